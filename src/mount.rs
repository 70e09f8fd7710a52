//! Formatting and mounting: turning a raw [`Flash`] device into a [`DumbFs`] handle.

use crate::config::{Config, ScratchMode};
use crate::error::Result;
use crate::flash::Flash;
use crate::layout::{DirEntry, FileFlags, SuperBlock, MAGIC};
use crate::meta::{read_sb_info, write_dirent, write_sb_info};
use crate::rewrite::ScratchBuffer;

/// A mounted DumbFS volume.
///
/// Owns the backing [`Flash`] device, the validated [`Config`] it was mounted with,
/// the scratch area the buffered-rewrite engine stages through, and an in-memory
/// copy of the superblock kept in sync with flash on every mutating call.
pub struct DumbFs<F: Flash> {
    pub(crate) flash: F,
    pub(crate) cfg: Config,
    pub(crate) scratch: ScratchBuffer,
    pub(crate) sb: SuperBlock,
}

impl<F: Flash> DumbFs<F> {
    /// Returns the configuration this volume was mounted with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Returns the in-memory superblock snapshot.
    pub fn superblock(&self) -> SuperBlock {
        self.sb
    }

    /// Returns the backing device, consuming the handle.
    pub fn into_flash(self) -> F {
        self.flash
    }

    fn header_len(max_inode_count: u32) -> u64 {
        core::mem::size_of::<SuperBlock>() as u64
            + max_inode_count as u64 * core::mem::size_of::<DirEntry>() as u64
    }

    fn make_scratch(cfg: &Config, flash: &F, buff_bk: u32) -> ScratchBuffer {
        match cfg.scratch_mode {
            ScratchMode::Ram => ScratchBuffer::new_ram(cfg.block_size),
            ScratchMode::Flash => {
                let _ = flash;
                ScratchBuffer::new_flash(buff_bk)
            }
        }
    }

    /// Erases the whole device and writes a fresh superblock and root dirent.
    ///
    /// The root is always inode 0, named `/`; it carries no data extent of its own.
    pub fn format(mut flash: F, cfg: Config) -> Result<Self> {
        cfg.validate()?;

        let total_blocks = flash.geometry().total_blocks();
        for block in 0..total_blocks {
            flash.erase(block)?;
        }

        let buff_bk = match cfg.scratch_mode {
            ScratchMode::Ram => 0,
            ScratchMode::Flash => total_blocks - 1,
        };
        let mut scratch = Self::make_scratch(&cfg, &flash, buff_bk);

        let max_inode_count = cfg.max_inodes + 1;
        let free_space = Self::header_len(max_inode_count) as u32;

        let sb = SuperBlock {
            magic: MAGIC,
            _pad: [0; 2],
            inode_count: 1,
            max_inode_count,
            max_len: cfg.minimum_file_size,
            buff_bk,
            free_space,
        };
        write_sb_info(&mut flash, &mut scratch, &cfg, &sb)?;

        let mut root = DirEntry::new(b"/", free_space, FileFlags::DIRECTORY);
        root.len = cfg.max_inodes;
        write_dirent(&mut flash, &mut scratch, &cfg, 0, &root)?;

        log::info!(
            "format: {max_inode_count} inode slots, {free_space} bytes of header, scratch {:?}",
            cfg.scratch_mode
        );
        Ok(Self { flash, cfg, scratch, sb })
    }

    /// Mounts an existing volume, formatting it first if its magic is absent or
    /// corrupt — a device with no prior DFS image is valid input.
    pub fn mount(flash: F, cfg: Config) -> Result<Self> {
        cfg.validate()?;
        let sb = read_sb_info(&flash)?;
        if !sb.has_valid_magic() {
            log::info!("mount: no valid superblock found, formatting");
            return Self::format(flash, cfg);
        }
        let buff_bk = sb.buff_bk;
        let scratch = Self::make_scratch(&cfg, &flash, buff_bk);
        let inode_count = sb.inode_count;
        log::info!("mount: found existing volume, inode_count {inode_count}");
        Ok(Self { flash, cfg, scratch, sb })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::flash::MemFlash;

    fn device(blocks: u32) -> MemFlash {
        MemFlash::new(Geometry::uniform(4096, blocks))
    }

    #[test]
    fn format_writes_valid_superblock_and_root() {
        let fs = DumbFs::format(device(8), Config::default()).unwrap();
        let sb = fs.superblock();
        assert!(sb.has_valid_magic());
        let inode_count = sb.inode_count;
        assert_eq!(inode_count, 1);
    }

    #[test]
    fn mount_of_blank_device_formats_it() {
        let fs = DumbFs::mount(device(8), Config::default()).unwrap();
        assert!(fs.superblock().has_valid_magic());
    }

    #[test]
    fn mount_of_formatted_device_preserves_state() {
        let cfg = Config::default();
        let fs = DumbFs::format(device(8), cfg).unwrap();
        let flash = fs.into_flash();
        let remounted = DumbFs::mount(flash, cfg).unwrap();
        let inode_count = remounted.superblock().inode_count;
        assert_eq!(inode_count, 1);
    }

    #[test]
    fn flash_scratch_mode_reserves_last_block() {
        let cfg = Config {
            scratch_mode: ScratchMode::Flash,
            ..Config::default()
        };
        let fs = DumbFs::format(device(8), cfg).unwrap();
        let buff_bk = fs.superblock().buff_bk;
        assert_eq!(buff_bk, 7);
    }
}
