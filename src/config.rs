//! Build-time configuration recognized by DFS.
//!
//! The original implementation selects these at compile time; here they are plain
//! fields on [`Config`], checked once by [`Config::validate`] before a mount or
//! format is attempted.

use crate::error::{Error, Result};

/// Selects how the buffered-rewrite engine stages a block before publishing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScratchMode {
    /// Stage in a RAM buffer of one erase-block size; publish is erase + write.
    Ram,
    /// Stage in a reserved flash block (the device's last erase block); publish is a
    /// block-to-block copy.
    Flash,
}

/// Runtime configuration for a DumbFS mount.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Flash page size in bytes.
    pub page_size: u32,
    /// Erase-block size in bytes. Must be a multiple of `page_size`.
    pub block_size: u32,
    /// Per-file preallocated capacity (`max_len` in the on-flash superblock).
    pub minimum_file_size: u32,
    /// Maximum number of files (excluding the root), i.e. `DFS_INODES_MAX`.
    pub max_inodes: u32,
    /// Selects RAM-scratch vs. flash-scratch mode.
    pub scratch_mode: ScratchMode,
    /// Placement hint only: in the original, names the linker section the RAM
    /// scratch buffer is placed in. Has no effect on a hosted target; carried for
    /// fidelity with the recognized option set.
    pub use_ram_section: Option<&'static str>,
}

impl Config {
    /// Checks the configuration for internal consistency.
    ///
    /// Returns [`Error::Inval`] if `block_size` is not a positive multiple of
    /// `page_size`, or if `minimum_file_size` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.block_size == 0 {
            return Err(Error::Inval);
        }
        if self.block_size % self.page_size != 0 {
            return Err(Error::Inval);
        }
        if self.minimum_file_size == 0 {
            return Err(Error::Inval);
        }
        if self.max_inodes == 0 {
            return Err(Error::Inval);
        }
        Ok(())
    }
}

impl Default for Config {
    /// 256B pages, 4KiB erase blocks, 8KiB minimum file size, 16 inodes.
    fn default() -> Self {
        Self {
            page_size: 256,
            block_size: 4096,
            minimum_file_size: 8192,
            max_inodes: 16,
            scratch_mode: ScratchMode::Ram,
            use_ram_section: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn misaligned_block_size_rejected() {
        let mut cfg = Config::default();
        cfg.block_size = 300;
        assert!(matches!(cfg.validate(), Err(Error::Inval)));
    }

    #[test]
    fn zero_minimum_file_size_rejected() {
        let mut cfg = Config::default();
        cfg.minimum_file_size = 0;
        assert!(matches!(cfg.validate(), Err(Error::Inval)));
    }
}
