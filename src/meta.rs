//! Metadata operations: the superblock and the directory-entry table.
//!
//! Every function here stages its write through the buffered-rewrite engine; nothing
//! in this module erases or writes a block directly.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::flash::Flash;
use crate::layout::{DirEntry, SuperBlock};
use crate::rewrite::{buffered_write, ScratchBuffer};

/// Reads the superblock from byte offset 0.
pub fn read_sb_info<F: Flash>(flash: &F) -> Result<SuperBlock> {
    let mut buf = vec![0u8; core::mem::size_of::<SuperBlock>()];
    flash.read_aligned(0, &mut buf).map_err(Error::from)?;
    Ok(SuperBlock::from_bytes(&buf))
}

/// Writes the superblock back to byte offset 0, through the buffered-rewrite engine.
pub fn write_sb_info<F: Flash>(
    flash: &mut F,
    scratch: &mut ScratchBuffer,
    cfg: &Config,
    sb: &SuperBlock,
) -> Result<()> {
    buffered_write(flash, scratch, cfg.block_size, cfg.page_size, 0, sb.as_bytes())
}

/// Reads the `n`th dirent slot.
///
/// Returns [`Error::NoEnt`] if the slot is empty, per the `name[0] == '\0'` sentinel
/// (the `0xFFFFFFFF` sentinel is the one `iterate`'s cursor walk honors instead; both
/// must agree on a freshly-erased slot, see [`DirEntry::is_empty_slot`]).
pub fn read_dirent<F: Flash>(flash: &F, n: u32) -> Result<DirEntry> {
    let mut buf = vec![0u8; core::mem::size_of::<DirEntry>()];
    flash
        .read_aligned(DirEntry::offset_of(n), &mut buf)
        .map_err(Error::from)?;
    let entry = DirEntry::from_bytes(&buf);
    if entry.is_empty_slot() {
        return Err(Error::NoEnt);
    }
    Ok(entry)
}

/// Reads the `n`th dirent slot without treating an empty slot as an error.
///
/// Used by callers (`create`, `iterate`) that need to distinguish "empty" from
/// "not found" rather than collapse both to [`Error::NoEnt`].
pub fn read_dirent_raw<F: Flash>(flash: &F, n: u32) -> Result<DirEntry> {
    let mut buf = vec![0u8; core::mem::size_of::<DirEntry>()];
    flash
        .read_aligned(DirEntry::offset_of(n), &mut buf)
        .map_err(Error::from)?;
    Ok(DirEntry::from_bytes(&buf))
}

/// Writes the `n`th dirent slot, through the buffered-rewrite engine.
pub fn write_dirent<F: Flash>(
    flash: &mut F,
    scratch: &mut ScratchBuffer,
    cfg: &Config,
    n: u32,
    entry: &DirEntry,
) -> Result<()> {
    buffered_write(
        flash,
        scratch,
        cfg.block_size,
        cfg.page_size,
        DirEntry::offset_of(n),
        entry.as_bytes(),
    )
}

/// Finds the inode index of the dirent named `name`, scanning linearly over
/// `0..max_inode_count` (there is no index beyond the flat table itself).
///
/// Inode 0 is always the root, named `/`; every other slot holds a bare file name
/// with no leading separator.
pub fn ino_from_path<F: Flash>(flash: &F, max_inode_count: u32, name: &[u8]) -> Result<u32> {
    if name == b"/" {
        return Ok(0);
    }
    for n in 1..max_inode_count {
        match read_dirent(flash, n) {
            Ok(entry) if entry.name() == name => return Ok(n),
            Ok(_) => continue,
            Err(Error::NoEnt) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(Error::NoEnt)
}
