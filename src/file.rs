//! File-level operations: create, truncate, read, write, and root directory
//! enumeration.
//!
//! DFS has no subdirectories and no deletion; every file lives as one entry in the
//! flat dirent table rooted at inode 0.

use crate::error::{Error, Result};
use crate::flash::Flash;
use crate::layout::{DirEntry, FileFlags};
use crate::meta::{ino_from_path, read_dirent, read_dirent_raw, write_dirent, write_sb_info};
use crate::mount::DumbFs;

impl<F: Flash> DumbFs<F> {
    /// Resolves `name` to an inode index.
    ///
    /// `name` is the bare file name as stored in the dirent table, or `/` for the
    /// root; it is never a multi-component path, since DFS has no subdirectories.
    pub fn lookup(&self, name: &[u8]) -> Result<u32> {
        ino_from_path(&self.flash, self.cfg.max_inodes + 1, name)
    }

    /// Builds the display path of inode `ino`: `/` for the root, `/` followed
    /// directly by the stored name (no separator) for everything else.
    ///
    /// Preserved quirk from the original `dfs_pathname`: since DFS is flat, the
    /// missing separator is only ever observable at the root slash, so the bug this
    /// would be in a directory hierarchy never surfaces here.
    pub fn pathname(&self, ino: u32) -> Result<Vec<u8>> {
        if ino == 0 {
            return Ok(b"/".to_vec());
        }
        let entry = read_dirent(&self.flash, ino)?;
        let mut path = Vec::with_capacity(1 + entry.name().len());
        path.push(b'/');
        path.extend_from_slice(entry.name());
        Ok(path)
    }

    /// Creates a new regular file named `name`, returning its inode index.
    ///
    /// Fails with [`Error::NoMem`] once `inode_count` would exceed
    /// `max_inode_count`, or if every slot up to `max_inode_count` is occupied (the
    /// two conditions should coincide, but a scan is done either way since a slot
    /// can be skipped without an `inode_count` bump by a future `unlink`-like
    /// operation this format does not yet have).
    pub fn create(&mut self, name: &[u8]) -> Result<u32> {
        let inode_count = self.sb.inode_count;
        if inode_count >= self.sb.max_inode_count {
            return Err(Error::NoMem);
        }
        let max_inode_count = self.sb.max_inode_count;
        let slot = (1..max_inode_count)
            .find(|&n| matches!(read_dirent_raw(&self.flash, n), Ok(e) if e.is_empty_slot()))
            .ok_or(Error::NoMem)?;

        let pos_start = self.sb.free_space;
        let entry = DirEntry::new(name, pos_start, FileFlags::REGULAR);
        write_dirent(&mut self.flash, &mut self.scratch, &self.cfg, slot, &entry)?;

        self.sb.free_space = pos_start + self.cfg.minimum_file_size;
        self.sb.inode_count = inode_count + 1;
        write_sb_info(&mut self.flash, &mut self.scratch, &self.cfg, &self.sb)?;

        log::debug!("create: inode {slot} at extent offset {pos_start}");
        Ok(slot)
    }

    /// Grows a file's recorded length to `new_len`.
    ///
    /// DFS files only grow: shrinking is a Non-goal of this format, and a no-op
    /// request (`new_len == current length`) is accepted rather than rejected.
    /// Returns [`Error::Inval`] if `new_len` exceeds the file's preallocated
    /// capacity or is smaller than the current length.
    pub fn truncate(&mut self, ino: u32, new_len: u32) -> Result<()> {
        let mut entry = read_dirent(&self.flash, ino)?;
        let current_len = entry.len;
        if new_len == current_len {
            return Ok(());
        }
        if new_len < current_len || new_len > self.sb.max_len {
            return Err(Error::Inval);
        }
        entry.len = new_len;
        write_dirent(&mut self.flash, &mut self.scratch, &self.cfg, ino, &entry)
    }

    /// Reads up to `buf.len()` bytes starting at `file_pos`, returning the number of
    /// bytes actually read.
    ///
    /// Clipped to `file_length - file_pos`. A `file_pos` exactly at the end of the
    /// file reads zero bytes (the clip is zero, not negative); a `file_pos` past the
    /// end is [`Error::Inval`] per the documented "clip goes negative" rejection.
    pub fn read(&self, ino: u32, file_pos: u32, buf: &mut [u8]) -> Result<usize> {
        let entry = read_dirent(&self.flash, ino)?;
        let len = entry.len;
        if file_pos > len {
            return Err(Error::Inval);
        }
        if file_pos == len {
            return Ok(0);
        }
        let n = (buf.len() as u32).min(len - file_pos) as usize;
        let pos_start = entry.pos_start;
        self.flash
            .read_aligned(pos_start as u64 + file_pos as u64, &mut buf[..n])
            .map_err(Error::from)?;
        Ok(n)
    }

    /// Writes up to `buf.len()` bytes starting at `file_pos`, returning the number
    /// of bytes actually written.
    ///
    /// Clipped to `max_len - file_pos` (the file's preallocated extent, not its
    /// current recorded length). A `file_pos` at or past the extent's end clips to
    /// zero or less, which is [`Error::Inval`] per the documented "non-positive
    /// clipped length" rejection. Deliberately does not update the dirent's `len`
    /// field: callers that extend a file must call [`Self::truncate`] afterward,
    /// the same two-step contract the original format exposes.
    pub fn write(&mut self, ino: u32, file_pos: u32, buf: &[u8]) -> Result<usize> {
        let entry = read_dirent(&self.flash, ino)?;
        let max_len = self.sb.max_len;
        if file_pos >= max_len {
            return Err(Error::Inval);
        }
        let n = (buf.len() as u32).min(max_len - file_pos) as usize;
        let pos_start = entry.pos_start;
        crate::rewrite::buffered_write(
            &mut self.flash,
            &mut self.scratch,
            self.cfg.block_size,
            self.cfg.page_size,
            pos_start as u64 + file_pos as u64,
            &buf[..n],
        )?;
        Ok(n)
    }

    /// Enumerates the root directory starting at dirent slot `cursor`.
    ///
    /// Returns `Ok(None)` once `cursor` reaches `max_inode_count`; skips empty
    /// slots (honoring both sentinels, see `DirEntry::is_empty_slot`) and inode 0,
    /// since the root never appears as its own child.
    pub fn iterate(&self, cursor: u32) -> Result<Option<(u32, DirEntry)>> {
        let max_inode_count = self.sb.max_inode_count;
        let mut n = cursor.max(1);
        while n < max_inode_count {
            match read_dirent_raw(&self.flash, n) {
                Ok(entry) if !entry.is_empty_slot() => return Ok(Some((n, entry))),
                Ok(_) => n += 1,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}
