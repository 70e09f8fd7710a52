//! A narrow host-facing trait for wiring a [`DumbFs`] volume into a larger system.
//!
//! The original format couples directly to a kernel's inode-operations vtable; this
//! trait keeps the same shape without assuming a particular kernel or VFS layer is
//! present. A hosted embedder implements or wraps this trait rather than poking at
//! `DumbFs` internals directly.

use crate::error::Result;
use crate::flash::Flash;
use crate::layout::DirEntry;
use crate::mount::DumbFs;

/// Operations a host VFS layer needs from a mounted DumbFS volume.
///
/// Formatting and mounting are deliberately not part of this trait: they are the
/// entry points that *produce* a `DumbFs` handle (`DumbFs::format`, `DumbFs::mount`),
/// not operations performed on one. A host wires up the volume via those associated
/// functions first, then drives it purely through this trait from then on.
pub trait FilesystemDriver {
    /// Returns the filesystem's name, for diagnostics and mount-table reporting.
    fn name(&self) -> &'static str {
        "dumbfs"
    }

    /// Creates a regular file named `name`, returning its inode index.
    fn create(&mut self, name: &[u8]) -> Result<u32>;

    /// Resolves `name` to an inode index.
    fn lookup(&self, name: &[u8]) -> Result<u32>;

    /// Builds the display path of inode `ino`.
    fn pathname(&self, ino: u32) -> Result<Vec<u8>>;

    /// Enumerates the root directory starting at dirent slot `cursor`.
    fn iterate(&self, cursor: u32) -> Result<Option<(u32, DirEntry)>>;

    /// Grows a file's recorded length to `new_len`.
    fn truncate(&mut self, ino: u32, new_len: u32) -> Result<()>;

    /// Reads up to `buf.len()` bytes starting at `file_pos`.
    fn read(&self, ino: u32, file_pos: u32, buf: &mut [u8]) -> Result<usize>;

    /// Writes up to `buf.len()` bytes starting at `file_pos`.
    fn write(&mut self, ino: u32, file_pos: u32, buf: &[u8]) -> Result<usize>;
}

impl<F: Flash> FilesystemDriver for DumbFs<F> {
    fn create(&mut self, name: &[u8]) -> Result<u32> {
        DumbFs::create(self, name)
    }

    fn lookup(&self, name: &[u8]) -> Result<u32> {
        DumbFs::lookup(self, name)
    }

    fn pathname(&self, ino: u32) -> Result<Vec<u8>> {
        DumbFs::pathname(self, ino)
    }

    fn iterate(&self, cursor: u32) -> Result<Option<(u32, DirEntry)>> {
        DumbFs::iterate(self, cursor)
    }

    fn truncate(&mut self, ino: u32, new_len: u32) -> Result<()> {
        DumbFs::truncate(self, ino, new_len)
    }

    fn read(&self, ino: u32, file_pos: u32, buf: &mut [u8]) -> Result<usize> {
        DumbFs::read(self, ino, file_pos, buf)
    }

    fn write(&mut self, ino: u32, file_pos: u32, buf: &[u8]) -> Result<usize> {
        DumbFs::write(self, ino, file_pos, buf)
    }
}
