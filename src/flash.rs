//! The flash facade: the narrow interface DFS expects its backing device to provide.
//!
//! This is the external collaborator described by the format's specification. DFS
//! ships one reference implementation, [`MemFlash`], backed by a plain byte buffer,
//! used by the test suite and by `demos/mkfs` when pointed at a flat file. A real
//! binding to MTD, SPI-NOR, or another raw flash transport is intentionally left to
//! the host application.

use crate::error::FlashError;
use crate::geometry::Geometry;

/// Abstract flash device: erase/read/write/copy at block and byte granularity.
///
/// Implementors only need to honor the erase-before-write contract; DFS itself never
/// assumes anything about the physical transport beyond what this trait exposes.
pub trait Flash {
    /// Returns the device's erase-block geometry.
    fn geometry(&self) -> &Geometry;

    /// Erases the given erase block, resetting every byte within it to its
    /// post-erase value (all-ones on the devices DFS targets).
    fn erase(&mut self, block_index: u32) -> Result<(), FlashError>;

    /// Reads `buf.len()` bytes starting at absolute byte offset `byte_off`.
    ///
    /// Unlike [`Self::write_aligned`], no alignment is required of `byte_off` or
    /// `buf.len()`: reads never disturb flash state.
    fn read_aligned(&self, byte_off: u64, buf: &mut [u8]) -> Result<(), FlashError>;

    /// Writes `buf` at absolute byte offset `byte_off`.
    ///
    /// The destination bytes must have been erased (and not yet written since) for
    /// this call to be meaningful; DFS never writes into already-written bytes
    /// without an intervening erase.
    fn write_aligned(&mut self, byte_off: u64, buf: &[u8]) -> Result<(), FlashError>;

    /// Copies `len` bytes from `src_off` to `dst_off` within the device.
    ///
    /// The destination range must already be erased.
    fn copy_aligned(&mut self, dst_off: u64, src_off: u64, len: usize) -> Result<(), FlashError> {
        let mut buf = vec![0u8; len];
        self.read_aligned(src_off, &mut buf)?;
        self.write_aligned(dst_off, &buf)
    }

    /// Copies the full contents of erase block `src_block` onto erase block
    /// `dst_block`. `dst_block` must already be erased.
    fn copy_block(&mut self, dst_block: u32, src_block: u32) -> Result<(), FlashError> {
        let geo = self.geometry();
        let size = geo
            .block_size(src_block)
            .expect("copy_block: src_block out of range") as u64;
        let dst_off = geo
            .block_offset(dst_block)
            .expect("copy_block: dst_block out of range");
        let src_off = geo
            .block_offset(src_block)
            .expect("copy_block: src_block out of range");
        self.copy_aligned(dst_off, src_off, size as usize)
    }
}

/// A RAM-backed [`Flash`] implementation, for tests and for formatting a flat file as
/// a DumbFS image (`demos/mkfs`'s default mode).
///
/// Erasing a block sets every byte to `0xFF`, matching the erase-to-one convention
/// most NOR/NAND parts DFS targets use.
#[derive(Debug)]
pub struct MemFlash {
    geometry: Geometry,
    data: Vec<u8>,
}

impl MemFlash {
    /// Creates a fresh, fully-erased device with the given geometry.
    pub fn new(geometry: Geometry) -> Self {
        let len = geometry.total_len() as usize;
        Self {
            geometry,
            data: vec![0xFF; len],
        }
    }

    /// Returns the raw backing buffer.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl Flash for MemFlash {
    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn erase(&mut self, block_index: u32) -> Result<(), FlashError> {
        let off = self
            .geometry
            .block_offset(block_index)
            .ok_or_else(|| FlashError::new("erase: block index out of range"))?;
        let size = self
            .geometry
            .block_size(block_index)
            .ok_or_else(|| FlashError::new("erase: block index out of range"))? as usize;
        log::trace!("erase block {block_index} at offset {off}, {size} bytes");
        self.data[off as usize..off as usize + size].fill(0xFF);
        Ok(())
    }

    fn read_aligned(&self, byte_off: u64, buf: &mut [u8]) -> Result<(), FlashError> {
        let start = byte_off as usize;
        let end = start + buf.len();
        if end > self.data.len() {
            return Err(FlashError::new("read past end of device"));
        }
        buf.copy_from_slice(&self.data[start..end]);
        Ok(())
    }

    fn write_aligned(&mut self, byte_off: u64, buf: &[u8]) -> Result<(), FlashError> {
        let start = byte_off as usize;
        let end = start + buf.len();
        if end > self.data.len() {
            return Err(FlashError::new("write past end of device"));
        }
        log::trace!("write_aligned offset {byte_off}, {} bytes", buf.len());
        self.data[start..end].copy_from_slice(buf);
        Ok(())
    }
}
