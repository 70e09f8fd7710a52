//! The buffered-rewrite engine.
//!
//! This is the hard part of DumbFS: it emulates an arbitrary in-place byte write on
//! top of flash that can only be erased a whole block at a time. Every byte within
//! the touched erase blocks that falls outside the write range is preserved exactly,
//! by staging a full block image through a scratch area before publishing it back.

use crate::error::{Error, Result};
use crate::flash::Flash;

/// Where a block is staged before being published back to its target location.
///
/// Both modes expose the same staging behavior; they differ only in where the
/// intermediate image lives.
#[derive(Debug)]
pub enum ScratchBuffer {
    /// A RAM buffer holding one erase block's worth of bytes.
    Ram(Vec<u8>),
    /// A reserved flash erase block, identified by its index. This block never
    /// holds persistent file data.
    Flash(u32),
}

impl ScratchBuffer {
    /// Creates a RAM-scratch buffer sized for `block_size` bytes.
    pub fn new_ram(block_size: u32) -> Self {
        ScratchBuffer::Ram(vec![0xFF; block_size as usize])
    }

    /// Creates a flash-scratch buffer backed by erase block `block_index`.
    pub fn new_flash(block_index: u32) -> Self {
        ScratchBuffer::Flash(block_index)
    }

    fn scratch_erase<F: Flash>(&mut self, flash: &mut F) -> Result<()> {
        match self {
            ScratchBuffer::Ram(buf) => {
                buf.fill(0xFF);
                Ok(())
            }
            ScratchBuffer::Flash(block) => flash.erase(*block).map_err(Error::from),
        }
    }

    /// Brings `len` bytes from the persistent region at `src_off` into the scratch
    /// area at `dst_off`.
    fn stage_copy<F: Flash>(
        &mut self,
        flash: &mut F,
        page_size: u32,
        dst_off: usize,
        src_off: u64,
        len: usize,
    ) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        match self {
            ScratchBuffer::Ram(buf) => flash
                .read_aligned(src_off, &mut buf[dst_off..dst_off + len])
                .map_err(Error::from),
            ScratchBuffer::Flash(block) => {
                let block_off = flash
                    .geometry()
                    .block_offset(*block)
                    .expect("scratch block out of range");
                let mut tmp = vec![0u8; len];
                flash.read_aligned(src_off, &mut tmp)?;
                write_page_aligned(flash, page_size, block_off + dst_off as u64, &tmp)
            }
        }
    }

    /// Places new bytes `buf` into the scratch area at `dst_off`.
    fn stage_write<F: Flash>(
        &mut self,
        flash: &mut F,
        page_size: u32,
        dst_off: usize,
        buf: &[u8],
    ) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        match self {
            ScratchBuffer::Ram(scratch) => {
                scratch[dst_off..dst_off + buf.len()].copy_from_slice(buf);
                Ok(())
            }
            ScratchBuffer::Flash(block) => {
                let block_off = flash
                    .geometry()
                    .block_offset(*block)
                    .expect("scratch block out of range");
                write_page_aligned(flash, page_size, block_off + dst_off as u64, buf)
            }
        }
    }

    /// Erases `target_block` and copies the staged image onto it.
    fn publish<F: Flash>(&mut self, flash: &mut F, target_block: u32) -> Result<()> {
        flash.erase(target_block)?;
        match self {
            ScratchBuffer::Ram(buf) => {
                let off = flash
                    .geometry()
                    .block_offset(target_block)
                    .expect("target block out of range");
                flash.write_aligned(off, buf).map_err(Error::from)
            }
            ScratchBuffer::Flash(block) => {
                flash.copy_block(target_block, *block).map_err(Error::from)
            }
        }
    }
}

/// Writes `buf` through a page-sized bounce buffer so that the underlying
/// [`Flash::write_aligned`] call always receives a page-aligned offset and a
/// page-multiple length, regardless of how `buf` itself is aligned.
///
/// `read_aligned` has no alignment requirement of its own, so the bounce buffer is
/// filled by reading the enclosing pages back, patched in place, then written out
/// whole.
fn write_page_aligned<F: Flash>(
    flash: &mut F,
    page_size: u32,
    byte_off: u64,
    buf: &[u8],
) -> Result<()> {
    let page_size = page_size as u64;
    let start_page = (byte_off / page_size) * page_size;
    let end = byte_off + buf.len() as u64;
    let end_page = end.div_ceil(page_size) * page_size;
    let mut bounce = vec![0u8; (end_page - start_page) as usize];
    flash.read_aligned(start_page, &mut bounce)?;
    let rel = (byte_off - start_page) as usize;
    bounce[rel..rel + buf.len()].copy_from_slice(buf);
    flash.write_aligned(start_page, &bounce).map_err(Error::from)
}

/// Writes `buf` starting at absolute flash byte offset `pos`, preserving every byte
/// outside `[pos, pos + buf.len())` within the erase blocks it touches.
///
/// `block_size` is the mount's configured erase-block size; DFS assumes a single
/// uniform block size across the region it writes into (true of every geometry the
/// worked examples use). `page_size` drives the bounce-buffer alignment in
/// flash-scratch mode.
///
/// A `size == 0` call (empty `buf`) is a documented no-op: it must not erase
/// anything.
pub fn buffered_write<F: Flash>(
    flash: &mut F,
    scratch: &mut ScratchBuffer,
    block_size: u32,
    page_size: u32,
    pos: u64,
    buf: &[u8],
) -> Result<()> {
    if buf.is_empty() {
        return Ok(());
    }
    let block_size = block_size as u64;
    let start_bk = (pos / block_size) as u32;
    // Inclusive index of the last touched block: using the last touched *byte*
    // (`pos + buf.len() - 1`) rather than the one-past-the-end offset avoids
    // treating a write that lands exactly on a block boundary as spilling into
    // the following (untouched) block.
    let last_bk = ((pos + buf.len() as u64 - 1) / block_size) as u32;
    let off = (pos % block_size) as usize;

    if start_bk == last_bk {
        log::debug!("buffered_write: single block {start_bk}, off {off}, len {}", buf.len());
        scratch.scratch_erase(flash)?;
        scratch.stage_copy(flash, page_size, 0, start_bk as u64 * block_size, off)?;
        scratch.stage_write(flash, page_size, off, buf)?;
        let tail_start = off + buf.len();
        let tail_len = block_size as usize - tail_start;
        scratch.stage_copy(
            flash,
            page_size,
            tail_start,
            start_bk as u64 * block_size + tail_start as u64,
            tail_len,
        )?;
        scratch.publish(flash, start_bk)?;
        return Ok(());
    }

    log::debug!(
        "buffered_write: spans blocks {start_bk}..={last_bk}, off {off}, len {}",
        buf.len()
    );
    let mut remaining = buf;

    // Preserve-prefix of the first block.
    scratch.scratch_erase(flash)?;
    scratch.stage_copy(flash, page_size, 0, start_bk as u64 * block_size, off)?;
    let first_chunk_len = block_size as usize - off;
    scratch.stage_write(flash, page_size, off, &remaining[..first_chunk_len])?;
    scratch.publish(flash, start_bk)?;
    remaining = &remaining[first_chunk_len..];

    // Fully-contained intermediate blocks: no staging needed, the whole block is
    // replaced.
    for bk in (start_bk + 1)..last_bk {
        flash.erase(bk)?;
        let chunk = &remaining[..block_size as usize];
        let block_off = flash
            .geometry()
            .block_offset(bk)
            .expect("intermediate block out of range");
        flash.write_aligned(block_off, chunk)?;
        remaining = &remaining[block_size as usize..];
    }

    // Preserve-suffix of the last block.
    let tail = remaining.len();
    scratch.scratch_erase(flash)?;
    scratch.stage_write(flash, page_size, 0, remaining)?;
    let suffix_preserve_len = block_size as usize - tail;
    scratch.stage_copy(
        flash,
        page_size,
        tail,
        last_bk as u64 * block_size + tail as u64,
        suffix_preserve_len,
    )?;
    scratch.publish(flash, last_bk)?;

    Ok(())
}

/// Writes `size` copies of `byte` starting at `pos`, through the same preservation
/// guarantees as [`buffered_write`].
///
/// Used internally by `format` to zero the dirent table without hand-building a
/// filled buffer at each call site; it carries no on-flash semantics beyond what
/// `buffered_write` already provides.
pub fn buffered_fill<F: Flash>(
    flash: &mut F,
    scratch: &mut ScratchBuffer,
    block_size: u32,
    page_size: u32,
    pos: u64,
    byte: u8,
    size: usize,
) -> Result<()> {
    let buf = vec![byte; size];
    buffered_write(flash, scratch, block_size, page_size, pos, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flash::MemFlash;
    use crate::geometry::Geometry;

    fn device(blocks: u32) -> MemFlash {
        MemFlash::new(Geometry::uniform(4096, blocks))
    }

    #[test]
    fn empty_write_is_noop() {
        let mut flash = device(2);
        let before = flash.as_slice().to_vec();
        let mut scratch = ScratchBuffer::new_ram(4096);
        buffered_write(&mut flash, &mut scratch, 4096, 256, 100, &[]).unwrap();
        assert_eq!(flash.as_slice(), before.as_slice());
    }

    #[test]
    fn single_block_write_preserves_prefix_and_suffix_ram() {
        single_block_write_preserves_prefix_and_suffix(ScratchBuffer::new_ram(4096));
    }

    #[test]
    fn single_block_write_preserves_prefix_and_suffix_flash() {
        single_block_write_preserves_prefix_and_suffix(ScratchBuffer::new_flash(3));
    }

    fn single_block_write_preserves_prefix_and_suffix(mut scratch: ScratchBuffer) {
        let mut flash = device(4);
        buffered_write(&mut flash, &mut scratch, 4096, 256, 0, b"hello").unwrap();
        let mut out = [0u8; 5];
        flash.read_aligned(0, &mut out).unwrap();
        assert_eq!(&out, b"hello");
        let mut tail = [0u8; 1];
        flash.read_aligned(5, &mut tail).unwrap();
        assert_eq!(tail, [0xFF]);
    }

    #[test]
    fn two_block_write_leaves_neighbors_untouched_ram() {
        two_block_write_leaves_neighbors_untouched(ScratchBuffer::new_ram(4096));
    }

    #[test]
    fn two_block_write_leaves_neighbors_untouched_flash() {
        two_block_write_leaves_neighbors_untouched(ScratchBuffer::new_flash(3));
    }

    fn two_block_write_leaves_neighbors_untouched(mut scratch: ScratchBuffer) {
        let mut flash = device(4);
        let payload: Vec<u8> = (0..20u8).collect();
        buffered_write(&mut flash, &mut scratch, 4096, 256, 4090, &payload).unwrap();

        let mut readback = vec![0u8; 20];
        flash.read_aligned(4090, &mut readback).unwrap();
        assert_eq!(readback, payload);

        let mut before = [0u8; 1];
        flash.read_aligned(4089, &mut before).unwrap();
        assert_eq!(before, [0xFF]);

        let mut after = [0u8; 1];
        flash.read_aligned(4110, &mut after).unwrap();
        assert_eq!(after, [0xFF]);
    }

    #[test]
    fn three_block_write_middle_block_written_once() {
        let mut flash = device(4);
        let mut scratch = ScratchBuffer::new_ram(4096);
        let payload: Vec<u8> = (0..8000u32).map(|i| (i % 256) as u8).collect();
        buffered_write(&mut flash, &mut scratch, 4096, 256, 100, &payload).unwrap();

        let mut readback = vec![0u8; payload.len()];
        flash.read_aligned(100, &mut readback).unwrap();
        assert_eq!(readback, payload);
    }

    #[test]
    fn write_exactly_one_block_touches_only_that_block() {
        let mut flash = device(3);
        let mut scratch = ScratchBuffer::new_ram(4096);
        let payload = vec![0x42u8; 4096];
        buffered_write(&mut flash, &mut scratch, 4096, 256, 0, &payload).unwrap();
        let mut next_block = vec![0u8; 4096];
        flash.read_aligned(4096, &mut next_block).unwrap();
        assert_eq!(next_block, vec![0xFFu8; 4096]);
    }

    #[test]
    fn reentrant_writes_to_same_block_accumulate() {
        let mut flash = device(2);
        let mut scratch = ScratchBuffer::new_ram(4096);
        buffered_write(&mut flash, &mut scratch, 4096, 256, 0, b"abc").unwrap();
        buffered_write(&mut flash, &mut scratch, 4096, 256, 10, b"xyz").unwrap();
        let mut out = [0u8; 13];
        flash.read_aligned(0, &mut out).unwrap();
        assert_eq!(&out[0..3], b"abc");
        assert_eq!(&out[10..13], b"xyz");
    }
}
