//! `mkfs.dumbfs`: creates a DumbFS volume on a file or block device.
//!
//! Mirrors the shape of the original `mkfs` tool this crate grew out of: parse a
//! device path off the command line, size it, then hand it to the filesystem's own
//! `format` entry point.

use std::env;
use std::ffi::c_long;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::os::unix::fs::{FileExt, FileTypeExt};
use std::path::PathBuf;
use std::process::exit;

use dumbfs::config::{Config, ScratchMode};
use dumbfs::error::FlashError;
use dumbfs::flash::Flash;
use dumbfs::geometry::Geometry;
use dumbfs::mount::DumbFs;

fn error(context: impl std::fmt::Display) -> ! {
    eprintln!("mkfs.dumbfs: {context}");
    exit(1);
}

struct Args {
    help: bool,
    block_size: u32,
    page_size: u32,
    min_file_size: u32,
    max_inodes: u32,
    scratch_flash: bool,
    device_path: Option<PathBuf>,
}

impl Default for Args {
    fn default() -> Self {
        let defaults = Config::default();
        Self {
            help: false,
            block_size: defaults.block_size,
            page_size: defaults.page_size,
            min_file_size: defaults.minimum_file_size,
            max_inodes: defaults.max_inodes,
            scratch_flash: false,
            device_path: None,
        }
    }
}

fn parse_args(args: env::ArgsOs) -> Args {
    let mut res = Args::default();
    let mut it = args.skip(1);
    while let Some(arg) = it.next() {
        let arg = arg.to_string_lossy().into_owned();
        match arg.as_str() {
            "-h" | "--help" => res.help = true,
            "--scratch-flash" => res.scratch_flash = true,
            "--block-size" => {
                res.block_size = next_u32(&mut it, "--block-size");
            }
            "--page-size" => {
                res.page_size = next_u32(&mut it, "--page-size");
            }
            "--min-file-size" => {
                res.min_file_size = next_u32(&mut it, "--min-file-size");
            }
            "--max-inodes" => {
                res.max_inodes = next_u32(&mut it, "--max-inodes");
            }
            _ => res.device_path = Some(PathBuf::from(arg)),
        }
    }
    res
}

fn next_u32(it: &mut impl Iterator<Item = std::ffi::OsString>, flag: &str) -> u32 {
    it.next()
        .and_then(|v| v.to_string_lossy().parse().ok())
        .unwrap_or_else(|| error(format_args!("{flag} requires a numeric argument")))
}

fn print_usage() {
    println!(
        "usage: mkfs.dumbfs [options] <device>\n\n\
         options:\n  \
         --block-size <bytes>     erase-block size (default 4096)\n  \
         --page-size <bytes>      page size (default 256)\n  \
         --min-file-size <bytes>  per-file preallocated capacity (default 8192)\n  \
         --max-inodes <n>         maximum number of files (default 16)\n  \
         --scratch-flash          stage rewrites in a reserved flash block\n  \
                                   instead of RAM"
    );
}

/// ioctl command: get the size of a block device in bytes.
///
/// Ported from the original `BLKGETSIZE64` helper, expressed directly in bytes
/// instead of 512-byte sectors since DumbFS only cares about total byte capacity.
fn block_device_size(dev: &File) -> io::Result<u64> {
    const BLKGETSIZE64: c_long = 0x80081272u32 as c_long;
    let mut size: u64 = 0;
    let ret = unsafe { libc::ioctl(dev.as_raw_fd(), BLKGETSIZE64 as _, &mut size) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(size)
}

fn device_size(dev: &File) -> io::Result<u64> {
    let meta = dev.metadata()?;
    let file_type = meta.file_type();
    if file_type.is_block_device() || file_type.is_char_device() {
        block_device_size(dev)
    } else {
        Ok(meta.len())
    }
}

/// A [`Flash`] implementation backed by an open file: a flat region on disk plays
/// the role of raw NAND, addressed with `read_at`/`write_at` rather than a real
/// erase/program interface. Good enough to host a DumbFS image for testing and for
/// loopback-mounted volumes; a real MTD or SPI-NOR binding belongs to the host
/// application, not to this crate.
struct FileFlash {
    file: File,
    geometry: Geometry,
}

impl Flash for FileFlash {
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
            .ok_or_else(|| FlashError::new("erase: block index out of range"))?
            as usize;
        let ones = vec![0xFFu8; size];
        self.file.write_all_at(&ones, off).map_err(FlashError::new)
    }

    fn read_aligned(&self, byte_off: u64, buf: &mut [u8]) -> Result<(), FlashError> {
        self.file.read_exact_at(buf, byte_off).map_err(FlashError::new)
    }

    fn write_aligned(&mut self, byte_off: u64, buf: &[u8]) -> Result<(), FlashError> {
        self.file.write_all_at(buf, byte_off).map_err(FlashError::new)
    }
}

fn main() {
    env_logger::init();
    let args = parse_args(env::args_os());

    if args.help {
        print_usage();
        return;
    }
    let device_path = args.device_path.unwrap_or_else(|| error("specify a device path"));

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&device_path)
        .unwrap_or_else(|e| error(format_args!("{}: {e}", device_path.display())));

    let size = device_size(&file).unwrap_or_else(|e| error(format_args!("{}: {e}", device_path.display())));
    let blocks = (size / args.block_size as u64) as u32;
    if blocks < 2 {
        error(format_args!(
            "{}: device too small for block size {}",
            device_path.display(),
            args.block_size
        ));
    }

    let cfg = Config {
        page_size: args.page_size,
        block_size: args.block_size,
        minimum_file_size: args.min_file_size,
        max_inodes: args.max_inodes,
        scratch_mode: if args.scratch_flash {
            ScratchMode::Flash
        } else {
            ScratchMode::Ram
        },
        use_ram_section: None,
    };
    if let Err(e) = cfg.validate() {
        error(format_args!("invalid configuration: {e}"));
    }

    let flash = FileFlash {
        file,
        geometry: Geometry::uniform(args.block_size, blocks),
    };
    let fs = DumbFs::format(flash, cfg).unwrap_or_else(|e| error(format_args!("format failed: {e}")));

    let sb = fs.superblock();
    let max_inode_count = sb.max_inode_count;
    println!(
        "{}: DumbFS volume, {blocks} blocks of {} bytes, {max_inode_count} inode slots",
        device_path.display(),
        args.block_size,
    );
}
