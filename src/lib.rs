//! DumbFS (DFS): a minimal flat filesystem for erase-before-write NAND-style flash.
//!
//! A volume is a single superblock, a fixed-size table of directory entries, and a
//! flat region of preallocated per-file extents — no subdirectories, no free-space
//! reclamation beyond what a reformat provides. Every mutating operation routes
//! through the buffered-rewrite engine ([`rewrite`]) so that an arbitrary byte range
//! can be rewritten on a device that can only be erased a whole block at a time.
//!
//! Typical use:
//!
//! ```no_run
//! use dumbfs::{config::Config, flash::MemFlash, geometry::Geometry, mount::DumbFs};
//!
//! let flash = MemFlash::new(Geometry::uniform(4096, 64));
//! let mut fs = DumbFs::mount(flash, Config::default()).unwrap();
//! let ino = fs.create(b"hello.txt").unwrap();
//! fs.write(ino, 0, b"hi").unwrap();
//! fs.truncate(ino, 2).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod file;
pub mod flash;
pub mod geometry;
pub mod layout;
pub mod meta;
pub mod mount;
pub mod rewrite;
pub mod vfs;

pub use error::{Error, Result};
pub use mount::DumbFs;
