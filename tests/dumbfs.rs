//! End-to-end scenarios against a fresh [`MemFlash`] device, at the same
//! 256B page / 4096B block / 8192B minimum-file-size / 16-inode geometry as the
//! worked examples this crate's behavior is checked against. Block-spanning write
//! byte-preservation itself is covered directly in `rewrite.rs`'s unit tests, where
//! the absolute block boundaries are known; these scenarios exercise the
//! create/write/truncate/read/iterate contract end to end instead.

use dumbfs::config::Config;
use dumbfs::error::Error;
use dumbfs::flash::MemFlash;
use dumbfs::geometry::Geometry;
use dumbfs::layout::MAGIC;
use dumbfs::mount::DumbFs;

fn scenario_config() -> Config {
    Config {
        page_size: 256,
        block_size: 4096,
        minimum_file_size: 8192,
        max_inodes: 16,
        ..Config::default()
    }
}

fn device(blocks: u32) -> MemFlash {
    MemFlash::new(Geometry::uniform(4096, blocks))
}

#[test]
fn format_and_mount_yields_empty_root() {
    let cfg = scenario_config();
    let fs = DumbFs::format(device(32), cfg).unwrap();
    let sb = fs.superblock();
    assert!(sb.has_valid_magic());
    let magic = sb.magic;
    let inode_count = sb.inode_count;
    assert_eq!(magic, MAGIC);
    assert_eq!(inode_count, 1);
    assert_eq!(fs.pathname(0).unwrap(), b"/");
    assert!(fs.iterate(0).unwrap().is_none());
}

#[test]
fn create_write_truncate_read_single_block() {
    let cfg = scenario_config();
    let mut fs = DumbFs::format(device(32), cfg).unwrap();
    let a = fs.create(b"a").unwrap();
    fs.write(a, 0, b"hello").unwrap();
    fs.truncate(a, 5).unwrap();

    let mut buf = [0u8; 5];
    assert_eq!(fs.read(a, 0, &mut buf).unwrap(), 5);
    assert_eq!(&buf, b"hello");
}

#[test]
fn write_across_two_blocks() {
    let cfg = scenario_config();
    let mut fs = DumbFs::format(device(32), cfg).unwrap();
    let b = fs.create(b"b").unwrap();
    let payload: Vec<u8> = (0..20u8).collect();
    fs.write(b, 4090, &payload).unwrap();
    fs.truncate(b, 4110).unwrap();

    let mut out = [0u8; 20];
    assert_eq!(fs.read(b, 4090, &mut out).unwrap(), 20);
    assert_eq!(out.to_vec(), payload);
}

#[test]
fn write_spanning_three_blocks() {
    let cfg = scenario_config();
    let mut fs = DumbFs::format(device(32), cfg).unwrap();
    let c = fs.create(b"c").unwrap();
    let payload: Vec<u8> = (0..8000u32).map(|i| (i % 256) as u8).collect();
    fs.write(c, 100, &payload).unwrap();
    fs.truncate(c, 100 + payload.len() as u32).unwrap();

    let mut out = vec![0u8; payload.len()];
    assert_eq!(fs.read(c, 100, &mut out).unwrap(), payload.len());
    assert_eq!(out, payload);
}

#[test]
fn inode_exhaustion_leaves_existing_files_readable() {
    let cfg = scenario_config();
    let mut fs = DumbFs::format(device(64), cfg).unwrap();
    let mut inodes = Vec::new();
    for i in 0..cfg.max_inodes {
        let name = format!("f{i}");
        inodes.push(fs.create(name.as_bytes()).unwrap());
    }
    assert!(matches!(fs.create(b"overflow"), Err(Error::NoMem)));

    fs.write(inodes[0], 0, b"still here").unwrap();
    fs.truncate(inodes[0], 10).unwrap();
    let mut buf = [0u8; 10];
    assert_eq!(fs.read(inodes[0], 0, &mut buf).unwrap(), 10);
    assert_eq!(&buf, b"still here");
}

#[test]
fn remount_preserves_contents() {
    let cfg = scenario_config();
    let mut fs = DumbFs::format(device(64), cfg).unwrap();
    let a = fs.create(b"a").unwrap();
    fs.write(a, 0, b"hello").unwrap();
    fs.truncate(a, 5).unwrap();

    let b = fs.create(b"b").unwrap();
    let payload: Vec<u8> = (0..20u8).collect();
    fs.write(b, 4090, &payload).unwrap();
    fs.truncate(b, 4110).unwrap();

    let flash = fs.into_flash();
    let remounted = DumbFs::mount(flash, cfg).unwrap();
    let inode_count = remounted.superblock().inode_count;
    assert_eq!(inode_count, 3);

    let a2 = remounted.lookup(b"a").unwrap();
    let mut buf = [0u8; 5];
    assert_eq!(remounted.read(a2, 0, &mut buf).unwrap(), 5);
    assert_eq!(&buf, b"hello");

    let b2 = remounted.lookup(b"b").unwrap();
    let mut out = [0u8; 20];
    assert_eq!(remounted.read(b2, 4090, &mut out).unwrap(), 20);
    assert_eq!(out.to_vec(), payload);
}

#[test]
fn iterate_enumerates_every_created_file_exactly_once() {
    let cfg = scenario_config();
    let mut fs = DumbFs::format(device(64), cfg).unwrap();
    let names: Vec<&[u8]> = vec![b"one", b"two", b"three"];
    for n in &names {
        fs.create(n).unwrap();
    }

    let mut seen = Vec::new();
    let mut cursor = 0;
    while let Some((ino, entry)) = fs.iterate(cursor).unwrap() {
        seen.push(entry.name().to_vec());
        cursor = ino + 1;
    }
    assert_eq!(seen, names.iter().map(|n| n.to_vec()).collect::<Vec<_>>());
}
