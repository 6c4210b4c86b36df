#![allow(dead_code)]

use std::sync::Arc;

use block_dev::RamDisk;
use reapfs::{FileSystem, FsConfig, OpenFlag};

/// 1 MiB
pub const DISK_SECTORS: u64 = 2048;

pub fn small_config() -> FsConfig {
    FsConfig {
        inode_capacity: 64,
        ..FsConfig::default()
    }
}

pub fn fresh() -> (Arc<RamDisk>, FileSystem) {
    let disk = Arc::new(RamDisk::new(DISK_SECTORS));
    let fs = FileSystem::mount(disk.clone(), small_config()).unwrap();
    (disk, fs)
}

pub fn remount(disk: &Arc<RamDisk>) -> FileSystem {
    FileSystem::mount(disk.clone(), small_config()).unwrap()
}

pub fn write_file(fs: &mut FileSystem, path: &str, data: &[u8]) {
    let fd = fs
        .open(path, OpenFlag::CREATE | OpenFlag::TRUNC | OpenFlag::WRONLY)
        .unwrap();
    assert_eq!(fs.write(fd, data).unwrap(), data.len());
    fs.close(fd).unwrap();
}

pub fn read_file(fs: &mut FileSystem, path: &str) -> Vec<u8> {
    let fd = fs.open(path, OpenFlag::read_only()).unwrap();
    let mut data = Vec::new();
    let mut buf = [0; 700];
    loop {
        let len = fs.read(fd, &mut buf).unwrap();
        if len == 0 {
            break;
        }
        data.extend_from_slice(&buf[..len]);
    }
    fs.close(fd).unwrap();
    data
}

/// 可辨认的字节序列
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}
