mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use block_dev::{BlockDevice, DeviceError, RamDisk, SECTOR_SIZE};
use common::{DISK_SECTORS, fresh, read_file, remount, small_config, write_file};
use reapfs::{Error, FileSystem, FsConfig, InodeId, RecoveryPolicy, SuperBlock};

fn strict() -> FsConfig {
    FsConfig {
        recovery: RecoveryPolicy::Strict,
        ..small_config()
    }
}

/// 每 `period` 次传输失败一次的盘
struct FlakyDisk {
    disk: RamDisk,
    period: usize,
    transfers: AtomicUsize,
}

impl FlakyDisk {
    fn new(period: usize) -> Self {
        Self {
            disk: RamDisk::new(DISK_SECTORS),
            period,
            transfers: AtomicUsize::new(0),
        }
    }

    fn tick(&self) -> Result<(), DeviceError> {
        let n = self.transfers.fetch_add(1, Ordering::Relaxed);
        if n % self.period == 0 {
            return Err(DeviceError::Timeout);
        }
        Ok(())
    }
}

impl BlockDevice for FlakyDisk {
    fn read_sectors(&self, lba: u64, count: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        self.tick()?;
        self.disk.read_sectors(lba, count, buf)
    }

    fn write_sectors(&self, lba: u64, count: usize, buf: &[u8]) -> Result<(), DeviceError> {
        self.tick()?;
        self.disk.write_sectors(lba, count, buf)
    }

    fn sector_count(&self) -> u64 {
        self.disk.sector_count()
    }
}

fn smash_super_block(disk: &RamDisk) {
    disk.write_sectors(0, 1, &[0xEE; SECTOR_SIZE]).unwrap();
}

/// 改写镜像中索引节点 `id` 的记录，从记录内偏移 `at` 处起
fn patch_record(disk: &RamDisk, id: InodeId, at: usize, bytes: &[u8]) -> Arc<RamDisk> {
    let mut image = disk.snapshot();
    let start = SuperBlock::record_offset(id) as usize + at;
    image[start..start + bytes.len()].copy_from_slice(bytes);
    Arc::new(RamDisk::from_image(image))
}

#[test]
fn blank_device_is_formatted() {
    let disk = Arc::new(RamDisk::new(DISK_SECTORS));
    let fs = FileSystem::mount(disk.clone(), small_config()).unwrap();
    assert_eq!(fs.inode_count(), 1);
    assert!(fs.list("/").unwrap().is_empty());
    assert_eq!(&disk.snapshot()[..4], &0x5241_5046_u32.to_ne_bytes());
}

#[test]
fn strict_refuses_blank_device() {
    let disk = Arc::new(RamDisk::new(DISK_SECTORS));
    assert!(matches!(
        FileSystem::mount(disk.clone(), strict()),
        Err(Error::Corrupted)
    ));
    assert!(disk.snapshot().iter().all(|&b| b == 0));
}

#[test]
fn tree_survives_remount() {
    let (disk, mut fs) = fresh();
    fs.mkdir("/etc").unwrap();
    fs.mkdir("/etc/conf.d").unwrap();
    write_file(&mut fs, "/etc/conf.d/net", b"dhcp=yes");
    fs.create("/etc/empty").unwrap();
    let dump = fs.debug_dump().unwrap();
    drop(fs);

    let mut fs = FileSystem::mount(disk.clone(), strict()).unwrap();
    assert_eq!(fs.debug_dump().unwrap(), dump);
    assert_eq!(read_file(&mut fs, "/etc/conf.d/net"), b"dhcp=yes");
    assert_eq!(fs.current_directory(), "/");
}

#[test]
fn removal_survives_remount() {
    let (disk, mut fs) = fresh();
    fs.mkdir("/a").unwrap();
    fs.create("/a/b").unwrap();
    fs.create("/c").unwrap();
    fs.remove("/a").unwrap();
    fs.rename("/c", "/d").unwrap();
    drop(fs);

    let fs = remount(&disk);
    assert_eq!(fs.inode_count(), 2);
    assert_eq!(fs.resolve("/a"), Err(Error::NotFound));
    assert!(fs.resolve("/d").is_ok());
}

#[test]
fn corrupt_super_block_reformats() {
    let (disk, mut fs) = fresh();
    fs.mkdir("/lost").unwrap();
    drop(fs);

    smash_super_block(&disk);
    let fs = remount(&disk);
    assert_eq!(fs.inode_count(), 1);
    assert_eq!(fs.resolve("/lost"), Err(Error::NotFound));
}

#[test]
fn corrupt_super_block_strict() {
    let (disk, mut fs) = fresh();
    fs.mkdir("/kept").unwrap();
    drop(fs);

    smash_super_block(&disk);
    let image = disk.snapshot();
    assert!(matches!(
        FileSystem::mount(disk.clone(), strict()),
        Err(Error::Corrupted)
    ));
    assert_eq!(disk.snapshot(), image);
}

#[test]
fn on_disk_capacity_wins() {
    let (disk, fs) = fresh();
    assert_eq!(fs.inode_table().capacity(), 64);
    drop(fs);

    let fs = FileSystem::mount(disk, FsConfig::default()).unwrap();
    assert_eq!(fs.inode_table().capacity(), 64);
}

#[test]
fn mkfs_wipes_existing_tree() {
    let (disk, mut fs) = fresh();
    fs.mkdir("/old").unwrap();
    drop(fs);

    let fs = FileSystem::mkfs(disk, small_config()).unwrap();
    assert_eq!(fs.inode_count(), 1);
    assert_eq!(fs.resolve("/old"), Err(Error::NotFound));
}

#[test]
fn device_too_small() {
    let disk = Arc::new(RamDisk::new(4));
    assert!(matches!(
        FileSystem::mount(disk, FsConfig::default()),
        Err(Error::NoSpace)
    ));
}

#[test]
fn invalid_config() {
    let disk = Arc::new(RamDisk::new(DISK_SECTORS));
    let config = FsConfig {
        max_descriptors: 0,
        ..small_config()
    };
    assert!(matches!(
        FileSystem::mount(disk, config),
        Err(Error::BadArgument)
    ));
}

#[test]
fn transient_failures_are_retried() {
    let disk = Arc::new(FlakyDisk::new(3));
    let mut fs = FileSystem::mount(disk.clone(), small_config()).unwrap();
    fs.mkdir("/x").unwrap();
    write_file(&mut fs, "/x/y", &common::pattern(3000, 5));
    assert_eq!(read_file(&mut fs, "/x/y"), common::pattern(3000, 5));
    assert!(disk.transfers.load(Ordering::Relaxed) > 0);
}

#[test]
fn persistent_failures_are_io_errors() {
    // 每次传输都失败
    let disk = Arc::new(FlakyDisk::new(1));
    assert!(matches!(
        FileSystem::mount(disk, small_config()),
        Err(Error::Io)
    ));
}

#[test]
fn garbage_record_is_corrupted() {
    let (disk, mut fs) = fresh();
    let id = fs.create("/f").unwrap();
    drop(fs);

    // 区段起点 u64::MAX，长度 1024
    let mut extent = Vec::new();
    extent.extend_from_slice(&u64::MAX.to_ne_bytes());
    extent.extend_from_slice(&1024_u64.to_ne_bytes());
    let disk = patch_record(&disk, id, 16, &extent);
    assert!(matches!(
        FileSystem::mount(disk.clone(), strict()),
        Err(Error::Corrupted)
    ));

    let mut fs = remount(&disk);
    assert_eq!(fs.inode_count(), 1);
    write_file(&mut fs, "/new", b"fresh");
    assert_eq!(read_file(&mut fs, "/new"), b"fresh");
}

#[test]
fn record_with_unknown_kind_is_corrupted() {
    let (disk, mut fs) = fresh();
    let id = fs.mkdir("/d").unwrap();
    drop(fs);

    let disk = patch_record(&disk, id, 5, &[9]);
    assert!(matches!(
        FileSystem::mount(disk, strict()),
        Err(Error::Corrupted)
    ));
}

#[test]
fn size_beyond_extent_is_corrupted() {
    let (disk, mut fs) = fresh();
    write_file(&mut fs, "/f", b"tiny");
    let id = fs.resolve("/f").unwrap();
    drop(fs);

    let disk = patch_record(&disk, id, 12, &4096_u32.to_ne_bytes());
    assert!(matches!(
        FileSystem::mount(disk, strict()),
        Err(Error::Corrupted)
    ));
}

#[test]
fn misplaced_child_is_corrupted() {
    let (disk, mut fs) = fresh();
    fs.mkdir("/a").unwrap();
    let b = fs.mkdir("/b").unwrap();
    let f = fs.create("/a/f").unwrap();
    drop(fs);

    // 记录说父目录是 /b，目录项却在 /a 中
    let disk = patch_record(&disk, f, 8, &b.to_ne_bytes());
    let mut fs = FileSystem::mount(disk, strict()).unwrap();
    assert_eq!(fs.resolve("/a/f"), Err(Error::Corrupted));
    assert_eq!(fs.list("/a"), Err(Error::Corrupted));
    assert_eq!(fs.debug_dump(), Err(Error::Corrupted));
    assert_eq!(fs.remove("/a"), Err(Error::Corrupted));
    assert_eq!(fs.rename("/a/f", "/b/f"), Err(Error::Corrupted));
    assert!(fs.list("/b").unwrap().is_empty());
}
