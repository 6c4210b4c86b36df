mod common;

use std::sync::Arc;

use block_dev::RamDisk;
use common::{fresh, pattern, read_file, remount, write_file};
use reapfs::{Error, FileSystem, FsConfig, OpenFlag};

#[test]
fn write_then_read() {
    let (_, mut fs) = fresh();
    write_file(&mut fs, "/hello.txt", b"hello, reapfs");
    assert_eq!(read_file(&mut fs, "/hello.txt"), b"hello, reapfs");
    assert_eq!(fs.stat("/hello.txt").unwrap().size, 13);
}

#[test]
fn sequential_writes_append() {
    let (_, mut fs) = fresh();
    let fd = fs.open("/log", OpenFlag::CREATE | OpenFlag::RDWR).unwrap();
    fs.write(fd, b"one ").unwrap();
    fs.write(fd, b"two ").unwrap();
    fs.write(fd, b"three").unwrap();
    fs.close(fd).unwrap();

    assert_eq!(read_file(&mut fs, "/log"), b"one two three");
}

#[test]
fn reads_stop_at_end_of_file() {
    let (_, mut fs) = fresh();
    write_file(&mut fs, "/short", b"abc");

    let fd = fs.open("/short", OpenFlag::read_only()).unwrap();
    let mut buf = [0; 16];
    assert_eq!(fs.read(fd, &mut buf), Ok(3));
    assert_eq!(&buf[..3], b"abc");
    assert_eq!(fs.read(fd, &mut buf), Ok(0));
    fs.close(fd).unwrap();

    fs.create("/empty").unwrap();
    assert!(read_file(&mut fs, "/empty").is_empty());
}

#[test]
fn open_flags() {
    let (_, mut fs) = fresh();
    assert_eq!(fs.open("/nope", OpenFlag::read_only()), Err(Error::NotFound));

    fs.mkdir("/dir").unwrap();
    assert_eq!(fs.open("/dir", OpenFlag::read_only()), Err(Error::IsADirectory));

    write_file(&mut fs, "/f", b"0123456789");
    let fd = fs.open("/f", OpenFlag::WRONLY.into()).unwrap();
    let mut buf = [0; 4];
    assert_eq!(fs.read(fd, &mut buf), Err(Error::BadHandle));
    fs.write(fd, b"ab").unwrap();
    fs.close(fd).unwrap();
    assert_eq!(read_file(&mut fs, "/f"), b"ab23456789");

    let fd = fs.open("/f", OpenFlag::read_only()).unwrap();
    assert_eq!(fs.write(fd, b"x"), Err(Error::BadHandle));
    fs.close(fd).unwrap();

    let fd = fs.open("/f", OpenFlag::TRUNC | OpenFlag::WRONLY).unwrap();
    fs.close(fd).unwrap();
    assert_eq!(fs.stat("/f").unwrap().size, 0);
}

#[test]
fn handles() {
    let (_, mut fs) = fresh();
    fs.create("/f").unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| fs.open("/f", OpenFlag::read_only()).unwrap())
        .collect();
    assert_eq!(handles, (0..16).collect::<Vec<_>>());
    assert_eq!(fs.open("/f", OpenFlag::read_only()), Err(Error::NoDescriptors));

    fs.close(5).unwrap();
    assert_eq!(fs.close(5), Err(Error::BadHandle));
    assert_eq!(fs.open("/f", OpenFlag::read_only()), Ok(5));

    let mut buf = [0; 1];
    assert_eq!(fs.read(99, &mut buf), Err(Error::BadHandle));
}

#[test]
fn remove_closes_descriptors() {
    let (_, mut fs) = fresh();
    fs.mkdir("/d").unwrap();
    write_file(&mut fs, "/d/f", b"data");
    let fd = fs.open("/d/f", OpenFlag::read_only()).unwrap();
    assert_eq!(fs.open_count(), 1);

    fs.remove("/d").unwrap();
    assert_eq!(fs.open_count(), 0);
    let mut buf = [0; 4];
    assert_eq!(fs.read(fd, &mut buf), Err(Error::BadHandle));
}

#[test]
fn growth_relocates_blocked_extents() {
    let (_, mut fs) = fresh();
    write_file(&mut fs, "/a", &pattern(100, 1));
    write_file(&mut fs, "/b", &pattern(100, 2));
    let a = fs.resolve("/a").unwrap();
    let b = fs.resolve("/b").unwrap();
    let a_start = fs.inode_table().get(a).unwrap().extent;
    let b_end = fs.inode_table().get(b).unwrap().extent_end();

    // a 被 b 挡住，只能搬到前沿
    let fd = fs.open("/a", OpenFlag::RDWR.into()).unwrap();
    let mut skip = [0; 100];
    fs.read(fd, &mut skip).unwrap();
    fs.write(fd, &pattern(1000, 3)).unwrap();
    fs.close(fd).unwrap();

    let moved = fs.inode_table().get(a).unwrap().clone();
    assert_ne!(moved.extent, a_start);
    assert_eq!(moved.extent, b_end);
    assert!(moved.extent_len >= 1100 + 16);

    let mut expected = pattern(100, 1);
    expected.extend(pattern(1000, 3));
    assert_eq!(read_file(&mut fs, "/a"), expected);
    assert_eq!(read_file(&mut fs, "/b"), pattern(100, 2));

    // a 现在位于前沿，继续增长时原地扩张
    let fd = fs.open("/a", OpenFlag::RDWR.into()).unwrap();
    let mut skip = vec![0; 1100];
    fs.read(fd, &mut skip).unwrap();
    fs.write(fd, &pattern(5000, 4)).unwrap();
    fs.close(fd).unwrap();

    let grown = fs.inode_table().get(a).unwrap();
    assert_eq!(grown.extent, moved.extent);
    assert!(grown.extent_len > moved.extent_len);
    expected.extend(pattern(5000, 4));
    assert_eq!(read_file(&mut fs, "/a"), expected);
    assert_eq!(read_file(&mut fs, "/b"), pattern(100, 2));
}

#[test]
fn capacity_doubles() {
    let (_, mut fs) = fresh();
    let fd = fs.open("/f", OpenFlag::CREATE | OpenFlag::WRONLY).unwrap();
    fs.write(fd, &[1; 100]).unwrap();
    assert_eq!(fs.stat("/f").unwrap().capacity, 496);
    fs.write(fd, &[1; 400]).unwrap();
    // max(500, 2 * 496) 向上取整到扇区
    assert_eq!(fs.stat("/f").unwrap().capacity, 1008);
    fs.close(fd).unwrap();
}

#[test]
fn device_end_is_no_space() {
    // 8 个索引节点：数据区从 1024 开始，根目录占去一个扇区
    let disk = Arc::new(RamDisk::new(8));
    let config = FsConfig {
        inode_capacity: 8,
        ..FsConfig::default()
    };
    let mut fs = FileSystem::mount(disk, config).unwrap();

    let fd = fs.open("/big", OpenFlag::CREATE | OpenFlag::WRONLY).unwrap();
    assert_eq!(fs.write(fd, &[0; 4000]), Err(Error::NoSpace));
    assert_eq!(fs.write(fd, &[0; 2000]), Ok(2000));
    assert_eq!(fs.stat("/big").unwrap().size, 2000);
}

#[test]
fn large_file_survives_remount() {
    let (disk, mut fs) = fresh();
    let data = pattern(100_000, 9);
    fs.mkdir("/var").unwrap();
    write_file(&mut fs, "/var/blob", &data);
    write_file(&mut fs, "/small", b"tiny");
    drop(fs);

    let mut fs = remount(&disk);
    assert_eq!(read_file(&mut fs, "/var/blob"), data);
    assert_eq!(read_file(&mut fs, "/small"), b"tiny");
    assert_eq!(fs.inode_count(), 4);
}
