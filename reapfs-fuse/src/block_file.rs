use std::cell::RefCell;
use std::fs::File;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};

use block_dev::{BlockDevice, DeviceError, SECTOR_SIZE};
use send_wrapper::SendWrapper;

/// 一次传输最多轮询的次数，超过即视作设备超时
const POLL_LIMIT: usize = 16;

/// 以宿主机上的镜像文件为介质的块设备
#[derive(Debug)]
pub struct BlockFile {
    inner: SendWrapper<RefCell<File>>,
    sectors: u64,
}

impl BlockFile {
    pub fn new(fd: File) -> io::Result<Self> {
        let sectors = fd.metadata()?.len() / SECTOR_SIZE as u64;
        Ok(Self {
            inner: SendWrapper::new(RefCell::new(fd)),
            sectors,
        })
    }

    fn check(&self, lba: u64, count: usize, len: usize) -> Result<u64, DeviceError> {
        if len != count * SECTOR_SIZE || lba + count as u64 > self.sectors {
            return Err(DeviceError::OutOfRange);
        }
        Ok(lba * SECTOR_SIZE as u64)
    }
}

/// 重复执行 `op`，直到它不再被打断
fn poll(mut op: impl FnMut() -> io::Result<()>) -> Result<(), DeviceError> {
    for _ in 0..POLL_LIMIT {
        match op() {
            Ok(()) => return Ok(()),
            Err(err) if matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => (),
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
                return Err(DeviceError::OutOfRange);
            }
            Err(err) => {
                log::error!("image file: {err}");
                return Err(DeviceError::Io);
            }
        }
    }

    Err(DeviceError::Timeout)
}

impl BlockDevice for BlockFile {
    fn read_sectors(&self, lba: u64, count: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        let pos = self.check(lba, count, buf.len())?;
        let mut file = self.inner.borrow_mut();
        poll(|| {
            file.seek(SeekFrom::Start(pos))?;
            file.read_exact(&mut *buf)
        })
    }

    fn write_sectors(&self, lba: u64, count: usize, buf: &[u8]) -> Result<(), DeviceError> {
        let pos = self.check(lba, count, buf.len())?;
        let mut file = self.inner.borrow_mut();
        poll(|| {
            file.seek(SeekFrom::Start(pos))?;
            file.write_all(buf)
        })
    }

    fn sector_count(&self) -> u64 {
        self.sectors
    }
}
