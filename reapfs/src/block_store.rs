//! # 块存储层
//!
//! 把扇区粒度的 [`BlockDevice`] 包装成字节粒度的读写：
//! 不对齐的首尾扇区先读出再合并写回，中间整扇区部分按批直接传输。
//! 每次设备传输失败后重试有限次，仍失败则报告 [`Error::Io`]。

use alloc::sync::Arc;

use block_dev::{BlockDevice, DeviceError, SECTOR_SIZE};

use crate::Error;

pub struct BlockStore {
    dev: Arc<dyn BlockDevice>,
    retries: usize,
    batch_sectors: usize,
}

impl BlockStore {
    pub fn new(dev: Arc<dyn BlockDevice>, retries: usize, batch_sectors: usize) -> Self {
        Self {
            dev,
            retries,
            batch_sectors: batch_sectors.max(1),
        }
    }

    /// 设备的字节容量
    pub fn capacity(&self) -> u64 {
        self.dev.sector_count() * SECTOR_SIZE as u64
    }

    pub fn read(&self, offset: u64, buf: &mut [u8]) -> Result<(), Error> {
        if buf.is_empty() {
            return Ok(());
        }
        self.check_range(offset, buf.len())?;

        let mut done = 0;
        let head = (offset % SECTOR_SIZE as u64) as usize;
        if head != 0 || buf.len() < SECTOR_SIZE {
            let mut sector = [0; SECTOR_SIZE];
            self.read_sectors(offset / SECTOR_SIZE as u64, &mut sector)?;
            done = (SECTOR_SIZE - head).min(buf.len());
            buf[..done].copy_from_slice(&sector[head..head + done]);
        }

        let whole = (buf.len() - done) / SECTOR_SIZE * SECTOR_SIZE;
        if whole != 0 {
            let lba = (offset + done as u64) / SECTOR_SIZE as u64;
            self.read_sectors(lba, &mut buf[done..done + whole])?;
            done += whole;
        }

        if done < buf.len() {
            let mut sector = [0; SECTOR_SIZE];
            self.read_sectors((offset + done as u64) / SECTOR_SIZE as u64, &mut sector)?;
            let rest = buf.len() - done;
            buf[done..].copy_from_slice(&sector[..rest]);
        }

        Ok(())
    }

    pub fn write(&self, offset: u64, data: &[u8]) -> Result<(), Error> {
        if data.is_empty() {
            return Ok(());
        }
        self.check_range(offset, data.len())?;

        let mut done = 0;
        let head = (offset % SECTOR_SIZE as u64) as usize;
        if head != 0 || data.len() < SECTOR_SIZE {
            let lba = offset / SECTOR_SIZE as u64;
            let mut sector = [0; SECTOR_SIZE];
            self.read_sectors(lba, &mut sector)?;
            done = (SECTOR_SIZE - head).min(data.len());
            sector[head..head + done].copy_from_slice(&data[..done]);
            self.write_sectors(lba, &sector)?;
        }

        let whole = (data.len() - done) / SECTOR_SIZE * SECTOR_SIZE;
        if whole != 0 {
            let lba = (offset + done as u64) / SECTOR_SIZE as u64;
            self.write_sectors(lba, &data[done..done + whole])?;
            done += whole;
        }

        if done < data.len() {
            let lba = (offset + done as u64) / SECTOR_SIZE as u64;
            let mut sector = [0; SECTOR_SIZE];
            self.read_sectors(lba, &mut sector)?;
            let rest = data.len() - done;
            sector[..rest].copy_from_slice(&data[done..]);
            self.write_sectors(lba, &sector)?;
        }

        Ok(())
    }

    fn check_range(&self, offset: u64, len: usize) -> Result<(), Error> {
        match offset.checked_add(len as u64) {
            Some(end) if end <= self.capacity() => Ok(()),
            _ => {
                log::debug!("access {offset:#x}+{len:#x} beyond device end");
                Err(Error::NoSpace)
            }
        }
    }

    /// `buf` 必须是整扇区
    fn read_sectors(&self, lba: u64, buf: &mut [u8]) -> Result<(), Error> {
        let batch = self.batch_sectors * SECTOR_SIZE;
        for (i, chunk) in buf.chunks_mut(batch).enumerate() {
            let lba = lba + (i * self.batch_sectors) as u64;
            let count = chunk.len() / SECTOR_SIZE;
            self.transfer(lba, || self.dev.read_sectors(lba, count, &mut *chunk))?;
        }

        Ok(())
    }

    /// `buf` 必须是整扇区
    fn write_sectors(&self, lba: u64, buf: &[u8]) -> Result<(), Error> {
        let batch = self.batch_sectors * SECTOR_SIZE;
        for (i, chunk) in buf.chunks(batch).enumerate() {
            let lba = lba + (i * self.batch_sectors) as u64;
            let count = chunk.len() / SECTOR_SIZE;
            self.transfer(lba, || self.dev.write_sectors(lba, count, chunk))?;
        }

        Ok(())
    }

    fn transfer(
        &self,
        lba: u64,
        mut op: impl FnMut() -> Result<(), DeviceError>,
    ) -> Result<(), Error> {
        let mut attempt = 0;
        loop {
            match op() {
                Ok(()) => return Ok(()),
                Err(DeviceError::OutOfRange) => {
                    log::error!("sector {lba} is out of range");
                    return Err(Error::Io);
                }
                Err(err) if attempt < self.retries => {
                    attempt += 1;
                    log::warn!("sector {lba}: {err:?}, retry {attempt}/{}", self.retries);
                }
                Err(err) => {
                    log::error!("sector {lba}: {err:?} after {attempt} retries");
                    return Err(Error::Io);
                }
            }
        }
    }
}
