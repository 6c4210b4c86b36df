use alloc::{vec, vec::Vec};

use spin::Mutex;

use crate::{BlockDevice, DeviceError, SECTOR_SIZE};

/// 以内存为介质的块设备
#[derive(Debug)]
pub struct RamDisk {
    data: Mutex<Vec<u8>>,
}

impl RamDisk {
    /// 创建一块全零、共 `sectors` 个扇区的盘
    pub fn new(sectors: u64) -> Self {
        Self {
            data: Mutex::new(vec![0; sectors as usize * SECTOR_SIZE]),
        }
    }

    /// 用现成的镜像创建盘，多余的不足一个扇区的尾部会被丢弃
    pub fn from_image(mut image: Vec<u8>) -> Self {
        image.truncate(image.len() / SECTOR_SIZE * SECTOR_SIZE);
        Self {
            data: Mutex::new(image),
        }
    }

    /// 盘上全部内容的拷贝
    pub fn snapshot(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    fn range(&self, lba: u64, count: usize, len: usize) -> Result<(usize, usize), DeviceError> {
        if len != count * SECTOR_SIZE {
            return Err(DeviceError::OutOfRange);
        }
        let start = usize::try_from(lba)
            .ok()
            .and_then(|lba| lba.checked_mul(SECTOR_SIZE))
            .ok_or(DeviceError::OutOfRange)?;
        let end = start + len;
        if end > self.data.lock().len() {
            return Err(DeviceError::OutOfRange);
        }

        Ok((start, end))
    }
}

impl BlockDevice for RamDisk {
    fn read_sectors(&self, lba: u64, count: usize, buf: &mut [u8]) -> Result<(), DeviceError> {
        let (start, end) = self.range(lba, count, buf.len())?;
        buf.copy_from_slice(&self.data.lock()[start..end]);
        Ok(())
    }

    fn write_sectors(&self, lba: u64, count: usize, buf: &[u8]) -> Result<(), DeviceError> {
        let (start, end) = self.range(lba, count, buf.len())?;
        self.data.lock()[start..end].copy_from_slice(buf);
        Ok(())
    }

    fn sector_count(&self) -> u64 {
        (self.data.lock().len() / SECTOR_SIZE) as u64
    }
}
