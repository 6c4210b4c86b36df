//! # 块设备接口层
//!
//! 块设备以**扇区**为单位存储数据；
//! [`BlockDevice`] 是对读写扇区的抽象，实现了此特质的类型称为**块设备驱动**。
//!
//! 与一次只搬运一个块的驱动不同，这里的接口一次可以读写连续的多个扇区，
//! 并把失败交还给调用者，由上层决定是否重试。

#![no_std]

extern crate alloc;

mod ram_disk;

use core::any::Any;

pub use ram_disk::RamDisk;

/// 扇区大小，设备上的数据总是以它的整数倍读写
pub const SECTOR_SIZE: usize = 512;

/// 块设备驱动报告的错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// 设备拒绝了本次传输
    Io,
    /// 轮询等待设备就绪超时
    Timeout,
    /// 访问超出设备末尾，或缓冲区长度与扇区数不符
    OutOfRange,
}

/// 块设备驱动特质
///
/// `buf` 的长度必须恰好是 `count * SECTOR_SIZE`。
pub trait BlockDevice: Send + Sync + Any {
    fn read_sectors(&self, lba: u64, count: usize, buf: &mut [u8]) -> Result<(), DeviceError>;

    fn write_sectors(&self, lba: u64, count: usize, buf: &[u8]) -> Result<(), DeviceError>;

    /// 设备的扇区总数
    fn sector_count(&self) -> u64;
}
