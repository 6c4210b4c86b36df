//! # 磁盘数据结构层
//!
//! reapfs 的磁盘布局，按字节偏移：
//! 超级块（扇区 0）| 索引节点表（扇区 1 起）| 数据区
//!
//! 数据区中每个索引节点至多占有一段连续区段，区段以 [`FileHeader`] 开头。

use core::{mem, ptr, slice};

mod super_block;
pub use super_block::SuperBlock;

mod inode;
pub use inode::{DiskInode, InodeKind};

mod dir_entry;
pub use dir_entry::DirEntry;

mod header;
pub use header::FileHeader;

/// 可以按字节原样落盘的记录
///
/// # Safety
///
/// 实现者必须是 `#[repr(C)]`、不含填充字节，且任意位模式都是合法值。
pub unsafe trait Record: Default {
    const SIZE: usize = mem::size_of::<Self>();

    #[inline]
    fn as_bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(ptr::from_ref(self).cast(), Self::SIZE) }
    }

    #[inline]
    fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(ptr::from_mut(self).cast(), Self::SIZE) }
    }

    /// 从 `bytes` 的前 [`Record::SIZE`] 字节解出记录
    fn from_bytes(bytes: &[u8]) -> Self {
        let mut record = Self::default();
        record.as_bytes_mut().copy_from_slice(&bytes[..Self::SIZE]);
        record
    }
}

/// 把 `name` 填进以 `\0` 结尾的定长名字字段，过长的部分截去
pub(crate) fn encode_name<const N: usize>(name: &str) -> [u8; N] {
    let bytes = name.as_bytes();
    let len = bytes.len().min(N - 1);
    let mut buf = [0; N];
    buf[..len].copy_from_slice(&bytes[..len]);
    buf
}

pub(crate) fn decode_name(name: &[u8]) -> &str {
    let len = name.iter().position(|&c| c == 0).unwrap_or(name.len());
    core::str::from_utf8(&name[..len]).unwrap_or_default()
}
