//! # 文件描述符层
//!
//! 打开文件表是定长的槽数组，打开时取下标最小的空槽。

use alloc::{vec, vec::Vec};

use enumflags2::{BitFlags, bitflags};

use crate::{Error, Handle, InodeId};

#[rustfmt::skip]
#[allow(clippy::upper_case_acronyms)]
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenFlag {
    /// 只写
    WRONLY = 0b0000_0000_0001,
    /// 读写兼备
    RDWR   = 0b0000_0000_0010,
    /// 文件不存在时创建
    CREATE = 0b0010_0000_0000,
    /// 先清空文件，再交给用户
    TRUNC  = 0b0100_0000_0000,
}

impl OpenFlag {
    // enumflags2拒绝值为0的标志
    /// 只读
    pub const RDONLY: u32 = 0b0000_0000_0000;

    #[inline]
    pub fn read_only() -> BitFlags<OpenFlag> {
        BitFlags::from_bits_truncate(Self::RDONLY)
    }

    /// 返回 `[readable, writable]`：空集只读，含 `WRONLY` 只写，其余读写
    pub fn access(flags: BitFlags<OpenFlag>) -> [bool; 2] {
        if flags.is_empty() {
            [true, false]
        } else if flags.contains(OpenFlag::WRONLY) {
            [false, true]
        } else {
            [true, true]
        }
    }
}

/// 一个打开的文件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub inode: InodeId,
    pub offset: u64,
    pub readable: bool,
    pub writable: bool,
}

impl Descriptor {
    pub fn new(inode: InodeId, flags: BitFlags<OpenFlag>) -> Self {
        let [readable, writable] = OpenFlag::access(flags);
        Self {
            inode,
            offset: 0,
            readable,
            writable,
        }
    }
}

#[derive(Debug)]
pub struct FdTable(Vec<Option<Descriptor>>);

impl FdTable {
    pub fn new(capacity: usize) -> Self {
        Self(vec![None; capacity])
    }

    pub fn insert(&mut self, desc: Descriptor) -> Result<Handle, Error> {
        let Some(handle) = self.0.iter().position(Option::is_none) else {
            log::debug!("all {} descriptors are in use", self.0.len());
            return Err(Error::NoDescriptors);
        };
        self.0[handle] = Some(desc);

        Ok(handle)
    }

    pub fn get(&self, handle: Handle) -> Result<&Descriptor, Error> {
        self.0
            .get(handle)
            .and_then(Option::as_ref)
            .ok_or(Error::BadHandle)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut Descriptor, Error> {
        self.0
            .get_mut(handle)
            .and_then(Option::as_mut)
            .ok_or(Error::BadHandle)
    }

    pub fn remove(&mut self, handle: Handle) -> Result<Descriptor, Error> {
        self.0
            .get_mut(handle)
            .and_then(Option::take)
            .ok_or(Error::BadHandle)
    }

    /// 关闭所有指向 `inode` 的描述符
    pub fn close_inode(&mut self, inode: InodeId) {
        for slot in &mut self.0 {
            if slot.is_some_and(|desc| desc.inode == inode) {
                *slot = None;
            }
        }
    }

    pub fn clear(&mut self) {
        self.0.fill(None);
    }

    pub fn open_count(&self) -> usize {
        self.0.iter().flatten().count()
    }
}
