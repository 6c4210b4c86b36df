//! # 索引节点表
//!
//! 固定容量的 [`DiskInode`] 数组，常驻内存，编号即下标。
//! 分配时取编号最小的空闲槽。

use alloc::vec::Vec;

use crate::layout::{DiskInode, InodeKind, Record};
use crate::{Error, InodeId, ROOT_ID};

#[derive(Debug, Clone)]
pub struct InodeTable {
    slots: Vec<DiskInode>,
}

impl InodeTable {
    /// 全部槽都空闲的表
    pub fn new(capacity: u32) -> Self {
        Self {
            slots: (0..capacity).map(|_| DiskInode::default()).collect(),
        }
    }

    /// 从连续的记录字节中恢复
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            slots: bytes
                .chunks_exact(DiskInode::SIZE)
                .map(DiskInode::from_bytes)
                .collect(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    pub fn allocate(
        &mut self,
        kind: InodeKind,
        name: &str,
        parent: Option<InodeId>,
    ) -> Result<InodeId, Error> {
        let Some(id) = self.slots.iter().position(|slot| !slot.is_used()) else {
            log::debug!("inode table is full");
            return Err(Error::NoSpace);
        };
        let id = id as InodeId;
        self.slots[id as usize].init(id, kind, name, parent);

        Ok(id)
    }

    pub fn free(&mut self, id: InodeId) -> Result<(), Error> {
        *self.get_mut(id)? = DiskInode::default();
        Ok(())
    }

    /// 正在使用的编号为 `id` 的索引节点
    pub fn get(&self, id: InodeId) -> Result<&DiskInode, Error> {
        self.slots
            .get(id as usize)
            .filter(|inode| inode.is_used())
            .ok_or(Error::BadHandle)
    }

    pub fn get_mut(&mut self, id: InodeId) -> Result<&mut DiskInode, Error> {
        self.slots
            .get_mut(id as usize)
            .filter(|inode| inode.is_used())
            .ok_or(Error::BadHandle)
    }

    pub fn iter_used(&self) -> impl Iterator<Item = &DiskInode> {
        self.slots.iter().filter(|inode| inode.is_used())
    }

    pub fn used_count(&self) -> usize {
        self.iter_used().count()
    }

    /// 检查每条在用记录是否自洽：
    /// 种类已知，区段落在 `[data_start, end)` 内且装得下声明大小，父目录是在用的目录。
    /// 只有根目录没有父目录。
    pub fn check(&self, data_start: u64, end: u64) -> Result<(), Error> {
        for (id, inode) in self.slots.iter().enumerate() {
            if !inode.is_used() {
                continue;
            }

            let extent_ok = !inode.has_extent()
                || (inode.extent >= data_start
                    && inode.extent.checked_add(inode.extent_len).is_some_and(|e| e <= end));
            let parent_ok = match inode.parent() {
                None => id as InodeId == ROOT_ID,
                Some(parent) => {
                    parent as usize != id && self.get(parent).is_ok_and(DiskInode::is_dir)
                }
            };
            if inode.id as usize != id
                || inode.kind().is_none()
                || !extent_ok
                || inode.size as u64 > inode.capacity()
                || !parent_ok
            {
                log::debug!("bad inode record {id}: {inode:?}");
                return Err(Error::Corrupted);
            }
        }

        Ok(())
    }

    /// 全部槽，包括空闲的
    #[inline]
    pub fn slots(&self) -> &[DiskInode] {
        &self.slots
    }
}
