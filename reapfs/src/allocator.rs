//! # 区段分配策略
//!
//! 每个索引节点至多占有一段连续区段。
//! 新区段放在哪里、旧区段能否原地扩展，由 [`ExtentAllocator`] 决定。

use crate::InodeTable;

pub trait ExtentAllocator: Send + Sync {
    /// 为长度为 `len` 的新区段挑选起始偏移
    fn place(&mut self, table: &InodeTable, data_start: u64, len: u64) -> u64;

    /// 起始于 `start`、长度为 `len` 的区段能否原地向后扩展
    fn can_grow(&self, table: &InodeTable, data_start: u64, start: u64, len: u64) -> bool;
}

/// 只向前推进的分配：新区段总放在所有已用区段之后
///
/// 前沿每次都扫描索引节点表重新计算，所以释放掉的区段只有在恰好位于末尾时才会被再次使用。
#[derive(Debug, Default, Clone, Copy)]
pub struct BumpAllocator;

impl BumpAllocator {
    /// 所有已用区段末尾的最大值，至少是数据区起点
    pub fn frontier(table: &InodeTable, data_start: u64) -> u64 {
        table
            .iter_used()
            .filter(|inode| inode.has_extent())
            .map(|inode| inode.extent_end())
            .fold(data_start, u64::max)
    }
}

impl ExtentAllocator for BumpAllocator {
    fn place(&mut self, table: &InodeTable, data_start: u64, _len: u64) -> u64 {
        Self::frontier(table, data_start)
    }

    fn can_grow(&self, table: &InodeTable, data_start: u64, start: u64, len: u64) -> bool {
        start + len == Self::frontier(table, data_start)
    }
}
