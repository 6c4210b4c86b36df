use super::{DiskInode, Record};
use crate::{MAGIC, MAX_INODES, SECTOR_SIZE, VERSION};

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 定位索引节点表与数据区
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[repr(C)]
pub struct SuperBlock {
    /// 魔数：用于校验文件系统合法性
    magic: u32,
    version: u32,
    /// 索引节点表的槽数
    pub inode_capacity: u32,
    /// 索引节点记录的字节数
    record_size: u32,
    /// 数据区起始的字节偏移，按扇区对齐
    pub data_start: u64,
}

unsafe impl Record for SuperBlock {}

impl SuperBlock {
    /// 索引节点表紧跟在超级块所在扇区之后
    pub const TABLE_START: u64 = SECTOR_SIZE as u64;

    pub fn new(inode_capacity: u32) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            inode_capacity,
            record_size: DiskInode::SIZE as u32,
            data_start: Self::data_start_for(inode_capacity),
        }
    }

    /// 容量为 `inode_capacity` 的索引节点表之后第一个对齐的字节偏移
    pub fn data_start_for(inode_capacity: u32) -> u64 {
        let table_end = Self::TABLE_START + inode_capacity as u64 * DiskInode::SIZE as u64;
        table_end.div_ceil(SECTOR_SIZE as u64) * SECTOR_SIZE as u64
    }

    /// 编号为 `id` 的索引节点记录所在的字节偏移
    #[inline]
    pub fn record_offset(id: u32) -> u64 {
        Self::TABLE_START + id as u64 * DiskInode::SIZE as u64
    }

    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
            && self.version == VERSION
            && self.record_size == DiskInode::SIZE as u32
            && (1..=MAX_INODES).contains(&self.inode_capacity)
            && self.data_start == Self::data_start_for(self.inode_capacity)
    }
}
