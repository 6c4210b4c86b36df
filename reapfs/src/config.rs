use crate::{Error, MAX_INODES, SECTOR_SIZE};

/// 挂载时发现超级块或根目录不合法时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryPolicy {
    /// 重新格式化，原有内容全部丢失
    #[default]
    AutoFormat,
    /// 报告 [`Error::Corrupted`]，不动设备
    Strict,
}

/// 挂载参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsConfig {
    /// 格式化时索引节点表的槽数；挂载已有文件系统时以超级块为准
    pub inode_capacity: u32,
    /// 打开文件表的容量
    pub max_descriptors: usize,
    /// 单个目录最多容纳的目录项数，包括根目录的`.`与`..`
    pub max_dir_entries: usize,
    /// 每次设备传输失败后的重试次数
    pub io_retries: usize,
    /// 单次设备传输最多的扇区数
    pub batch_sectors: usize,
    /// 格式化与区段搬迁时缓冲区的字节数
    pub relocation_chunk: usize,
    pub recovery: RecoveryPolicy,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            inode_capacity: 1024,
            max_descriptors: 16,
            max_dir_entries: 128,
            io_retries: 3,
            batch_sectors: 8,
            relocation_chunk: 4096,
            recovery: RecoveryPolicy::AutoFormat,
        }
    }
}

impl FsConfig {
    pub fn validate(&self) -> Result<(), Error> {
        let valid = (1..=MAX_INODES).contains(&self.inode_capacity)
            && self.max_descriptors > 0
            && self.max_dir_entries > 0
            && self.batch_sectors > 0
            && self.relocation_chunk >= SECTOR_SIZE;
        if !valid {
            log::error!("invalid config: {self:?}");
            return Err(Error::BadArgument);
        }

        Ok(())
    }
}
