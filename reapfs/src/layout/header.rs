use super::Record;
use crate::HEADER_MAGIC;

/// 数据区段开头的文件头
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[repr(C)]
pub struct FileHeader {
    magic: u32,
    _reserved: u32,
    pub size: u64,
}

unsafe impl Record for FileHeader {}

impl FileHeader {
    pub fn new(size: u64) -> Self {
        Self {
            magic: HEADER_MAGIC,
            _reserved: 0,
            size,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == HEADER_MAGIC
    }
}
