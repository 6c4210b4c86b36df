use super::{Record, decode_name, encode_name};
use crate::{InodeId, NAME_MAX_LEN};

/// 目录文件中的一项
#[derive(Debug, Default, Clone)]
#[repr(C)]
pub struct DirEntry {
    // 最后一字节留给 \0
    name: [u8; NAME_MAX_LEN + 1],
    inode_id: u32,
}

unsafe impl Record for DirEntry {}

impl DirEntry {
    #[inline]
    pub fn new(name: &str, inode_id: InodeId) -> Self {
        Self {
            name: encode_name(name),
            inode_id,
        }
    }

    pub fn name(&self) -> &str {
        decode_name(&self.name)
    }

    #[inline]
    pub fn inode_id(&self) -> InodeId {
        self.inode_id
    }

    /// 是否为 `.` 或 `..`
    pub fn is_relative(&self) -> bool {
        matches!(self.name(), "." | "..")
    }
}
