use super::{FileHeader, Record, decode_name, encode_name};
use crate::{InodeId, NAME_MAX_LEN};

/// 索引节点种类在磁盘上的取值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InodeKind {
    File = 1,
    Directory = 2,
}

impl From<InodeKind> for vfs::DirEntryType {
    fn from(kind: InodeKind) -> Self {
        match kind {
            InodeKind::File => Self::Regular,
            InodeKind::Directory => Self::Directory,
        }
    }
}

/// 索引节点表中的一条记录
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[repr(C)]
pub struct DiskInode {
    pub id: u32,
    used: u8,
    kind: u8,
    _pad: [u8; 2],
    /// 父目录编号，根目录为 `u32::MAX`
    parent: u32,
    /// 文件的声明大小，目录则为目录项所占字节数
    pub size: u32,
    /// 数据区段起始的字节偏移，0 表示尚未分配
    pub extent: u64,
    /// 数据区段的字节数，包含文件头
    pub extent_len: u64,
    // 最后一字节留给 \0
    name: [u8; NAME_MAX_LEN + 1],
    _reserved: u32,
}

unsafe impl Record for DiskInode {}

impl DiskInode {
    const NO_PARENT: u32 = u32::MAX;

    pub fn init(&mut self, id: InodeId, kind: InodeKind, name: &str, parent: Option<InodeId>) {
        *self = Self {
            id,
            used: 1,
            kind: kind as u8,
            parent: parent.unwrap_or(Self::NO_PARENT),
            name: encode_name(name),
            ..Self::default()
        };
    }

    #[inline]
    pub fn is_used(&self) -> bool {
        self.used != 0
    }

    pub fn kind(&self) -> Option<InodeKind> {
        match self.kind {
            1 => Some(InodeKind::File),
            2 => Some(InodeKind::Directory),
            _ => None,
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind() == Some(InodeKind::Directory)
    }

    #[inline]
    pub fn is_file(&self) -> bool {
        self.kind() == Some(InodeKind::File)
    }

    pub fn parent(&self) -> Option<InodeId> {
        (self.parent != Self::NO_PARENT).then_some(self.parent)
    }

    #[inline]
    pub fn set_parent(&mut self, parent: InodeId) {
        self.parent = parent;
    }

    pub fn name(&self) -> &str {
        decode_name(&self.name)
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = encode_name(name);
    }

    #[inline]
    pub fn has_extent(&self) -> bool {
        self.extent != 0
    }

    /// 区段末尾的字节偏移
    #[inline]
    pub fn extent_end(&self) -> u64 {
        self.extent.saturating_add(self.extent_len)
    }

    /// 区段能容纳的数据字节数，不含文件头
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.extent_len.saturating_sub(FileHeader::SIZE as u64)
    }
}
