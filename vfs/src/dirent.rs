use alloc::string::String;

/// 目录列举时交给调用者的目录项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Inode number
    pub inode: u64,
    pub ty: DirEntryType,
    pub name: String,
    /// 文件的声明大小，目录则为其目录项所占字节数
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DirEntryType {
    Directory,
    #[default]
    Regular,
}

impl DirEntryType {
    pub fn is_dir(self) -> bool {
        self == Self::Directory
    }
}
