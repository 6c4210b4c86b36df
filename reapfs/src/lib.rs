#![no_std]

extern crate alloc;

/* reapfs 的整体架构，自上而下 */

// 文件系统层：路径操作、打开的文件、挂载与格式化
mod fs;
mod ops;
pub use fs::FileSystem;

// 配置
mod config;
pub use config::{FsConfig, RecoveryPolicy};

// 文件描述符层：固定容量的打开文件表
mod fd;
pub use fd::{Descriptor, OpenFlag};

// 路径解析
mod path;
pub use path::{Path, validate_name};

// 目录层：目录文件中的目录项
mod dir;

// 数据区层：每个索引节点一段连续区段
mod extent;
mod allocator;
pub use allocator::{BumpAllocator, ExtentAllocator};

// 索引节点表
mod table;
pub use table::InodeTable;

// 磁盘数据结构层
mod layout;
pub use layout::{DirEntry, DiskInode, FileHeader, InodeKind, SuperBlock};

// 块存储层：字节粒度的读写，底下是扇区粒度的块设备
mod block_store;
pub use block_store::BlockStore;

pub use block_dev::SECTOR_SIZE;
pub use vfs::Error;

pub const MAGIC: u32 = 0x5241_5046;
pub const VERSION: u32 = 1;
/// 每个数据区段开头文件头的魔数
pub const HEADER_MAGIC: u32 = 0x4649_4C45;
/// 名字的最大字节数，磁盘上还要再留一字节给 `\0`
pub const NAME_MAX_LEN: usize = 27;
/// 索引节点表容量的上限
pub const MAX_INODES: u32 = 65536;
pub const ROOT_ID: InodeId = 0;

/// 索引节点编号，即它在索引节点表中的下标
pub type InodeId = u32;
/// 打开文件表中的下标
pub type Handle = usize;
