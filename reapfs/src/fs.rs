//! # 文件系统管理器
//!
//! [`FileSystem`] 持有块存储、超级块、索引节点表、打开文件表和当前工作目录，
//! 是所有操作的上下文。它负责挂载、格式化，以及把内存中的元数据写回设备。

use alloc::{
    boxed::Box,
    string::String,
    sync::Arc,
    vec::Vec,
};

use block_dev::BlockDevice;

use crate::{
    BlockStore, BumpAllocator, Error, ExtentAllocator, FsConfig, InodeId, InodeKind, InodeTable,
    ROOT_ID, RecoveryPolicy, SECTOR_SIZE,
    fd::FdTable,
    layout::{DiskInode, Record, SuperBlock},
};

pub struct FileSystem {
    pub(crate) store: BlockStore,
    pub(crate) super_block: SuperBlock,
    pub(crate) table: InodeTable,
    pub(crate) allocator: Box<dyn ExtentAllocator>,
    pub(crate) fds: FdTable,
    pub(crate) cwd: String,
    pub(crate) config: FsConfig,
}

impl FileSystem {
    /// 挂载设备上的文件系统。
    ///
    /// 超级块或根目录不合法时，按 [`FsConfig::recovery`] 重新格式化或报错。
    pub fn mount(dev: Arc<dyn BlockDevice>, config: FsConfig) -> Result<Self, Error> {
        Self::mount_with(dev, config, Box::new(BumpAllocator))
    }

    pub fn mount_with(
        dev: Arc<dyn BlockDevice>,
        config: FsConfig,
        allocator: Box<dyn ExtentAllocator>,
    ) -> Result<Self, Error> {
        let mut fs = Self::assemble(dev, config, allocator)?;

        match fs.load() {
            Ok(()) => {
                log::info!(
                    "mounted reapfs: {} inodes, {} in use",
                    fs.table.capacity(),
                    fs.table.used_count()
                );
                Ok(fs)
            }
            Err(Error::Corrupted) if fs.config.recovery == RecoveryPolicy::AutoFormat => {
                log::warn!("no valid reapfs found, formatting");
                fs.format()?;
                Ok(fs)
            }
            Err(err) => Err(err),
        }
    }

    /// 不论设备上原有什么，直接格式化
    pub fn mkfs(dev: Arc<dyn BlockDevice>, config: FsConfig) -> Result<Self, Error> {
        let mut fs = Self::assemble(dev, config, Box::new(BumpAllocator))?;
        fs.format()?;
        Ok(fs)
    }

    fn assemble(
        dev: Arc<dyn BlockDevice>,
        config: FsConfig,
        allocator: Box<dyn ExtentAllocator>,
    ) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            store: BlockStore::new(dev, config.io_retries, config.batch_sectors),
            super_block: SuperBlock::new(config.inode_capacity),
            table: InodeTable::new(config.inode_capacity),
            allocator,
            fds: FdTable::new(config.max_descriptors),
            cwd: String::from("/"),
            config,
        })
    }

    fn load(&mut self) -> Result<(), Error> {
        if self.store.capacity() < SECTOR_SIZE as u64 {
            return Err(Error::NoSpace);
        }

        let mut sector = [0; SECTOR_SIZE];
        self.store.read(0, &mut sector)?;
        let super_block = SuperBlock::from_bytes(&sector);
        if !super_block.is_valid() || super_block.data_start > self.store.capacity() {
            log::debug!("bad super block: {super_block:?}");
            return Err(Error::Corrupted);
        }

        let table_len = super_block.inode_capacity as usize * DiskInode::SIZE;
        let mut bytes = Vec::with_capacity(table_len);
        let mut chunk = Vec::new();
        let mut offset = SuperBlock::TABLE_START;
        while bytes.len() < table_len {
            chunk.resize(self.table_chunk().min(table_len - bytes.len()), 0);
            self.store.read(offset, &mut chunk)?;
            bytes.extend_from_slice(&chunk);
            offset += chunk.len() as u64;
        }
        let table = InodeTable::from_bytes(&bytes);

        match table.get(ROOT_ID) {
            Ok(root) if root.is_dir() => (),
            _ => {
                log::debug!("root directory is missing");
                return Err(Error::Corrupted);
            }
        }
        table.check(super_block.data_start, self.store.capacity())?;

        self.super_block = super_block;
        self.table = table;
        self.fds.clear();
        self.cwd = String::from("/");

        Ok(())
    }

    /// 写入新的超级块和空索引节点表，再建立只含`.`与`..`的根目录
    pub fn format(&mut self) -> Result<(), Error> {
        let super_block = SuperBlock::new(self.config.inode_capacity);
        if super_block.data_start + SECTOR_SIZE as u64 > self.store.capacity() {
            log::error!(
                "device of {} bytes is too small for {} inodes",
                self.store.capacity(),
                self.config.inode_capacity
            );
            return Err(Error::NoSpace);
        }

        self.super_block = super_block;
        self.table = InodeTable::new(self.config.inode_capacity);
        self.fds.clear();
        self.cwd = String::from("/");

        let root = self.table.allocate(InodeKind::Directory, "/", None)?;
        debug_assert_eq!(root, ROOT_ID);
        self.persist_all()?;

        self.dir_add(ROOT_ID, ".", ROOT_ID)?;
        self.dir_add(ROOT_ID, "..", ROOT_ID)?;

        log::info!(
            "formatted reapfs: {} inodes, data from {:#x}",
            self.table.capacity(),
            self.super_block.data_start
        );

        Ok(())
    }

    /// 写回超级块和整张索引节点表
    pub(crate) fn persist_all(&self) -> Result<(), Error> {
        self.write_super_block()?;

        let mut chunk = Vec::with_capacity(self.table_chunk());
        let mut offset = SuperBlock::TABLE_START;
        for records in self.table.slots().chunks(self.table_chunk() / DiskInode::SIZE) {
            chunk.clear();
            for inode in records {
                chunk.extend_from_slice(inode.as_bytes());
            }
            self.store.write(offset, &chunk)?;
            offset += chunk.len() as u64;
        }

        Ok(())
    }

    /// 写回超级块和单条索引节点记录
    pub(crate) fn persist_inode(&self, id: InodeId) -> Result<(), Error> {
        self.write_super_block()?;

        let record = self
            .table
            .slots()
            .get(id as usize)
            .ok_or(Error::BadHandle)?;
        self.store.write(SuperBlock::record_offset(id), record.as_bytes())
    }

    fn write_super_block(&self) -> Result<(), Error> {
        let mut sector = [0; SECTOR_SIZE];
        sector[..SuperBlock::SIZE].copy_from_slice(self.super_block.as_bytes());
        self.store.write(0, &sector)
    }

    /// 一次搬运的索引节点表字节数，至少一条记录
    fn table_chunk(&self) -> usize {
        (self.config.relocation_chunk / DiskInode::SIZE).max(1) * DiskInode::SIZE
    }

    #[inline]
    pub(crate) fn data_start(&self) -> u64 {
        self.super_block.data_start
    }

    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    pub fn inode_table(&self) -> &InodeTable {
        &self.table
    }

    /// 正在使用的索引节点数
    pub fn inode_count(&self) -> usize {
        self.table.used_count()
    }

    pub fn open_count(&self) -> usize {
        self.fds.open_count()
    }

    pub fn current_directory(&self) -> &str {
        &self.cwd
    }
}
