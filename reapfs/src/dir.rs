//! # 目录层
//!
//! 目录的内容是紧密排列的 [`DirEntry`] 数组，存放在目录自己的区段里；
//! 目录的声明大小就是目录项所占的字节数。

use alloc::{vec, vec::Vec};

use crate::{DirEntry, Error, FileSystem, InodeId, layout::Record};

impl FileSystem {
    pub(crate) fn dir_entries(&self, dir: InodeId) -> Result<Vec<DirEntry>, Error> {
        let inode = self.table.get(dir)?;
        if !inode.is_dir() {
            return Err(Error::NotADirectory);
        }

        let mut bytes = vec![0; inode.size as usize / DirEntry::SIZE * DirEntry::SIZE];
        let len = self.read_at(dir, 0, &mut bytes)?;

        Ok(bytes[..len]
            .chunks_exact(DirEntry::SIZE)
            .map(DirEntry::from_bytes)
            .collect())
    }

    /// 按名字（区分大小写）查找子项
    pub(crate) fn dir_lookup(&self, dir: InodeId, name: &str) -> Result<Option<InodeId>, Error> {
        Ok(self
            .dir_entries(dir)?
            .iter()
            .find(|entry| entry.name() == name)
            .map(DirEntry::inode_id))
    }

    /// 在目录末尾追加一项
    pub(crate) fn dir_add(&mut self, dir: InodeId, name: &str, child: InodeId) -> Result<(), Error> {
        let entries = self.dir_entries(dir)?;
        if entries.iter().any(|entry| entry.name() == name) {
            return Err(Error::AlreadyExists);
        }
        if entries.len() >= self.config.max_dir_entries {
            log::debug!("directory {dir} is full");
            return Err(Error::NoSpace);
        }

        let entry = DirEntry::new(name, child);
        let offset = (entries.len() * DirEntry::SIZE) as u64;
        self.write_at(dir, offset, entry.as_bytes())?;

        Ok(())
    }

    /// 原地改写一项的名字，项数不变
    pub(crate) fn dir_rename(&mut self, dir: InodeId, from: &str, to: &str) -> Result<(), Error> {
        let entries = self.dir_entries(dir)?;
        if entries.iter().any(|entry| entry.name() == to) {
            return Err(Error::AlreadyExists);
        }
        let pos = entries
            .iter()
            .position(|entry| entry.name() == from)
            .ok_or(Error::NotFound)?;

        let entry = DirEntry::new(to, entries[pos].inode_id());
        self.write_at(dir, (pos * DirEntry::SIZE) as u64, entry.as_bytes())?;

        Ok(())
    }

    /// 除`.`与`..`外的目录项。
    ///
    /// 每个子项记录的父目录必须就是 `dir`，否则视为损坏；遍历因此不会绕圈。
    pub(crate) fn dir_children(&self, dir: InodeId) -> Result<Vec<DirEntry>, Error> {
        let mut children = self.dir_entries(dir)?;
        children.retain(|entry| !entry.is_relative());
        for entry in &children {
            self.check_child(dir, entry.inode_id())?;
        }

        Ok(children)
    }

    pub(crate) fn check_child(&self, dir: InodeId, child: InodeId) -> Result<(), Error> {
        let parent = self.table.get(child).ok().and_then(|inode| inode.parent());
        if parent != Some(dir) {
            log::error!("inode {child} listed in directory {dir} but its parent is {parent:?}");
            return Err(Error::Corrupted);
        }
        Ok(())
    }

    /// 删去名为 `name` 的项，其后的项依次前移。返回被删项指向的索引节点。
    ///
    /// 删空的目录会脱离它的区段。
    pub(crate) fn dir_remove(&mut self, dir: InodeId, name: &str) -> Result<InodeId, Error> {
        let mut entries = self.dir_entries(dir)?;
        let pos = entries
            .iter()
            .position(|entry| entry.name() == name)
            .ok_or(Error::NotFound)?;
        let removed = entries.remove(pos);

        if entries.is_empty() {
            let inode = self.table.get_mut(dir)?;
            inode.size = 0;
            inode.extent = 0;
            inode.extent_len = 0;
            self.persist_inode(dir)?;
            return Ok(removed.inode_id());
        }

        let tail: Vec<u8> = entries[pos..]
            .iter()
            .flat_map(|entry| entry.as_bytes().iter().copied())
            .collect();
        let offset = (pos * DirEntry::SIZE) as u64;
        self.table.get_mut(dir)?.size = offset as u32;
        if tail.is_empty() {
            self.sync_size(dir)?;
        } else {
            self.write_at(dir, offset, &tail)?;
        }

        Ok(removed.inode_id())
    }
}
