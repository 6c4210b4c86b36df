//! # 数据区层
//!
//! 索引节点的内容存放在一段连续区段中：文件头之后紧跟数据。
//! 写入越过容量时区段扩张到 `max(所需, 2 × 旧容量)`：
//! 区段恰在前沿时原地扩张，否则整段搬到前沿。

use alloc::vec;

use crate::{Error, FileHeader, FileSystem, InodeId, SECTOR_SIZE, layout::Record};

/// 容纳 `size` 字节数据所需的区段长度，按扇区取整
fn extent_len_for(size: u64) -> u64 {
    let sector = SECTOR_SIZE as u64;
    ((FileHeader::SIZE as u64 + size).div_ceil(sector) * sector).max(sector)
}

impl FileSystem {
    /// 从 `offset` 读至多 `buf.len()` 字节，越过声明大小的部分不读
    pub(crate) fn read_at(&self, id: InodeId, offset: u64, buf: &mut [u8]) -> Result<usize, Error> {
        let inode = self.table.get(id)?;
        let size = inode.size as u64;
        if offset >= size || buf.is_empty() {
            return Ok(0);
        }
        if !inode.has_extent() || size > inode.capacity() {
            log::error!("inode {id} claims {size} bytes beyond its extent");
            return Err(Error::Io);
        }

        let mut header = FileHeader::default();
        self.store.read(inode.extent, header.as_bytes_mut())?;
        if !header.is_valid() {
            log::error!("inode {id}: bad file header at {:#x}", inode.extent);
            return Err(Error::Io);
        }

        let len = (size - offset).min(buf.len() as u64) as usize;
        self.store.read(
            inode.extent + FileHeader::SIZE as u64 + offset,
            &mut buf[..len],
        )?;

        Ok(len)
    }

    /// 在 `offset` 处写入 `data`，必要时分配或扩张区段。
    ///
    /// `offset` 不得越过声明大小，即不允许空洞。
    pub(crate) fn write_at(&mut self, id: InodeId, offset: u64, data: &[u8]) -> Result<usize, Error> {
        let size = self.table.get(id)?.size as u64;
        if offset > size {
            return Err(Error::BadArgument);
        }
        if data.is_empty() {
            return Ok(0);
        }
        let end = offset + data.len() as u64;
        if end > u32::MAX as u64 {
            return Err(Error::NoSpace);
        }

        self.ensure_extent(id, end)?;
        if end > self.table.get(id)?.capacity() {
            self.grow(id, end)?;
        }

        let extent = self.table.get(id)?.extent;
        self.store.write(extent + FileHeader::SIZE as u64 + offset, data)?;

        self.table.get_mut(id)?.size = size.max(end) as u32;
        self.sync_size(id)?;

        Ok(data.len())
    }

    /// 把声明大小归零，区段保留
    pub(crate) fn truncate(&mut self, id: InodeId) -> Result<(), Error> {
        self.table.get_mut(id)?.size = 0;
        self.sync_size(id)
    }

    /// 把内存中的大小写进文件头和索引节点记录
    pub(crate) fn sync_size(&mut self, id: InodeId) -> Result<(), Error> {
        let inode = self.table.get(id)?;
        if inode.has_extent() {
            let header = FileHeader::new(inode.size as u64);
            self.store.write(inode.extent, header.as_bytes())?;
        }
        self.persist_inode(id)
    }

    /// 没有区段时，在前沿分配一段能容纳 `size` 字节的
    fn ensure_extent(&mut self, id: InodeId, size: u64) -> Result<(), Error> {
        if self.table.get(id)?.has_extent() {
            return Ok(());
        }

        let len = extent_len_for(size);
        let data_start = self.data_start();
        let start = self.allocator.place(&self.table, data_start, len);
        self.check_device(start, len)?;

        let inode = self.table.get_mut(id)?;
        inode.extent = start;
        inode.extent_len = len;
        log::debug!("inode {id}: extent {start:#x}+{len:#x}");

        self.sync_size(id)
    }

    fn grow(&mut self, id: InodeId, needed: u64) -> Result<(), Error> {
        let inode = self.table.get(id)?;
        let (start, len, size) = (inode.extent, inode.extent_len, inode.size as u64);
        let new_len = extent_len_for(needed.max(inode.capacity() * 2));
        let data_start = self.data_start();

        if self.allocator.can_grow(&self.table, data_start, start, len) {
            self.check_device(start, new_len)?;
            log::debug!("inode {id}: grow in place to {new_len:#x}");
            self.table.get_mut(id)?.extent_len = new_len;
        } else {
            let new_start = self.allocator.place(&self.table, data_start, new_len);
            self.check_device(new_start, new_len)?;
            log::debug!("inode {id}: relocate {start:#x} -> {new_start:#x}, {new_len:#x} bytes");
            self.copy_extent(start, new_start, FileHeader::SIZE as u64 + size)?;

            let inode = self.table.get_mut(id)?;
            inode.extent = new_start;
            inode.extent_len = new_len;
        }

        self.sync_size(id)
    }

    /// 分块复制 `len` 字节
    fn copy_extent(&self, from: u64, to: u64, len: u64) -> Result<(), Error> {
        let mut buf = vec![0; self.config.relocation_chunk];
        let mut done = 0;
        while done < len {
            let n = (len - done).min(buf.len() as u64) as usize;
            self.store.read(from + done, &mut buf[..n])?;
            self.store.write(to + done, &buf[..n])?;
            done += n as u64;
        }

        Ok(())
    }

    fn check_device(&self, start: u64, len: u64) -> Result<(), Error> {
        if start + len > self.store.capacity() {
            log::debug!("extent {start:#x}+{len:#x} does not fit the device");
            return Err(Error::NoSpace);
        }
        Ok(())
    }
}
