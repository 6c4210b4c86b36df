//! # 路径操作
//!
//! 对外的文件系统接口：所有路径先相对当前工作目录规范化，再从根目录逐级解析。

use alloc::{
    format,
    string::{String, ToString},
    vec,
    vec::Vec,
};

use enumflags2::BitFlags;
use vfs::Stat;

use crate::{
    Error, FileSystem, Handle, InodeId, InodeKind, OpenFlag, Path, ROOT_ID, SECTOR_SIZE,
    fd::Descriptor, validate_name,
};

impl FileSystem {
    /// 解析路径到索引节点
    pub fn resolve(&self, path: &str) -> Result<InodeId, Error> {
        self.walk(&path.normalize(&self.cwd))
    }

    /// 解析规范路径
    fn walk(&self, path: &str) -> Result<InodeId, Error> {
        let mut id = ROOT_ID;
        for name in path.components() {
            let child = self.dir_lookup(id, name)?.ok_or(Error::NotFound)?;
            self.check_child(id, child)?;
            id = child;
        }

        Ok(id)
    }

    /// 解析规范路径的父目录，返回 `(父目录, 文件名)`
    fn walk_parent<'a>(&self, path: &'a str) -> Result<(InodeId, &'a str), Error> {
        let (parent, name) = path.parent_file().ok_or(Error::BadArgument)?;
        let parent = self.walk(parent)?;
        if !self.table.get(parent)?.is_dir() {
            return Err(Error::NotADirectory);
        }

        Ok((parent, name))
    }

    fn make_node(&mut self, path: &str, kind: InodeKind) -> Result<InodeId, Error> {
        let path = path.normalize(&self.cwd);
        if path == "/" {
            return Err(Error::AlreadyExists);
        }
        let (parent, name) = self.walk_parent(&path)?;
        validate_name(name)?;
        if self.dir_lookup(parent, name)?.is_some() {
            return Err(Error::AlreadyExists);
        }

        let id = self.table.allocate(kind, name, Some(parent))?;
        if let Err(err) = self.dir_add(parent, name, id) {
            self.table.free(id)?;
            return Err(err);
        }
        self.persist_inode(id)?;
        log::debug!("{kind:?} {path} -> inode {id}");

        Ok(id)
    }

    /// 新建空目录
    pub fn mkdir(&mut self, path: &str) -> Result<InodeId, Error> {
        self.make_node(path, InodeKind::Directory)
    }

    /// 新建空文件
    pub fn create(&mut self, path: &str) -> Result<InodeId, Error> {
        self.make_node(path, InodeKind::File)
    }

    pub fn open(&mut self, path: &str, flags: BitFlags<OpenFlag>) -> Result<Handle, Error> {
        let id = match self.resolve(path) {
            Ok(id) => id,
            Err(Error::NotFound) if flags.contains(OpenFlag::CREATE) => self.create(path)?,
            Err(err) => return Err(err),
        };
        if self.table.get(id)?.is_dir() {
            return Err(Error::IsADirectory);
        }
        if flags.contains(OpenFlag::TRUNC) {
            self.truncate(id)?;
        }

        self.fds.insert(Descriptor::new(id, flags))
    }

    /// 从描述符的偏移处读，读到的字节数可能少于 `buf.len()`，文件末尾时为 0
    pub fn read(&mut self, handle: Handle, buf: &mut [u8]) -> Result<usize, Error> {
        let desc = *self.fds.get(handle)?;
        if !desc.readable {
            return Err(Error::BadHandle);
        }

        let len = self.read_at(desc.inode, desc.offset, buf)?;
        self.fds.get_mut(handle)?.offset += len as u64;

        Ok(len)
    }

    /// 在描述符的偏移处写，文件按需增长
    pub fn write(&mut self, handle: Handle, data: &[u8]) -> Result<usize, Error> {
        let desc = *self.fds.get(handle)?;
        if !desc.writable {
            return Err(Error::BadHandle);
        }

        let len = self.write_at(desc.inode, desc.offset, data)?;
        self.fds.get_mut(handle)?.offset += len as u64;

        Ok(len)
    }

    pub fn close(&mut self, handle: Handle) -> Result<(), Error> {
        self.fds.remove(handle).map(|_| ())
    }

    /// 删除文件，或连同其下全部内容删除目录
    pub fn remove(&mut self, path: &str) -> Result<(), Error> {
        let path = path.normalize(&self.cwd);
        let (parent, name) = self.walk_parent(&path)?;
        let target = self.dir_lookup(parent, name)?.ok_or(Error::NotFound)?;
        self.check_child(parent, target)?;

        let mut doomed = Vec::new();
        let mut stack = vec![target];
        while let Some(id) = stack.pop() {
            if self.table.get(id)?.is_dir() {
                stack.extend(self.dir_children(id)?.iter().map(|entry| entry.inode_id()));
            }
            doomed.push(id);
        }

        self.dir_remove(parent, name)?;
        for &id in &doomed {
            self.table.free(id)?;
            self.fds.close_inode(id);
            self.persist_inode(id)?;
        }
        log::debug!("removed {path}: {} inodes freed", doomed.len());

        if is_within(&self.cwd, &path) {
            self.cwd = path.parent_file().map_or("/", |(parent, _)| parent).to_string();
        }

        Ok(())
    }

    /// 列出目录内容，不含`.`与`..`
    pub fn list(&self, path: &str) -> Result<Vec<vfs::DirEntry>, Error> {
        let dir = self.resolve(path)?;
        if !self.table.get(dir)?.is_dir() {
            return Err(Error::NotADirectory);
        }

        self.dir_children(dir)?
            .iter()
            .map(|entry| {
                let inode = self.table.get(entry.inode_id())?;
                Ok(vfs::DirEntry {
                    inode: inode.id as u64,
                    ty: inode.kind().ok_or(Error::Corrupted)?.into(),
                    name: entry.name().to_string(),
                    size: inode.size as u64,
                })
            })
            .collect()
    }

    /// 切换当前工作目录
    pub fn change_directory(&mut self, path: &str) -> Result<(), Error> {
        let path = path.normalize(&self.cwd);
        let id = self.walk(&path)?;
        if !self.table.get(id)?.is_dir() {
            return Err(Error::NotADirectory);
        }
        self.cwd = path;

        Ok(())
    }

    pub fn stat(&self, path: &str) -> Result<Stat, Error> {
        let inode = self.table.get(self.resolve(path)?)?;
        Ok(Stat {
            inode: inode.id as u64,
            mode: inode.kind().ok_or(Error::Corrupted)?.into(),
            size: inode.size as u64,
            capacity: inode.capacity(),
            block_size: SECTOR_SIZE as u64,
            blocks: inode.extent_len / SECTOR_SIZE as u64,
        })
    }

    /// 移动或改名。目标已存在时报错；目录不能移进自己的子树。
    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), Error> {
        let from = from.normalize(&self.cwd);
        let to = to.normalize(&self.cwd);
        if from == "/" || to == "/" {
            return Err(Error::BadArgument);
        }

        let (src_parent, src_name) = self.walk_parent(&from)?;
        let id = self.dir_lookup(src_parent, src_name)?.ok_or(Error::NotFound)?;
        self.check_child(src_parent, id)?;
        let (dst_parent, dst_name) = self.walk_parent(&to)?;
        if from == to {
            return Ok(());
        }
        validate_name(dst_name)?;
        if self.dir_lookup(dst_parent, dst_name)?.is_some() {
            return Err(Error::AlreadyExists);
        }

        // 沿父指针上溯，确认目标目录不在被移动的子树中
        let mut cur = Some(dst_parent);
        let mut steps = 0;
        while let Some(dir) = cur {
            if dir == id {
                return Err(Error::BadArgument);
            }
            steps += 1;
            if steps > self.table.capacity() {
                log::error!("parent chain of inode {dst_parent} never reaches the root");
                return Err(Error::Corrupted);
            }
            cur = self.table.get(dir)?.parent();
        }

        if src_parent == dst_parent {
            self.dir_rename(src_parent, src_name, dst_name)?;
        } else {
            self.dir_add(dst_parent, dst_name, id)?;
            self.dir_remove(src_parent, src_name)?;
        }

        let inode = self.table.get_mut(id)?;
        inode.set_name(dst_name);
        inode.set_parent(dst_parent);
        self.persist_inode(id)?;
        log::debug!("renamed {from} -> {to}");

        if is_within(&self.cwd, &from) {
            self.cwd = format!("{to}{}", &self.cwd[from.len()..]);
        }

        Ok(())
    }

    /// 自根目录先序遍历，每个节点一行，每深一层缩进两个空格
    pub fn debug_dump(&self) -> Result<String, Error> {
        let mut out = String::new();
        let mut stack = vec![(ROOT_ID, 0)];
        while let Some((id, depth)) = stack.pop() {
            let inode = self.table.get(id)?;
            out.push_str(&"  ".repeat(depth));
            match inode.kind().ok_or(Error::Corrupted)? {
                InodeKind::Directory => {
                    out.push_str(&format!("DIR {} size={}\n", inode.name(), inode.size));
                    // 逆序入栈，出栈时保持目录项顺序
                    let children: Vec<_> = self
                        .dir_children(id)?
                        .iter()
                        .map(|entry| (entry.inode_id(), depth + 1))
                        .collect();
                    stack.extend(children.into_iter().rev());
                }
                InodeKind::File => {
                    out.push_str(&format!("FILE {} size={}\n", inode.name(), inode.size));
                }
            }
        }
        log::debug!("\n{out}");

        Ok(out)
    }
}

/// `path` 是否为 `dir` 本身或位于其下，两者都是规范路径
fn is_within(path: &str, dir: &str) -> bool {
    path.strip_prefix(dir)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
