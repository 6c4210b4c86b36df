use alloc::borrow::ToOwned;
use alloc::string::String;
use alloc::vec::Vec;

use crate::{Error, NAME_MAX_LEN};

pub trait Path: ToOwned {
    fn is_absolute(&self) -> bool;

    /// 返回不以`/`结束、不包含相对项的绝对路径。
    ///
    /// 连续的`/`视作一个，根目录的`..`仍是根目录，空路径即`cwd`。
    ///
    /// # 参数
    ///
    /// `cwd`: 当前工作目录，为同样形式的绝对路径。
    fn normalize(&self, cwd: &Self) -> Self::Owned;

    /// 返回规范路径的`(父目录, 文件名)`，若为根目录则返回`None`。
    fn parent_file(&self) -> Option<(&Self, &Self)>;

    /// 规范路径自根向下的各级名字
    fn components(&self) -> impl Iterator<Item = &Self>;

    fn is_relative(&self) -> bool {
        !self.is_absolute()
    }
}

impl Path for str {
    fn is_absolute(&self) -> bool {
        self.starts_with('/')
    }

    fn normalize(&self, cwd: &Self) -> String {
        let mut cmps = Vec::new();
        if self.is_relative() {
            cmps.extend(cwd.components());
        }

        for cmp in self.split('/') {
            match cmp {
                ".." => {
                    cmps.pop();
                }
                "." | "" => (),
                s => cmps.push(s),
            }
        }

        if cmps.is_empty() {
            return String::from("/");
        }
        cmps.insert(0, ""); // 在接下来的拼接中代表根目录

        cmps.join("/")
    }

    fn parent_file(&self) -> Option<(&Self, &Self)> {
        if self == "/" {
            return None;
        }

        self.rsplit_once('/')
            .map(|(p, f)| if p.is_empty() { ("/", f) } else { (p, f) })
    }

    fn components(&self) -> impl Iterator<Item = &Self> {
        self.split('/').filter(|s| !s.is_empty())
    }
}

/// 校验新建项的名字
pub fn validate_name(name: &str) -> Result<(), Error> {
    if name.is_empty()
        || name.len() > NAME_MAX_LEN
        || matches!(name, "." | "..")
        || name.contains(['/', '\0'])
    {
        return Err(Error::BadArgument);
    }

    Ok(())
}
