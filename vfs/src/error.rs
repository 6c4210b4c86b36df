use derive_more::Display;

/// 文件系统操作的错误种类
///
/// 每个变体都有一个稳定的负数编号，见 [`Error::code`]。
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[display(fmt = "no such file or directory")]
    NotFound,
    #[display(fmt = "file exists")]
    AlreadyExists,
    #[display(fmt = "no space left on device")]
    NoSpace,
    #[display(fmt = "input/output error")]
    Io,
    #[display(fmt = "invalid argument")]
    BadArgument,
    #[display(fmt = "is a directory")]
    IsADirectory,
    #[display(fmt = "not a directory")]
    NotADirectory,
    #[display(fmt = "out of memory")]
    NoMemory,
    #[display(fmt = "bad file descriptor")]
    BadHandle,
    #[display(fmt = "too many open files")]
    NoDescriptors,
    #[display(fmt = "filesystem is corrupted")]
    Corrupted,
}

impl Error {
    /// 错误的稳定编号，均为负数
    pub fn code(self) -> i32 {
        match self {
            Self::NotFound => -1,
            Self::AlreadyExists => -2,
            Self::NoSpace => -3,
            Self::Io => -4,
            Self::BadArgument => -5,
            Self::IsADirectory => -6,
            Self::NotADirectory => -7,
            Self::NoMemory => -8,
            Self::BadHandle => -9,
            Self::NoDescriptors => -10,
            Self::Corrupted => -11,
        }
    }
}

impl core::error::Error for Error {}
