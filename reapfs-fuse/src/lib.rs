
mod block_file;
mod cli;

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use block_dev::BlockDevice;
use byte_unit::Byte;
use reapfs::{FileSystem, FsConfig, OpenFlag, RecoveryPolicy};

pub use self::{
    block_file::BlockFile,
    cli::{Cli, Command},
};

/// 宿主机与镜像之间一次搬运的字节数
const COPY_CHUNK: usize = 64 * 1024;

/// 执行一条命令，输出写进 `out`
pub fn run(cli: &Cli, out: &mut impl Write) -> io::Result<()> {
    let mut fs = match cli.command {
        Command::Mkfs { size, inodes } => mkfs(&cli.image, size, inodes)?,
        _ => mount(&cli.image, cli.strict)?,
    };

    match &cli.command {
        Command::Mkfs { size, .. } => {
            writeln!(
                out,
                "formatted {:?}: {}, {} inodes",
                cli.image,
                size.get_appropriate_unit(true),
                fs.inode_table().capacity()
            )?;
        }
        Command::Ls { path } => {
            for entry in fs.list(path).map_err(fs_error)? {
                let kind = if entry.ty.is_dir() { "<DIR>" } else { "<FILE>" };
                writeln!(out, "{}\t{kind}\t{}", entry.name, entry.size)?;
            }
        }
        Command::Mkdir { path } => {
            fs.mkdir(path).map_err(fs_error)?;
        }
        Command::Touch { path } => {
            fs.create(path).map_err(fs_error)?;
        }
        Command::Put { source, path } => {
            let data = std::fs::read(source)?;
            let fd = fs
                .open(path, OpenFlag::CREATE | OpenFlag::TRUNC | OpenFlag::WRONLY)
                .map_err(fs_error)?;
            for chunk in data.chunks(COPY_CHUNK) {
                fs.write(fd, chunk).map_err(fs_error)?;
            }
            fs.close(fd).map_err(fs_error)?;
            log::info!("copied {} bytes from {source:?} to {path}", data.len());
        }
        Command::Cat { path } => {
            let fd = fs.open(path, OpenFlag::read_only()).map_err(fs_error)?;
            let mut buf = vec![0; COPY_CHUNK];
            loop {
                let len = fs.read(fd, &mut buf).map_err(fs_error)?;
                if len == 0 {
                    break;
                }
                out.write_all(&buf[..len])?;
            }
            fs.close(fd).map_err(fs_error)?;
        }
        Command::Rm { path } => {
            fs.remove(path).map_err(fs_error)?;
        }
        Command::Mv { from, to } => {
            fs.rename(from, to).map_err(fs_error)?;
        }
        Command::Stat { path } => {
            let stat = fs.stat(path).map_err(fs_error)?;
            let kind = if stat.mode.is_dir() { "directory" } else { "file" };
            writeln!(
                out,
                "{path}: {kind}, inode {}, size {}, capacity {}, {} blocks of {}",
                stat.inode, stat.size, stat.capacity, stat.blocks, stat.block_size
            )?;
        }
        Command::Tree => {
            out.write_all(fs.debug_dump().map_err(fs_error)?.as_bytes())?;
        }
    }

    Ok(())
}

fn mkfs(image: &Path, size: Byte, inodes: u32) -> io::Result<FileSystem> {
    let disk_size = u64::try_from(size.get_bytes()).map_err(io::Error::other)?;
    let fd = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(image)?;
    fd.set_len(disk_size)?;

    let block_dev: Arc<dyn BlockDevice> = Arc::new(BlockFile::new(fd)?);
    let config = FsConfig {
        inode_capacity: inodes,
        ..FsConfig::default()
    };

    FileSystem::mkfs(block_dev, config).map_err(fs_error)
}

fn mount(image: &Path, strict: bool) -> io::Result<FileSystem> {
    let fd = OpenOptions::new().read(true).write(true).open(image)?;
    let block_dev: Arc<dyn BlockDevice> = Arc::new(BlockFile::new(fd)?);
    let config = FsConfig {
        recovery: if strict {
            RecoveryPolicy::Strict
        } else {
            RecoveryPolicy::AutoFormat
        },
        ..FsConfig::default()
    };

    FileSystem::mount(block_dev, config).map_err(fs_error)
}

fn fs_error(err: reapfs::Error) -> io::Error {
    log::error!("reapfs: {err} ({})", err.code());
    io::Error::other(err)
}
