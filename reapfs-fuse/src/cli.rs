use std::path::PathBuf;

use byte_unit::Byte;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug, PartialEq, Eq)]
#[command(version, about = "Inspect and edit reapfs images")]
pub struct Cli {
    /// Filesystem image
    #[arg(long, short)]
    pub image: PathBuf,

    /// Refuse to reformat an image without a valid reapfs
    #[arg(long)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Create the image and format it
    Mkfs {
        /// Image size, e.g. `16MiB`
        #[arg(long, short, default_value = "16MiB")]
        size: Byte,

        /// Inode table capacity
        #[arg(long, default_value_t = 1024)]
        inodes: u32,
    },
    /// List a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Create a directory
    Mkdir { path: String },
    /// Create an empty file
    Touch { path: String },
    /// Copy a host file into the image
    Put { source: PathBuf, path: String },
    /// Print a file
    Cat { path: String },
    /// Remove a file or a whole directory
    Rm { path: String },
    /// Move or rename
    Mv { from: String, to: String },
    /// Show inode metadata
    Stat { path: String },
    /// Print the whole tree
    Tree,
}
