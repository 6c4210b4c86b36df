use std::io;

use clap::Parser;
use reapfs_fuse::Cli;

fn main() -> io::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    log::info!("image={:?}", cli.image);

    reapfs_fuse::run(&cli, &mut io::stdout().lock())
}
