//! Shorten CSS class names.

use anyhow::Result;
use classmin::cli::{Cli, Parser};
use log::LevelFilter;

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .format_timestamp(None)
        .format_target(false)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    classmin::cli::run(&cli.opts)?;

    Ok(())
}
