//! Command line utilities.

use std::path::PathBuf;

use anyhow::{Context, Result};
pub use clap::Parser;
use clap::Args;
use log::info;

use crate::Config;

/// Command line usage description.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Command line options.
    #[command(flatten)]
    pub opts: Opts,
}

/// Command line options.
#[derive(Debug, Default, Args, Clone)]
pub struct Opts {
    /// Configuration file [default: "classmin.{json,toml,yaml}"]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Input stylesheet
    #[arg(long)]
    pub css_in: Option<PathBuf>,

    /// Output stylesheet [default: standard output]
    #[arg(long)]
    pub css_out: Option<PathBuf>,

    /// Input script
    #[arg(long)]
    pub js_in: Option<PathBuf>,

    /// Output script [default: standard output]
    #[arg(long)]
    pub js_out: Option<PathBuf>,

    /// Only substitute class names starting with this prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Only substitute class names matching this regular expression
    #[arg(long)]
    pub regexp: Option<String>,

    /// Assign tokens to class names never referenced by the script
    #[arg(long)]
    pub replace_all: bool,

    /// Write the substitution table to this JSON file
    #[arg(long)]
    pub replacements_output: Option<PathBuf>,

    /// Leave rules in conditional blocks and nested rules untouched
    #[arg(long)]
    pub no_nested: bool,

    /// Fail on selectors referencing classes unknown to the script
    #[arg(long)]
    pub strict: bool,

    /// Do not minify the output files
    #[arg(long)]
    pub no_minify: bool,

    /// Name of the component definition function
    #[arg(long)]
    pub component_callee: Option<String>,

    /// Suffix of class names derived by component definitions [default: "-inner"]
    #[arg(long)]
    pub component_suffix: Option<String>,
}

/// Run the minifier.
pub fn run(opts: &Opts) -> Result<()> {
    let config = Config::from_opts(opts).context("loading configuration")?;

    info!("Minifying class names...");

    let count = crate::process(&config)?;

    info!("Performed {count} substitutions");

    Ok(())
}
