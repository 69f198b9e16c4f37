use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dones", about = concat!("dones v", env!("CARGO_PKG_VERSION"), " - tab-indented outlines with tags"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Read editor settings from this file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the outline
    Show(ShowArgs),
    /// Print the tag index
    Tags(TagsArgs),
    /// Rewrite a file in normalized form
    Fmt(FmtArgs),
    /// Replay a script of edit events against a file
    Apply(ApplyArgs),
}

#[derive(Args)]
pub struct ShowArgs {
    /// Outline file
    pub file: PathBuf,
    /// Only lines up to this depth (1 = top level)
    #[arg(long)]
    pub depth: Option<usize>,
    /// Truncate lines to this display width
    #[arg(long)]
    pub width: Option<usize>,
}

#[derive(Args)]
pub struct TagsArgs {
    /// Outline file
    pub file: PathBuf,
    /// Only this tag
    #[arg(long)]
    pub tag: Option<String>,
}

#[derive(Args)]
pub struct FmtArgs {
    /// Outline file
    pub file: PathBuf,
    /// Report instead of rewriting; fails when the file would change
    #[arg(long)]
    pub check: bool,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Outline file
    pub file: PathBuf,
    /// JSON array of edit events
    pub script: PathBuf,
    /// Print the result instead of saving it
    #[arg(long)]
    pub dry_run: bool,
}
