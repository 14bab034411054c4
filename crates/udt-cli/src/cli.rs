use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "udt",
    about = "Inspect and edit Universal Data Tool dataset files",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Store configuration (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show each sample id and whether it is annotated
    Summary(SummaryArgs),
    /// Load a dataset, assign sample ids, and write it back out
    Import(ImportArgs),
    /// Print a top-level dataset property
    Get(GetArgs),
    /// Merge or replace a top-level dataset property
    Set(SetArgs),
    /// Append samples
    Add(AddArgs),
    /// Remove samples by id
    Remove(RemoveArgs),
}

#[derive(Args)]
pub struct SummaryArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ImportArgs {
    pub file: PathBuf,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct GetArgs {
    pub file: PathBuf,
    pub key: String,
}

#[derive(Args)]
pub struct SetArgs {
    pub file: PathBuf,
    pub key: String,
    /// JSON value; bare words are taken as strings
    pub value: String,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct AddArgs {
    pub file: PathBuf,
    /// One JSON object per sample
    #[arg(required = true)]
    pub samples: Vec<String>,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct RemoveArgs {
    pub file: PathBuf,
    #[arg(required = true)]
    pub ids: Vec<String>,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
