use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "golo")]
#[command(about = "Golo language parser")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file with [limits] and [dump] tables
    #[arg(long, global = true, default_value = "golo.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse Golo source files, optionally printing their AST
    Parse(ParseArgs),
    /// Parse every .golo file under a directory and report failures
    Check(CheckArgs),
}

#[derive(clap::Args)]
pub struct ParseArgs {
    /// Input file paths
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Print the AST of each file
    #[arg(long)]
    pub trace: bool,

    /// Marker written before every dump line
    #[arg(long)]
    pub prefix: Option<String>,

    /// Append source spans to dump lines
    #[arg(long)]
    pub spans: bool,
}

#[derive(clap::Args)]
pub struct CheckArgs {
    /// Directory searched recursively
    pub dir: PathBuf,

    /// Number of parser threads (defaults to available cores)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}
