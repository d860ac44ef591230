use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "policy-structure",
    version,
    about = "Structure recognition and chunking for extracted policy documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Parse(ParseArgs),
    Normalize(NormalizeArgs),
    Outline(OutlineArgs),
    Rules(RulesArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    #[arg(long = "input", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Display name used for the title; only valid with a single input.
    #[arg(long)]
    pub file_name: Option<String>,

    #[arg(long, default_value = ".cache/policy-structure")]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub rules: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct NormalizeArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub rules: Option<PathBuf>,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct OutlineArgs {
    #[arg(long)]
    pub segments: PathBuf,

    #[arg(long, default_value_t = false)]
    pub chunks: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RulesArgs {
    #[arg(long)]
    pub output: Option<PathBuf>,
}
