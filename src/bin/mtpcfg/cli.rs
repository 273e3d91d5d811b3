use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mtpcfg",
    about = "Inspect and merge MTP CFG configuration files",
    version,
    author,
    before_help = crate::display::banner_for_help(),
    propagate_version = true
)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Summarize the configurations in a CFG file
    #[command(visible_alias = "i")]
    Info(InfoArgs),

    /// Concatenate CFG files into one, validating every frame
    #[command(visible_alias = "m")]
    Merge(MergeArgs),
}

/// Species label to CFG type ID mapping, shared by all commands.
#[derive(Args)]
#[command(next_help_heading = "Type Mapping")]
#[group(required = true, multiple = false)]
pub struct TypeOptions {
    /// Species labels in type order, numbered from 1 (e.g. Si,O)
    #[arg(long, value_name = "LABELS", value_delimiter = ',')]
    pub types: Vec<String>,

    /// TOML file with a [types] table of label = ID entries
    #[arg(long = "type-map", value_name = "FILE")]
    pub type_map: Option<PathBuf>,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Input CFG file (stdin if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Suppress banner and progress output
    #[arg(short, long)]
    pub quiet: bool,

    #[command(flatten)]
    pub types: TypeOptions,
}

#[derive(Args)]
pub struct MergeArgs {
    /// Input CFG files, merged in the order given
    #[arg(short, long, value_name = "FILE", required = true, action = ArgAction::Append)]
    pub input: Vec<PathBuf>,

    /// Output CFG file (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Append to the output file instead of replacing it
    #[arg(short, long, requires = "output")]
    pub append: bool,

    /// Suppress banner and progress output
    #[arg(short, long)]
    pub quiet: bool,

    #[command(flatten)]
    pub types: TypeOptions,
}

pub fn parse() -> Cli {
    Cli::parse()
}
