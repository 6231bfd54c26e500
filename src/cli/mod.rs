//! CLI command definitions for confagg.
//!
//! The main entry point is the `Cli` struct which contains subcommands.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for `dump`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DumpFormat {
    #[default]
    Json,
    Yaml,
}

/// Aggregate configuration files and inspect the merged result
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a settings file
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    /// Directory or file to scan (repeatable, appended after settings targets)
    #[arg(short, long = "target", global = true)]
    pub targets: Vec<PathBuf>,

    /// Extension whose handler should be removed (repeatable)
    #[arg(long = "disable", global = true)]
    pub disabled: Vec<String>,

    /// Skip files that fail to parse instead of aborting
    #[arg(long, global = true)]
    pub skip_invalid: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the merged configuration (default if no subcommand given)
    Dump(DumpArgs),

    /// Print one value by dotted path, e.g. `db.user` or `hosts.0`
    Get(GetArgs),

    /// List the files a refresh parses, in merge order
    Sources,
}

#[derive(Args, Debug, Default)]
pub struct DumpArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = DumpFormat::Json)]
    pub format: DumpFormat,

    /// Single-line JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Dotted key path
    pub key: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = DumpFormat::Json)]
    pub format: DumpFormat,
}
