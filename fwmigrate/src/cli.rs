use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use fwmigrate::options::Dialect;

#[derive(Parser, Debug)]
#[command(name = "fwmigrate")]
#[command(about = "Convert Cisco ASA and FortiGate configurations into a normalized policy model")]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Show the parsed structure of a configuration file.
    Inspect(InspectArgs),
    /// Convert a configuration into objects, policy layers, and NAT rules.
    Convert(ConvertArgs),
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    pub file: PathBuf,
    #[arg(long, default_value_t = 3)]
    pub depth: usize,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// List only ASA commands of this kind, e.g. `access-list` or `object-group`.
    #[arg(long)]
    pub kind: Option<String>,
    /// Source dialect; detected from the contents when omitted.
    #[arg(long, value_enum)]
    pub dialect: Option<Dialect>,
}

#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Source config file to convert.
    pub input: PathBuf,
    /// Write the JSON model here instead of printing it.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Options TOML file.
    #[arg(long)]
    pub options: Option<PathBuf>,
    /// Known-value tables TOML file. Defaults to the embedded tables.
    #[arg(long)]
    pub tables: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Source dialect; overrides the options file and detection.
    #[arg(long, value_enum)]
    pub dialect: Option<Dialect>,
    /// Policy package name.
    #[arg(long)]
    pub package_name: Option<String>,
    /// Keep every converted rule instead of merging equivalent ones.
    #[arg(long)]
    pub no_optimize: bool,
    /// Carry ACL remarks onto every later entry of the same ACL.
    #[arg(long)]
    pub spread_remarks: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}
