//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    completions::CompletionsArgs, config::ConfigCommands, groups::GroupsArgs, lookup::LookupArgs,
    run::RunArgs, sheets::SheetsArgs,
};

#[derive(Parser)]
#[command(name = "partpick")]
#[command(author, version, about = "Cheapest in-stock part picker for multi-sheet BOMs")]
#[command(long_about = "Reads part families from a BOM workbook, looks up live stock and pricing for every candidate supplier code, and exports the cheapest in-stock part per family.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (per-candidate diagnostics)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Select the cheapest in-stock part for every family and export CSVs
    Run(RunArgs),

    /// List the sheets of a BOM workbook
    Sheets(SheetsArgs),

    /// Show the part families of one sheet after fill-down
    Groups(GroupsArgs),

    /// Look up stock and price for a single supplier code
    Lookup(LookupArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Auto,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// Markdown tables
    Md,
}
