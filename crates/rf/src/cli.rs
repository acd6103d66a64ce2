//! CLI argument parsing using clap derive macros.
//!
//! This module defines the command-line interface for the rf CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// rf - filter, order and page JSON records with a query expression
#[derive(Parser, Debug)]
#[command(name = "rf")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose output (show debug information)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Force JSON output for reports and errors
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the records of a JSON document that match a query
    #[command(alias = "f")]
    Filter {
        /// Schema file describing the record members (TOML)
        #[arg(short, long)]
        schema: PathBuf,

        /// Filter expression (e.g., 'Score gt 10 and "x" in Tags')
        #[arg(short = 'e', long)]
        query: Option<String>,

        /// Order by a dotted member path (repeatable)
        #[arg(short, long = "order-by", action = clap::ArgAction::Append)]
        order_by: Vec<String>,

        /// Sort in descending order
        #[arg(long, requires = "order_by")]
        descending: bool,

        /// Page number, starting at 1
        #[arg(long, requires = "page_size")]
        page: Option<usize>,

        /// Records per page
        #[arg(long)]
        page_size: Option<usize>,

        /// JSON document to read (default: stdin)
        input: Option<PathBuf>,
    },

    /// Validate a query and print the compiled condition
    Check {
        /// Schema file describing the record members (TOML)
        #[arg(short, long)]
        schema: PathBuf,

        /// Filter expression to check
        query: String,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show config file path
    Path,
    /// Show effective configuration
    Show,
}
