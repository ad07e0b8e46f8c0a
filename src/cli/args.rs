//! Command-line argument parsing for MedReg Fetcher
//!
//! This module defines the CLI structure using clap derive macros: table
//! materialization, single-product inspection, document download, and cache,
//! snapshot and configuration management.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// MedReg Fetcher - Harvest the EU community register of medicinal products
#[derive(Parser, Debug)]
#[command(
    name = "medreg_fetcher",
    version,
    about = "Harvest the EU community register of medicinal products into tables",
    long_about = "Crawls the community register listing, enriches every product from its detail page \
and collects procedure histories. Pages are cached on disk and finished tables are stored as \
snapshots, so repeated runs only fetch what has never been seen."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Cache directory path
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Materialize (or load) the product table
    Products(TableArgs),

    /// Materialize (or load) the procedure table
    Procedures(TableArgs),

    /// Crawl the register listing only
    Crawl,

    /// Show detail fields and procedures of one product
    Product {
        /// Register identifier of the product
        #[arg(value_name = "ID")]
        id: i64,
    },

    /// Download a linked document through the cache
    Document {
        /// Document URL
        #[arg(value_name = "URL")]
        url: String,

        /// Where to write the document
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Content cache management
    Cache(CacheArgs),

    /// Snapshot management
    Snapshot(SnapshotArgs),

    /// Configuration file management
    Config(ConfigArgs),
}

/// Arguments for the table commands
#[derive(Args, Debug, Clone, Default)]
pub struct TableArgs {
    /// Also export the table as CSV to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Arguments for cache management
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache management actions
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show cache statistics and information
    Info,

    /// List the fetch log
    Log {
        /// Show only the most recent entries
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Remove every cached page and the fetch log
    Clear,
}

/// Arguments for snapshot management
#[derive(Args, Debug)]
pub struct SnapshotArgs {
    #[command(subcommand)]
    pub action: SnapshotAction,
}

/// Snapshot management actions
#[derive(Subcommand, Debug)]
pub enum SnapshotAction {
    /// List stored snapshots
    List,

    /// Remove one snapshot, or all of them
    Clear {
        /// Snapshot key (e.g. medicines_register)
        #[arg(value_name = "KEY")]
        key: Option<String>,
    },
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Target file (user config directory if omitted)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        self.global.log_level()
    }
}

impl GlobalArgs {
    /// Logging level selected by the verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.very_verbose {
            tracing::Level::DEBUG
        } else if self.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }
}
