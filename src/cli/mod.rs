//! Command-line interface components
//!
//! This module contains CLI-specific code for the MedReg Fetcher application,
//! including argument parsing, command handlers and progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    CacheAction, CacheArgs, Cli, Commands, ConfigAction, ConfigArgs, GlobalArgs, SnapshotAction,
    SnapshotArgs, TableArgs,
};
pub use commands::{
    handle_cache, handle_config, handle_crawl, handle_document, handle_procedures, handle_product,
    handle_products, handle_snapshot, CommandContext,
};
pub use progress::ProgressConfig;
