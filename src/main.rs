//! MedReg Fetcher CLI application
//!
//! Command-line interface for harvesting the EU community register of
//! medicinal products into product and procedure tables.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use medreg_fetcher::cli::{
    handle_cache, handle_config, handle_crawl, handle_document, handle_procedures, handle_product,
    handle_products, handle_snapshot, Cli, Commands,
};
use medreg_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // A missing .env file is fine
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    init_logging(&cli);

    info!("MedReg Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    let global = &cli.global;
    match cli.command {
        Commands::Products(args) => handle_products(args, global).await,
        Commands::Procedures(args) => handle_procedures(args, global).await,
        Commands::Crawl => handle_crawl(global).await,
        Commands::Product { id } => handle_product(id, global).await,
        Commands::Document { url, output } => handle_document(&url, &output, global).await,
        Commands::Cache(args) => handle_cache(args, global).await,
        Commands::Snapshot(args) => handle_snapshot(args, global).await,
        Commands::Config(args) => handle_config(args, global).await,
    }
}

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli) {
    let log_level = cli.log_level();

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("medreg_fetcher={}", log_level).parse() {
        filter = filter.add_directive(directive);
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose) // Show levels only in very verbose mode
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
