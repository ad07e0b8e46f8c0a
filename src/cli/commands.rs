//! Command handlers for MedReg Fetcher CLI
//!
//! This module implements the command handlers that coordinate between CLI
//! arguments and the core pipeline. Every handler first resolves the effective
//! configuration (defaults, config file, environment, CLI flags) into a
//! [`CommandContext`].

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::app::cache::format_bytes;
use crate::app::{
    CacheConfig, ClientConfig, ContentCache, ProductRef, RegisterConfig, ResilientFetcher,
    SnapshotStore, TableMaterializer,
};
use crate::cli::{
    CacheAction, CacheArgs, ConfigAction, ConfigArgs, GlobalArgs, ProgressConfig, SnapshotAction,
    SnapshotArgs, TableArgs,
};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Effective configuration of one CLI invocation
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: AppConfig,
    pub cache_config: CacheConfig,
    pub client_config: ClientConfig,
    pub register_config: RegisterConfig,
    pub quiet: bool,
}

impl CommandContext {
    /// Load configuration and apply CLI overrides
    pub async fn load(global: &GlobalArgs) -> Result<Self> {
        let mut config = AppConfig::load(global.config.clone()).await?;
        if let Some(dir) = &global.cache_dir {
            debug!("Cache directory overridden on the command line");
            config.cache.cache_root = Some(dir.clone());
        }

        let (cache_config, client_config, register_config) = config.to_runtime_config();
        Ok(Self {
            config,
            cache_config,
            client_config,
            register_config,
            quiet: global.quiet,
        })
    }

    pub async fn cache(&self) -> Result<Arc<ContentCache>> {
        Ok(Arc::new(ContentCache::new(&self.cache_config).await?))
    }

    pub async fn fetcher(&self) -> Result<Arc<ResilientFetcher>> {
        let cache = self.cache().await?;
        Ok(Arc::new(ResilientFetcher::new(
            self.client_config.clone(),
            cache,
        )?))
    }

    pub fn snapshot_store(&self) -> Result<SnapshotStore> {
        SnapshotStore::from_config(&self.cache_config)
    }

    /// Materializer reporting progress on stderr unless quiet
    pub async fn materializer(&self) -> Result<TableMaterializer> {
        let materializer = TableMaterializer::new(
            self.fetcher().await?,
            self.register_config.clone(),
            self.snapshot_store()?,
        );

        let progress = ProgressConfig {
            enable_progress_bars: !self.quiet,
            ..Default::default()
        };
        Ok(materializer.with_progress(progress.enrichment_bar()?))
    }
}

/// Handle the products command
pub async fn handle_products(args: TableArgs, global: &GlobalArgs) -> Result<()> {
    let start_time = Instant::now();
    let context = CommandContext::load(global).await?;
    let materializer = context.materializer().await?;

    let products = materializer.products().await?;
    info!(
        "Product table ready: {} rows in {:?}",
        products.len(),
        start_time.elapsed()
    );

    println!("💊 Products: {}", products.len());
    let with_atc = products.iter().filter(|p| p.atc_codes.is_some()).count();
    println!("   With ATC codes: {}", with_atc);

    if let Some(output) = &args.output {
        export_csv(output, &products)?;
        println!("   Exported to {}", output.display());
    }
    Ok(())
}

/// Handle the procedures command
pub async fn handle_procedures(args: TableArgs, global: &GlobalArgs) -> Result<()> {
    let start_time = Instant::now();
    let context = CommandContext::load(global).await?;
    let materializer = context.materializer().await?;

    let procedures = materializer.procedures().await?;
    info!(
        "Procedure table ready: {} rows in {:?}",
        procedures.len(),
        start_time.elapsed()
    );

    let with_decision = procedures
        .iter()
        .filter(|p| p.decisions_en.is_some())
        .count();
    println!("📄 Procedure rows: {}", procedures.len());
    println!("   With English decision: {}", with_decision);

    if let Some(output) = &args.output {
        export_csv(output, &procedures)?;
        println!("   Exported to {}", output.display());
    }
    Ok(())
}

/// Handle the crawl command
pub async fn handle_crawl(global: &GlobalArgs) -> Result<()> {
    let context = CommandContext::load(global).await?;
    let materializer = context.materializer().await?;

    let listing = materializer.listing().await?;
    println!("📋 Listing entries: {}", listing.len());
    Ok(())
}

/// Handle the product command
pub async fn handle_product(id: i64, global: &GlobalArgs) -> Result<()> {
    let context = CommandContext::load(global).await?;
    let materializer = context.materializer().await?;
    let enricher = materializer.enricher();

    let fields = enricher.top_fields(&ProductRef::from(id)).await?;
    let procedures = enricher.procedures(id).await?;

    println!("💊 Product {}", id);
    let rows = [
        ("EU number", &fields.eu_number),
        ("Name", &fields.name),
        ("INN", &fields.inn),
        ("MAH", &fields.mah),
        ("ATC", &fields.atc),
        ("EMA links", &fields.ema_links),
    ];
    for (label, value) in rows {
        println!("   {:<10} {}", label, value.as_deref().unwrap_or("-"));
    }

    println!();
    println!("📄 Procedures: {}", procedures.len());
    for procedure in &procedures {
        println!(
            "   {:<12} {:<24} {}",
            procedure.close_date.as_deref().unwrap_or("-"),
            procedure.procedure_type.as_deref().unwrap_or("-"),
            procedure.decisions_en.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

/// Handle the document command
pub async fn handle_document(url: &str, output: &Path, global: &GlobalArgs) -> Result<()> {
    let context = CommandContext::load(global).await?;
    let fetcher = context.fetcher().await?;

    let bytes = fetcher.fetch_document(url).await?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(output, &bytes).await?;

    println!(
        "📥 Saved {} ({}) to {}",
        url,
        format_bytes(bytes.len() as u64),
        output.display()
    );
    Ok(())
}

/// Handle cache management commands
pub async fn handle_cache(args: CacheArgs, global: &GlobalArgs) -> Result<()> {
    let context = CommandContext::load(global).await?;
    let cache = context.cache().await?;

    match args.action {
        CacheAction::Info => {
            let stats = cache.stats().await?;
            println!("💾 Cache Information");
            println!("===================");
            println!("Location: {}", stats.requests_dir.display());
            println!("Cached pages: {}", stats.cached_files_count);
            println!("Logged URLs: {}", stats.logged_urls);
            println!("Cache size: {}", stats.format_cache_size());
        }
        CacheAction::Log { limit } => {
            let mut entries = cache.log_entries().await?;
            entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            let shown = limit.unwrap_or(entries.len());
            for entry in entries.iter().take(shown) {
                println!(
                    "{}  {}  {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.status_code,
                    entry.url
                );
            }
            if shown < entries.len() {
                println!("... {} more", entries.len() - shown);
            }
        }
        CacheAction::Clear => {
            let removed = cache.clear().await?;
            println!("🧹 Removed {} cached files", removed);
        }
    }
    Ok(())
}

/// Handle snapshot management commands
pub async fn handle_snapshot(args: SnapshotArgs, global: &GlobalArgs) -> Result<()> {
    let context = CommandContext::load(global).await?;
    let store = context.snapshot_store()?;

    match args.action {
        SnapshotAction::List => {
            let snapshots = store.list().await?;
            if snapshots.is_empty() {
                println!("No snapshots in {}", store.dir().display());
            }
            for snapshot in snapshots {
                println!("{:<24} {}", snapshot.key, format_bytes(snapshot.size_bytes));
            }
        }
        SnapshotAction::Clear { key: Some(key) } => {
            if store.remove(&key).await? {
                println!("🗑️  Removed snapshot {}", key);
            } else {
                println!("No snapshot named {}", key);
            }
        }
        SnapshotAction::Clear { key: None } => {
            let removed = store.clear().await?;
            println!("🗑️  Removed {} snapshots", removed);
        }
    }
    Ok(())
}

/// Handle configuration commands
pub async fn handle_config(args: ConfigArgs, global: &GlobalArgs) -> Result<()> {
    match args.action {
        ConfigAction::Init { path, force } => {
            let written = AppConfig::init(path, force).await?;
            println!("📁 Created configuration file:");
            println!("   {}", written.display());
        }
        ConfigAction::Show => {
            let context = CommandContext::load(global).await?;
            print!("{}", context.config.to_toml()?);
        }
    }
    Ok(())
}

/// Write rows to a CSV file
fn export_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let csv_error = |e: csv::Error| {
        AppError::generic(format!("Failed to export {}: {}", path.display(), e))
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ProcedureRecord;
    use tempfile::TempDir;

    #[test]
    fn test_export_csv_writes_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("procedures.csv");

        export_csv(&path, &[ProcedureRecord::empty(7)]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("product_id,close_date"));
        assert!(lines.next().unwrap().starts_with("7,"));
    }

    #[tokio::test]
    async fn test_context_applies_cache_dir_flag() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        tokio::fs::write(&config_path, "[client]\nmax_retries = 2\n")
            .await
            .unwrap();

        let global = GlobalArgs {
            config: Some(config_path),
            cache_dir: Some(dir.path().join("cache")),
            ..Default::default()
        };
        let context = CommandContext::load(&global).await.unwrap();

        assert_eq!(context.client_config.max_retries, 2);
        assert_eq!(
            context.cache_config.cache_root,
            Some(dir.path().join("cache"))
        );
    }
}
