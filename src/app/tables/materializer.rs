//! Materialization of the register tables
//!
//! Three tables are built, each memoized as a snapshot:
//!
//! - `register_listing`: the flattened listing crawl
//! - `medicines_register`: listing rows merged with their detail fields
//! - `procedures`: the procedure history of every product, one row per
//!   procedure carrying the product's columns, or a single row with empty
//!   procedure columns for products without any
//!
//! Each table is read from its snapshot when one exists. Enrichment requests
//! detail pages in listing order; with `enrichment_concurrency > 1` several
//! pages are in flight at once but rows keep listing order.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::ProgressBar;
use tracing::info;

use crate::app::client::ResilientFetcher;
use crate::app::models::{ListingRecord, ProcedureRecord, ProcedureTableRow, ProductRecord};
use crate::app::register::{ConsistencyMerger, DetailPageEnricher, RegisterConfig, RegisterCrawler};
use crate::constants::snapshots;
use crate::errors::{AppError, Result};

use super::snapshot::{memoize, SnapshotStore};

/// Builds and memoizes the register tables
#[derive(Debug)]
pub struct TableMaterializer {
    crawler: RegisterCrawler,
    merger: ConsistencyMerger,
    store: SnapshotStore,
    concurrency: usize,
    progress: Option<ProgressBar>,
}

impl TableMaterializer {
    pub fn new(fetcher: Arc<ResilientFetcher>, register: RegisterConfig, store: SnapshotStore) -> Self {
        let concurrency = register.enrichment_concurrency.max(1);
        let crawler = RegisterCrawler::new(Arc::clone(&fetcher), register.clone());
        let merger = ConsistencyMerger::new(DetailPageEnricher::new(fetcher, register));
        Self {
            crawler,
            merger,
            store,
            concurrency,
            progress: None,
        }
    }

    /// Report per-product enrichment progress on `progress`
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn enricher(&self) -> &DetailPageEnricher {
        self.merger.enricher()
    }

    /// Flattened listing of every product
    pub async fn listing(&self) -> Result<Vec<ListingRecord>> {
        memoize(&self.store, snapshots::LISTING, || self.crawler.crawl()).await
    }

    /// Product table: listing rows merged with detail page fields
    ///
    /// # Errors
    ///
    /// Any consistency violation aborts the whole table; no snapshot is written.
    pub async fn products(&self) -> Result<Vec<ProductRecord>> {
        memoize(&self.store, snapshots::PRODUCTS, || self.build_products()).await
    }

    /// Procedure table covering every product of the product table
    pub async fn procedures(&self) -> Result<Vec<ProcedureTableRow>> {
        memoize(&self.store, snapshots::PROCEDURES, || self.build_procedures()).await
    }

    async fn build_products(&self) -> Result<Vec<ProductRecord>> {
        let listing = self.listing().await?;
        info!("Enriching {} products", listing.len());
        self.start_progress(listing.len(), "products");

        let products: Vec<ProductRecord> = stream::iter(listing)
            .map(|row| self.merger.merge(row))
            .buffered(self.concurrency)
            .inspect_ok(|_| self.tick())
            .try_collect()
            .await?;

        self.finish_progress();
        Ok(products)
    }

    async fn build_procedures(&self) -> Result<Vec<ProcedureTableRow>> {
        let products = self.products().await?;
        info!("Collecting procedures of {} products", products.len());
        self.start_progress(products.len(), "procedures");

        let enricher = self.merger.enricher();
        let per_product: Vec<Vec<ProcedureTableRow>> = stream::iter(products)
            .map(|product| async move {
                let mut procedures = enricher.procedures(product.id).await?;
                if procedures.is_empty() {
                    procedures.push(ProcedureRecord::empty(product.id));
                }
                Ok::<_, AppError>(
                    procedures
                        .into_iter()
                        .map(|procedure| ProcedureTableRow::new(&product, procedure))
                        .collect(),
                )
            })
            .buffered(self.concurrency)
            .inspect_ok(|_| self.tick())
            .try_collect()
            .await?;

        self.finish_progress();
        Ok(per_product.into_iter().flatten().collect())
    }

    fn start_progress(&self, len: usize, stage: &'static str) {
        if let Some(progress) = &self.progress {
            progress.reset();
            progress.set_length(len as u64);
            progress.set_message(stage);
        }
    }

    fn tick(&self) {
        if let Some(progress) = &self.progress {
            progress.inc(1);
        }
    }

    fn finish_progress(&self) {
        if let Some(progress) = &self.progress {
            progress.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::cache::{CacheConfig, ContentCache};
    use crate::app::client::ClientConfig;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LISTING_PAGE: &str = r#"<script>var dataSet = [
  {"eu_num": {"display": "EU/1/00/001", "pre": "h", "id": 1}, "name": "Alpha", "inn": "alfa", "indication": "A", "company": "Acme"},
  {"eu_num": {"display": "EU/1/00/002", "pre": "h", "id": 2}, "name": "Beta", "inn": "beta", "indication": "B", "company": "Acme"}
];</script>"#;

    const DETAIL_ONE: &str = r#"<script>
var dataSet_product_information = [{"type": "name", "value": "Alpha"}, {"type": "mah", "value": "Acme Pharma"}];
var dataSet_proc = [
  {"id": "C1", "type": "Initial", "decision": {"number": "C(2020)1", "date": "2020-01-02"}, "files_dec": [{"code": "en"}]},
  {"id": "C2", "type": "Variation"}
];
</script>"#;

    const DETAIL_TWO: &str = r#"<script>
var dataSet_product_information = [{"type": "name", "value": "Beta"}];
</script>"#;

    async fn mount(server: &MockServer, page_path: &str, status: u16, body: &str, times: u64) {
        Mock::given(method("GET"))
            .and(path(page_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body.to_string()))
            .expect(times)
            .mount(server)
            .await;
    }

    async fn create_materializer(server: &MockServer, root: &TempDir, concurrency: usize) -> TableMaterializer {
        let cache_config = CacheConfig::with_cache_root(root.path().to_path_buf());
        let cache = ContentCache::new(&cache_config).await.unwrap();
        let fetcher =
            Arc::new(ResilientFetcher::new(ClientConfig::default(), Arc::new(cache)).unwrap());
        let register = RegisterConfig {
            enrichment_concurrency: concurrency,
            ..RegisterConfig::with_base_url(server.uri())
        };
        TableMaterializer::new(fetcher, register, SnapshotStore::from_config(&cache_config).unwrap())
    }

    async fn mount_register(server: &MockServer) {
        mount(server, "/html/reg_hum_act.htm", 200, LISTING_PAGE, 1).await;
        mount(server, "/html/reg_hum_act2.htm", 404, "", 1).await;
        mount(server, "/html/h001.htm", 200, DETAIL_ONE, 1).await;
        mount(server, "/html/h002.htm", 200, DETAIL_TWO, 1).await;
    }

    #[tokio::test]
    async fn test_products_second_call_makes_no_requests() {
        let server = MockServer::start().await;
        mount_register(&server).await;
        let root = TempDir::new().unwrap();
        let materializer = create_materializer(&server, &root, 1).await;

        let first = materializer.products().await.unwrap();
        let requests_after_first = server.received_requests().await.unwrap().len();
        let second = materializer.products().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            server.received_requests().await.unwrap().len(),
            requests_after_first
        );
        assert_eq!(first[0].marketing_authorisation_holder.as_deref(), Some("Acme Pharma"));
        assert!(first[1].marketing_authorisation_holder.is_none());
    }

    #[tokio::test]
    async fn test_procedures_explode_per_product() {
        let server = MockServer::start().await;
        mount_register(&server).await;
        let root = TempDir::new().unwrap();
        let materializer = create_materializer(&server, &root, 4).await;

        let procedures = materializer.procedures().await.unwrap();
        let ids: Vec<_> = procedures.iter().map(|p| p.product_id).collect();
        assert_eq!(ids, [1, 1, 2]);
        assert!(procedures[0].decisions_en.is_some());
        assert_eq!(procedures[1].procedure_type.as_deref(), Some("Variation"));
        assert_eq!(procedures[2].procedure(), ProcedureRecord::empty(2));

        assert_eq!(procedures[0].name, "Alpha");
        assert_eq!(procedures[1].marketing_authorisation_holder.as_deref(), Some("Acme Pharma"));
        assert_eq!(procedures[2].name, "Beta");
        assert_eq!(procedures[2].eu_number, "EU/1/00/002");
        assert_eq!(procedures[2].company, "Acme");

        assert!(materializer.store().exists(snapshots::PRODUCTS).unwrap());
        assert!(materializer.store().exists(snapshots::PROCEDURES).unwrap());
    }

    #[tokio::test]
    async fn test_consistency_violation_aborts_products() {
        let server = MockServer::start().await;
        mount(&server, "/html/reg_hum_act.htm", 200, LISTING_PAGE, 1).await;
        mount(&server, "/html/reg_hum_act2.htm", 404, "", 1).await;
        mount(&server, "/html/h001.htm", 200, DETAIL_TWO, 1).await;

        let root = TempDir::new().unwrap();
        let materializer = create_materializer(&server, &root, 1).await;

        let err = materializer.products().await.unwrap_err();
        assert!(matches!(err, AppError::ConsistencyViolation { product_id: 1, .. }));
        assert!(!materializer.store().exists(snapshots::PRODUCTS).unwrap());
        assert!(materializer.store().exists(snapshots::LISTING).unwrap());
    }
}
