//! Detail page parsing
//!
//! A product's detail page embeds two arrays: the product information block
//! (tagged top-level fields) and the procedure history. Both are read from the
//! same cached page.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::app::client::ResilientFetcher;
use crate::app::embedded::extract_array;
use crate::app::models::{value_as_text, DetailFields, FieldTag, ProcedureRecord, ProductRef};
use crate::constants::variables;
use crate::errors::Result;

use super::config::RegisterConfig;

const ATC_LEVEL: &str = "5";
const ENGLISH: &str = "en";
const JOIN_SEPARATOR: &str = ";";

#[derive(Debug, Deserialize)]
struct RawInformationItem {
    #[serde(rename = "type")]
    tag: String,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    meta: Value,
}

#[derive(Debug, Deserialize)]
struct RawProcedure {
    id: Value,
    #[serde(default)]
    closed: Option<Value>,
    #[serde(default, rename = "type")]
    procedure_type: Option<Value>,
    #[serde(default)]
    ema_number: Option<Value>,
    #[serde(default)]
    decision: Option<RawDecision>,
    #[serde(default)]
    files_dec: Option<Vec<RawFile>>,
    #[serde(default)]
    files_anx: Option<Vec<RawFile>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDecision {
    #[serde(default)]
    number: Option<Value>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    #[serde(default)]
    code: Option<String>,
}

fn has_english(files: &Option<Vec<RawFile>>) -> bool {
    files
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|f| f.code.as_deref() == Some(ENGLISH))
}

/// Level-5 codes from the nested ATC metadata, in source order
fn level5_codes(meta: &Value) -> String {
    meta.as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_array)
        .flatten()
        .filter(|level| level.get("level").and_then(Value::as_str) == Some(ATC_LEVEL))
        .filter_map(|level| level.get("code").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join(JOIN_SEPARATOR)
}

fn link_urls(meta: &Value) -> String {
    meta.as_array()
        .into_iter()
        .flatten()
        .filter_map(|link| link.get("url").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join(JOIN_SEPARATOR)
}

/// Fetches and parses product detail pages
#[derive(Debug, Clone)]
pub struct DetailPageEnricher {
    fetcher: Arc<ResilientFetcher>,
    config: RegisterConfig,
}

impl DetailPageEnricher {
    pub fn new(fetcher: Arc<ResilientFetcher>, config: RegisterConfig) -> Self {
        Self { fetcher, config }
    }

    async fn page(&self, product: &ProductRef) -> Result<String> {
        let url = self.config.detail_url(product);
        Ok(self.fetcher.get(&url).await?.text())
    }

    /// Tagged top-level fields of a product's detail page
    ///
    /// A page without the product information array yields empty fields.
    /// Unknown tags are logged and skipped.
    pub async fn top_fields(&self, product: &ProductRef) -> Result<DetailFields> {
        let html = self.page(product).await?;
        let Some(items) = extract_array::<RawInformationItem>(
            &html,
            variables::PRODUCT_INFORMATION,
            true,
        )?
        else {
            debug!("No product information on detail page {}", product);
            return Ok(DetailFields::default());
        };

        let mut fields = DetailFields::default();
        for item in items {
            match FieldTag::from(item.tag.as_str()) {
                FieldTag::EuNumber => fields.eu_number = value_as_text(&item.value),
                FieldTag::Name => fields.name = value_as_text(&item.value),
                FieldTag::Inn => fields.inn = value_as_text(&item.value),
                FieldTag::Indication => fields.indication = value_as_text(&item.value),
                FieldTag::Mah => fields.mah = value_as_text(&item.value),
                FieldTag::Atc => fields.atc = Some(level5_codes(&item.meta)),
                FieldTag::EmaLinks => fields.ema_links = Some(link_urls(&item.meta)),
                FieldTag::OrphanLink => {}
                FieldTag::Unknown(tag) => {
                    warn!("Encountered unknown type: {}, skipping", tag);
                }
            }
        }

        Ok(fields)
    }

    /// Procedure history of a product
    ///
    /// Returns an empty list when the page has no procedure array.
    pub async fn procedures(&self, product_id: i64) -> Result<Vec<ProcedureRecord>> {
        let product = ProductRef::from(product_id);
        let html = self.page(&product).await?;
        let Some(entries) = extract_array::<RawProcedure>(&html, variables::PROCEDURES, false)?
        else {
            debug!("No procedures on detail page {}", product);
            return Ok(Vec::new());
        };

        Ok(entries
            .into_iter()
            .map(|entry| self.procedure_record(product_id, entry))
            .collect())
    }

    fn procedure_record(&self, product_id: i64, entry: RawProcedure) -> ProcedureRecord {
        let decision = entry.decision.unwrap_or_default();
        let mut record = ProcedureRecord {
            product_id,
            close_date: entry.closed.as_ref().and_then(value_as_text),
            procedure_type: entry.procedure_type.as_ref().and_then(value_as_text),
            ema_number: entry.ema_number.as_ref().and_then(value_as_text),
            decision_number: decision.number.as_ref().and_then(value_as_text),
            ..ProcedureRecord::empty(product_id)
        };

        let Some(date) = decision.date.filter(|d| !d.is_empty()) else {
            return record;
        };
        let procedure_id = value_as_text(&entry.id).unwrap_or_default();
        let year = date.split('-').next().unwrap_or_default();
        let digits: String = date.chars().filter(char::is_ascii_digit).collect();
        let base = self.config.document_base(year, &digits, &procedure_id);

        if has_english(&entry.files_dec) {
            record.decisions_en = Some(format!("{}/dec_{}_en.pdf", base, procedure_id));
        }
        if has_english(&entry.files_anx) {
            let annex = format!("{}/anx_{}_en.pdf", base, procedure_id);
            record.summary_en = Some(annex.clone());
            record.annexes_en = Some(annex);
        }

        record
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

    async fn create_enricher(server: &MockServer) -> (TempDir, DetailPageEnricher) {
        let temp_dir = TempDir::new().unwrap();
        let cache = ContentCache::new(&CacheConfig::with_cache_root(temp_dir.path().to_path_buf()))
            .await
            .unwrap();
        let fetcher =
            Arc::new(ResilientFetcher::new(ClientConfig::default(), Arc::new(cache)).unwrap());
        let enricher = DetailPageEnricher::new(fetcher, RegisterConfig::with_base_url(server.uri()));
        (temp_dir, enricher)
    }

    async fn serve_detail(server: &MockServer, page_path: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(page_path))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
            .expect(1)
            .mount(server)
            .await;
    }

    const DETAIL_PAGE: &str = r#"<html><script>
var dataSet_product_information = [
  {"type": "eu_num", "value": "EU/1/00/001"},
  {"type": "name", "value": "Alpha"},
  {"type": "inn", "value": "alphamab"},
  {"type": "indication", "value": "Some indication"},
  {"type": "mah", "value": "Acme Pharma"},
  {"type": "atc", "meta": [
      [{"level": "3", "code": "L01X"}, {"level": "5", "code": "L01XC01"}],
      [{"level": "5", "code": "L01XC02"}]
  ]},
  {"type": "ema_links", "meta": [{"url": "https://ema/a"}, {"url": "https://ema/b"}]},
  {"type": "orphan_links", "meta": [{"url": "https://ema/orphan"}]},
  {"type": "paediatric_plan", "value": "yes"}
];
var dataSet_proc = [
  {"id": "C123", "closed": "2020-03-20", "type": "Variation", "ema_number": "EMEA/H/C/1",
   "decision": {"number": "C(2020)1", "date": "2020-03-15"},
   "files_dec": [{"code": "de"}, {"code": "en"}], "files_anx": [{"code": "fr"}]},
  {"id": "P9", "closed": null, "type": "Renewal",
   "decision": {"number": "C(2021)9", "date": "2021-11-02"},
   "files_dec": [{"code": "en"}], "files_anx": [{"code": "en"}]},
  {"id": "X1", "type": "Transfer"}
];
</script></html>"#;

    #[tokio::test]
    async fn test_top_fields() {
        let server = MockServer::start().await;
        serve_detail(&server, "/html/h001.htm", DETAIL_PAGE).await;
        let (_dir, enricher) = create_enricher(&server).await;

        let fields = enricher.top_fields(&ProductRef::from(1)).await.unwrap();
        assert_eq!(fields.eu_number.as_deref(), Some("EU/1/00/001"));
        assert_eq!(fields.name.as_deref(), Some("Alpha"));
        assert_eq!(fields.mah.as_deref(), Some("Acme Pharma"));
        assert_eq!(fields.atc.as_deref(), Some("L01XC01;L01XC02"));
        assert_eq!(fields.ema_links.as_deref(), Some("https://ema/a;https://ema/b"));
    }

    #[tokio::test]
    async fn test_procedure_document_urls() {
        let server = MockServer::start().await;
        serve_detail(&server, "/html/h001.htm", DETAIL_PAGE).await;
        let (_dir, enricher) = create_enricher(&server).await;
        let base = server.uri();

        let procedures = enricher.procedures(1).await.unwrap();
        assert_eq!(procedures.len(), 3);

        let first = &procedures[0];
        assert_eq!(first.product_id, 1);
        assert_eq!(first.close_date.as_deref(), Some("2020-03-20"));
        assert_eq!(first.decision_number.as_deref(), Some("C(2020)1"));
        assert_eq!(
            first.decisions_en.as_deref(),
            Some(format!("{}/2020/20200315C123/dec_C123_en.pdf", base).as_str())
        );
        assert!(first.annexes_en.is_none());
        assert!(first.summary_en.is_none());

        let second = &procedures[1];
        assert!(second.close_date.is_none());
        let annex = format!("{}/2021/20211102P9/anx_P9_en.pdf", base);
        assert_eq!(second.annexes_en.as_deref(), Some(annex.as_str()));
        assert_eq!(second.summary_en, second.annexes_en);

        let third = &procedures[2];
        assert_eq!(third.procedure_type.as_deref(), Some("Transfer"));
        assert!(third.decisions_en.is_none());
    }

    #[tokio::test]
    async fn test_page_without_arrays() {
        let server = MockServer::start().await;
        serve_detail(&server, "/html/h1234.htm", "<html>empty</html>").await;
        let (_dir, enricher) = create_enricher(&server).await;

        assert!(enricher
            .top_fields(&ProductRef::from(1234))
            .await
            .unwrap()
            .is_empty());
        assert!(enricher.procedures(1234).await.unwrap().is_empty());
    }

    #[test]
    fn test_level5_codes_keep_source_order() {
        let meta = serde_json::json!([
            [{"level": "5", "code": "B"}, {"level": "3", "code": "X"}],
            [{"level": "4", "code": "Y"}, {"level": "5", "code": "A"}]
        ]);
        assert_eq!(level5_codes(&meta), "B;A");
        assert_eq!(level5_codes(&Value::Null), "");
    }
}
