//! Data models for MedReg Fetcher
//!
//! This module defines the records that flow through the pipeline: the
//! flattened listing row, the merged product row, the procedure row, the typed
//! detail-page field set and the closed set of detail field tags.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::constants::register;
use crate::errors::{ParseError, ParseResult};

/// Markup and encoding artifacts replaced by a space in indication texts
const INDICATION_ARTIFACTS: [&str; 5] = ["<br/>", "<br>", "<u>", "</u>", "â€¢ "];

/// Reference to a product's detail page
///
/// Small integer identifiers are zero-padded to three digits in the page name
/// (`h001.htm`); anything else is used verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductRef {
    /// Numeric register identifier
    Index(i64),
    /// Identifier used as-is
    Raw(String),
}

impl fmt::Display for ProductRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductRef::Index(idx) if (0..register::PADDED_ID_LIMIT).contains(idx) => {
                write!(f, "{:03}", idx)
            }
            ProductRef::Index(idx) => write!(f, "{}", idx),
            ProductRef::Raw(raw) => f.write_str(raw),
        }
    }
}

impl From<i64> for ProductRef {
    fn from(idx: i64) -> Self {
        ProductRef::Index(idx)
    }
}

impl From<&str> for ProductRef {
    fn from(raw: &str) -> Self {
        ProductRef::Raw(raw.to_string())
    }
}

/// Flattened listing entry (one row per product on the listing pages)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Register identifier
    pub id: i64,
    /// Display form of the EU number (e.g. `EU/1/96/007`)
    pub eu_number: String,
    /// Register prefix of the EU number
    pub pre: String,
    /// Product name
    pub name: String,
    /// International non-proprietary name
    pub inn: String,
    /// Therapeutic indication, markup removed
    pub indication: String,
    /// Company as shown on the listing
    pub company: String,
}

/// Product row after merging listing and detail-page fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: i64,
    pub eu_number: String,
    pub pre: String,
    pub name: String,
    pub inn: String,
    pub indication: String,
    pub company: String,
    /// Marketing authorisation holder from the detail page
    pub marketing_authorisation_holder: Option<String>,
    /// Level-5 ATC codes, `;`-joined
    pub atc_codes: Option<String>,
    /// EMA links, `;`-joined
    pub ema_links: Option<String>,
}

/// One row of a product's procedure history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureRecord {
    /// Register identifier of the owning product
    pub product_id: i64,
    pub close_date: Option<String>,
    pub procedure_type: Option<String>,
    pub ema_number: Option<String>,
    pub decision_number: Option<String>,
    /// English decision document
    pub decisions_en: Option<String>,
    /// English annex document
    pub annexes_en: Option<String>,
    /// Product characteristics summary; lives inside the annex document
    pub summary_en: Option<String>,
}

impl ProcedureRecord {
    /// Row standing in for a product without any procedure
    pub fn empty(product_id: i64) -> Self {
        Self {
            product_id,
            ..Default::default()
        }
    }
}

/// Row of the procedure table
///
/// A procedure joined with the columns of its product, so the table can be
/// read on its own. Placeholder procedures keep every procedure column empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureTableRow {
    pub product_id: i64,
    pub eu_number: String,
    pub pre: String,
    pub name: String,
    pub inn: String,
    pub indication: String,
    pub company: String,
    pub marketing_authorisation_holder: Option<String>,
    pub atc_codes: Option<String>,
    pub ema_links: Option<String>,
    pub close_date: Option<String>,
    pub procedure_type: Option<String>,
    pub ema_number: Option<String>,
    pub decision_number: Option<String>,
    pub decisions_en: Option<String>,
    pub annexes_en: Option<String>,
    pub summary_en: Option<String>,
}

impl ProcedureTableRow {
    /// Attach `procedure` to the columns of `product`
    pub fn new(product: &ProductRecord, procedure: ProcedureRecord) -> Self {
        Self {
            product_id: product.id,
            eu_number: product.eu_number.clone(),
            pre: product.pre.clone(),
            name: product.name.clone(),
            inn: product.inn.clone(),
            indication: product.indication.clone(),
            company: product.company.clone(),
            marketing_authorisation_holder: product.marketing_authorisation_holder.clone(),
            atc_codes: product.atc_codes.clone(),
            ema_links: product.ema_links.clone(),
            close_date: procedure.close_date,
            procedure_type: procedure.procedure_type,
            ema_number: procedure.ema_number,
            decision_number: procedure.decision_number,
            decisions_en: procedure.decisions_en,
            annexes_en: procedure.annexes_en,
            summary_en: procedure.summary_en,
        }
    }

    /// The procedure part of the row
    pub fn procedure(&self) -> ProcedureRecord {
        ProcedureRecord {
            product_id: self.product_id,
            close_date: self.close_date.clone(),
            procedure_type: self.procedure_type.clone(),
            ema_number: self.ema_number.clone(),
            decision_number: self.decision_number.clone(),
            decisions_en: self.decisions_en.clone(),
            annexes_en: self.annexes_en.clone(),
            summary_en: self.summary_en.clone(),
        }
    }
}

/// Tag of an entry in the detail page's product information array
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTag {
    EuNumber,
    Name,
    Inn,
    Indication,
    Mah,
    Atc,
    EmaLinks,
    OrphanLink,
    Unknown(String),
}

impl From<&str> for FieldTag {
    fn from(tag: &str) -> Self {
        match tag {
            "eu_num" => FieldTag::EuNumber,
            "name" => FieldTag::Name,
            "inn" => FieldTag::Inn,
            "indication" => FieldTag::Indication,
            "mah" => FieldTag::Mah,
            "atc" => FieldTag::Atc,
            "ema_links" => FieldTag::EmaLinks,
            "orphan_links" => FieldTag::OrphanLink,
            other => FieldTag::Unknown(other.to_string()),
        }
    }
}

/// Typed top-level fields of a detail page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetailFields {
    pub eu_number: Option<String>,
    pub name: Option<String>,
    pub inn: Option<String>,
    pub indication: Option<String>,
    pub mah: Option<String>,
    pub atc: Option<String>,
    pub ema_links: Option<String>,
}

impl DetailFields {
    /// True if the page yielded no recognised field
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Strip listing markup from an indication and trim it
pub fn normalize_indication(raw: &str) -> String {
    INDICATION_ARTIFACTS
        .iter()
        .fold(raw.to_string(), |text, artifact| text.replace(artifact, " "))
        .trim()
        .to_string()
}

/// Read an identifier that may be a JSON number or a numeric string
pub fn parse_identifier(value: &Value) -> ParseResult<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ParseError::InvalidIdentifier {
        value: value.to_string(),
    })
}

/// Render a scalar JSON value as text; `null` is absent
pub fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Deserialize a string field where the source may send `null`
pub fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
