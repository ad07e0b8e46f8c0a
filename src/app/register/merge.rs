//! Listing and detail page reconciliation

use tracing::debug;

use crate::app::models::{DetailFields, ListingRecord, ProductRecord, ProductRef};
use crate::errors::{AppError, Result};

use super::detail::DetailPageEnricher;

/// Merges a listing row with its detail page fields
#[derive(Debug, Clone)]
pub struct ConsistencyMerger {
    enricher: DetailPageEnricher,
}

impl ConsistencyMerger {
    pub fn new(enricher: DetailPageEnricher) -> Self {
        Self { enricher }
    }

    pub fn enricher(&self) -> &DetailPageEnricher {
        &self.enricher
    }

    /// Fetch the product's detail fields and merge them into the listing row
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConsistencyViolation` when the detail page disagrees
    /// with the listing on name, EU number or INN.
    pub async fn merge(&self, listing: ListingRecord) -> Result<ProductRecord> {
        let fields = self.enricher.top_fields(&ProductRef::from(listing.id)).await?;
        debug!("Merging detail fields for product {}", listing.id);
        merge_fields(listing, fields)
    }
}

/// Merge already fetched detail fields into a listing row
pub fn merge_fields(listing: ListingRecord, fields: DetailFields) -> Result<ProductRecord> {
    let checks = [
        ("name", &listing.name, &fields.name),
        ("eu_number", &listing.eu_number, &fields.eu_number),
        ("inn", &listing.inn, &fields.inn),
    ];
    for (field, listed, detail) in checks {
        if let Some(detail) = detail {
            if detail != listed {
                return Err(AppError::ConsistencyViolation {
                    product_id: listing.id,
                    field,
                    listing: listed.clone(),
                    detail: detail.clone(),
                });
            }
        }
    }

    Ok(ProductRecord {
        id: listing.id,
        eu_number: listing.eu_number,
        pre: listing.pre,
        name: listing.name,
        inn: listing.inn,
        indication: listing.indication,
        company: listing.company,
        marketing_authorisation_holder: fields.mah,
        atc_codes: fields.atc,
        ema_links: fields.ema_links,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> ListingRecord {
        ListingRecord {
            id: 1,
            eu_number: "EU/1/00/001".to_string(),
            pre: "h".to_string(),
            name: "X".to_string(),
            inn: "xinn".to_string(),
            indication: "Listing indication".to_string(),
            company: "Acme".to_string(),
        }
    }

    #[test]
    fn test_name_mismatch_is_a_violation() {
        let fields = DetailFields {
            name: Some("Y".to_string()),
            mah: Some("Acme Pharma".to_string()),
            ..Default::default()
        };

        let err = merge_fields(listing(), fields).unwrap_err();
        match err {
            AppError::ConsistencyViolation {
                product_id,
                field,
                listing,
                detail,
            } => {
                assert_eq!(product_id, 1);
                assert_eq!(field, "name");
                assert_eq!(listing, "X");
                assert_eq!(detail, "Y");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_detail_indication_is_discarded() {
        let fields = DetailFields {
            name: Some("X".to_string()),
            eu_number: Some("EU/1/00/001".to_string()),
            indication: Some("Detail indication".to_string()),
            mah: Some("Acme Pharma".to_string()),
            atc: Some("L01XC01".to_string()),
            ..Default::default()
        };

        let product = merge_fields(listing(), fields).unwrap();
        assert_eq!(product.indication, "Listing indication");
        assert_eq!(product.marketing_authorisation_holder.as_deref(), Some("Acme Pharma"));
        assert_eq!(product.atc_codes.as_deref(), Some("L01XC01"));
        assert!(product.ema_links.is_none());
    }

    #[test]
    fn test_absent_detail_fields_are_not_compared() {
        let product = merge_fields(listing(), DetailFields::default()).unwrap();
        assert_eq!(product.name, "X");
        assert!(product.marketing_authorisation_holder.is_none());
    }

    #[test]
    fn test_inn_mismatch_is_a_violation() {
        let fields = DetailFields {
            inn: Some("other".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            merge_fields(listing(), fields),
            Err(AppError::ConsistencyViolation { field: "inn", .. })
        ));
    }
}
