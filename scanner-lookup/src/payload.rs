//! Wire format of the product API response.

use scanner_core::{OriginSources, ProductIdentifier, ProductRecord};
use serde::Deserialize;

/// Top-level response body. Only the `product` object matters here.
#[derive(Debug, Deserialize)]
pub(crate) struct ProductResponse {
    #[serde(default)]
    pub(crate) product: Option<ProductPayload>,
}

/// The subset of product fields used to build a record.
#[derive(Debug, Deserialize)]
pub(crate) struct ProductPayload {
    product_name: Option<String>,
    image_front_url: Option<String>,
    origins: Option<String>,
    manufacturing_places: Option<String>,
    countries_tags: Option<Vec<String>>,
}

impl ProductPayload {
    pub(crate) fn into_record(self, identifier: ProductIdentifier) -> ProductRecord {
        let countries_tags = self.countries_tags.unwrap_or_default();
        ProductRecord::new(
            identifier,
            self.product_name.as_deref(),
            self.image_front_url.as_deref(),
            &OriginSources {
                origins: self.origins.as_deref(),
                manufacturing_places: self.manufacturing_places.as_deref(),
                countries_tags: &countries_tags,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanner_core::{DecodeEvent, ScanFilter, NO_NAME_FALLBACK};
    use serde_json::json;

    fn id(code: &str) -> ProductIdentifier {
        ScanFilter::accept(&DecodeEvent::decoded(code)).expect("valid")
    }

    fn record_from(body: &serde_json::Value) -> Option<ProductRecord> {
        let response: ProductResponse = serde_json::from_value(body.clone()).expect("parse");
        response.product.map(|p| p.into_record(id("123")))
    }

    #[test]
    fn test_country_tag_fallback() {
        let record = record_from(&json!({
            "product": {
                "product_name": "Cocoa",
                "origins": "",
                "manufacturing_places": "",
                "countries_tags": ["en:france"]
            }
        }))
        .expect("product");
        assert_eq!(record.name(), "Cocoa");
        assert_eq!(record.origin_label(), Some("France"));
    }

    #[test]
    fn test_origins_precede_tags() {
        let record = record_from(&json!({
            "product": {
                "product_name": "Tea",
                "origins": "India, Sri Lanka",
                "countries_tags": ["en:united-kingdom"]
            }
        }))
        .expect("product");
        assert_eq!(record.origin_label(), Some("India, Sri Lanka"));
    }

    #[test]
    fn test_missing_product_is_none() {
        assert!(record_from(&json!({ "code": "123", "status": "failure" })).is_none());
        assert!(record_from(&json!({ "product": null })).is_none());
    }

    #[test]
    fn test_sparse_product() {
        let record = record_from(&json!({
            "product": { "countries_tags": null, "countries": "France" }
        }))
        .expect("product");
        assert_eq!(record.name(), NO_NAME_FALLBACK);
        assert_eq!(record.image_url(), None);
        assert_eq!(record.origin_label(), None);
    }

    #[test]
    fn test_wrong_field_type_is_a_parse_error() {
        let result: Result<ProductResponse, _> =
            serde_json::from_value(json!({ "product": { "product_name": 42 } }));
        assert!(result.is_err());
    }
}
