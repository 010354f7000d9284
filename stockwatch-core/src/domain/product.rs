//! Product feed types and match filtering
//!
//! Mirrors the storefront `products.json` payload. Only the fields the
//! poller reads are modelled; anything else in the payload is ignored.

use serde::{Deserialize, Deserializer, Serialize};

/// Top-level product feed payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductFeed {
    pub products: Vec<Product>,
}

/// A product listed in the feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub product_type: String,
    pub title: String,
    pub handle: String,
    pub variants: Vec<Variant>,
}

/// A purchasable variant (size, colour, ...) of a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    /// Price as the feed spells it. Numeric prices keep their JSON text.
    #[serde(deserialize_with = "price_text")]
    pub price: String,
    pub available: bool,
}

/// What the poller is looking for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criteria {
    pub product_type: String,
    pub price: String,
}

/// A product that satisfied the criteria during a poll cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMatch {
    pub title: String,
    pub handle: String,
    /// True if any variant of the product is available
    pub available: bool,
}

impl Product {
    /// True if any variant can be bought
    pub fn is_available(&self) -> bool {
        self.variants.iter().any(|v| v.available)
    }

    /// Type equals and at least one variant has exactly the wanted price
    pub fn matches(&self, criteria: &Criteria) -> bool {
        self.product_type == criteria.product_type
            && self.variants.iter().any(|v| v.price == criteria.price)
    }
}

impl ProductFeed {
    /// Selects matching products in feed order
    pub fn select_matches(&self, criteria: &Criteria) -> Vec<ProductMatch> {
        self.products
            .iter()
            .filter(|p| p.matches(criteria))
            .map(|p| ProductMatch {
                title: p.title.clone(),
                handle: p.handle.clone(),
                available: p.is_available(),
            })
            .collect()
    }
}

fn price_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawPrice::deserialize(deserializer)? {
        RawPrice::Text(s) => s,
        RawPrice::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feed(value: serde_json::Value) -> ProductFeed {
        serde_json::from_value(value).unwrap()
    }

    fn tee_criteria() -> Criteria {
        Criteria {
            product_type: "Tee".to_string(),
            price: "20.00".to_string(),
        }
    }

    #[test]
    fn test_selects_type_and_exact_price() {
        let feed = feed(json!({
            "products": [
                {
                    "product_type": "Tee", "title": "Classic Tee", "handle": "classic-tee",
                    "variants": [
                        { "price": "25.00", "available": false },
                        { "price": "20.00", "available": true }
                    ]
                },
                {
                    "product_type": "Bottoms", "title": "Shorts", "handle": "shorts",
                    "variants": [{ "price": "20.00", "available": true }]
                },
                {
                    "product_type": "Tee", "title": "Pricey Tee", "handle": "pricey-tee",
                    "variants": [{ "price": "20.0", "available": true }]
                }
            ]
        }));

        let matches = feed.select_matches(&tee_criteria());
        assert_eq!(
            matches,
            vec![ProductMatch {
                title: "Classic Tee".to_string(),
                handle: "classic-tee".to_string(),
                available: true,
            }]
        );
    }

    #[test]
    fn test_availability_is_any_variant() {
        let feed = feed(json!({
            "products": [{
                "product_type": "Tee", "title": "Sold Tee", "handle": "sold-tee",
                "variants": [
                    { "price": "20.00", "available": false },
                    { "price": "22.00", "available": false }
                ]
            }, {
                "product_type": "Tee", "title": "Partly Tee", "handle": "partly-tee",
                "variants": [
                    { "price": "20.00", "available": false },
                    { "price": "22.00", "available": true }
                ]
            }]
        }));

        let matches = feed.select_matches(&tee_criteria());
        assert_eq!(matches.len(), 2);
        assert!(!matches[0].available);
        assert!(matches[1].available);
    }

    #[test]
    fn test_numeric_price_keeps_json_text() {
        let feed = feed(json!({
            "products": [{
                "product_type": "Tee", "title": "Num Tee", "handle": "num-tee",
                "variants": [{ "price": 20.5, "available": true }]
            }]
        }));
        assert_eq!(feed.products[0].variants[0].price, "20.5");

        let criteria = Criteria {
            product_type: "Tee".to_string(),
            price: "20.5".to_string(),
        };
        assert_eq!(feed.select_matches(&criteria).len(), 1);
    }

    #[test]
    fn test_ignores_unknown_fields() {
        let feed = feed(json!({
            "products": [{
                "id": 1, "vendor": "WWD",
                "product_type": "Tee", "title": "T", "handle": "t",
                "variants": [{ "id": 9, "sku": "X", "price": "20.00", "available": true }]
            }]
        }));
        assert_eq!(feed.select_matches(&tee_criteria()).len(), 1);
    }

    #[test]
    fn test_missing_fields_fail_to_parse() {
        let result: Result<ProductFeed, _> =
            serde_json::from_value(json!({ "products": [{ "title": "No type" }] }));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_feed_has_no_matches() {
        let feed = feed(json!({ "products": [] }));
        assert!(feed.select_matches(&tee_criteria()).is_empty());
    }
}
