//! Job domain types
//!
//! A job is one polling process watching one (site, product type, price,
//! recipient) combination. Jobs are addressed by a [`JobKey`] derived from
//! those four parameters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Separator between the escaped components of a job key
const KEY_SEPARATOR: char = '_';

/// Parameters a poller is started with
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobSpec {
    pub site: String,
    pub product_type: String,
    pub price: String,
    pub recipient: String,
}

/// Registry key identifying a job
///
/// Each component is percent-escaped (every byte outside `[A-Za-z0-9.@+-]`)
/// before joining with `_`, so the separator never occurs inside a component.
/// Keys are therefore unique per spec and usable as file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobKey(String);

/// A running job as recorded in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub pid: u32,
    #[serde(flatten)]
    pub spec: JobSpec,
    pub started_at: DateTime<Utc>,
}

impl JobSpec {
    pub fn new(
        site: impl Into<String>,
        product_type: impl Into<String>,
        price: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            site: site.into(),
            product_type: product_type.into(),
            price: price.into(),
            recipient: recipient.into(),
        }
    }

    /// Derives the registry key for this spec
    pub fn key(&self) -> JobKey {
        let parts = [
            self.site.as_str(),
            self.product_type.as_str(),
            self.price.as_str(),
            self.recipient.as_str(),
        ];
        let encoded: Vec<String> = parts.iter().map(|p| escape(p)).collect();
        JobKey(encoded.join(&KEY_SEPARATOR.to_string()))
    }
}

impl std::fmt::Display for JobSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at ${} on {} for {}",
            self.product_type, self.price, self.site, self.recipient
        )
    }
}

impl JobKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn is_plain(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'@' | b'+' | b'-')
}

fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for b in input.bytes() {
        if is_plain(b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tee() -> JobSpec {
        JobSpec::new("waterwhendry", "Tee", "20.00", "me@example.com")
    }

    #[test]
    fn test_plain_key_is_readable() {
        assert_eq!(tee().key().as_str(), "waterwhendry_Tee_20.00_me@example.com");
    }

    #[test]
    fn test_key_escapes_reserved_bytes() {
        let spec = JobSpec::new("waterwhendry", "Long Sleeve/Tee", "1_000%", "a_b@example.com");
        assert_eq!(
            spec.key().as_str(),
            "waterwhendry_Long%20Sleeve%2FTee_1%5F000%25_a%5Fb@example.com"
        );
    }

    #[test]
    fn test_escape_is_injective_on_near_misses() {
        let inputs = ["a_b", "a%5Fb", "a b", "a%20b", "%", "%25", "", "_"];
        let escaped: Vec<String> = inputs.iter().map(|i| escape(i)).collect();
        for (i, a) in escaped.iter().enumerate() {
            assert!(!a.contains(KEY_SEPARATOR), "{}", a);
            for b in &escaped[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_separator_in_components_does_not_collide() {
        let a = JobSpec::new("waterwhendry", "Tee_20.00", "x", "me@example.com");
        let b = JobSpec::new("waterwhendry", "Tee", "20.00_x", "me@example.com");
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = JobRecord {
            pid: 4242,
            spec: tee(),
            started_at: DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["pid"], 4242);
        assert_eq!(value["product_type"], "Tee");
        assert_eq!(value["price"], "20.00");

        let back: JobRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_spec_display() {
        assert_eq!(
            tee().to_string(),
            "Tee at $20.00 on waterwhendry for me@example.com"
        );
    }
}
