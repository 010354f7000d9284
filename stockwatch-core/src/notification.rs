//! Notification composition
//!
//! Builds the plaintext email sent when a poll cycle finds matching products.

use chrono::{DateTime, TimeZone};

use crate::domain::product::ProductMatch;
use crate::domain::site::product_url;

/// Subject line of every match notification
pub const SUBJECT: &str = "New Products Found";

/// A composed email, ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Composes the notification for a non-empty set of matches
    ///
    /// # Arguments
    /// * `base_url` - Storefront base URL, used to rebuild product links
    /// * `matches` - Matched products, in feed order
    /// * `checked_at` - When the feed was checked
    pub fn for_matches<Tz>(base_url: &str, matches: &[ProductMatch], checked_at: DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let mut body = format!("Products found at {}:\n", ctime(&checked_at));
        for product in matches {
            body.push_str(&format!(
                "- {} ({})\n",
                product.title,
                availability_label(product.available)
            ));
            body.push_str(&format!("  URL: {}\n", product_url(base_url, &product.handle)));
        }

        Self {
            subject: SUBJECT.to_string(),
            body,
        }
    }
}

/// Human label for a product's availability
pub fn availability_label(available: bool) -> &'static str {
    if available { "Available" } else { "Sold Out" }
}

/// Formats a timestamp the way C `ctime` does, e.g. `Fri Oct 16 09:05:00 2026`
pub fn ctime<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.format("%a %b %e %H:%M:%S %Y").to_string()
}
