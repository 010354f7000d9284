//! Storefront sites
//!
//! The poller only knows a closed set of storefronts. Each one exposes a
//! public product feed at `<base>/products.json` and serves product pages at
//! `<base>/products/<handle>`.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// A storefront the poller knows how to check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    WaterWhenDry,
}

/// Returned when a site identifier is not in the known set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown site '{0}'")]
pub struct UnknownSite(pub String);

impl Site {
    /// Every known site
    pub const ALL: &'static [Site] = &[Site::WaterWhenDry];

    /// Identifier used on the command line and in the job registry
    pub fn id(&self) -> &'static str {
        match self {
            Site::WaterWhenDry => "waterwhendry",
        }
    }

    /// Storefront base URL, without a trailing slash
    pub fn base_url(&self) -> &'static str {
        match self {
            Site::WaterWhenDry => "https://waterwhendry.com",
        }
    }

    /// URL of the site's public product feed
    pub fn feed_url(&self) -> String {
        feed_url(self.base_url())
    }

    /// URL of a single product page
    pub fn product_url(&self, handle: &str) -> String {
        product_url(self.base_url(), handle)
    }
}

/// Builds a product feed URL from a storefront base URL
pub fn feed_url(base_url: &str) -> String {
    format!("{}/products.json", base_url.trim_end_matches('/'))
}

/// Builds a product page URL from a storefront base URL
pub fn product_url(base_url: &str, handle: &str) -> String {
    format!("{}/products/{}", base_url.trim_end_matches('/'), handle)
}

impl FromStr for Site {
    type Err = UnknownSite;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Site::ALL
            .iter()
            .copied()
            .find(|site| site.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownSite(s.to_string()))
    }
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}
