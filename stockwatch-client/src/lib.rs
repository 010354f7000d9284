//! Stockwatch HTTP Client
//!
//! A small, type-safe HTTP client for storefront product feeds.
//!
//! Storefront feeds often turn away requests that do not look like they come
//! from a browser, so every request carries a browser `User-Agent`.
//!
//! # Example
//!
//! ```no_run
//! use stockwatch_client::FeedClient;
//! use stockwatch_core::domain::site::Site;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FeedClient::new();
//!     let feed = client.fetch_products(&Site::WaterWhenDry.feed_url()).await?;
//!
//!     println!("Feed lists {} products", feed.products.len());
//!     Ok(())
//! }
//! ```

pub mod error;
mod products;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use stockwatch_core::domain::product::ProductFeed;

use reqwest::Client;
use serde::de::DeserializeOwned;

/// User agent sent with every feed request
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// HTTP client for storefront product feeds
#[derive(Debug, Clone)]
pub struct FeedClient {
    /// HTTP client instance
    client: Client,
}

impl FeedClient {
    /// Create a new feed client with the default browser user agent
    ///
    /// # Example
    /// ```
    /// use stockwatch_client::FeedClient;
    ///
    /// let client = FeedClient::new();
    /// ```
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Create a new feed client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use stockwatch_client::FeedClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = FeedClient::with_client(http_client);
    /// ```
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle a feed response and deserialize JSON
    ///
    /// 401 is reported as [`ClientError::Unauthorized`] together with the
    /// response headers. Anything other than 200 becomes
    /// [`ClientError::HttpStatus`], including other 2xx codes.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized {
                headers: format!("{:?}", response.headers()),
            });
        }

        if status != reqwest::StatusCode::OK {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::http_status(status.as_u16(), error_text));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

impl Default for FeedClient {
    fn default() -> Self {
        Self::new()
    }
}
