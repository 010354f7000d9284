//! Feed source
//!
//! Abstracts fetching a storefront product feed.

use async_trait::async_trait;
use stockwatch_client::{FeedClient, ProductFeed};

/// Source of product feeds
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetches and parses the feed at `feed_url`
    async fn fetch(&self, feed_url: &str) -> stockwatch_client::Result<ProductFeed>;
}

#[async_trait]
impl FeedSource for FeedClient {
    async fn fetch(&self, feed_url: &str) -> stockwatch_client::Result<ProductFeed> {
        self.fetch_products(feed_url).await
    }
}
