//! Product feed endpoint

use crate::{BROWSER_USER_AGENT, FeedClient};
use crate::error::Result;
use reqwest::header::{ACCEPT, USER_AGENT};
use stockwatch_core::domain::product::ProductFeed;
use tracing::debug;

impl FeedClient {
    /// Fetch and parse a storefront product feed
    ///
    /// # Arguments
    /// * `feed_url` - Full feed URL, e.g. `https://shop.example/products.json`
    ///
    /// # Returns
    /// The parsed feed
    pub async fn fetch_products(&self, feed_url: &str) -> Result<ProductFeed> {
        debug!("Fetching product feed {}", feed_url);

        let response = self
            .client
            .get(feed_url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let feed: ProductFeed = self.handle_response(response).await?;
        debug!("Feed {} listed {} products", feed_url, feed.products.len());

        Ok(feed)
    }
}
