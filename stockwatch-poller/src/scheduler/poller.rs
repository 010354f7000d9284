//! Stock poller
//!
//! Checks a storefront feed for products of the wanted type and price and
//! emails the recipient when any appear. Every failure is contained to its
//! cycle: the loop keeps going until the process is told to stop.

use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use stockwatch_core::domain::job::JobSpec;
use stockwatch_core::domain::product::Criteria;
use stockwatch_core::domain::site::{self, Site};
use stockwatch_core::notification::{Notification, availability_label, ctime};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::scheduler::Backoff;
use crate::service::{FeedSource, Notifier};

/// Result of a single check cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Matches found and the recipient was emailed
    Notified { matches: usize },
    /// Feed checked, nothing matched
    NoMatches,
    /// Matches found but the email could not be sent
    NotifyFailed { matches: usize, error: String },
    /// The site identifier is not a known storefront
    UnknownSite(String),
    /// The storefront answered 401
    Unauthorized,
    /// Any other HTTP, network or parse failure
    FetchFailed(String),
}

impl CycleOutcome {
    /// Whether the cycle failed to get an answer from the storefront
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            CycleOutcome::UnknownSite(_) | CycleOutcome::Unauthorized | CycleOutcome::FetchFailed(_)
        )
    }
}

/// Poller for a single job
pub struct StockPoller {
    spec: JobSpec,
    criteria: Criteria,
    feed_base_url: Option<String>,
    poll_interval: Duration,
    max_backoff: Duration,
    backoff_jitter: f64,
    feed: Arc<dyn FeedSource>,
    notifier: Arc<dyn Notifier>,
}

impl StockPoller {
    /// Creates a new poller
    pub fn new(
        spec: JobSpec,
        config: &Config,
        feed: Arc<dyn FeedSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let criteria = Criteria {
            product_type: spec.product_type.clone(),
            price: spec.price.clone(),
        };
        Self {
            spec,
            criteria,
            feed_base_url: config.feed_base_url.clone(),
            poll_interval: config.poll_interval,
            max_backoff: config.max_backoff,
            backoff_jitter: config.backoff_jitter,
            feed,
            notifier,
        }
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    /// Runs check cycles until the surrounding task is cancelled
    pub async fn run(&self) {
        info!(
            "Starting poller for {} (interval: {:?})",
            self.spec, self.poll_interval
        );

        let mut backoff = Backoff::new(self.poll_interval, self.max_backoff, self.backoff_jitter);

        loop {
            let delay = self.tick(&mut backoff).await;
            tokio::time::sleep(delay).await;
        }
    }

    /// Runs one cycle, updates the backoff, and returns the wait before the next one
    pub async fn tick(&self, backoff: &mut Backoff) -> Duration {
        let outcome = self.check_once().await;

        if outcome.is_failure() {
            backoff.record_failure();
        } else {
            backoff.record_success();
        }

        let delay = backoff.next_delay();
        if backoff.failures() > 0 {
            warn!(
                "{} consecutive failed check(s), next check in {:?}",
                backoff.failures(),
                delay
            );
        } else {
            debug!("Next check in {:?}", delay);
        }
        delay
    }

    /// Performs a single check cycle
    pub async fn check_once(&self) -> CycleOutcome {
        let now = Local::now();

        let base_url = match self.resolve_base_url() {
            Ok(url) => url,
            Err(e) => {
                error!("{} at {}", e, ctime(&now));
                return CycleOutcome::UnknownSite(self.spec.site.clone());
            }
        };

        let feed = match self.feed.fetch(&site::feed_url(&base_url)).await {
            Ok(feed) => feed,
            Err(e) if e.is_unauthorized() => {
                error!("Authentication failed at {}. Status code: 401", ctime(&now));
                error!("{}", e);
                return CycleOutcome::Unauthorized;
            }
            Err(e) => {
                match e.status() {
                    Some(status) => error!(
                        "Website check failed at {}. Status code: {}",
                        ctime(&now),
                        status
                    ),
                    None => error!("Error occurred at {}: {}", ctime(&now), e),
                }
                return CycleOutcome::FetchFailed(e.to_string());
            }
        };

        let matches = feed.select_matches(&self.criteria);
        if matches.is_empty() {
            info!(
                "No products matching criteria found at {}",
                ctime(&now)
            );
            return CycleOutcome::NoMatches;
        }

        info!("Found {} matching product(s)", matches.len());
        for product in &matches {
            info!(
                "- {} ({})",
                product.title,
                availability_label(product.available)
            );
        }

        let notification = Notification::for_matches(&base_url, &matches, now);
        match self
            .notifier
            .send(&self.spec.recipient, &notification)
            .await
        {
            Ok(()) => {
                info!("Email sent successfully to {}", self.spec.recipient);
                CycleOutcome::Notified {
                    matches: matches.len(),
                }
            }
            Err(e) => {
                error!("Error sending email: {}", e);
                CycleOutcome::NotifyFailed {
                    matches: matches.len(),
                    error: e.to_string(),
                }
            }
        }
    }

    /// Base URL of the storefront to check
    fn resolve_base_url(&self) -> Result<String, site::UnknownSite> {
        let site: Site = self.spec.site.parse()?;
        Ok(self
            .feed_base_url
            .clone()
            .unwrap_or_else(|| site.base_url().to_string()))
    }
}
