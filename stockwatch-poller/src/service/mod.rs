//! Service layer
//!
//! Services wrap the poller's two external collaborators: the storefront
//! feed and outgoing mail. Both are trait-based so the check cycle can be
//! exercised without a network.

mod feed;
pub mod notifier;

// Re-export traits
pub use feed::FeedSource;
pub use notifier::Notifier;

// Re-export implementations
pub use notifier::SmtpNotifier;
