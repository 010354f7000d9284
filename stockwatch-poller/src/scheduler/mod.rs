//! Scheduler layer for the poller
//!
//! This layer runs the check cycle on an interval and decides how long to
//! wait between cycles.

pub mod backoff;
pub mod poller;

pub use backoff::Backoff;
pub use poller::StockPoller;
