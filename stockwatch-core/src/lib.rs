//! Stockwatch Core
//!
//! Core types and persistence shared by the stock poller and the job controller.
//!
//! This crate contains:
//! - Domain types: Sites, job specs and keys, product feeds and matches
//! - Notification: Plaintext email composition for matched products
//! - Registry: The file-backed table of running jobs
//! - Marker: Per-job pid marker files written by running pollers

pub mod domain;
pub mod error;
pub mod marker;
pub mod notification;
pub mod registry;

pub use error::{Result, StoreError};
