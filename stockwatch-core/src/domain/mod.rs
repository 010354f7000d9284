//! Core domain types
//!
//! This module contains the domain structures shared by the poller (which
//! fetches and filters feeds) and the controller (which tracks running jobs).

pub mod job;
pub mod product;
pub mod site;
