//! Drover - fingerprint-gated task runner
//!
//! Runs commands only when their fingerprinted inputs changed, and
//! imports remote packages through a content-addressed cache with
//! deduplicated fetches.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod remote;
pub mod task;

pub use error::{DroverError, DroverResult};
