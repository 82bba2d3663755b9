//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits and the outer
//! surfaces of the service:
//! - Source: HTTP fetcher for the rate board page
//! - API: axum router serving `/api/rates`
//! - CLI: Command-line interface definitions

pub mod source;
pub mod api;
pub mod cli;

pub use source::{HttpSourceFetcher, SourceFetcherConfig};
pub use api::{router, ApiState, RatesResponse};
pub use cli::CliApp;
