//! Source Port
//!
//! The one capability the poller consumes: fetch the raw markup of the
//! rate board. Implementations make a single attempt; retry policy belongs
//! to the poller.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Raw page markup as returned by the source
pub type RawMarkup = String;

/// Source fetch error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Source returned HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// True for failures that are likely to clear up on their own
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout(_) | FetchError::Network(_) | FetchError::Body(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Client(_) => false,
        }
    }
}

/// Rate board source
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourcePort: Send + Sync {
    /// Fetch the current page markup once
    async fn fetch(&self) -> Result<RawMarkup, FetchError>;
}
