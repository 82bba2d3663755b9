//! Source Adapters
//!
//! Implementations of `SourcePort`:
//! - `HttpSourceFetcher`: reqwest GET of the rate board with a bounded
//!   timeout and browser User-Agent

mod http_fetcher;

pub use http_fetcher::{
    HttpSourceFetcher, SourceFetcherConfig, DEFAULT_FETCH_TIMEOUT, DEFAULT_SOURCE_URL,
    DEFAULT_USER_AGENT,
};
