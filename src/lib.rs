//! Silver Rates - Silver quote scraper and rates API
//!
//! Polls the FENEGOSIDA rate board, extracts the per-tola and per-10-gram
//! silver price, caches the last good quote on disk and serves sale/buy
//! prices to the rate widget.
//!
//! # Modules
//!
//! - `domain`: Quote snapshot, extractor, snapshot store, pricing rules
//! - `ports`: Trait abstractions (SourcePort) and test doubles
//! - `adapters`: External implementations (HTTP fetcher, axum API, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Steady/FastRetry quote poller

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
