//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement:
//! - Rate board source (raw page markup)
//!
//! `mocks` provides a scripted source for exercising the poller without
//! network access.

pub mod source;
pub mod mocks;

pub use source::{FetchError, RawMarkup, SourcePort};
pub use mocks::ScriptedSource;
