//! Application Layer
//!
//! Use cases that wire domain logic to ports:
//! - `QuotePoller`: Steady/FastRetry polling controller

pub mod poller;

pub use poller::{
    CycleError, PollerConfig, PollerStatus, PollingMode, PollingState, QuotePoller, Transition,
};
