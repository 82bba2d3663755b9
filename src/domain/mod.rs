//! Domain Layer - Core quote logic for the silver rate service
//!
//! Pure types and rules with no network access. External interactions happen
//! through the ports layer.
//!
//! - `quote`: the cached `QuoteSnapshot` and its provenance
//! - `extractor`: labeled-pattern price extraction from the source page
//! - `snapshot_store`: current-snapshot cache with JSON file persistence
//! - `pricing`: sale rounding, buy deduction and display formatting

pub mod quote;
pub mod extractor;
pub mod snapshot_store;
pub mod pricing;

pub use quote::{Provenance, QuoteSnapshot, TOLA_PER_TEN_GRAM};
pub use extractor::{ExtractionError, ExtractorConfig, QuoteExtractor};
pub use snapshot_store::{LoadStatus, PersistError, RejectedSnapshot, SnapshotStore, DEFAULT_STORE_FILE};
pub use pricing::{DeductionRule, PriceQuote, PricingPolicy, RateBoard, Unit, UnitFormat};
