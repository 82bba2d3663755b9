//! Quote Snapshot
//!
//! The single cached silver quote served to readers: price per tola and
//! price per 10 grams, where it came from, and when it was accepted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Price per tola = price per 10 g × this ratio (market convention, not exact)
pub const TOLA_PER_TEN_GRAM: f64 = 1.16638;

/// Where the current snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Scraped from the source page by a successful cycle
    Live,
    /// Startup placeholder, no cycle has succeeded yet
    Uninitialized,
}

impl Provenance {
    pub fn is_live(&self) -> bool {
        matches!(self, Provenance::Live)
    }
}

/// Latest silver quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    /// Price per 1 tola
    pub per_tola: f64,
    /// Price per 10 grams
    pub per_ten_gram: f64,
    pub provenance: Provenance,
    /// Time the snapshot was accepted into the store
    pub observed_at: DateTime<Utc>,
}

impl QuoteSnapshot {
    /// Zero-priced placeholder used until the first successful cycle
    pub fn uninitialized() -> Self {
        Self {
            per_tola: 0.0,
            per_ten_gram: 0.0,
            provenance: Provenance::Uninitialized,
            observed_at: Utc::now(),
        }
    }

    /// Live candidate; `observed_at` is re-stamped when the store accepts it
    pub fn live(per_tola: f64, per_ten_gram: f64) -> Self {
        Self {
            per_tola,
            per_ten_gram,
            provenance: Provenance::Live,
            observed_at: Utc::now(),
        }
    }

    /// True if at least one price is a usable positive number
    pub fn has_price(&self) -> bool {
        is_positive(self.per_tola) || is_positive(self.per_ten_gram)
    }

    /// Age of the snapshot relative to `now`
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.observed_at)
    }
}

impl Default for QuoteSnapshot {
    fn default() -> Self {
        Self::uninitialized()
    }
}

pub(crate) fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_default() {
        let snapshot = QuoteSnapshot::default();
        assert_eq!(snapshot.per_tola, 0.0);
        assert_eq!(snapshot.per_ten_gram, 0.0);
        assert_eq!(snapshot.provenance, Provenance::Uninitialized);
        assert!(!snapshot.has_price());
    }

    #[test]
    fn test_has_price() {
        assert!(QuoteSnapshot::live(150_000.0, 0.0).has_price());
        assert!(QuoteSnapshot::live(0.0, 12_859.5).has_price());
        assert!(!QuoteSnapshot::live(0.0, 0.0).has_price());
        assert!(!QuoteSnapshot::live(-1.0, f64::NAN).has_price());
        assert!(!QuoteSnapshot::live(f64::INFINITY, 0.0).has_price());
    }

    #[test]
    fn test_provenance_serialization() {
        let json = serde_json::to_string(&Provenance::Uninitialized).unwrap();
        assert_eq!(json, "\"uninitialized\"");
        assert!(Provenance::Live.is_live());
        assert!(!Provenance::Uninitialized.is_live());
    }

    #[test]
    fn test_age() {
        let snapshot = QuoteSnapshot::live(1.0, 1.0);
        let later = snapshot.observed_at + chrono::Duration::seconds(90);
        assert_eq!(snapshot.age(later).num_seconds(), 90);
    }
}
