//! Read API Handlers

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::pricing::{PricingPolicy, Unit};
use crate::domain::quote::{Provenance, QuoteSnapshot};

use super::ApiState;

/// Label shown while the store has never seen a live quote
pub const UNINITIALIZED_LABEL: &str = "Initializing...";

/// Body of `GET /api/rates`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatesResponse {
    pub tola_sale: String,
    pub tola_buy: String,
    pub gram_sale: String,
    pub gram_buy: String,
    pub source: String,
    pub last_updated: String,
}

impl RatesResponse {
    pub fn from_snapshot(snapshot: &QuoteSnapshot, pricing: &PricingPolicy, source_name: &str) -> Self {
        let board = pricing.board(snapshot);

        let source = match snapshot.provenance {
            Provenance::Live => format!("Live: {}", source_name),
            Provenance::Uninitialized => UNINITIALIZED_LABEL.to_string(),
        };

        Self {
            tola_sale: pricing.format(board.tola.sale, Unit::Tola),
            tola_buy: pricing.format(board.tola.buy, Unit::Tola),
            gram_sale: pricing.format(board.ten_gram.sale, Unit::TenGram),
            gram_buy: pricing.format(board.ten_gram.buy, Unit::TenGram),
            source,
            last_updated: snapshot
                .observed_at
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

/// `GET /api/rates` - always 200, serves whatever the store holds
pub async fn get_rates(State(state): State<ApiState>) -> Json<RatesResponse> {
    let snapshot = state.store.current();
    Json(RatesResponse::from_snapshot(&snapshot, &state.pricing, &state.source_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_live_response() {
        let mut snapshot = QuoteSnapshot::live(150_000.0, 12_859.5);
        snapshot.observed_at = chrono::Utc.with_ymd_and_hms(2026, 1, 5, 6, 30, 0).unwrap();

        let response = RatesResponse::from_snapshot(&snapshot, &PricingPolicy::default(), "FENEGOSIDA");

        assert_eq!(response.tola_sale, "Rs. 150,000");
        assert_eq!(response.tola_buy, "Rs. 144,000");
        assert_eq!(response.gram_sale, "Rs. 12,859.50");
        assert_eq!(response.gram_buy, "Rs. 12,345.00");
        assert_eq!(response.source, "Live: FENEGOSIDA");
        assert_eq!(response.last_updated, "2026-01-05T06:30:00.000Z");
    }

    #[test]
    fn test_uninitialized_response() {
        let response = RatesResponse::from_snapshot(
            &QuoteSnapshot::uninitialized(),
            &PricingPolicy::default(),
            "FENEGOSIDA",
        );

        assert_eq!(response.tola_sale, "Rs. 0");
        assert_eq!(response.tola_buy, "Rs. 0");
        assert_eq!(response.gram_sale, "Rs. 0.00");
        assert_eq!(response.gram_buy, "Rs. 0.00");
        assert_eq!(response.source, UNINITIALIZED_LABEL);
    }

    #[test]
    fn test_camel_case_fields() {
        let response = RatesResponse::from_snapshot(
            &QuoteSnapshot::uninitialized(),
            &PricingPolicy::default(),
            "FENEGOSIDA",
        );
        let json = serde_json::to_value(&response).unwrap();

        for field in ["tolaSale", "tolaBuy", "gramSale", "gramBuy", "source", "lastUpdated"] {
            assert!(json.get(field).is_some(), "missing {}", field);
        }
    }
}
