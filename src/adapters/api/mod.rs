//! Read API Adapter
//!
//! axum router serving the cached quote to the frontend widget:
//! - `GET /api/rates`: formatted sale/buy prices, provenance, last update
//!
//! CORS is open to any origin; the widget is embedded on other sites.

mod handlers;

pub use handlers::{get_rates, RatesResponse, UNINITIALIZED_LABEL};

use std::future::Future;
use std::sync::Arc;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domain::pricing::PricingPolicy;
use crate::domain::snapshot_store::SnapshotStore;

/// Shared handler state
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<SnapshotStore>,
    pub pricing: Arc<PricingPolicy>,
    pub source_name: Arc<str>,
}

impl ApiState {
    pub fn new(store: Arc<SnapshotStore>, pricing: PricingPolicy, source_name: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            pricing: Arc::new(pricing),
            source_name: source_name.into(),
        }
    }
}

/// Build the API router
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/api/rates", get(get_rates))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: ApiState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Rates API listening on http://{}", addr);
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
