//! API Routes
//!
//! HTTP endpoints of the lead server:
//! - `/api/leads` - Form submissions (rate limited)
//! - `/api/health` - Health checks

pub mod health;
pub mod leads;

use axum::Router;
use crate::middleware::apply_cors;
use crate::models::AppState;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Create the lead server router
///
/// CORS wraps every route so preflight requests never reach the rate limiter.
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let allowed_origins = state.allowed_origins.clone();
    let api_router = Router::new()
        .merge(leads::router(state))
        .merge(health::router())
        .layer(TraceLayer::new_for_http());

    apply_cors(api_router, &allowed_origins)
}
