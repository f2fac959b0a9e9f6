use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    routing::post,
    Json, Router,
};
use crate::leads::{evaluate, LeadOutcome, LeadSubmission};
use crate::middleware::rate_limiter_middleware;
use crate::models::{AppState, LeadResponse};
use tracing::{debug, error, info};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/leads", post(submit_lead))
        .route_layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limiter_middleware,
        ))
        .with_state(state)
}

async fn submit_lead(
    State(state): State<AppState>,
    payload: Result<Json<LeadSubmission>, JsonRejection>,
) -> (StatusCode, Json<LeadResponse>) {
    let Json(submission) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            debug!(error = %rejection, "Unreadable lead payload");
            return (
                StatusCode::BAD_REQUEST,
                Json(LeadResponse::error("Invalid request body")),
            );
        }
    };

    match evaluate(&submission) {
        LeadOutcome::Rejected(errors) => {
            debug!(fields = errors.len(), "Lead rejected");
            (StatusCode::BAD_REQUEST, Json(LeadResponse::invalid(errors)))
        }
        // Bots get the same answer as people.
        LeadOutcome::SilentlyIgnored(reason) => {
            debug!(reason = %reason, "Lead silently ignored");
            (StatusCode::OK, Json(LeadResponse::ok()))
        }
        LeadOutcome::Accepted(lead) => {
            let Some(forwarder) = &state.forwarder else {
                info!(form = %lead.form, "Lead accepted, no webhook configured");
                return (StatusCode::OK, Json(LeadResponse::ok()));
            };

            match forwarder.forward(&lead).await {
                Ok(()) => (StatusCode::OK, Json(LeadResponse::ok())),
                Err(e) => {
                    error!(error = %e, form = %lead.form, "Failed to forward lead");
                    (
                        StatusCode::BAD_GATEWAY,
                        Json(LeadResponse::error("Could not submit the form, please try again")),
                    )
                }
            }
        }
    }
}
