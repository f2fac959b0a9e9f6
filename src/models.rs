use crate::leads::{FieldError, LeadForwarder, RateLimiter};
use serde::Serialize;
use std::sync::Arc;

/// Shared state for the lead server.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
    /// Without a webhook, accepted leads are only logged.
    pub forwarder: Option<Arc<LeadForwarder>>,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl LeadResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            errors: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            errors: Vec::new(),
        }
    }

    pub fn invalid(errors: Vec<FieldError>) -> Self {
        Self {
            success: false,
            error: Some("Please check the highlighted fields".to_string()),
            errors,
        }
    }
}
