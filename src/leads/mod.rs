//! Lead Capture
//!
//! Server side of the site's contact, demo and pricing forms:
//!
//! - **validation**: classify a submission as accepted, rejected or
//!   silently ignored (suspected bot)
//! - **rate_limit**: per-client request windows behind an injectable store
//! - **forward**: hand accepted leads to the CRM webhook

pub mod forward;
pub mod rate_limit;
pub mod validation;

pub use forward::{ForwardError, LeadForwarder};
pub use rate_limit::{
    spawn_cleanup, InMemoryRateLimitStore, RateDecision, RateLimitStore, RateLimiter, RateWindow,
};
pub use validation::{evaluate, FieldError, IgnoreReason, Lead, LeadOutcome, LeadSubmission};
