// Lead form validation
//
// Three outcomes, kept apart on purpose in the type: real leads, invalid
// submissions, and suspected bots that get a success response but go nowhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

/// Submissions filled in faster than this are treated as bots.
pub const MIN_FILL_TIME_MS: u64 = 2_000;

/// Raw form payload.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LeadSubmission {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,

    #[validate(length(max = 200, message = "Company name is too long"))]
    pub company: Option<String>,

    #[validate(length(max = 40, message = "Phone number is too long"))]
    pub phone: Option<String>,

    #[validate(length(max = 5000, message = "Message is too long"))]
    pub message: Option<String>,

    /// Which form on the site sent this (contact, demo, pricing…)
    #[serde(default = "default_form")]
    pub form: String,

    /// Honeypot: hidden from people, filled in by naive bots
    #[serde(default)]
    pub website: Option<String>,

    /// Time between form render and submit, reported by the page
    pub elapsed_ms: Option<u64>,
}

fn default_form() -> String {
    "contact".to_string()
}

/// A validated lead, ready to forward.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lead {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub form: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Honeypot,
    TooFast,
}

impl std::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IgnoreReason::Honeypot => write!(f, "honeypot"),
            IgnoreReason::TooFast => write!(f, "too_fast"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LeadOutcome {
    Accepted(Lead),
    Rejected(Vec<FieldError>),
    SilentlyIgnored(IgnoreReason),
}

impl LeadSubmission {
    /// Trim free-text fields and drop empty optionals.
    fn normalized(&self) -> Self {
        fn opt(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            company: opt(&self.company),
            phone: opt(&self.phone),
            message: opt(&self.message),
            form: self.form.trim().to_string(),
            website: opt(&self.website),
            elapsed_ms: self.elapsed_ms,
        }
    }
}

/// Classify a submission.
///
/// Bot checks run before field validation so that bots never learn which
/// fields they got wrong.
pub fn evaluate(submission: &LeadSubmission) -> LeadOutcome {
    let submission = submission.normalized();

    if submission.website.is_some() {
        return LeadOutcome::SilentlyIgnored(IgnoreReason::Honeypot);
    }
    if matches!(submission.elapsed_ms, Some(ms) if ms < MIN_FILL_TIME_MS) {
        return LeadOutcome::SilentlyIgnored(IgnoreReason::TooFast);
    }

    if let Err(errors) = submission.validate() {
        return LeadOutcome::Rejected(field_errors(&errors));
    }

    LeadOutcome::Accepted(Lead {
        name: submission.name,
        email: submission.email.to_lowercase(),
        company: submission.company,
        phone: submission.phone,
        message: submission.message,
        form: submission.form,
        received_at: Utc::now(),
    })
}

fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| FieldError {
                field: field.clone(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", field)),
            })
        })
        .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> LeadSubmission {
        LeadSubmission {
            name: "  Jordan Lee ".to_string(),
            email: "Jordan@Example.com".to_string(),
            company: Some("Acme Facilities".to_string()),
            phone: Some("   ".to_string()),
            message: Some("We track 4,000 laptops.".to_string()),
            form: "demo".to_string(),
            website: None,
            elapsed_ms: Some(15_000),
        }
    }

    #[test]
    fn test_valid_submission_is_accepted() {
        match evaluate(&submission()) {
            LeadOutcome::Accepted(lead) => {
                assert_eq!(lead.name, "Jordan Lee");
                assert_eq!(lead.email, "jordan@example.com");
                assert_eq!(lead.phone, None);
                assert_eq!(lead.form, "demo");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_honeypot_is_silently_ignored() {
        let mut s = submission();
        s.website = Some("http://spam.example".to_string());
        assert_eq!(evaluate(&s), LeadOutcome::SilentlyIgnored(IgnoreReason::Honeypot));
    }

    #[test]
    fn test_too_fast_is_silently_ignored_even_when_invalid() {
        let mut s = submission();
        s.elapsed_ms = Some(300);
        s.email = "nope".to_string();
        assert_eq!(evaluate(&s), LeadOutcome::SilentlyIgnored(IgnoreReason::TooFast));
    }

    #[test]
    fn test_missing_elapsed_time_is_not_a_bot_signal() {
        let mut s = submission();
        s.elapsed_ms = None;
        assert!(matches!(evaluate(&s), LeadOutcome::Accepted(_)));
    }

    #[test]
    fn test_invalid_fields_are_rejected() {
        let mut s = submission();
        s.name = "   ".to_string();
        s.email = "not-an-email".to_string();

        match evaluate(&s) {
            LeadOutcome::Rejected(errors) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["email", "name"]);
                assert_eq!(errors[0].message, "A valid email address is required");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_deserialize_defaults() {
        let s: LeadSubmission =
            serde_json::from_str(r#"{"name":"Ana","email":"ana@example.com"}"#).unwrap();
        assert_eq!(s.form, "contact");
        assert!(s.website.is_none());
        assert!(matches!(evaluate(&s), LeadOutcome::Accepted(_)));
    }
}
