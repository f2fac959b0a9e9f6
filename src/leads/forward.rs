// Forwarding accepted leads to the CRM webhook

use super::Lead;
use reqwest::Client;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("Webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Webhook returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

pub struct LeadForwarder {
    client: Client,
    webhook_url: String,
}

impl LeadForwarder {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            webhook_url: webhook_url.into(),
        }
    }

    /// POST the lead as JSON to the webhook.
    pub async fn forward(&self, lead: &Lead) -> Result<(), ForwardError> {
        let response = self.client.post(&self.webhook_url).json(lead).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ForwardError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(form = %lead.form, "Forwarded lead");
        Ok(())
    }
}
