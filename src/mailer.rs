//! Resend email gateway.
//!
//! Thin HTTP wrapper over the Resend API. Failures map to `Transport`
//! errors, which dispatch treats as retryable-later.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use crate::error::{Error, Result};
use crate::store::NotificationGateway;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

pub struct ResendMailer {
    agent: ureq::Agent,
    api_key: SecretString,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: SecretString, from: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            api_key,
            from: from.into(),
        }
    }
}

impl NotificationGateway for ResendMailer {
    fn send_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: Option<&str>,
    ) -> Result<()> {
        let mut payload = json!({
            "from": self.from,
            "to": [to],
            "subject": subject,
            "html": html_body,
        });
        if let Some(text) = text_body {
            payload["text"] = json!(text);
        }

        // ureq treats non-2xx responses as errors, so a transport-level
        // failure and an API rejection land in the same arm.
        self.agent
            .post(RESEND_API_URL)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .send_json(&payload)
            .map_err(|e| Error::Transport(format!("resend: {e}")))?;

        Ok(())
    }
}
