//! Resend HTTP API sender: POST /emails with a bearer API key.

use crate::mail::sender::{EmailSender, MailError, OutboundEmail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const RESEND_API_BASE: &str = "https://api.resend.com";

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// Sends plain-text email through the Resend API. No retries.
pub struct ResendSender {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl ResendSender {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| RESEND_API_BASE.to_string());
        Self {
            api_key,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl EmailSender for ResendSender {
    fn name(&self) -> &str {
        "resend"
    }

    async fn send(&self, email: &OutboundEmail) -> Result<String, MailError> {
        let url = format!("{}/emails", self.base_url);
        let body = SendEmailRequest {
            from: &email.from,
            to: &email.to,
            subject: &email.subject,
            text: &email.text,
        };
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(MailError::Api(format!("{} {}", status, body)));
        }
        let data: SendEmailResponse = res.json().await?;
        log::debug!("mail: resend accepted email {} to {:?}", data.id, email.to);
        Ok(data.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_defaults_and_trims() {
        assert_eq!(ResendSender::new("k".into(), None).base_url(), RESEND_API_BASE);
        assert_eq!(
            ResendSender::new("k".into(), Some("http://127.0.0.1:9000/".into())).base_url(),
            "http://127.0.0.1:9000"
        );
        assert_eq!(
            ResendSender::new("k".into(), Some(String::new())).base_url(),
            RESEND_API_BASE
        );
    }
}
