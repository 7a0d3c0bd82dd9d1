//! Email sender trait and the message it delivers.

use async_trait::async_trait;

/// A plain-text email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    /// Source address; must be authorized with the mail provider.
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("mail api error: {0}")]
    Api(String),
}

/// Capability to deliver one email. Implementations make a single attempt; callers decide
/// what a failure means.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Provider name (e.g. "resend").
    fn name(&self) -> &str;
    /// Send the email and return the provider's message id.
    async fn send(&self, email: &OutboundEmail) -> Result<String, MailError>;
}
