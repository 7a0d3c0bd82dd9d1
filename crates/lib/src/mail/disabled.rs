//! Sender that logs instead of delivering.

use crate::mail::sender::{EmailSender, MailError, OutboundEmail};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct DisabledSender {
    count: AtomicU64,
}

impl DisabledSender {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmailSender for DisabledSender {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn send(&self, email: &OutboundEmail) -> Result<String, MailError> {
        let n = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        log::warn!(
            "mail: skipping delivery (disabled) to {:?}, subject {:?}",
            email.to,
            email.subject
        );
        log::debug!("mail: undelivered body:\n{}", email.text);
        Ok(format!("disabled-{}", n))
    }
}
