//! Event handler: filter an inbound event, then dispatch the notification.
//!
//! One event in, one terminal outcome out. Nothing is remembered between invocations.

use crate::config::{self, Config};
use crate::dispatch::{self, DispatchError, Sent};
use crate::event::Envelope;
use crate::mail::{self, EmailSender};
use crate::policy::{self, Skip};
use anyhow::Result;
use serde_json::json;
use std::sync::Arc;

/// Terminal outcome of a handled event. Dispatch failures are the `Err` side of `Relay::handle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Skipped(Skip),
    Sent(Sent),
}

impl Outcome {
    /// Completion payload reported to the invoker.
    pub fn completion(&self) -> serde_json::Value {
        match self {
            Outcome::Sent(sent) => json!({
                "success": true,
                "recipient": sent.recipient,
                "messageId": sent.message_id,
            }),
            Outcome::Skipped(skip) => json!({
                "success": false,
                "skipped": skip.reason(),
                "detail": skip.to_string(),
            }),
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, Outcome::Sent(_))
    }
}

/// Check the resolved sender address: it must be present and a valid email address.
fn validate_from_address(from_address: Option<String>) -> Result<String> {
    let Some(from_address) = from_address else {
        anyhow::bail!("no sender address configured (set mail.fromAddress or SGWATCH_FROM_ADDRESS)");
    };
    if !policy::is_valid_email(&from_address) {
        anyhow::bail!("sender address {:?} is not a valid email address", from_address);
    }
    Ok(from_address)
}

/// Filter-and-notify pipeline bound to a mail sender and source address.
#[derive(Clone)]
pub struct Relay {
    sender: Arc<dyn EmailSender>,
    from_address: String,
}

impl Relay {
    pub fn new(sender: Arc<dyn EmailSender>, from_address: impl Into<String>) -> Self {
        Self {
            sender,
            from_address: from_address.into(),
        }
    }

    /// Build from config: sender address (config or SGWATCH_FROM_ADDRESS) and mail provider.
    pub fn from_config(config: &Config) -> Result<Self> {
        let from_address = validate_from_address(config::resolve_from_address(config))?;
        let sender = mail::sender_from_config(config)?;
        Ok(Self::new(sender, from_address))
    }

    pub fn provider(&self) -> &str {
        self.sender.name()
    }

    pub fn from_address(&self) -> &str {
        &self.from_address
    }

    /// Handle a raw event body.
    pub async fn handle_json(&self, body: &str) -> Result<Outcome, DispatchError> {
        match policy::evaluate_json(body) {
            Ok(req) => self.send(req).await,
            Err(skip) => Ok(Outcome::Skipped(skip)),
        }
    }

    pub async fn handle(&self, envelope: &Envelope) -> Result<Outcome, DispatchError> {
        match policy::evaluate(envelope) {
            Ok(req) => self.send(req).await,
            Err(skip) => Ok(Outcome::Skipped(skip)),
        }
    }

    async fn send(&self, req: policy::NotificationRequest) -> Result<Outcome, DispatchError> {
        let sent = dispatch::dispatch(self.sender.as_ref(), &self.from_address, &req).await?;
        Ok(Outcome::Sent(sent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::{MailError, OutboundEmail};
    use crate::policy::tests::{change_message, envelope_for, valid_event};
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Mutex;

    /// Records sent emails; fails every send once `fail` is set.
    #[derive(Default)]
    struct TestSender {
        sent: Mutex<Vec<OutboundEmail>>,
        fail: bool,
    }

    #[async_trait]
    impl EmailSender for TestSender {
        fn name(&self) -> &str {
            "test"
        }

        async fn send(&self, email: &OutboundEmail) -> Result<String, MailError> {
            if self.fail {
                return Err(MailError::Api("500 mock failure".to_string()));
            }
            let mut sent = self.sent.lock().await;
            sent.push(email.clone());
            Ok(format!("msg-{}", sent.len()))
        }
    }

    fn relay(sender: Arc<TestSender>) -> Relay {
        Relay::new(sender, "alerts@example.com")
    }

    #[tokio::test]
    async fn valid_event_sends_one_email() {
        let sender = Arc::new(TestSender::default());
        let outcome = relay(sender.clone()).handle_json(&valid_event()).await.unwrap();
        assert!(outcome.is_sent());

        let sent = sender.sent.lock().await;
        assert_eq!(sent.len(), 1);
        let email = &sent[0];
        assert_eq!(email.to, vec!["owner@example.com".to_string()]);
        assert_eq!(email.from, "alerts@example.com");
        assert_eq!(email.subject, "Security Group sg-123 Was Changed");
        assert!(email.text.contains("sg-123/web-sg"));
        assert!(email.text.contains("Details:\n{\n  \"changedProperties\": {"));
        assert!(email.text.contains("\"changeType\": \"UPDATE\""));
    }

    #[tokio::test]
    async fn skipped_events_send_nothing() {
        let sender = Arc::new(TestSender::default());
        let relay = relay(sender.clone());
        let disabled = envelope_for(&change_message(
            policy::SUPPORTED_RESOURCE_TYPE,
            json!({ "NotifyOnChange": "No", "OwnerDL": "owner@example.com" }),
        ));
        for body in ["{}", r#"{"Records":[]}"#, r#"{"Records":[{}]}"#, disabled.as_str()] {
            let outcome = relay.handle_json(body).await.unwrap();
            assert!(matches!(outcome, Outcome::Skipped(_)), "{body}");
        }
        assert!(sender.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn send_failure_is_fatal() {
        let sender = Arc::new(TestSender {
            fail: true,
            ..Default::default()
        });
        let err = relay(sender).handle_json(&valid_event()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Send { ref recipient, .. } if recipient == "owner@example.com"));
        assert!(err.to_string().contains("mock failure"));
    }

    #[tokio::test]
    async fn repeated_events_are_not_deduplicated() {
        let sender = Arc::new(TestSender::default());
        let relay = relay(sender.clone());
        let body = valid_event();
        relay.handle_json(&body).await.unwrap();
        relay.handle_json(&body).await.unwrap();
        assert_eq!(sender.sent.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn handle_accepts_parsed_envelope() {
        let sender = Arc::new(TestSender::default());
        let envelope = Envelope::from_json(&valid_event()).unwrap();
        let outcome = relay(sender).handle(&envelope).await.unwrap();
        assert_eq!(
            outcome.completion(),
            json!({ "success": true, "recipient": "owner@example.com", "messageId": "msg-1" })
        );
    }

    #[test]
    fn skipped_completion_reports_reason() {
        let completion = Outcome::Skipped(Skip::NotificationsDisabled).completion();
        assert_eq!(completion["success"], false);
        assert_eq!(completion["skipped"], "notifications_disabled");
    }

    #[test]
    fn sender_address_must_be_present_and_valid() {
        assert!(validate_from_address(None).is_err());
        let err = validate_from_address(Some("not-an-email".to_string())).unwrap_err();
        assert!(err.to_string().contains("not a valid email address"));
        assert_eq!(
            validate_from_address(Some("alerts@example.com".to_string())).unwrap(),
            "alerts@example.com"
        );
    }

    #[test]
    fn from_config_builds_disabled_sender_by_default() {
        let mut config = Config::default();
        config.mail.from_address = Some("alerts@example.com".to_string());
        let relay = Relay::from_config(&config).unwrap();
        assert_eq!(relay.provider(), "disabled");
        assert!(policy::is_valid_email(relay.from_address()));
    }
}
