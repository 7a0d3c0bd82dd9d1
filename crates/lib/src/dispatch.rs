//! Notification dispatcher: renders the alert email and sends it once.

use crate::mail::{EmailSender, MailError, OutboundEmail};
use crate::policy::NotificationRequest;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("rendering notification body: {0}")]
    Render(#[from] serde_json::Error),
    #[error("sending notification to {recipient}: {source}")]
    Send {
        recipient: String,
        #[source]
        source: MailError,
    },
}

/// Result of a delivered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub recipient: String,
    pub subject: String,
    /// Provider message id.
    pub message_id: String,
}

pub fn subject_line(req: &NotificationRequest) -> String {
    format!("Security Group {} Was Changed", req.resource_id)
}

/// Plain-text body: identifiers, then the diff as 2-space indented JSON in its original key order.
pub fn body_text(req: &NotificationRequest) -> Result<String, serde_json::Error> {
    let mut body = format!(
        "The security group {} was changed.\n\nDetails:\n",
        req.identifiers.join("/")
    );
    body.push_str(&serde_json::to_string_pretty(&req.diff)?);
    Ok(body)
}

pub fn build_email(from_address: &str, req: &NotificationRequest) -> Result<OutboundEmail, DispatchError> {
    Ok(OutboundEmail {
        from: from_address.to_string(),
        to: vec![req.recipient.clone()],
        subject: subject_line(req),
        text: body_text(req)?,
    })
}

/// Send the notification. A single attempt; a send failure is returned to the caller as fatal.
pub async fn dispatch(
    sender: &dyn EmailSender,
    from_address: &str,
    req: &NotificationRequest,
) -> Result<Sent, DispatchError> {
    let email = build_email(from_address, req)?;
    log::debug!("dispatch: email body: {}", email.text);
    match sender.send(&email).await {
        Ok(message_id) => {
            log::info!("dispatch: email sent successfully to {} ({})", req.recipient, message_id);
            Ok(Sent {
                recipient: req.recipient.clone(),
                subject: email.subject,
                message_id,
            })
        }
        Err(e) => {
            log::error!("dispatch: sending to {} failed: {}", req.recipient, e);
            Err(DispatchError::Send {
                recipient: req.recipient.clone(),
                source: e,
            })
        }
    }
}
