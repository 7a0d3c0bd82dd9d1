//! Event validator/filter: decides whether a change event should produce a notification.
//!
//! Every check is a hard gate. A failed gate is a `Skip`, which is normal traffic rather than
//! an error: the invocation still completes successfully.

use crate::event::{ChangeMessage, Envelope};
use lazy_static::lazy_static;
use regex::Regex;

/// The only resource type notifications are sent for.
pub const SUPPORTED_RESOURCE_TYPE: &str = "AWS::EC2::SecurityGroup";

/// Policy tag acting as the opt-in flag.
pub const NOTIFY_TAG: &str = "NotifyOnChange";
/// Recipient tag carrying the destination address.
pub const OWNER_DL_TAG: &str = "OwnerDL";
pub const OWNER_TAG: &str = "Owner";
pub const NAME_TAG: &str = "Name";

/// `NotifyOnChange` values that disable notifications. Compared case-sensitively.
const NOTIFY_NEGATIVE_VALUES: [&str; 3] = ["", "No", "False"];

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(
        r"^[A-Za-z0-9_+.-]+@(?:[A-Za-z0-9_-]+\.)*[A-Za-z0-9_][A-Za-z0-9_-]{0,66}\.[A-Za-z]{2,6}(?:\.[A-Za-z]{2})?$"
    )
    .expect("email pattern must compile");
}

/// True if `s` is an ASCII email address: local-part `@` domain labels `.` TLD.
/// The whole value must match; an address embedded in other text is rejected.
pub fn is_valid_email(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

/// Why an event did not produce a notification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Skip {
    #[error("event envelope is not valid JSON: {0}")]
    MalformedEnvelope(String),
    #[error("event envelope has no records")]
    NoRecords,
    #[error("first record carries no message payload")]
    MissingMessage,
    #[error("message payload could not be parsed: {0}")]
    UnparseableMessage(String),
    #[error("message is missing configurationItem or configurationItemDiff")]
    MissingFields,
    #[error("change notifications are only supported for security groups (got {0})")]
    UnsupportedResourceType(String),
    #[error("notifications are not enabled for the security group in question")]
    NotificationsDisabled,
    #[error("the email address in the OwnerDL tag is either missing or invalid")]
    InvalidRecipient,
}

impl Skip {
    /// Short machine-readable reason, used in completion payloads.
    pub fn reason(&self) -> &'static str {
        match self {
            Skip::MalformedEnvelope(_) => "malformed_envelope",
            Skip::NoRecords => "no_records",
            Skip::MissingMessage => "missing_message",
            Skip::UnparseableMessage(_) => "unparseable_message",
            Skip::MissingFields => "missing_fields",
            Skip::UnsupportedResourceType(_) => "unsupported_resource_type",
            Skip::NotificationsDisabled => "notifications_disabled",
            Skip::InvalidRecipient => "invalid_recipient",
        }
    }
}

/// A validated notification, ready for the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRequest {
    /// Address from the `OwnerDL` tag.
    pub recipient: String,
    pub resource_id: String,
    /// `[resourceId]`, followed by the `Name` tag when set.
    pub identifiers: Vec<String>,
    /// `Owner` tag; diagnostics only.
    pub owner: Option<String>,
    pub diff: serde_json::Value,
}

/// `false`, `0` and `""` carry no change details and count as a missing diff.
fn is_empty_diff(diff: &serde_json::Value) -> bool {
    match diff {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(b) => !b,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Parse a raw event body, then evaluate it.
pub fn evaluate_json(body: &str) -> Result<NotificationRequest, Skip> {
    let envelope = Envelope::from_json(body).map_err(|e| {
        log::info!("policy: event envelope could not be parsed: {}", e);
        Skip::MalformedEnvelope(e.to_string())
    })?;
    evaluate(&envelope)
}

/// Run every gate against the envelope.
pub fn evaluate(envelope: &Envelope) -> Result<NotificationRequest, Skip> {
    if !envelope.has_records() {
        log::info!("policy: event has no records, stopping");
        return Err(Skip::NoRecords);
    }
    let Some(raw) = envelope.first_message() else {
        log::info!("policy: first record has no message payload, stopping");
        return Err(Skip::MissingMessage);
    };

    let message: ChangeMessage = serde_json::from_str(raw).map_err(|e| {
        log::info!("policy: the message format is invalid ({}), stopping", e);
        Skip::UnparseableMessage(e.to_string())
    })?;
    let diff = message.configuration_item_diff.filter(|d| !is_empty_diff(d));
    let (Some(item), Some(diff)) = (message.configuration_item, diff) else {
        log::info!("policy: message is missing configurationItem or configurationItemDiff, stopping");
        return Err(Skip::MissingFields);
    };

    let resource_type = item.resource_type.as_deref().unwrap_or_default();
    if resource_type != SUPPORTED_RESOURCE_TYPE {
        log::info!(
            "policy: change notifications are only supported for security groups (got {:?})",
            resource_type
        );
        return Err(Skip::UnsupportedResourceType(resource_type.to_string()));
    }

    match item.tag(NOTIFY_TAG) {
        Some(v) if !NOTIFY_NEGATIVE_VALUES.contains(&v) => {}
        _ => {
            log::info!("policy: notifications are not enabled for the security group in question");
            return Err(Skip::NotificationsDisabled);
        }
    }

    let owner = item.tag(OWNER_TAG).map(str::to_string);
    let recipient = match item.tag(OWNER_DL_TAG) {
        Some(v) if is_valid_email(v) => v.to_string(),
        _ => {
            log::info!("policy: the OwnerDL tag is either missing or invalid");
            return Err(Skip::InvalidRecipient);
        }
    };

    let resource_id = item.resource_id.clone().unwrap_or_default();
    log::info!("policy: owner: {}", owner.as_deref().unwrap_or("(none)"));
    log::info!("policy: owner DL: {}", recipient);
    log::info!("policy: security group id: {}", resource_id);

    let mut identifiers = vec![resource_id.clone()];
    if let Some(name) = item.tag(NAME_TAG).filter(|n| !n.is_empty()) {
        identifiers.push(name.to_string());
    }

    Ok(NotificationRequest {
        recipient,
        resource_id,
        identifiers,
        owner,
        diff,
    })
}
