//! Inbound event types: the SNS envelope and the AWS Config change message it carries.
//!
//! The envelope accepts the AWS field names (`Records`, `Sns`, `Message`) as well as the
//! lowercase aliases (`records`, `notification`, `message`) used by non-AWS forwarders.

use serde::Deserialize;
use std::collections::HashMap;

/// Outer event wrapper delivered to the handler.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(default, rename = "Records", alias = "records")]
    pub records: Option<Vec<Record>>,
}

/// One delivered record; only the first record of an envelope is considered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Record {
    #[serde(default, rename = "Sns", alias = "notification")]
    pub notification: Option<Notification>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Notification {
    /// String-encoded JSON change message.
    #[serde(default, rename = "Message", alias = "message")]
    pub message: Option<String>,
}

impl Envelope {
    /// Parse a raw event body.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Message payload of the first record, when present and non-empty.
    pub fn first_message(&self) -> Option<&str> {
        self.records
            .as_ref()?
            .first()?
            .notification
            .as_ref()?
            .message
            .as_deref()
            .filter(|m| !m.is_empty())
    }

    pub fn has_records(&self) -> bool {
        self.records.as_ref().is_some_and(|r| !r.is_empty())
    }
}

/// Decoded AWS Config change notification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeMessage {
    #[serde(default)]
    pub configuration_item: Option<ConfigurationItem>,
    /// What changed; passed through to the email body verbatim.
    #[serde(default)]
    pub configuration_item_diff: Option<serde_json::Value>,
}

/// Monitored resource as described by AWS Config. Fields not used by the notifier are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationItem {
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
}

impl ConfigurationItem {
    /// Tag value by name. Absent tags and a missing tag map both yield None.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.as_ref()?.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_accepts_aws_field_names() {
        let env = Envelope::from_json(r#"{"Records":[{"Sns":{"Message":"{}"}}]}"#).unwrap();
        assert!(env.has_records());
        assert_eq!(env.first_message(), Some("{}"));
    }

    #[test]
    fn envelope_accepts_lowercase_aliases() {
        let env =
            Envelope::from_json(r#"{"records":[{"notification":{"message":"x"}}]}"#).unwrap();
        assert_eq!(env.first_message(), Some("x"));
    }

    #[test]
    fn first_message_ignores_empty_and_missing_payloads() {
        let env = Envelope::from_json(r#"{"Records":[{"Sns":{"Message":""}}]}"#).unwrap();
        assert_eq!(env.first_message(), None);
        let env = Envelope::from_json(r#"{"Records":[{}]}"#).unwrap();
        assert_eq!(env.first_message(), None);
        let env = Envelope::from_json(r#"{"Records":null}"#).unwrap();
        assert!(!env.has_records());
    }

    #[test]
    fn change_message_null_diff_is_absent() {
        let msg: ChangeMessage = serde_json::from_str(
            r#"{"configurationItem":{"resourceType":"AWS::EC2::SecurityGroup"},"configurationItemDiff":null}"#,
        )
        .unwrap();
        assert!(msg.configuration_item_diff.is_none());
        let item = msg.configuration_item.unwrap();
        assert_eq!(item.tag("Name"), None);
    }
}
