//! Wire types exchanged with the signal-cli daemon.

use serde::{Deserialize, Serialize};

/// Payload of a `receive` event on the events stream.
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiveEvent {
    pub envelope: Envelope,
}

/// An incoming Signal envelope.
///
/// Only the fields needed to route text messages are decoded; receipts,
/// typing indicators and sync messages arrive without a `data_message`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Sender phone number, or UUID when the number is hidden.
    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub source_number: Option<String>,

    #[serde(default)]
    pub source_uuid: Option<String>,

    /// Milliseconds since epoch.
    #[serde(default)]
    pub timestamp: u64,

    #[serde(default)]
    pub data_message: Option<DataMessage>,
}

/// Content of a regular message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataMessage {
    #[serde(default)]
    pub timestamp: u64,

    #[serde(default)]
    pub message: Option<String>,

    /// Present for group messages.
    #[serde(default)]
    pub group_info: Option<GroupInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInfo {
    /// Base64 group id.
    #[serde(default)]
    pub group_id: String,
}

impl Envelope {
    /// Best identifier for the sender: number first, then UUID.
    pub fn sender(&self) -> &str {
        self.source_number
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| Some(self.source.as_str()).filter(|s| !s.is_empty()))
            .or(self.source_uuid.as_deref())
            .unwrap_or_default()
    }

    /// Whether the envelope was sent by `number`.
    pub fn is_from(&self, number: &str) -> bool {
        self.source == number || self.source_number.as_deref() == Some(number)
    }

    /// Message text, if the envelope carries a non-blank text message.
    pub fn text(&self) -> Option<&str> {
        self.data_message
            .as_ref()?
            .message
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }

    /// Group id for group messages.
    pub fn group_id(&self) -> Option<&str> {
        self.data_message
            .as_ref()?
            .group_info
            .as_ref()
            .map(|g| g.group_id.as_str())
            .filter(|id| !id.is_empty())
    }
}

/// Parameters of the `send` RPC method.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendParams {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recipient: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group_id: Vec<String>,

    pub message: String,

    /// Sending account in multi-account mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl SendParams {
    /// A direct message to one recipient.
    pub fn direct(recipient: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            recipient: vec![recipient.into()],
            message: message.into(),
            ..Default::default()
        }
    }

    /// A message to a group.
    pub fn group(group_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            group_id: vec![group_id.into()],
            message: message.into(),
            ..Default::default()
        }
    }
}

/// Result of the `send` RPC method.
#[derive(Debug, Clone, Deserialize)]
pub struct SendResult {
    pub timestamp: u64,
}
