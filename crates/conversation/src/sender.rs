//! Message sender trait and implementations.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::ConversationError;

/// Trait for sending replies.
///
/// Abstracted to support different transports (Signal, tests, etc.)
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send a text message.
    ///
    /// # Arguments
    /// * `recipient` - Phone number or group ID
    /// * `text` - Message content
    /// * `is_group` - Whether this is a group message
    async fn send_message(
        &self,
        recipient: &str,
        text: &str,
        is_group: bool,
    ) -> Result<(), ConversationError>;
}

/// A no-op message sender that discards all messages.
#[derive(Debug, Clone, Default)]
pub struct NoOpSender;

#[async_trait]
impl MessageSender for NoOpSender {
    async fn send_message(
        &self,
        _recipient: &str,
        _text: &str,
        _is_group: bool,
    ) -> Result<(), ConversationError> {
        Ok(())
    }
}

/// A message sender that only logs, for running without a transport.
#[derive(Debug, Clone, Default)]
pub struct LoggingSender;

#[async_trait]
impl MessageSender for LoggingSender {
    async fn send_message(
        &self,
        recipient: &str,
        text: &str,
        is_group: bool,
    ) -> Result<(), ConversationError> {
        let msg_type = if is_group { "group" } else { "direct" };
        tracing::info!("[{}] Sending to {}: {}", msg_type, recipient, text);
        Ok(())
    }
}

/// A message recorded by [`RecordingSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub recipient: String,
    pub text: String,
    pub is_group: bool,
}

/// Keeps every sent message in memory so flows can be inspected.
#[derive(Debug, Clone, Default)]
pub struct RecordingSender {
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages sent so far, oldest first.
    pub async fn messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Text of the most recent message.
    pub async fn last_text(&self) -> Option<String> {
        self.sent.lock().await.last().map(|m| m.text.clone())
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send_message(
        &self,
        recipient: &str,
        text: &str,
        is_group: bool,
    ) -> Result<(), ConversationError> {
        self.sent.lock().await.push(SentMessage {
            recipient: recipient.to_string(),
            text: text.to_string(),
            is_group,
        });
        Ok(())
    }
}
