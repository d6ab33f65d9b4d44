//! Replies through the signal-cli daemon.

use async_trait::async_trait;
use conversation::{ConversationError, MessageSender};
use signal_daemon::SignalClient;
use tracing::debug;

/// [`MessageSender`] backed by a [`SignalClient`].
#[derive(Debug, Clone)]
pub struct SignalSender {
    client: SignalClient,
}

impl SignalSender {
    pub fn new(client: SignalClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MessageSender for SignalSender {
    async fn send_message(
        &self,
        recipient: &str,
        text: &str,
        is_group: bool,
    ) -> Result<(), ConversationError> {
        let result = if is_group {
            self.client.send_to_group(recipient, text).await
        } else {
            self.client.send_text(recipient, text).await
        };

        let sent = result.map_err(|e| ConversationError::SendFailed(e.to_string()))?;
        debug!("Sent reply to {} (ts={})", recipient, sent.timestamp);
        Ok(())
    }
}
