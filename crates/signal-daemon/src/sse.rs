//! Incoming messages over Server-Sent Events.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::stream::Stream;
use reqwest_eventsource::{Event, EventSource, RequestBuilderExt};
use tracing::{debug, info, warn};

use crate::client::SignalClient;
use crate::error::DaemonError;
use crate::types::{Envelope, ReceiveEvent};

/// Exponential backoff for re-subscribing after the stream ends.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2,
        }
    }
}

impl ReconnectConfig {
    /// Delay before retry number `attempt` (0-based), capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt);
        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

/// Stream of envelopes from the daemon's events endpoint.
///
/// Transient errors are yielded as `Err` items; the underlying event source
/// retries on its own. The stream ends when the daemon closes it for good.
pub struct MessageStream {
    source: EventSource,
}

impl Stream for MessageStream {
    type Item = Result<Envelope, DaemonError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            let event = match Pin::new(&mut self.source).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => event,
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(DaemonError::Sse(e.to_string()))))
                }
                Poll::Ready(None) => {
                    info!("SSE stream ended");
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            };

            match event {
                Event::Open => debug!("SSE connection opened"),
                Event::Message(msg) if msg.event == "receive" => {
                    match serde_json::from_str::<ReceiveEvent>(&msg.data) {
                        Ok(received) => return Poll::Ready(Some(Ok(received.envelope))),
                        Err(e) => warn!("Failed to parse receive event: {}", e),
                    }
                }
                Event::Message(msg) => debug!("Ignoring SSE event type: {}", msg.event),
            }
        }
    }
}

/// Subscribe to incoming envelopes.
pub fn subscribe(client: &SignalClient) -> Result<MessageStream, DaemonError> {
    let url = client.config().events_url();
    info!("Subscribing to {}", url);

    let source = client
        .streaming_http()?
        .get(&url)
        .eventsource()
        .map_err(|e| DaemonError::Sse(e.to_string()))?;

    Ok(MessageStream { source })
}
