//! Feeds Signal envelopes into the conversation dispatcher.

use std::future::Future;

use conversation::{Dispatcher, InboundEvent};
use futures::StreamExt;
use signal_daemon::{DaemonError, Envelope, ReconnectConfig, SignalClient};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors that stop the processor.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("daemon error: {0}")]
    Daemon(#[from] DaemonError),
}

/// Receives envelopes and hands text messages to the dispatcher.
pub struct MessageProcessor {
    client: SignalClient,
    dispatcher: Dispatcher,
    bot_number: Option<String>,
    reconnect: ReconnectConfig,
}

impl MessageProcessor {
    pub fn new(client: SignalClient, dispatcher: Dispatcher, bot_number: Option<String>) -> Self {
        Self {
            client,
            dispatcher,
            bot_number,
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Convert an envelope into an event, or say why it is skipped.
    pub fn to_event(&self, envelope: &Envelope) -> Result<InboundEvent, &'static str> {
        if let Some(ref bot_number) = self.bot_number {
            if envelope.is_from(bot_number) {
                return Err("message from self");
            }
        }

        let text = envelope.text().ok_or("no text content")?;
        let caller = envelope.sender();
        if caller.is_empty() {
            return Err("unknown sender");
        }

        Ok(match envelope.group_id() {
            Some(group_id) => InboundEvent::group(group_id, caller, text),
            None => InboundEvent::direct(caller, text),
        })
    }

    async fn process_envelope(&self, envelope: &Envelope) {
        match self.to_event(envelope) {
            Ok(event) => {
                debug!(
                    "Dispatching message from {} in {}",
                    event.caller_id, event.conversation_id
                );
                self.dispatcher.dispatch(event).await;
            }
            Err(reason) => debug!("Skipping envelope: {}", reason),
        }
    }

    /// Process messages until `shutdown_signal` completes.
    ///
    /// When the events stream ends the processor re-subscribes with
    /// exponential backoff.
    pub async fn run_with_shutdown<S>(self, shutdown_signal: S) -> Result<(), ProcessorError>
    where
        S: Future<Output = ()> + Send,
    {
        info!("Starting message processor");
        tokio::pin!(shutdown_signal);

        let mut attempt = 0u32;
        loop {
            let mut stream = signal_daemon::subscribe(&self.client)?;

            loop {
                tokio::select! {
                    biased;

                    () = &mut shutdown_signal => {
                        info!("Shutdown signal received, stopping message processor");
                        return Ok(());
                    }

                    next = stream.next() => {
                        match next {
                            Some(Ok(envelope)) => {
                                attempt = 0;
                                self.process_envelope(&envelope).await;
                            }
                            Some(Err(e)) => error!("Stream error: {}", e),
                            None => break,
                        }
                    }
                }
            }

            let delay = self.reconnect.delay_for_attempt(attempt);
            attempt = attempt.saturating_add(1);
            warn!("Message stream ended, re-subscribing in {:?}", delay);

            tokio::select! {
                biased;
                () = &mut shutdown_signal => {
                    info!("Shutdown signal received, stopping message processor");
                    return Ok(());
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}
