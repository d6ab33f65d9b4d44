//! Per-conversation sequential dispatch.
//!
//! Each conversation id gets its own worker task fed by an unbounded
//! channel. Events of one conversation are handled in arrival order and
//! never overlap; different conversations run concurrently. A worker that
//! has been idle for the idle timeout retires.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::event::InboundEvent;
use crate::handler::ConversationHandler;

/// Default time a worker waits for the next event before retiring.
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

type Workers = Arc<Mutex<HashMap<String, UnboundedSender<InboundEvent>>>>;

/// Routes inbound events to per-conversation workers.
#[derive(Clone)]
pub struct Dispatcher {
    handler: Arc<ConversationHandler>,
    workers: Workers,
    idle_timeout: Duration,
}

impl Dispatcher {
    pub fn new(handler: Arc<ConversationHandler>) -> Self {
        Self::with_idle_timeout(handler, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(handler: Arc<ConversationHandler>, idle_timeout: Duration) -> Self {
        Self {
            handler,
            workers: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    pub fn handler(&self) -> &Arc<ConversationHandler> {
        &self.handler
    }

    /// Queue an event behind earlier events of the same conversation.
    ///
    /// Returns once the event is queued, not once it is handled.
    pub async fn dispatch(&self, event: InboundEvent) {
        let mut workers = self.workers.lock().await;
        let id = event.conversation_id.clone();

        let event = match workers.get(&id) {
            Some(tx) => match tx.send(event) {
                Ok(()) => return,
                // Worker is gone without deregistering; replace it
                Err(mpsc::error::SendError(event)) => {
                    warn!("Worker for {} vanished, restarting", id);
                    workers.remove(&id);
                    event
                }
            },
            None => event,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        if tx.send(event).is_err() {
            return;
        }
        workers.insert(id.clone(), tx);
        debug!("Started worker for {}", id);

        tokio::spawn(run_worker(
            id,
            rx,
            self.handler.clone(),
            self.workers.clone(),
            self.idle_timeout,
        ));
    }

    /// Number of conversations with a live worker.
    pub async fn active_workers(&self) -> usize {
        self.workers.lock().await.len()
    }
}

async fn run_worker(
    id: String,
    mut rx: UnboundedReceiver<InboundEvent>,
    handler: Arc<ConversationHandler>,
    workers: Workers,
    idle_timeout: Duration,
) {
    loop {
        let event = match timeout(idle_timeout, rx.recv()).await {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(_) => {
                // Dispatch sends under this lock, so an empty queue here
                // means nothing can slip in before we deregister.
                let mut registered = workers.lock().await;
                match rx.try_recv() {
                    Ok(event) => event,
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
                        registered.remove(&id);
                        debug!("Worker for {} retired", id);
                        break;
                    }
                }
            }
        };

        if let Err(e) = handler.handle(&event).await {
            warn!("Failed to reply in {}: {}", event.conversation_id, e);
        }
    }
}
