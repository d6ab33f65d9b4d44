//! Conversational flows for the Secret Angel organizer.
//!
//! This crate turns inbound chat events into replies:
//!
//! - [`ConversationHandler`] - the per-conversation state machine
//!   (registration, assignment lookup, admin group creation and wipe)
//! - [`ConversationStore`] - in-memory flow state keyed by conversation id
//! - [`RateLimiter`] - per-caller admission check
//! - [`Dispatcher`] - runs one sequential worker per conversation
//! - [`MessageSender`] - the outbound transport seam
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use angel_engine::AssignmentEngine;
//! use conversation::{
//!     ConversationHandler, Dispatcher, HandlerConfig, InboundEvent, LoggingSender,
//! };
//! use database::Database;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite:angel.db?mode=rwc").await?;
//! db.migrate().await?;
//!
//! let engine = AssignmentEngine::with_defaults(db.clone());
//! let handler = ConversationHandler::new(
//!     db,
//!     engine,
//!     Arc::new(LoggingSender),
//!     HandlerConfig::new("+15550001111"),
//! );
//! let dispatcher = Dispatcher::new(Arc::new(handler));
//!
//! dispatcher
//!     .dispatch(InboundEvent::direct("+15552223333", "/register"))
//!     .await;
//! # Ok(())
//! # }
//! ```

mod dispatcher;
mod error;
mod event;
mod handler;
mod messages;
mod rate_limit;
mod sender;
mod state;

pub use dispatcher::Dispatcher;
pub use error::ConversationError;
pub use event::{Command, InboundEvent};
pub use handler::{ConversationHandler, HandlerConfig};
pub use rate_limit::{Admission, RateLimit, RateLimiter};
pub use sender::{LoggingSender, MessageSender, NoOpSender, RecordingSender, SentMessage};
pub use state::{ConversationState, ConversationStore};
