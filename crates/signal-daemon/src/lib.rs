//! Minimal signal-cli daemon client.
//!
//! Sends text to people and groups over JSON-RPC and receives envelopes
//! over Server-Sent Events.
//!
//! # Example
//!
//! ```no_run
//! use futures::StreamExt;
//! use signal_daemon::{DaemonConfig, SignalClient};
//!
//! # async fn example() -> Result<(), signal_daemon::DaemonError> {
//! let client = SignalClient::connect(DaemonConfig::default()).await?;
//!
//! let mut messages = signal_daemon::subscribe(&client)?;
//! while let Some(Ok(envelope)) = messages.next().await {
//!     if let Some(text) = envelope.text() {
//!         client.send_text(envelope.sender(), text).await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod sse;
pub mod types;

pub use client::SignalClient;
pub use config::DaemonConfig;
pub use error::DaemonError;
pub use sse::{subscribe, MessageStream, ReconnectConfig};
pub use types::{DataMessage, Envelope, GroupInfo, ReceiveEvent, SendParams, SendResult};
