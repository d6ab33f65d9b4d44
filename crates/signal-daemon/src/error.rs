//! Error types for the daemon client.

use thiserror::Error;

/// Errors talking to the signal-cli daemon.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON-RPC error object returned by the daemon.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i32, message: String },

    /// Non-success HTTP status.
    #[error("daemon returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("health check failed")]
    HealthCheckFailed,

    /// Events stream failure.
    #[error("SSE error: {0}")]
    Sse(String),
}
