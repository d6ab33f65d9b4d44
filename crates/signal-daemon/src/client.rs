//! JSON-RPC client for the signal-cli daemon.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::DaemonConfig;
use crate::error::DaemonError;
use crate::types::{SendParams, SendResult};

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<P>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i32,
    message: String,
}

/// Handle to a running signal-cli daemon. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SignalClient {
    http: Client,
    config: DaemonConfig,
    next_id: Arc<AtomicU64>,
}

impl SignalClient {
    /// Build a client without contacting the daemon.
    pub fn new(config: DaemonConfig) -> Result<Self, DaemonError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            config,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Build a client and verify the daemon answers its health check.
    pub async fn connect(config: DaemonConfig) -> Result<Self, DaemonError> {
        let client = Self::new(config)?;
        if !client.health_check().await? {
            return Err(DaemonError::HealthCheckFailed);
        }
        info!("Connected to signal-cli daemon at {}", client.config.base_url);
        Ok(client)
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    /// `true` when the check endpoint answers with a success status.
    pub async fn health_check(&self) -> Result<bool, DaemonError> {
        let url = self.config.check_url();
        debug!("Health check: {}", url);
        let response = self.http.get(&url).send().await?;
        Ok(response.status().is_success())
    }

    /// Send a message, filling in the configured account.
    pub async fn send(&self, mut params: SendParams) -> Result<SendResult, DaemonError> {
        if params.account.is_none() {
            params.account = self.config.account.clone();
        }
        self.rpc_call("send", Some(params)).await
    }

    pub async fn send_text(&self, recipient: &str, message: &str) -> Result<SendResult, DaemonError> {
        self.send(SendParams::direct(recipient, message)).await
    }

    pub async fn send_to_group(&self, group_id: &str, message: &str) -> Result<SendResult, DaemonError> {
        self.send(SendParams::group(group_id, message)).await
    }

    /// Make a JSON-RPC 2.0 call.
    pub async fn rpc_call<P, R>(&self, method: &str, params: Option<P>) -> Result<R, DaemonError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };
        debug!("RPC call: {} (id={})", method, id);

        let response = self
            .http
            .post(self.config.rpc_url())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DaemonError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: RpcResponse<R> = response.json().await?;
        if let Some(error) = body.error {
            return Err(DaemonError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        body.result.ok_or_else(|| DaemonError::Rpc {
            code: -1,
            message: format!("no result for {method}"),
        })
    }

    /// HTTP client without a request timeout, for long-lived streams.
    pub(crate) fn streaming_http(&self) -> Result<Client, DaemonError> {
        Ok(Client::builder().build()?)
    }
}
