//! Daemon connection settings.

use std::time::Duration;

/// Default timeout for RPC calls.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the signal-cli daemon listens and which account to use.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// HTTP base URL, e.g. `http://127.0.0.1:8080`.
    pub base_url: String,
    /// Account for multi-account daemons. `None` in single-account mode.
    pub account: Option<String>,
    /// Timeout applied to RPC calls. The events stream has none.
    pub request_timeout: Duration,
}

impl DaemonConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            account: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    pub fn rpc_url(&self) -> String {
        format!("{}/api/v1/rpc", self.base_url)
    }

    /// Events endpoint, scoped to the account when one is set.
    pub fn events_url(&self) -> String {
        match &self.account {
            Some(account) => format!(
                "{}/api/v1/events?account={}",
                self.base_url,
                urlencoding::encode(account)
            ),
            None => format!("{}/api/v1/events", self.base_url),
        }
    }

    pub fn check_url(&self) -> String {
        format!("{}/api/v1/check", self.base_url)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self::new("http://127.0.0.1:8080")
    }
}
