//! Configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use angel_engine::DEFAULT_MAX_ATTEMPTS;
use conversation::RateLimit;

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Caller id of the organizer.
    pub admin_id: String,
    /// SQLite database URL.
    pub database_url: String,
    /// Signal daemon URL.
    pub signal_daemon_url: String,
    /// Account for multi-account daemons.
    pub signal_daemon_account: Option<String>,
    /// The bot's own number; its messages are ignored.
    pub bot_number: Option<String>,
    /// Retry bound for matching a group.
    pub match_max_attempts: usize,
    pub rate_limit: RateLimit,
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `ANGEL_ADMIN_ID` | Organizer's caller id | (required) |
    /// | `SQLITE_PATH` | SQLite file path or `sqlite:` URL | `./data/angel.db` |
    /// | `SIGNAL_DAEMON_URL` | Signal daemon URL | `http://127.0.0.1:8080` |
    /// | `SIGNAL_DAEMON_ACCOUNT` | Daemon account | (none) |
    /// | `ANGEL_NUMBER` | Bot phone number | (none) |
    /// | `MATCH_MAX_ATTEMPTS` | Matching retry bound | `100` |
    /// | `RATE_LIMIT_MAX_MESSAGES` | Messages per caller per window | `20` |
    /// | `RATE_LIMIT_WINDOW_SECS` | Rate limit window | `60` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let admin_id = var("ANGEL_ADMIN_ID")
            .filter(|id| id != "0")
            .ok_or(ConfigError::MissingAdminId)?;

        let database_url = sqlite_url(&var("SQLITE_PATH").unwrap_or_else(|| "./data/angel.db".to_string()));

        let signal_daemon_url =
            var("SIGNAL_DAEMON_URL").unwrap_or_else(|| "http://127.0.0.1:8080".to_string());

        let match_max_attempts = parse_or(&var, "MATCH_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;
        if match_max_attempts == 0 {
            return Err(ConfigError::InvalidNumber {
                var: "MATCH_MAX_ATTEMPTS",
                value: "0".to_string(),
            });
        }

        let defaults = RateLimit::default();
        let rate_limit = RateLimit {
            max_messages: parse_or(&var, "RATE_LIMIT_MAX_MESSAGES", defaults.max_messages)?,
            window: Duration::from_secs(parse_or(
                &var,
                "RATE_LIMIT_WINDOW_SECS",
                defaults.window.as_secs(),
            )?),
        };

        Ok(Self {
            admin_id,
            database_url,
            signal_daemon_url,
            signal_daemon_account: var("SIGNAL_DAEMON_ACCOUNT"),
            bot_number: var("ANGEL_NUMBER"),
            match_max_attempts,
            rate_limit,
        })
    }

    /// Filesystem path of the database, when it is a plain file.
    pub fn database_path(&self) -> Option<&str> {
        let rest = self.database_url.strip_prefix("sqlite:")?;
        let path = rest.split('?').next().unwrap_or(rest);
        let path = path.strip_prefix("//").unwrap_or(path);
        (!path.is_empty() && !path.starts_with(":memory:")).then_some(path)
    }
}

fn sqlite_url(path: &str) -> String {
    if path.starts_with("sqlite:") {
        path.to_string()
    } else {
        format!("sqlite:{}?mode=rwc", path)
    }
}

fn parse_or<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var: key, value }),
        None => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ANGEL_ADMIN_ID environment variable is required and must not be 0")]
    MissingAdminId,

    #[error("{var} must be a positive whole number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}
