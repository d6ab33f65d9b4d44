//! Per-caller admission check.

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use tokio::sync::Mutex;

/// Default maximum number of callers to track before LRU eviction.
const DEFAULT_MAX_CALLERS: usize = 10000;

/// Messages allowed per caller within one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_messages: u32,
    pub window: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            max_messages: 20,
            window: Duration::from_secs(60),
        }
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// Over the limit. `notify` is set only for the first rejection in a
    /// window so the caller hears about it once.
    Limited { notify: bool },
}

impl Admission {
    pub fn is_allowed(self) -> bool {
        matches!(self, Admission::Allowed)
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
    notified: bool,
}

/// Fixed-window rate limiter keyed by caller id.
#[derive(Debug)]
pub struct RateLimiter {
    limit: RateLimit,
    windows: Mutex<IndexMap<String, Window>>,
    max_callers: usize,
}

impl RateLimiter {
    pub fn new(limit: RateLimit) -> Self {
        Self::with_capacity(limit, DEFAULT_MAX_CALLERS)
    }

    pub fn with_capacity(limit: RateLimit, max_callers: usize) -> Self {
        Self {
            limit,
            windows: Mutex::new(IndexMap::new()),
            max_callers: max_callers.max(1),
        }
    }

    pub fn limit(&self) -> RateLimit {
        self.limit
    }

    /// Record a message from `caller`.
    pub async fn check(&self, caller: &str) -> Admission {
        self.check_at(caller, Instant::now()).await
    }

    async fn check_at(&self, caller: &str, now: Instant) -> Admission {
        let mut windows = self.windows.lock().await;

        let mut window = match windows.shift_remove(caller) {
            Some(w) if now.saturating_duration_since(w.started) < self.limit.window => w,
            _ => Window {
                started: now,
                count: 0,
                notified: false,
            },
        };

        let admission = if window.count < self.limit.max_messages {
            window.count += 1;
            Admission::Allowed
        } else {
            let notify = !window.notified;
            window.notified = true;
            Admission::Limited { notify }
        };
        windows.insert(caller.to_string(), window);

        while windows.len() > self.max_callers {
            windows.shift_remove_index(0);
        }

        admission
    }

    /// Number of callers currently tracked.
    pub async fn tracked(&self) -> usize {
        self.windows.lock().await.len()
    }
}
