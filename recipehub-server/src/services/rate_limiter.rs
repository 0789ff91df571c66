//! Per-user request limiting for the chat endpoint
//!
//! Fixed windows: the first request for a key opens a window, every request
//! inside it increments the counter, and the first request after it ends
//! starts over at 1. Counters live in a [`CounterStore`]; the SQLite store
//! lets several server instances sharing one database share the limit.

use async_trait::async_trait;
use recipehub_common::config::ChatConfig;
use recipehub_common::Result;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::db::rate_limits;

/// Keyed counters with fixed-window expiry
#[async_trait]
pub trait CounterStore: Send + Sync + fmt::Debug {
    /// Count this hit and return the number of hits in the current window
    async fn increment(&self, key: &str, window: Duration) -> Result<u64>;
}

/// Process-local counters
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: Mutex<HashMap<String, (u64, Instant)>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn increment_at(&self, key: &str, window: Duration, now: Instant) -> u64 {
        let mut counters = match self.counters.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // Expired windows are dropped lazily so the map doesn't grow forever
        if counters.len() > 10_000 {
            counters.retain(|_, (_, ends_at)| *ends_at > now);
        }

        let entry = counters
            .entry(key.to_string())
            .or_insert((0, now + window));
        if entry.1 <= now {
            *entry = (0, now + window);
        }
        entry.0 += 1;
        entry.0
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<u64> {
        Ok(self.increment_at(key, window, Instant::now()))
    }
}

/// Counters in the `rate_limit_counters` table
#[derive(Debug, Clone)]
pub struct SqliteCounterStore {
    db: SqlitePool,
}

impl SqliteCounterStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CounterStore for SqliteCounterStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<u64> {
        let now = chrono::Utc::now().timestamp();
        let window_secs = window.as_secs().max(1) as i64;
        let (count, _) = rate_limits::increment_counter(&self.db, key, now, window_secs).await?;
        Ok(count.max(0) as u64)
    }
}

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub count: u64,
    pub limit: u64,
}

#[derive(Debug, Clone)]
pub struct ChatRateLimiter {
    store: Arc<dyn CounterStore>,
    max_requests: u64,
    window: Duration,
}

impl ChatRateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, max_requests: u32, window: Duration) -> Self {
        Self {
            store,
            max_requests: max_requests as u64,
            window,
        }
    }

    pub fn from_config(store: Arc<dyn CounterStore>, config: &ChatConfig) -> Self {
        Self::new(store, config.max_requests, Duration::from_secs(config.window_secs))
    }

    /// Count a request from `user` and decide whether it may proceed
    pub async fn check(&self, user: &str) -> Result<RateDecision> {
        let count = self.store.increment(&format!("chat:{}", user), self.window).await?;
        let allowed = count <= self.max_requests;

        if !allowed {
            tracing::warn!(user, count, limit = self.max_requests, "Chat rate limit exceeded");
        }

        Ok(RateDecision {
            allowed,
            count,
            limit: self.max_requests,
        })
    }
}
