//! Rate Limiting
//!
//! Fixed-window request counting per client key. Counters live behind the
//! [`RateLimitStore`] trait so the in-process map can be swapped for a shared
//! store without touching the middleware. Expired windows are removed by an
//! explicit cleanup task ([`spawn_cleanup`]), not as a side effect of reads.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// Request count within the window that started at `started_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub count: u32,
    pub started_at: Instant,
}

#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Current window for `key`, if any.
    async fn get(&self, key: &str) -> Option<RateWindow>;

    /// Count one request for `key` at `now`. A window older than `window`
    /// is replaced by a fresh one starting at `now`.
    async fn increment(&self, key: &str, now: Instant, window: Duration) -> RateWindow;

    /// Remove windows that started before `cutoff`; returns how many were removed.
    async fn evict(&self, cutoff: Instant) -> usize;
}

#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.windows.lock().await.len()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn get(&self, key: &str) -> Option<RateWindow> {
        self.windows.lock().await.get(key).copied()
    }

    async fn increment(&self, key: &str, now: Instant, window: Duration) -> RateWindow {
        let mut windows = self.windows.lock().await;
        let entry = windows.entry(key.to_string()).or_insert(RateWindow {
            count: 0,
            started_at: now,
        });
        if now.saturating_duration_since(entry.started_at) >= window {
            *entry = RateWindow {
                count: 0,
                started_at: now,
            };
        }
        entry.count += 1;
        *entry
    }

    async fn evict(&self, cutoff: Instant) -> usize {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, w| w.started_at >= cutoff);
        before - windows.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

/// Fixed-window policy on top of a [`RateLimitStore`].
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, max_requests: u32, window: Duration) -> Self {
        Self {
            store,
            max_requests,
            window,
        }
    }

    pub async fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now()).await
    }

    pub async fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let current = self.store.increment(key, now, self.window).await;
        if current.count > self.max_requests {
            let elapsed = now.saturating_duration_since(current.started_at);
            RateDecision::Limited {
                retry_after: self.window.saturating_sub(elapsed),
            }
        } else {
            RateDecision::Allowed {
                remaining: self.max_requests - current.count,
            }
        }
    }
}

/// Periodically evict windows older than `window`.
pub fn spawn_cleanup(store: Arc<dyn RateLimitStore>, window: Duration, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Some(cutoff) = Instant::now().checked_sub(window) {
                let evicted = store.evict(cutoff).await;
                if evicted > 0 {
                    debug!(evicted, "Evicted expired rate-limit windows");
                }
            }
        }
    })
}
