//! Per-client fixed-window admission control.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::RateLimitConfig;

/// Admission state of one client within the current window.
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    started: Instant,
    count: u32,
}

/// Limit disclosure for one admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Requests allowed per window.
    pub limit: u32,
    /// Requests still allowed in the current window.
    pub remaining: u32,
    /// Time until the current window resets.
    pub reset_after: Duration,
}

impl RateLimitInfo {
    /// Seconds until reset, rounded up.
    pub fn reset_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        if self.reset_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted(RateLimitInfo),
    Rejected(RateLimitInfo),
}

impl Admission {
    pub fn info(&self) -> RateLimitInfo {
        match self {
            Admission::Admitted(info) | Admission::Rejected(info) => *info,
        }
    }

    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted(_))
    }
}

/// Admission control keyed by client identity.
///
/// Implementations never fail; they only admit or reject.
pub trait AdmissionControl: Send + Sync {
    fn admit(&self, client: &str) -> Admission;
}

/// In-memory fixed-window counter, one window per client.
///
/// The read-modify-write of a window happens under the map's per-key
/// write lock, so concurrent requests from one client cannot over-admit.
pub struct FixedWindowLimiter {
    windows: DashMap<String, RateWindow>,
    window: Duration,
    max_requests: u32,
}

impl FixedWindowLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            windows: DashMap::new(),
            window,
            max_requests,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.window(), config.max_requests)
    }

    /// Admission check against an explicit clock reading.
    pub fn admit_at(&self, client: &str, now: Instant) -> Admission {
        let mut entry = self
            .windows
            .entry(client.to_owned())
            .or_insert(RateWindow { started: now, count: 0 });
        let window = entry.value_mut();

        if now.saturating_duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }

        // Capped at max + 1 so sustained abuse cannot grow the counter.
        if window.count <= self.max_requests {
            window.count += 1;
        }

        let info = RateLimitInfo {
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(window.count),
            reset_after: self
                .window
                .saturating_sub(now.saturating_duration_since(window.started)),
        };

        if window.count <= self.max_requests {
            Admission::Admitted(info)
        } else {
            Admission::Rejected(info)
        }
    }

    /// Drop every window that has fully elapsed. Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        before.saturating_sub(self.windows.len())
    }

    /// Number of clients with a live window.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

impl AdmissionControl for FixedWindowLimiter {
    fn admit(&self, client: &str) -> Admission {
        self.admit_at(client, Instant::now())
    }
}

/// Periodically evict expired windows until shutdown.
pub async fn run_sweeper(
    limiter: Arc<FixedWindowLimiter>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = time::interval(interval);
    // First tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = limiter.purge_expired(Instant::now());
                if removed > 0 {
                    tracing::debug!(
                        removed,
                        tracked = limiter.tracked_clients(),
                        "Evicted expired rate windows"
                    );
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Rate window sweeper received shutdown signal, exiting loop");
                break;
            }
        }
    }
}
