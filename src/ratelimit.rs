//! Two-tier admission control for the analyze endpoint.
//!
//! Gate one is a per-client sliding window: each client identity may make at
//! most `client_limit` requests in the trailing `client_window`. Gate two is
//! a global lazily-reset fixed window capping admitted requests across all
//! clients, a failsafe for aggregate cost exposure even when every client
//! stays under its individual limit. Both gates inspect only timing and
//! identity, never request content.
//!
//! The limiter is an owned, injectable object rather than module-level
//! state; every check has an `_at` variant taking an explicit `Instant` so
//! tests can drive the clock. Check-then-increment happens under the
//! per-client entry lock (DashMap shard) or the global mutex, so concurrent
//! admission cannot exceed the stated limits.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::http::{HeaderMap, HeaderValue};
use dashmap::DashMap;

pub const DEFAULT_CLIENT_LIMIT: u32 = 10;
pub const DEFAULT_CLIENT_WINDOW_SECS: u64 = 5 * 60;
pub const DEFAULT_GLOBAL_LIMIT: u64 = 200;
pub const DEFAULT_GLOBAL_WINDOW_SECS: u64 = 60 * 60;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitSettings {
    pub client_limit: u32,
    pub client_window: Duration,
    pub global_limit: u64,
    pub global_window: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            client_limit: DEFAULT_CLIENT_LIMIT,
            client_window: Duration::from_secs(DEFAULT_CLIENT_WINDOW_SECS),
            global_limit: DEFAULT_GLOBAL_LIMIT,
            global_window: Duration::from_secs(DEFAULT_GLOBAL_WINDOW_SECS),
        }
    }
}

/// Outcome of the per-client gate, also the source of the standard
/// `RateLimit-*` response headers.
#[derive(Debug, Clone, Copy)]
pub struct ClientDecision {
    pub admitted: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the oldest counted request leaves the window.
    pub reset_secs: u64,
}

impl ClientDecision {
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("ratelimit-limit", int_header(self.limit as u64));
        headers.insert("ratelimit-remaining", int_header(self.remaining as u64));
        headers.insert("ratelimit-reset", int_header(self.reset_secs));
        headers
    }
}

fn int_header(v: u64) -> HeaderValue {
    HeaderValue::from_str(&v.to_string()).unwrap_or_else(|_| HeaderValue::from_static("0"))
}

struct GlobalWindow {
    window_start: Instant,
    calls_this_window: u64,
}

/// Process-wide admission state. One instance lives in `AppState`; tests
/// construct their own.
pub struct RateLimiter {
    settings: RateLimitSettings,
    clients: DashMap<String, VecDeque<Instant>>,
    global: Mutex<GlobalWindow>,
    last_sweep: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        let now = Instant::now();
        Self {
            settings,
            clients: DashMap::new(),
            global: Mutex::new(GlobalWindow {
                window_start: now,
                calls_this_window: 0,
            }),
            last_sweep: Mutex::new(now),
        }
    }

    pub fn settings(&self) -> &RateLimitSettings {
        &self.settings
    }

    /// Per-client sliding-window gate. Admission records the request.
    pub fn check_client(&self, client: &str) -> ClientDecision {
        self.check_client_at(client, Instant::now())
    }

    pub fn check_client_at(&self, client: &str, now: Instant) -> ClientDecision {
        self.sweep_stale_at(now);
        let window = self.settings.client_window;
        let limit = self.settings.client_limit;
        let mut entry = self.clients.entry(client.to_string()).or_default();

        // Drop timestamps that have slid out of the trailing window.
        while let Some(front) = entry.front() {
            if now.saturating_duration_since(*front) >= window {
                entry.pop_front();
            } else {
                break;
            }
        }

        let reset_secs = |deque: &VecDeque<Instant>| -> u64 {
            deque
                .front()
                .map(|front| {
                    window
                        .saturating_sub(now.saturating_duration_since(*front))
                        .as_secs()
                })
                .unwrap_or_else(|| window.as_secs())
        };

        if entry.len() as u32 >= limit {
            return ClientDecision {
                admitted: false,
                limit,
                remaining: 0,
                reset_secs: reset_secs(&entry),
            };
        }

        entry.push_back(now);
        ClientDecision {
            admitted: true,
            limit,
            remaining: limit - entry.len() as u32,
            reset_secs: reset_secs(&entry),
        }
    }

    /// Drop client entries whose newest timestamp has left the window, so
    /// the map does not grow monotonically with distinct identities (which
    /// are attacker-controlled when a forwarded header is trusted). Runs at
    /// most once per window; the sweep must complete before any entry lock
    /// is taken.
    fn sweep_stale_at(&self, now: Instant) {
        let window = self.settings.client_window;
        {
            let mut last = self.last_sweep.lock().expect("rate limiter mutex poisoned");
            if now.saturating_duration_since(*last) < window {
                return;
            }
            *last = now;
        }
        self.clients.retain(|_, stamps| {
            stamps
                .back()
                .map_or(false, |newest| now.saturating_duration_since(*newest) < window)
        });
    }

    /// Number of client identities currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    /// Global fixed-window gate. The window resets lazily: a request
    /// arriving after the window's duration has elapsed moves the window
    /// start to `now` and zeroes the counter before evaluation.
    pub fn check_global(&self) -> bool {
        self.check_global_at(Instant::now())
    }

    pub fn check_global_at(&self, now: Instant) -> bool {
        let mut global = self.global.lock().expect("rate limiter mutex poisoned");
        if now.saturating_duration_since(global.window_start) >= self.settings.global_window {
            global.window_start = now;
            global.calls_this_window = 0;
        }
        if global.calls_this_window >= self.settings.global_limit {
            return false;
        }
        global.calls_this_window += 1;
        true
    }
}
