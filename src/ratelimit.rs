//! Per-key sliding-window rate limiting for post creation.
//!
//! Each key keeps the instants of its admitted requests.  A request is
//! admitted while fewer than `limit` of those fall inside the trailing
//! `window`.  Callers pass `now` explicitly so tests can drive the clock.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Posts allowed per author per window.
pub const POSTS_PER_WINDOW: usize = 3;
/// Length of the rolling window.
pub const POST_WINDOW: Duration = Duration::from_secs(60);

pub struct SlidingWindow {
    limit: usize,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindow {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request for `key` at `now`; `false` means it was rejected.
    pub fn check(&self, key: &str, now: Instant) -> bool {
        let mut hits = match self.hits.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let entry = hits.entry(key.to_string()).or_default();
        while let Some(&oldest) = entry.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                entry.pop_front();
            } else {
                break;
            }
        }
        if entry.len() < self.limit {
            entry.push_back(now);
            true
        } else {
            false
        }
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new(POSTS_PER_WINDOW, POST_WINDOW)
    }
}
