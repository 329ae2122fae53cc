//! C10 — Rate Limiter / Quota (spec §4.10).
//!
//! Process-local, `parking_lot`-guarded counters — the same concurrency
//! primitive choice as the Index Store (spec §9 "Concurrency primitives").

use crate::config::RateLimitConfig;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

struct Window {
    events: Vec<Instant>,
}

/// Sliding-window limiter keyed by `(effective_root, target)`.
pub struct RateLimiter {
    config: Option<RateLimitConfig>,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(config: Option<RateLimitConfig>) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record an attempt for `key`; returns `false` if the sliding window
    /// quota is already exceeded.
    pub fn try_acquire(&self, key: &str) -> bool {
        let Some(cfg) = &self.config else {
            return true;
        };
        let now = Instant::now();
        let window_dur = Duration::from_millis(cfg.window_ms);

        let mut windows = self.windows.lock();
        let entry = windows.entry(key.to_string()).or_insert_with(|| Window {
            events: Vec::new(),
        });
        entry.events.retain(|t| now.duration_since(*t) < window_dur);

        if entry.events.len() as u32 >= cfg.max_requests {
            return false;
        }
        entry.events.push(now);
        true
    }

    #[must_use]
    pub fn config(&self) -> Option<&RateLimitConfig> {
        self.config.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_blocks() {
        let limiter = RateLimiter::new(Some(RateLimitConfig {
            max_requests: 2,
            window_ms: 10_000,
        }));
        assert!(limiter.try_acquire("root:/a"));
        assert!(limiter.try_acquire("root:/a"));
        assert!(!limiter.try_acquire("root:/a"));
    }

    #[test]
    fn unlimited_when_no_config() {
        let limiter = RateLimiter::new(None);
        for _ in 0..100 {
            assert!(limiter.try_acquire("any"));
        }
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(Some(RateLimitConfig {
            max_requests: 1,
            window_ms: 10_000,
        }));
        assert!(limiter.try_acquire("a"));
        assert!(limiter.try_acquire("b"));
        assert!(!limiter.try_acquire("a"));
    }
}
