//! Keyed request rate limiting.
//!
//! Callers depend on the [`RateLimiter`] capability only; the in-memory
//! implementation below is per process, so a horizontally scaled deployment
//! should provide an implementation backed by a shared store.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub trait RateLimiter: Send + Sync {
    /// Records a request for `key` and returns whether it is allowed.
    fn check(&self, key: &str) -> bool;
}

/// Sliding-window limiter keeping recent request timestamps per key.
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl InMemoryRateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // drop keys whose whole window has expired
        windows.retain(|_, timestamps| {
            timestamps
                .back()
                .is_some_and(|last| now.duration_since(*last) <= self.window)
        });

        let timestamps = windows.entry(key.to_string()).or_default();
        while let Some(ts) = timestamps.front() {
            if now.duration_since(*ts) > self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.max_requests {
            return false;
        }

        timestamps.push_back(now);
        true
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_over_limit_per_key() {
        let limiter = InMemoryRateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.check("player-1"));
        assert!(limiter.check("player-1"));
        assert!(!limiter.check("player-1"));
        // other keys are unaffected
        assert!(limiter.check("player-2"));
    }

    #[test]
    fn test_window_expiry_allows_again() {
        let limiter = InMemoryRateLimiter::new(1, Duration::from_secs(10));
        let start = Instant::now();
        assert!(limiter.check_at("k", start));
        assert!(!limiter.check_at("k", start + Duration::from_secs(5)));
        assert!(limiter.check_at("k", start + Duration::from_secs(11)));
    }
}
