//! # Rate Limiter
//!
//! Sliding-window admission control. One instance per widget; every send
//! attempt goes through [`RateLimiter::try_acquire`].

use std::collections::VecDeque;
use std::time::Duration;

use log::debug;
use tokio::time::Instant;

pub const DEFAULT_MAX_REQUESTS: usize = 10;
pub const DEFAULT_WINDOW_MS: u64 = 60_000;

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    /// Accepted send times, oldest first.
    accepted: VecDeque<Instant>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, Duration::from_millis(DEFAULT_WINDOW_MS))
    }
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            accepted: VecDeque::with_capacity(max_requests),
        }
    }

    /// Admits a send now, or denies it without recording anything.
    pub fn try_acquire(&mut self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&mut self, now: Instant) -> bool {
        // Insertion order is chronological, so stale entries form a prefix.
        while let Some(&oldest) = self.accepted.front() {
            if now.saturating_duration_since(oldest) > self.window {
                self.accepted.pop_front();
            } else {
                break;
            }
        }

        if self.accepted.len() >= self.max_requests {
            debug!(
                "Rate limit hit: {} sends in the last {}ms",
                self.accepted.len(),
                self.window.as_millis()
            );
            return false;
        }

        self.accepted.push_back(now);
        true
    }

    /// Number of accepted sends still inside the window as of the last call.
    pub fn in_window(&self) -> usize {
        self.accepted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_max_then_denies() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.try_acquire_at(now));
        assert!(limiter.try_acquire_at(now));
        assert!(limiter.try_acquire_at(now));
        assert!(!limiter.try_acquire_at(now));
        assert_eq!(limiter.in_window(), 3);
    }

    #[test]
    fn test_denial_records_nothing() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(10));
        let start = Instant::now();
        assert!(limiter.try_acquire_at(start));
        for offset in 1..=10 {
            assert!(!limiter.try_acquire_at(start + Duration::from_secs(offset)));
        }
        // Denied calls did not extend the window: the first entry expires on schedule.
        assert!(limiter.try_acquire_at(start + Duration::from_millis(10_001)));
    }

    #[test]
    fn test_old_entries_are_evicted() {
        let mut limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();
        assert!(limiter.try_acquire_at(start));
        assert!(limiter.try_acquire_at(start + Duration::from_secs(30)));
        assert!(!limiter.try_acquire_at(start + Duration::from_secs(59)));
        assert!(limiter.try_acquire_at(start + Duration::from_secs(61)));
        assert_eq!(limiter.in_window(), 2);
    }

    #[test]
    fn test_no_window_exceeds_max() {
        let max = 4;
        let window = Duration::from_millis(1_000);
        let mut limiter = RateLimiter::new(max, window);
        let start = Instant::now();

        // Bursty, irregular arrival pattern.
        let mut accepted = Vec::new();
        let mut t = 0u64;
        for i in 0..500u64 {
            t += (i * 37) % 211;
            let at = start + Duration::from_millis(t);
            if limiter.try_acquire_at(at) {
                accepted.push(at);
            }
        }

        assert!(!accepted.is_empty());
        for (i, &first) in accepted.iter().enumerate() {
            let in_window = accepted[i..]
                .iter()
                .take_while(|&&at| at.saturating_duration_since(first) <= window)
                .count();
            assert!(in_window <= max, "window starting at #{i} holds {in_window}");
        }
    }

    #[test]
    fn test_defaults() {
        let mut limiter = RateLimiter::default();
        let now = Instant::now();
        for _ in 0..DEFAULT_MAX_REQUESTS {
            assert!(limiter.try_acquire_at(now));
        }
        assert!(!limiter.try_acquire_at(now));
    }
}
