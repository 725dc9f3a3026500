use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::models::SecurityError;

pub const LOGIN_MAX_ATTEMPTS: usize = 5;
pub const LOGIN_WINDOW: Duration = Duration::from_secs(900);

/// Sliding-window request limiter keyed by client address.
///
/// Keys with no attempt left inside the window are swept at most once per window.
pub struct RateLimiter {
    windows: HashMap<String, Vec<Instant>>,
    limit: usize,
    window: Duration,
    last_sweep: Instant,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            windows: HashMap::new(),
            limit,
            window,
            last_sweep: Instant::now(),
        }
    }

    pub fn check(&mut self, key: &str) -> Result<(), SecurityError> {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&mut self, key: &str, now: Instant) -> Result<(), SecurityError> {
        if now.saturating_duration_since(self.last_sweep) >= self.window {
            self.prune(now);
        }

        let window = self.window;
        let entries = self.windows.entry(key.to_string()).or_default();
        entries.retain(|ts| now.saturating_duration_since(*ts) < window);

        if entries.len() >= self.limit {
            warn!(target: "security", "Rate limit exceeded for {}", key);
            return Err(SecurityError::RateLimited);
        }

        entries.push(now);
        Ok(())
    }

    /// Drops keys whose window has fully elapsed.
    pub fn prune(&mut self, now: Instant) {
        sweep(&mut self.windows, now, self.window);
        self.last_sweep = now;
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

/// Brute-force guard for logins: every attempt counts until a success clears the record.
pub struct LoginThrottle {
    attempts: HashMap<String, Vec<Instant>>,
    max_attempts: usize,
    window: Duration,
    last_sweep: Instant,
}

impl Default for LoginThrottle {
    fn default() -> Self {
        Self::new(LOGIN_MAX_ATTEMPTS, LOGIN_WINDOW)
    }
}

impl LoginThrottle {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            attempts: HashMap::new(),
            max_attempts,
            window,
            last_sweep: Instant::now(),
        }
    }

    /// Records an attempt and returns how many remain before the account locks.
    pub fn record_attempt(&mut self, username: &str) -> Result<usize, SecurityError> {
        self.record_attempt_at(username, Instant::now())
    }

    pub fn record_attempt_at(&mut self, username: &str, now: Instant) -> Result<usize, SecurityError> {
        if now.saturating_duration_since(self.last_sweep) >= self.window {
            sweep(&mut self.attempts, now, self.window);
            self.last_sweep = now;
        }

        let window = self.window;
        let entries = self.attempts.entry(username.to_string()).or_default();
        entries.retain(|ts| now.saturating_duration_since(*ts) < window);
        entries.push(now);

        if entries.len() >= self.max_attempts {
            warn!(target: "security", "Account locked due to failed attempts: {}", username);
            return Err(SecurityError::AccountLocked);
        }

        Ok(self.max_attempts - entries.len())
    }

    pub fn clear(&mut self, username: &str) {
        self.attempts.remove(username);
    }

    pub fn tracked_usernames(&self) -> usize {
        self.attempts.len()
    }
}

fn sweep(entries: &mut HashMap<String, Vec<Instant>>, now: Instant, window: Duration) {
    entries.retain(|_, stamps| {
        stamps.retain(|ts| now.saturating_duration_since(*ts) < window);
        !stamps.is_empty()
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn limits_within_window() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(60));
        let start = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at("10.0.0.1", start).is_ok());
        }
        assert_matches!(limiter.check_at("10.0.0.1", start), Err(SecurityError::RateLimited));
        assert!(limiter.check_at("10.0.0.2", start).is_ok());
    }

    #[test]
    fn window_slides() {
        let mut limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();

        limiter.check_at("ip", start).unwrap();
        limiter.check_at("ip", start + Duration::from_secs(30)).unwrap();
        assert!(limiter.check_at("ip", start + Duration::from_secs(45)).is_err());
        assert!(limiter.check_at("ip", start + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn prune_forgets_idle_clients() {
        let mut limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();
        limiter.check_at("a", start).unwrap();
        limiter.check_at("b", start + Duration::from_secs(50)).unwrap();

        limiter.prune(start + Duration::from_secs(70));
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn checks_forget_clients_once_their_window_passes() {
        let mut limiter = RateLimiter::new(5, Duration::from_secs(60));
        let start = Instant::now();
        for n in 0..100 {
            limiter.check_at(&format!("10.0.0.{}", n), start).unwrap();
        }
        assert_eq!(limiter.tracked_keys(), 100);

        limiter.check_at("10.0.1.1", start + Duration::from_secs(30)).unwrap();
        assert_eq!(limiter.tracked_keys(), 101);

        limiter.check_at("10.0.1.2", start + Duration::from_secs(61)).unwrap();
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[test]
    fn throttle_forgets_stale_usernames() {
        let mut throttle = LoginThrottle::default();
        let start = Instant::now();
        for n in 0..50 {
            throttle.record_attempt_at(&format!("guess_{}", n), start).unwrap();
        }
        assert_eq!(throttle.tracked_usernames(), 50);

        throttle.record_attempt_at("carol", start + LOGIN_WINDOW).unwrap();
        assert_eq!(throttle.tracked_usernames(), 1);
    }

    #[test]
    fn fifth_attempt_locks() {
        let mut throttle = LoginThrottle::default();
        let start = Instant::now();

        for remaining in (1..=4).rev() {
            assert_eq!(throttle.record_attempt_at("bob", start).unwrap(), remaining);
        }
        assert_matches!(throttle.record_attempt_at("bob", start), Err(SecurityError::AccountLocked));
        assert_eq!(throttle.record_attempt_at("alice", start).unwrap(), 4);
    }

    #[test]
    fn lock_expires_and_clear_resets() {
        let mut throttle = LoginThrottle::default();
        let start = Instant::now();
        for _ in 0..5 {
            let _ = throttle.record_attempt_at("bob", start);
        }

        assert!(throttle.record_attempt_at("bob", start + LOGIN_WINDOW).is_ok());

        throttle.clear("bob");
        assert_eq!(throttle.record_attempt_at("bob", start + LOGIN_WINDOW).unwrap(), 4);
    }
}
