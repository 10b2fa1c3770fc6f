//! Submission rate limiting
//!
//! Sliding-window admission control for form submissions. The limiter is an
//! explicitly constructed, injectable service with its own lifecycle: build
//! one at application start and hand it by reference to every form that
//! needs admission control. Keys follow the source convention
//! `form_submit_<formType>`, so all mounted forms of one type share a
//! throttling budget.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::env;
use std::time::{Duration, Instant};

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_WINDOW_SECONDS: u64 = 15 * 60;

/// Rate-limit key for a form type.
pub fn submit_key(form_type: &str) -> String {
    format!("form_submit_{}", form_type)
}

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    pub max_attempts: u32,
    pub window: Duration,
}

impl RateLimiterConfig {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
        }
    }

    pub fn from_env() -> Self {
        let max_attempts = env_u32("FORM_RATE_LIMIT_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS);
        let window_seconds =
            env_u64("FORM_RATE_LIMIT_WINDOW_SECONDS", DEFAULT_WINDOW_SECONDS).max(1);

        tracing::info!(max_attempts, window_seconds, "Form rate limiter configured");

        Self {
            max_attempts,
            window: Duration::from_secs(window_seconds),
        }
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, Duration::from_secs(DEFAULT_WINDOW_SECONDS))
    }
}

/// Sliding-window limiter over per-key attempt timestamps.
///
/// Every check is append-then-filter: expired timestamps are dropped before
/// the decision so entries never grow beyond one window's worth of attempts.
pub struct SubmitRateLimiter {
    config: RateLimiterConfig,
    windows: Mutex<HashMap<String, Vec<Instant>>>,
}

impl SubmitRateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_env() -> Self {
        Self::new(RateLimiterConfig::from_env())
    }

    /// Record an attempt for `key` and decide whether it is admitted.
    /// A denied attempt is not recorded, so waiting out the window always
    /// recovers the budget.
    pub fn is_allowed(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock();
        let attempts = windows.entry(key.to_string()).or_default();

        attempts.retain(|at| now.duration_since(*at) < self.config.window);

        if attempts.len() >= self.config.max_attempts as usize {
            tracing::warn!(key, attempts = attempts.len(), "Submission throttled");
            return false;
        }

        attempts.push(now);
        true
    }

    /// Clear one key's window. Called after a successful submission so it
    /// does not count against future throttling.
    pub fn reset(&self, key: &str) {
        self.windows.lock().remove(key);
    }

    /// Attempts currently recorded inside the window for `key`.
    pub fn attempts_in_window(&self, key: &str) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock();
        match windows.get_mut(key) {
            Some(attempts) => {
                attempts.retain(|at| now.duration_since(*at) < self.config.window);
                attempts.len()
            }
            None => 0,
        }
    }
}

fn env_u32(key: &str, default: u32) -> u32 {
    match env::var(key) {
        Ok(raw) => match raw.parse::<u32>() {
            Ok(value) if value > 0 => value,
            _ => {
                tracing::warn!("Invalid value for {key} (`{raw}`), using default {default}");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(value) if value > 0 => value,
            _ => {
                tracing::warn!("Invalid value for {key} (`{raw}`), using default {default}");
                default
            }
        },
        Err(_) => default,
    }
}
