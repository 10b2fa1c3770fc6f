//! Debounced field validation
//!
//! Coalesces rapid repeated validation triggers (fast typing) into one
//! delayed [`FormEngine::validate_field`] call per field. Each field holds
//! at most one scheduled task handle; scheduling again before it fires
//! aborts and replaces the handle, so the last call wins and two
//! validations are never in flight for one field. Schedules for different
//! fields are independent.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::engine::FormEngine;

/// Quiet period before a scheduled validation fires.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Quiet period from `FORM_DEBOUNCE_MS`, defaulting to 300ms.
pub fn debounce_from_env() -> Duration {
    match env::var("FORM_DEBOUNCE_MS") {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(ms) if ms > 0 => Duration::from_millis(ms),
            _ => {
                tracing::warn!("Invalid value for FORM_DEBOUNCE_MS (`{raw}`), using default");
                DEFAULT_DEBOUNCE
            }
        },
        Err(_) => DEFAULT_DEBOUNCE,
    }
}

pub struct FieldDebouncer {
    engine: Arc<FormEngine>,
    delay: Duration,
    pending: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl FieldDebouncer {
    pub fn new(engine: Arc<FormEngine>) -> Self {
        Self::with_delay(engine, DEFAULT_DEBOUNCE)
    }

    pub fn with_delay(engine: Arc<FormEngine>, delay: Duration) -> Self {
        Self {
            engine,
            delay,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Schedule `validate_field(field)` after the quiet period, cancelling
    /// any pending schedule for the same field. The validation reads the
    /// value current at fire time, not at schedule time.
    ///
    /// The pending handle is aborted before its replacement is spawned, and
    /// both happen under the map lock, so an expiring old timer can never
    /// fire once the new schedule exists.
    pub fn schedule(&self, field: &str) {
        let engine = Arc::clone(&self.engine);
        let name = field.to_string();
        let delay = self.delay;

        let mut pending = self.pending.lock();
        if let Some(previous) = pending.remove(field) {
            previous.abort();
        }
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            engine.validate_field(&name);
        });
        pending.insert(field.to_string(), handle);
    }

    /// Drop any pending schedule for one field without validating.
    pub fn cancel(&self, field: &str) {
        if let Some(handle) = self.pending.lock().remove(field) {
            handle.abort();
        }
    }

    pub fn cancel_all(&self) {
        let mut pending = self.pending.lock();
        for (_, handle) in pending.drain() {
            handle.abort();
        }
    }
}

impl Drop for FieldDebouncer {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
