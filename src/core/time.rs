//! Time provider abstraction for testable time-dependent logic
//!
//! The flow state machine escalates Full to Flood after a configured
//! tolerance window, and the dispatcher paces itself against loop
//! elapsed time. Both measure intervals through this seam so tests can
//! drive a deterministic clock instead of sleeping.

#[cfg(test)]
use std::sync::{Arc, Mutex};
#[cfg(test)]
use std::time::Duration;
use std::time::Instant;

/// Abstraction over monotonic time for interval measurements
pub trait TimeProvider: Send + Sync {
    /// Get the current monotonic time
    fn now(&self) -> Instant;
}

/// Production time provider using the system monotonic clock
#[derive(Default, Clone)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Mock time provider for deterministic testing
#[derive(Clone)]
#[cfg(test)]
pub struct MockTimeProvider {
    current_instant: Arc<Mutex<Instant>>,
}

#[cfg(test)]
impl MockTimeProvider {
    /// Create a new mock provider anchored at the current instant
    pub fn new() -> Self {
        Self {
            current_instant: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Advance the mock clock by the given duration
    pub fn advance_time(&self, duration: Duration) {
        let mut instant = self.current_instant.lock().unwrap();
        *instant += duration;
    }
}

#[cfg(test)]
impl TimeProvider for MockTimeProvider {
    fn now(&self) -> Instant {
        *self.current_instant.lock().unwrap()
    }
}
