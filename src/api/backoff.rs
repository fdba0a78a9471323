//! Exponential backoff for reconnect and retry loops.

use std::time::Duration;

/// Doubling backoff with a cap.
///
/// `next_delay` returns the current delay and doubles it for next time;
/// `reset` drops back to the base after a period of good service.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            current: base,
        }
    }

    /// The delay to wait before the next attempt.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    /// Return to the base delay.
    pub fn reset(&mut self) {
        self.current = self.base;
    }
}
