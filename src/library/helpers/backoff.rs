//! Exponential backoff implementations

use std::{iter::Iterator, time::Duration};

/// Capped exponential backoff iterator
///
/// Each element is the previous one multiplied by the `multiplier` property until the `max`
/// duration is reached, after which the iterator keeps yielding `max` forever. Calling
/// [`Backoff::reset`] starts over at the initial value.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    multiplier: u32,
    current: Option<Duration>,
}

impl Backoff {
    /// Creates a new backoff starting at `initial` and never exceeding `max`
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
            multiplier: 2,
            current: None,
        }
    }

    /// Restarts the sequence at the initial value
    pub fn reset(&mut self) {
        self.current = None;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_secs(5))
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        let next = match self.current {
            None => self.initial,
            Some(current) => (current * self.multiplier).min(self.max),
        };

        self.current = Some(next);
        Some(next)
    }
}
