//! # Fibonacci Backoff
//!
//! Provides a Fibonacci-based backoff for retrying list calls.
//! The sequence grows more slowly than exponential backoff, which keeps
//! retries against a rate-limited API server gentle.
//!
//! Sequence with a 100ms step and a 2s cap: 100ms, 100ms, 200ms, 300ms, 500ms, 800ms, 1.3s, 2s (max).

use std::time::Duration;

/// Fibonacci backoff calculator
///
/// Each backoff is the sum of the previous two, in multiples of `step`,
/// capped at `max`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    step: Duration,
    /// Previous backoff in steps
    prev: u32,
    /// Current backoff in steps
    current: u32,
    /// Maximum backoff in steps
    max: u32,
}

impl FibonacciBackoff {
    /// Create a backoff that starts at `step` and never exceeds `max`.
    #[must_use]
    pub fn new(step: Duration, max: Duration) -> Self {
        let max_steps = if step.is_zero() {
            1
        } else {
            u32::try_from(max.as_nanos() / step.as_nanos()).unwrap_or(u32::MAX).max(1)
        };
        Self {
            step,
            prev: 0,
            current: 1,
            max: max_steps,
        }
    }

    /// Get the next backoff duration and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.step * self.current;

        let next = self.prev.saturating_add(self.current);
        self.prev = self.current;
        self.current = next.min(self.max);

        result
    }

    /// Reset the backoff to the initial state
    pub fn reset(&mut self) {
        self.prev = 0;
        self.current = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_fibonacci_backoff_sequence() {
        let mut backoff = FibonacciBackoff::new(ms(100), ms(2000));

        assert_eq!(backoff.next_backoff(), ms(100));
        assert_eq!(backoff.next_backoff(), ms(100));
        assert_eq!(backoff.next_backoff(), ms(200));
        assert_eq!(backoff.next_backoff(), ms(300));
        assert_eq!(backoff.next_backoff(), ms(500));
        assert_eq!(backoff.next_backoff(), ms(800));
        assert_eq!(backoff.next_backoff(), ms(1300));
        assert_eq!(backoff.next_backoff(), ms(2000));
    }

    #[test]
    fn test_fibonacci_backoff_max_cap() {
        let mut backoff = FibonacciBackoff::new(ms(100), ms(300));

        assert_eq!(backoff.next_backoff(), ms(100));
        assert_eq!(backoff.next_backoff(), ms(100));
        assert_eq!(backoff.next_backoff(), ms(200));
        assert_eq!(backoff.next_backoff(), ms(300));
        // Next would be 500ms but is capped
        assert_eq!(backoff.next_backoff(), ms(300));
        assert_eq!(backoff.next_backoff(), ms(300));
    }

    #[test]
    fn test_fibonacci_backoff_reset() {
        let mut backoff = FibonacciBackoff::new(ms(100), ms(2000));

        backoff.next_backoff();
        backoff.next_backoff();
        assert_eq!(backoff.next_backoff(), ms(200));

        backoff.reset();

        assert_eq!(backoff.next_backoff(), ms(100));
        assert_eq!(backoff.next_backoff(), ms(100));
        assert_eq!(backoff.next_backoff(), ms(200));
    }
}
