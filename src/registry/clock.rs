use std::cell::Cell;
use std::rc::Rc;

use web_time::Instant;

/// Milliseconds on a monotonic clock.
pub type Millis = u64;

/// Source of monotonic millisecond timestamps for visibility bookkeeping.
pub trait Clock {
    /// Current time in milliseconds. Must never go backwards.
    fn now_ms(&self) -> Millis;
}

/// Wall-clock-independent monotonic clock anchored at construction.
///
/// Backed by [`web_time::Instant`], so it reads `performance.now()` on WASM.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Create a clock whose zero is "now".
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> Millis {
        self.origin.elapsed().as_millis() as Millis
    }
}

/// Manually advanced clock. Clones share the same time source, so a test
/// can keep one handle while the registry owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Millis>>,
}

impl ManualClock {
    /// Create a clock reading `start_ms`.
    #[must_use]
    pub fn starting_at(start_ms: Millis) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    /// Move the clock forward by `delta_ms`.
    pub fn advance(&self, delta_ms: Millis) {
        self.now.set(self.now.get().saturating_add(delta_ms));
    }

    /// Jump to an absolute reading. Ignored if it would move backwards.
    pub fn set(&self, now_ms: Millis) {
        if now_ms >= self.now.get() {
            self.now.set(now_ms);
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::starting_at(1_000);
        let handle = clock.clone();
        handle.advance(250);
        assert_eq!(clock.now_ms(), 1_250);
    }

    #[test]
    fn manual_clock_never_goes_backwards() {
        let clock = ManualClock::starting_at(5_000);
        clock.set(4_000);
        assert_eq!(clock.now_ms(), 5_000);
        clock.set(6_000);
        assert_eq!(clock.now_ms(), 6_000);
    }

    #[test]
    fn monotonic_clock_is_non_decreasing() {
        let clock = MonotonicClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
