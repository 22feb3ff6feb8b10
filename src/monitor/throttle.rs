//! Minimum-interval gate for activity notifications.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::tick::{elapsed_ms, Tick};

/// Minimum spacing between two forwarded activity pulses.
pub const THROTTLE_INTERVAL_MS: u64 = 5_000;

/// Rate-limiting gate that lets at most one event through per interval.
///
/// This is a gate, not a debounce: the first qualifying event after a quiet
/// period passes immediately, and followers are swallowed until the interval
/// has elapsed again. [`try_pass`](Self::try_pass) is lock-free and
/// allocation-free so it can run on every keystroke and mouse move inside the
/// hook callback.
pub struct ThrottleGate {
    interval_ms: u64,
    last_forwarded: AtomicU64,
}

impl ThrottleGate {
    /// Creates a gate that forwards at most once per `interval_ms`.
    ///
    /// The gate starts closed relative to tick zero; call
    /// [`reset_open`](Self::reset_open) when a registration begins so its
    /// first observed event passes.
    pub const fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_forwarded: AtomicU64::new(0),
        }
    }

    /// Re-arms the gate so the next event at or after `now` passes.
    pub fn reset_open(&self, now: Tick) {
        self.last_forwarded
            .store(now.wrapping_sub(self.interval_ms), Ordering::Relaxed);
    }

    /// Consults the gate at tick `now`.
    ///
    /// Returns true and moves the gate forward when at least the interval has
    /// elapsed since the last forwarded event, false otherwise.
    pub fn try_pass(&self, now: Tick) -> bool {
        let mut last = self.last_forwarded.load(Ordering::Relaxed);
        loop {
            if elapsed_ms(last, now) < self.interval_ms {
                return false;
            }
            match self.last_forwarded.compare_exchange_weak(
                last,
                now,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(observed) => last = observed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn first_event_after_reset_passes_immediately() {
        let gate = ThrottleGate::new(5_000);
        gate.reset_open(42);
        assert!(gate.try_pass(42));
    }

    #[test]
    fn gate_holds_until_interval_elapses() {
        let gate = ThrottleGate::new(5_000);
        let t0 = 100_000;
        gate.reset_open(t0);

        assert!(gate.try_pass(t0));
        assert!(!gate.try_pass(t0 + 100));
        assert!(!gate.try_pass(t0 + 4_999));
        assert!(gate.try_pass(t0 + 5_000));
        assert!(!gate.try_pass(t0 + 9_999));
    }

    #[test]
    fn dense_burst_forwards_twice_over_two_intervals() {
        let gate = ThrottleGate::new(5_000);
        let t0 = 7_777;
        gate.reset_open(t0);

        let passes = (0..10_000).filter(|offset| gate.try_pass(t0 + offset)).count();
        assert_eq!(passes, 2);
    }

    #[test]
    fn gate_survives_counter_wrap() {
        let gate = ThrottleGate::new(5_000);
        let before_wrap = u64::MAX - 1_000;
        gate.reset_open(before_wrap);
        assert!(gate.try_pass(before_wrap));

        // 1001 ticks reach the wrap point, so 4999 have elapsed at tick 3998
        // and 5001 at tick 4000.
        assert!(!gate.try_pass(3_998));
        assert!(gate.try_pass(4_000));
    }

    #[test]
    fn simultaneous_observers_forward_once() {
        let gate = Arc::new(ThrottleGate::new(5_000));
        gate.reset_open(123);

        let passes: usize = (0..8)
            .map(|_| {
                let gate = Arc::clone(&gate);
                thread::spawn(move || gate.try_pass(123) as usize)
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .sum();
        assert_eq!(passes, 1);
    }
}
