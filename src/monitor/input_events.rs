//! Shared input-event state and the pulse forwarding path.
//!
//! Every input event observed by the hook callbacks funnels through
//! [`record_input`], which stores the event timestamp and lets the throttle
//! gate decide whether one activity pulse goes out to the armed sink.
//!
//! # Performance Critical
//!
//! [`record_input`] is the body of the low-level hook callbacks and executes
//! synchronously in the Windows input pipeline. Any delay here causes
//! system-wide input lag. The path is an atomic store, a lock-free gate
//! check, and — at most once per throttle interval — a non-blocking
//! `try_send`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{SyncSender, TrySendError};
use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::monitor::throttle::{ThrottleGate, THROTTLE_INTERVAL_MS};
use crate::tick::Tick;

/// Tick of the most recent input event, readable from any thread.
///
/// Written from the listener thread's callback context, plus one
/// initialization store per successful registration. Never decreases.
static LAST_EVENT_TICK: AtomicU64 = AtomicU64::new(0);

/// Gate between the raw event stream and the outbound pulse channel.
static PULSE_GATE: ThrottleGate = ThrottleGate::new(THROTTLE_INTERVAL_MS);

/// Sender half of the active registration's pulse channel, `None` while no
/// registration is armed. Locked only on the forwarding path, which the gate
/// already limits to once per interval.
static PULSE_SINK: Lazy<Mutex<Option<SyncSender<ActivityPulse>>>> =
    Lazy::new(|| Mutex::new(None));

/// Payloadless "activity resumed" notification.
///
/// Carries no data beyond its arrival: the receiver knows activity was
/// observed and can read [`last_event_tick`] for the timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityPulse;

/// Which input device produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputClass {
    Keyboard,
    Mouse,
}

impl fmt::Display for InputClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputClass::Keyboard => f.write_str("keyboard"),
            InputClass::Mouse => f.write_str("mouse"),
        }
    }
}

/// Records one observed input event at tick `now`.
///
/// Both input classes are handled identically: the timestamp is stored
/// unconditionally, then the gate decides whether one pulse is forwarded to
/// the armed sink.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub(crate) fn record_input(class: InputClass, now: Tick) {
    LAST_EVENT_TICK.store(now, Ordering::Relaxed);

    if PULSE_GATE.try_pass(now) {
        forward_pulse(class, now);
    }
}

fn forward_pulse(class: InputClass, now: Tick) {
    if let Ok(sink) = PULSE_SINK.lock() {
        if let Some(tx) = sink.as_ref() {
            match tx.try_send(ActivityPulse) {
                Ok(()) => tracing::debug!(%class, tick = now, "activity pulse forwarded"),
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(%class, tick = now, "pulse channel full, dropping pulse")
                }
                Err(TrySendError::Disconnected(_)) => {
                    tracing::debug!(%class, tick = now, "pulse receiver gone, dropping pulse")
                }
            }
        }
    }
}

/// Tick of the most recent observed input event. Zero before the first
/// registration.
pub fn last_event_tick() -> Tick {
    LAST_EVENT_TICK.load(Ordering::Relaxed)
}

/// Installs `tx` as the active pulse sink and primes the event state for a
/// new registration: the last-event tick becomes `now` and the gate opens so
/// the first observed event forwards immediately.
pub(crate) fn arm(tx: SyncSender<ActivityPulse>, now: Tick) {
    LAST_EVENT_TICK.store(now, Ordering::Relaxed);
    PULSE_GATE.reset_open(now);
    if let Ok(mut sink) = PULSE_SINK.lock() {
        *sink = Some(tx);
    }
}

/// Removes the active pulse sink. Events observed after this still update
/// the last-event tick but forward nothing.
pub(crate) fn disarm() {
    if let Ok(mut sink) = PULSE_SINK.lock() {
        *sink = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    #[serial]
    fn timestamp_updates_even_when_throttled() {
        let (tx, rx) = mpsc::sync_channel(8);
        arm(tx, 1_000);

        record_input(InputClass::Keyboard, 1_000);
        assert_eq!(rx.try_recv(), Ok(ActivityPulse));

        record_input(InputClass::Mouse, 1_100);
        assert!(rx.try_recv().is_err());
        assert_eq!(last_event_tick(), 1_100);

        disarm();
    }

    #[test]
    #[serial]
    fn forwards_exactly_twice_across_interval_boundary() {
        let (tx, rx) = mpsc::sync_channel(8);
        let t0 = 50_000;
        arm(tx, t0);

        for offset in [0, 100, 4_999, 5_000, 9_999] {
            record_input(InputClass::Keyboard, t0 + offset);
        }

        assert_eq!(rx.try_iter().count(), 2);
        assert_eq!(last_event_tick(), t0 + 9_999);
        disarm();
    }

    #[test]
    #[serial]
    fn mouse_events_forward_like_keyboard_events() {
        let (tx, rx) = mpsc::sync_channel(8);
        let t0 = 9_000;
        arm(tx, t0);

        record_input(InputClass::Mouse, t0);
        assert_eq!(rx.try_recv(), Ok(ActivityPulse));
        disarm();
    }

    #[test]
    #[serial]
    fn disarmed_state_keeps_timestamps_but_forwards_nothing() {
        let (tx, rx) = mpsc::sync_channel(8);
        arm(tx, 2_000);
        disarm();

        record_input(InputClass::Keyboard, 8_000);
        assert_eq!(last_event_tick(), 8_000);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    #[serial]
    fn full_pulse_channel_never_blocks_the_event_path() {
        let (tx, _rx) = mpsc::sync_channel(1);
        let t0 = 30_000;
        arm(tx, t0);

        record_input(InputClass::Keyboard, t0); // fills the only slot
        record_input(InputClass::Mouse, t0 + THROTTLE_INTERVAL_MS); // dropped, must not block
        assert_eq!(last_event_tick(), t0 + THROTTLE_INTERVAL_MS);
        disarm();
    }

    #[test]
    #[serial]
    fn concurrent_readers_never_observe_torn_ticks() {
        let (tx, _rx) = mpsc::sync_channel(8);
        let base = 1_000_000;
        arm(tx, base);

        let writer = thread::spawn(move || {
            for offset in 0..10_000 {
                record_input(InputClass::Keyboard, base + offset);
            }
        });
        let reader = thread::spawn(move || {
            let mut prev = 0;
            for _ in 0..10_000 {
                let tick = last_event_tick();
                assert!(tick >= base && tick <= base + 9_999);
                assert!(tick >= prev);
                prev = tick;
            }
        });

        writer.join().unwrap();
        reader.join().unwrap();
        disarm();
    }
}
