//! Hook lifecycle management.
//!
//! [`IdleDetector`] is the control surface of the crate. It owns the hook
//! listener thread, guards the process-wide hooked-in flag, and answers
//! status queries. All other modules are plumbing it drives.

#[cfg(target_os = "windows")]
mod listener_windows;
#[cfg(target_os = "windows")]
use listener_windows as listener;

#[cfg(not(target_os = "windows"))]
mod listener_fallback;
#[cfg(not(target_os = "windows"))]
use listener_fallback as listener;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread::{self, JoinHandle};

#[cfg(target_os = "windows")]
use std::sync::atomic::AtomicU32;
#[cfg(not(target_os = "windows"))]
use std::sync::Condvar;

use crate::error::HookError;
use crate::monitor::input_events::{self, ActivityPulse, InputClass};
use crate::tick::{self, Tick};

/// Bound on undelivered activity pulses. Consumers that fall behind lose
/// pulses rather than stalling the hook callback.
pub(crate) const PULSE_CHANNEL_CAPACITY: usize = 8;

/// Process-wide flag recording whether interceptors are currently installed.
/// At most one registration may hold the hooks at a time, across all
/// `IdleDetector` instances.
static HOOKED_IN: AtomicBool = AtomicBool::new(false);

/// Lifecycle state of the hook listener thread, as reported by
/// [`IdleDetector::status`].
///
/// "Never started" is a distinct state, so it cannot be mistaken for a
/// genuine zero/success exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerStatus {
    /// No listener thread exists (never registered, or unregistered).
    NotRunning,
    /// The listener thread is alive and pumping messages.
    Running,
    /// The listener thread has terminated with the recorded exit.
    Exited(ListenerExit),
}

/// How a hook listener thread terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerExit {
    /// The message pump drained after a quit signal.
    Clean,
    /// Installing one of the low-level hooks failed; `code` is the platform
    /// error code, propagated unchanged.
    InstallFailed { class: InputClass, code: u32 },
}

impl ListenerExit {
    /// Converts the exit into a `Result`, mapping an install failure to
    /// [`HookError::HookInstall`].
    pub fn ok(self) -> Result<(), HookError> {
        match self {
            ListenerExit::Clean => Ok(()),
            ListenerExit::InstallFailed { class, code } => {
                Err(HookError::HookInstall { class, code })
            }
        }
    }
}

/// State shared between the lifecycle manager and its listener thread.
pub(crate) struct ListenerShared {
    /// Exit recorded by the listener just before it returns.
    exit: OnceLock<ListenerExit>,
    /// Thread id of the message pump, published before the startup handshake
    /// completes so a quit message can always reach the queue.
    #[cfg(target_os = "windows")]
    pump_thread_id: AtomicU32,
    #[cfg(not(target_os = "windows"))]
    stop: (Mutex<bool>, Condvar),
}

impl ListenerShared {
    fn new() -> Self {
        Self {
            exit: OnceLock::new(),
            #[cfg(target_os = "windows")]
            pump_thread_id: AtomicU32::new(0),
            #[cfg(not(target_os = "windows"))]
            stop: (Mutex::new(false), Condvar::new()),
        }
    }

    pub(crate) fn record_exit(&self, exit: ListenerExit) {
        let _ = self.exit.set(exit);
    }

    #[cfg(target_os = "windows")]
    pub(crate) fn publish_pump_thread(&self, thread_id: u32) {
        self.pump_thread_id.store(thread_id, Ordering::SeqCst);
    }

    #[cfg(target_os = "windows")]
    pub(crate) fn pump_thread(&self) -> u32 {
        self.pump_thread_id.load(Ordering::SeqCst)
    }

    #[cfg(not(target_os = "windows"))]
    pub(crate) fn wait_for_stop(&self) {
        let (lock, cvar) = &self.stop;
        let mut stopped = lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !*stopped {
            stopped = cvar.wait(stopped).unwrap_or_else(PoisonError::into_inner);
        }
    }

    #[cfg(not(target_os = "windows"))]
    pub(crate) fn signal_stop(&self) {
        let (lock, cvar) = &self.stop;
        let mut stopped = lock.lock().unwrap_or_else(PoisonError::into_inner);
        *stopped = true;
        cvar.notify_all();
    }
}

struct ListenerHandle {
    join: JoinHandle<()>,
    shared: Arc<ListenerShared>,
}

#[derive(Default)]
struct Lifecycle {
    hooked_in: bool,
    listener: Option<ListenerHandle>,
}

/// Owns the global input hook registration and its listener thread.
///
/// All lifecycle state lives behind an internal mutex, so the detector can be
/// shared across threads and `register`/`unregister`/`status` may race freely.
/// The system hooks themselves are a process-wide singleton: a second
/// registration attempt fails with [`HookError::AlreadyActive`] no matter
/// which instance holds them.
pub struct IdleDetector {
    lifecycle: Mutex<Lifecycle>,
    pulse_tx: SyncSender<ActivityPulse>,
    pulse_rx: Mutex<Option<Receiver<ActivityPulse>>>,
}

impl IdleDetector {
    /// Creates a detector in the idle state. No hooks are touched until
    /// [`register`](Self::register).
    pub fn new() -> Self {
        let (pulse_tx, pulse_rx) = mpsc::sync_channel(PULSE_CHANNEL_CAPACITY);
        Self {
            lifecycle: Mutex::new(Lifecycle::default()),
            pulse_tx,
            pulse_rx: Mutex::new(Some(pulse_rx)),
        }
    }

    /// Hands out the consumer end of the pulse channel.
    ///
    /// Returns `None` after the first call. The channel survives
    /// unregister/register cycles, so one consumer keeps receiving across
    /// re-registrations.
    pub fn take_pulse_receiver(&self) -> Option<Receiver<ActivityPulse>> {
        self.pulse_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Installs the global input hooks.
    ///
    /// Primes the last-event tick and throttle gate to "now", spawns the
    /// listener thread, and waits for its startup handshake. Fails with
    /// [`HookError::AlreadyActive`] if any registration is already installed,
    /// or with [`HookError::Spawn`] if the thread cannot start — in which
    /// case no state is left behind and the call may be retried.
    ///
    /// Hook *installation* failure is not reported here: it terminates the
    /// listener asynchronously and surfaces through [`status`](Self::status).
    pub fn register(&self) -> Result<(), HookError> {
        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        if lifecycle.hooked_in
            || lifecycle.listener.is_some()
            || HOOKED_IN
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
        {
            return Err(HookError::AlreadyActive);
        }

        input_events::arm(self.pulse_tx.clone(), tick::now());

        let shared = Arc::new(ListenerShared::new());
        let (ready_tx, ready_rx) = mpsc::sync_channel::<()>(1);
        let thread_shared = Arc::clone(&shared);
        let spawned = thread::Builder::new()
            .name("idlewatch-listener".into())
            .spawn(move || listener::run(&thread_shared, ready_tx));

        let join = match spawned {
            Ok(join) => join,
            Err(err) => {
                input_events::disarm();
                HOOKED_IN.store(false, Ordering::SeqCst);
                return Err(HookError::Spawn(err));
            }
        };

        if ready_rx.recv().is_err() {
            // The listener died before its handshake; roll back fully so the
            // caller may retry.
            let _ = join.join();
            input_events::disarm();
            HOOKED_IN.store(false, Ordering::SeqCst);
            return Err(HookError::Spawn(io::Error::new(
                io::ErrorKind::Other,
                "hook listener thread exited during startup",
            )));
        }

        tracing::info!("input hook registration active");
        lifecycle.hooked_in = true;
        lifecycle.listener = Some(ListenerHandle { join, shared });
        Ok(())
    }

    /// Detaches the hooks and joins the listener thread.
    ///
    /// Fails with [`HookError::NotActive`] when nothing is registered. Safe
    /// to call even if the listener already died from an install failure.
    pub fn unregister(&self) -> Result<(), HookError> {
        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        if !lifecycle.hooked_in {
            return Err(HookError::NotActive);
        }

        input_events::disarm();

        if let Some(handle) = lifecycle.listener.take() {
            listener::request_stop(&handle.shared);
            if handle.join.join().is_err() {
                tracing::error!("hook listener thread panicked during shutdown");
            }
        }

        lifecycle.hooked_in = false;
        HOOKED_IN.store(false, Ordering::SeqCst);
        tracing::info!("input hook registration removed");
        Ok(())
    }

    /// Reports the listener thread's lifecycle state.
    ///
    /// A listener that vanished without recording an exit reports
    /// [`HookError::ThreadQuery`].
    pub fn status(&self) -> Result<ListenerStatus, HookError> {
        let lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(handle) = lifecycle.listener.as_ref() else {
            return Ok(ListenerStatus::NotRunning);
        };
        if !handle.join.is_finished() {
            return Ok(ListenerStatus::Running);
        }
        match handle.shared.exit.get() {
            Some(exit) => Ok(ListenerStatus::Exited(*exit)),
            None => Err(HookError::ThreadQuery),
        }
    }

    /// Current monotonic tick. Safe in any lifecycle state.
    pub fn now(&self) -> Tick {
        tick::now()
    }

    /// Tick of the most recent observed input event, throttled or not. Zero
    /// if no registration ever ran.
    pub fn last_event_tick(&self) -> Tick {
        input_events::last_event_tick()
    }
}

impl Default for IdleDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IdleDetector {
    fn drop(&mut self) {
        // A detector dropped while active must not leave hooks dangling.
        let _ = self.unregister();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("idlewatch=debug")
            .try_init();
    }

    #[test]
    #[serial]
    fn repeated_register_reports_already_active() {
        init_tracing();
        let detector = IdleDetector::new();
        detector.register().expect("first register");
        for _ in 0..3 {
            assert!(matches!(detector.register(), Err(HookError::AlreadyActive)));
        }
        detector.unregister().expect("unregister");
    }

    #[test]
    #[serial]
    fn repeated_unregister_reports_not_active() {
        let detector = IdleDetector::new();
        for _ in 0..3 {
            assert!(matches!(detector.unregister(), Err(HookError::NotActive)));
        }
        assert_eq!(detector.status().unwrap(), ListenerStatus::NotRunning);
    }

    #[test]
    #[serial]
    fn second_detector_cannot_register_while_first_is_active() {
        let first = IdleDetector::new();
        first.register().expect("register");

        let second = IdleDetector::new();
        assert!(matches!(second.register(), Err(HookError::AlreadyActive)));

        first.unregister().expect("unregister");
        second.register().expect("register after release");
        second.unregister().expect("unregister");
    }

    #[test]
    #[serial]
    fn status_follows_the_lifecycle() {
        let detector = IdleDetector::new();
        assert_eq!(detector.status().unwrap(), ListenerStatus::NotRunning);

        detector.register().expect("register");
        assert_eq!(detector.status().unwrap(), ListenerStatus::Running);

        detector.unregister().expect("unregister");
        assert_eq!(detector.status().unwrap(), ListenerStatus::NotRunning);
    }

    #[test]
    #[serial]
    fn reregistration_reopens_the_throttle_gate() {
        init_tracing();
        let detector = IdleDetector::new();
        let pulses = detector.take_pulse_receiver().expect("receiver");

        detector.register().expect("register");
        input_events::record_input(InputClass::Keyboard, tick::now());
        assert!(pulses.try_recv().is_ok());
        detector.unregister().expect("unregister");

        detector.register().expect("re-register");
        input_events::record_input(InputClass::Mouse, tick::now());
        assert!(pulses.try_recv().is_ok());
        detector.unregister().expect("unregister again");
    }

    #[test]
    #[serial]
    fn take_pulse_receiver_hands_out_once() {
        let detector = IdleDetector::new();
        assert!(detector.take_pulse_receiver().is_some());
        assert!(detector.take_pulse_receiver().is_none());
    }

    #[test]
    #[serial]
    fn register_primes_the_last_event_tick() {
        let detector = IdleDetector::new();
        detector.register().expect("register");
        let primed = detector.last_event_tick();
        assert!(tick::elapsed_ms(primed, detector.now()) < 60_000);
        detector.unregister().expect("unregister");
    }

    #[test]
    #[serial]
    fn drop_releases_an_active_registration() {
        {
            let detector = IdleDetector::new();
            detector.register().expect("register");
        }
        let next = IdleDetector::new();
        next.register().expect("register after drop");
        next.unregister().expect("unregister");
    }

    #[test]
    #[serial]
    fn listener_exit_converts_to_error() {
        assert!(ListenerExit::Clean.ok().is_ok());

        let exit = ListenerExit::InstallFailed {
            class: InputClass::Keyboard,
            code: 1429,
        };
        let err = exit.ok().unwrap_err();
        assert!(matches!(err, HookError::HookInstall { code: 1429, .. }));
        assert!(err.to_string().contains("globally"));
    }
}
