//! System-wide idle/AFK input watcher.
//!
//! Installs global low-level keyboard and mouse hooks on a dedicated listener
//! thread, timestamps every input event, and coalesces bursts of input into at
//! most one [`ActivityPulse`] per throttle interval. The owning application
//! supplies the AFK policy: it decides how long "idle" is and what resuming
//! means, either by consuming pulses or by polling
//! [`IdleDetector::last_event_tick`].
//!
//! ```no_run
//! use idlewatch::IdleDetector;
//!
//! fn main() -> Result<(), idlewatch::HookError> {
//!     let detector = IdleDetector::new();
//!     let pulses = detector.take_pulse_receiver().expect("first take");
//!     detector.register()?;
//!
//!     // Blocks until the user touches keyboard or mouse; further input
//!     // stays quiet for at least the throttle interval.
//!     let _ = pulses.recv();
//!     println!("user is back, last event at tick {}", detector.last_event_tick());
//!
//!     detector.unregister()?;
//!     Ok(())
//! }
//! ```
//!
//! Hook installation runs on the listener thread after `register` has already
//! returned; poll [`IdleDetector::status`] to detect a delayed startup failure.

pub mod detector;
pub mod error;
pub mod monitor;
pub mod tick;
#[cfg(target_os = "windows")]
pub mod winapi_utils;

pub use detector::{IdleDetector, ListenerExit, ListenerStatus};
pub use error::HookError;
pub use monitor::input_events::{ActivityPulse, InputClass};
pub use monitor::throttle::THROTTLE_INTERVAL_MS;
pub use tick::Tick;
