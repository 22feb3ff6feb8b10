//! Input event fan-in and throttling.
//!
//! This module holds the state the hook callbacks write into: the shared
//! last-event timestamp and the gate that turns the raw event stream into a
//! low-frequency pulse stream.

pub mod input_events;
pub mod throttle;

pub use input_events::*;
pub use throttle::*;
