//! Listener stand-in for platforms without a global input hook facility.
//!
//! Keeps the lifecycle state machine fully operational on non-Windows
//! builds: the listener performs the same startup handshake and clean-exit
//! protocol, but observes no input.

use std::sync::mpsc::SyncSender;

use super::{ListenerExit, ListenerShared};

pub(crate) fn run(shared: &ListenerShared, ready: SyncSender<()>) {
    tracing::warn!("no global input hook backend for this platform; listener observes no input");
    let _ = ready.send(());
    shared.wait_for_stop();
    shared.record_exit(ListenerExit::Clean);
}

pub(crate) fn request_stop(shared: &ListenerShared) {
    shared.signal_stop();
}
