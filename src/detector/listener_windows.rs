//! Windows hook listener thread.
//!
//! Owns the message pump and the two global low-level input hooks for the
//! lifetime of a registration. The hook callbacks execute synchronously on
//! this thread whenever any process on the machine receives input.

use std::sync::mpsc::SyncSender;

use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{CallNextHookEx, HC_ACTION};

use super::{ListenerExit, ListenerShared};
use crate::monitor::input_events::{self, InputClass};
use crate::tick;
use crate::winapi_utils::{
    current_thread_id, ensure_message_queue, post_quit_message, run_message_loop, HookGuard,
};

/// Body of the listener thread.
///
/// Creates the thread's message queue and publishes its id *before*
/// signalling readiness, so the manager can always deliver a quit message.
/// Hook installation happens after the handshake: a failure there terminates
/// the thread with the platform error recorded as its exit, readable through
/// `status` — it is never reported through `register`.
pub(crate) fn run(shared: &ListenerShared, ready: SyncSender<()>) {
    ensure_message_queue();
    shared.publish_pump_thread(current_thread_id());
    let _ = ready.send(());

    let _keyboard_hook = match HookGuard::install_keyboard(Some(keyboard_hook_proc)) {
        Ok(guard) => guard,
        Err(err) => {
            let code = win32_error_code(&err);
            tracing::error!(code, "failed to install low-level keyboard hook");
            shared.record_exit(ListenerExit::InstallFailed {
                class: InputClass::Keyboard,
                code,
            });
            return;
        }
    };
    let _mouse_hook = match HookGuard::install_mouse(Some(mouse_hook_proc)) {
        Ok(guard) => guard,
        Err(err) => {
            let code = win32_error_code(&err);
            tracing::error!(code, "failed to install low-level mouse hook");
            shared.record_exit(ListenerExit::InstallFailed {
                class: InputClass::Mouse,
                code,
            });
            return;
        }
    };

    run_message_loop();
    shared.record_exit(ListenerExit::Clean);
    // Hook guards drop here, after the pump has drained.
}

/// Asks the listener's pump to exit. The thread id is always published by the
/// time the startup handshake completes.
pub(crate) fn request_stop(shared: &ListenerShared) {
    post_quit_message(shared.pump_thread(), 0);
}

/// Recovers the Win32 error code from a `windows` crate error, which wraps
/// it in an HRESULT.
fn win32_error_code(err: &windows::core::Error) -> u32 {
    let hresult = err.code().0 as u32;
    if hresult & 0xFFFF_0000 == 0x8007_0000 {
        hresult & 0xFFFF
    } else {
        hresult
    }
}

/// Low-level keyboard hook callback.
///
/// # Safety
/// Called by Windows from the listener thread's message dispatch with valid
/// hook arguments. Must stay fast and must always call `CallNextHookEx`, or
/// the system degrades input delivery for every process.
unsafe extern "system" fn keyboard_hook_proc(
    code: i32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if code == HC_ACTION as i32 {
        input_events::record_input(InputClass::Keyboard, tick::now());
    }
    CallNextHookEx(None, code, wparam, lparam)
}

/// Low-level mouse hook callback. Same constraints as [`keyboard_hook_proc`].
unsafe extern "system" fn mouse_hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == HC_ACTION as i32 {
        input_events::record_input(InputClass::Mouse, tick::now());
    }
    CallNextHookEx(None, code, wparam, lparam)
}
