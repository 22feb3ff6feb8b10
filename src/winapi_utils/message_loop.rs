//! Message pump for the hook listener thread.
//!
//! Low-level hooks only fire on the thread that installed them, and only
//! while that thread pumps messages. The pump blocks in `GetMessageW` until
//! a `WM_QUIT` posted by the lifecycle manager drains it.

use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW, TranslateMessage, MSG,
    PM_NOREMOVE, WM_QUIT,
};

/// Returns the calling thread's id, the address for [`post_quit_message`].
pub fn current_thread_id() -> u32 {
    unsafe { GetCurrentThreadId() }
}

/// Forces creation of the calling thread's message queue.
///
/// A thread has no queue until it first touches the message API, and posting
/// to a queue-less thread fails. The listener calls this before publishing
/// its thread id.
pub fn ensure_message_queue() {
    let mut msg = MSG::default();
    unsafe {
        let _ = PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE);
    }
}

/// Pumps messages on the calling thread until `WM_QUIT` arrives.
///
/// Blocks for the whole lifetime of a registration. Dispatching here is what
/// invokes the installed hook callbacks.
pub fn run_message_loop() {
    tracing::debug!(thread_id = current_thread_id(), "message pump starting");

    let mut msg = MSG::default();
    loop {
        // 0 = WM_QUIT, -1 = queue error; both end the pump.
        let result = unsafe { GetMessageW(&mut msg, None, 0, 0) };
        if result.0 <= 0 {
            break;
        }
        unsafe {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    tracing::debug!("message pump exited");
}

/// Posts `WM_QUIT` to `thread_id`'s message queue, unblocking its pump.
/// Callable from any thread.
pub fn post_quit_message(thread_id: u32, exit_code: i32) {
    if thread_id == 0 {
        tracing::warn!("no pump thread id published, cannot post quit message");
        return;
    }
    let result = unsafe {
        PostThreadMessageW(thread_id, WM_QUIT, WPARAM(exit_code as usize), LPARAM(0))
    };
    if let Err(e) = result {
        tracing::debug!(thread_id, error = ?e, "quit message not delivered (pump may have exited)");
    }
}

#[cfg(test)]
mod tests {
    // The pump is exercised end to end by the detector lifecycle tests,
    // which register real hooks and drain the loop through WM_QUIT.
}
