//! Windows hook installation and management.
//!
//! RAII wrappers for the global low-level input hooks, so a hook can never
//! outlive the listener thread that installed it.

use windows::Win32::UI::WindowsAndMessaging::{
    SetWindowsHookExW, UnhookWindowsHookEx, HHOOK, HOOKPROC, WH_KEYBOARD_LL, WH_MOUSE_LL,
    WINDOWS_HOOK_ID,
};

/// RAII guard for an installed Windows hook.
///
/// Calls `UnhookWindowsHookEx` on drop, detaching the hook from the system
/// hook table.
pub struct HookGuard {
    handle: HHOOK,
    hook_type: &'static str,
}

impl HookGuard {
    /// Installs a global low-level keyboard hook.
    ///
    /// The callback runs on the installing thread, which must pump messages.
    /// A callback that does not return promptly degrades input latency
    /// system-wide, and the OS may silently remove the hook.
    pub fn install_keyboard(callback: HOOKPROC) -> windows::core::Result<Self> {
        Self::install(WH_KEYBOARD_LL, callback, "keyboard_ll")
    }

    /// Installs a global low-level mouse hook. Same constraints as
    /// [`install_keyboard`](Self::install_keyboard).
    pub fn install_mouse(callback: HOOKPROC) -> windows::core::Result<Self> {
        Self::install(WH_MOUSE_LL, callback, "mouse_ll")
    }

    fn install(
        hook_id: WINDOWS_HOOK_ID,
        callback: HOOKPROC,
        hook_type: &'static str,
    ) -> windows::core::Result<Self> {
        // Module handle None + thread id 0: observe all input on the machine.
        let handle = unsafe { SetWindowsHookExW(hook_id, callback, None, 0)? };
        tracing::info!(hook_type, "hook installed");
        Ok(Self { handle, hook_type })
    }
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        match unsafe { UnhookWindowsHookEx(self.handle) } {
            Ok(_) => tracing::info!(hook_type = self.hook_type, "hook removed"),
            Err(e) => tracing::error!(
                hook_type = self.hook_type,
                error = ?e,
                "failed to unhook"
            ),
        }
    }
}
