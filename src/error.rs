//! Error taxonomy for the hook lifecycle operations.

use std::error::Error;
use std::fmt;
use std::io;

use crate::monitor::input_events::InputClass;

/// Errors surfaced by the hook lifecycle operations.
///
/// No operation retries internally; every failure is reported synchronously
/// to the immediate caller, which decides whether to retry.
#[derive(Debug)]
pub enum HookError {
    /// `register` was called while a registration is already installed.
    AlreadyActive,
    /// `unregister` was called while no registration is installed.
    NotActive,
    /// The hook listener thread could not be spawned. Carries the platform
    /// error unchanged.
    Spawn(io::Error),
    /// Installing a low-level hook failed on the listener thread. `code` is
    /// the Win32 error code reported by the platform.
    ///
    /// `register` never returns this: the failure happens after it has
    /// already succeeded, and surfaces through
    /// [`status`](crate::IdleDetector::status).
    HookInstall { class: InputClass, code: u32 },
    /// The listener thread terminated without recording an exit status.
    ThreadQuery,
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookError::AlreadyActive => write!(f, "input hooks are already registered"),
            HookError::NotActive => write!(f, "input hooks are not registered"),
            HookError::Spawn(err) => write!(f, "failed to spawn hook listener thread: {err}"),
            HookError::HookInstall { class, code } => match describe_hook_error_code(*code) {
                Some(desc) => write!(f, "failed to install {class} hook: {code} ({desc})"),
                None => write!(f, "failed to install {class} hook: system error {code}"),
            },
            HookError::ThreadQuery => {
                write!(f, "hook listener thread terminated without reporting an exit status")
            }
        }
    }
}

impl Error for HookError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            HookError::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

/// Descriptions for the Win32 error codes that hook installation is known to
/// produce.
fn describe_hook_error_code(code: u32) -> Option<&'static str> {
    match code {
        1404 => Some("invalid hook handle"),
        1426 => Some("invalid hook procedure type"),
        1427 => Some("invalid hook procedure"),
        1428 => Some("cannot set nonlocal hook without a module handle"),
        1429 => Some("this hook procedure can only be set globally"),
        1430 => Some("the journal hook procedure is already installed"),
        1431 => Some("the hook procedure is not installed"),
        1458 => Some("hook type not allowed"),
        _ => None,
    }
}
