//! Safe wrappers around the Win32 calls the hook listener depends on.

pub mod hooks;
pub mod message_loop;

pub use hooks::*;
pub use message_loop::*;
