//! Monotonic tick source.
//!
//! All idle arithmetic in this crate is expressed in "ticks": milliseconds of
//! monotonic uptime. Windows builds read `GetTickCount64`, whose 64-bit range
//! never wraps within a realistic uptime (unlike the 32-bit counter it
//! supersedes, which wraps after ~49.7 days). Elapsed-time math still goes
//! through [`elapsed_ms`] so a tick source that did wrap between two samples
//! would still yield the true difference.

/// Milliseconds of monotonic uptime.
pub type Tick = u64;

/// Returns the current monotonic tick.
#[cfg(target_os = "windows")]
pub fn now() -> Tick {
    unsafe { windows::Win32::System::SystemInformation::GetTickCount64() }
}

/// Returns the current monotonic tick.
///
/// Non-Windows builds count from the first call instead of from boot; only
/// differences between ticks are meaningful, so callers cannot tell.
#[cfg(not(target_os = "windows"))]
pub fn now() -> Tick {
    use once_cell::sync::Lazy;
    use std::time::Instant;

    static EPOCH: Lazy<Instant> = Lazy::new(Instant::now);
    EPOCH.elapsed().as_millis() as Tick
}

/// Milliseconds elapsed from `earlier` to `later`, as wrapping subtraction.
#[inline]
pub fn elapsed_ms(earlier: Tick, later: Tick) -> u64 {
    later.wrapping_sub(earlier)
}
