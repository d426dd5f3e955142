//! Internal utilities.

/// Returns `true` on hosts that use the `/etc/resolver` per-domain
/// convention (macOS only).
#[must_use]
pub const fn is_supported_platform() -> bool {
    cfg!(target_os = "macos")
}

/// Checks whether the process with the given PID is still alive.
///
/// Uses `kill(pid, 0)` — signal 0 checks existence without delivering a
/// signal.
#[must_use]
pub fn is_process_alive(pid: u32) -> bool {
    // SAFETY: `kill(pid, 0)` is a standard POSIX existence check that does
    // not deliver any signal.
    #[allow(clippy::cast_possible_wrap)]
    unsafe {
        libc::kill(pid as libc::pid_t, 0) == 0
    }
}
