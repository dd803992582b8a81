//! Shared helpers for the crate's tests.

use std::sync::{Mutex, MutexGuard, OnceLock};

/// Serialize tests that spawn or reap child processes. The job-table reaper
/// waits on `-1`, so concurrent tests in the same binary would otherwise
/// steal each other's children.
pub(crate) fn lock_children() -> MutexGuard<'static, ()> {
    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

/// Serialize tests that change the process working directory.
pub(crate) fn lock_current_dir() -> MutexGuard<'static, ()> {
    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}
