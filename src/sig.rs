//! Signal disposition of the shell.
//!
//! The SIGCHLD handler only stores into an atomic flag; the main loop
//! consumes the flag at safe points and runs the reaper. The shell itself
//! ignores SIGINT and SIGTSTP so that terminal delivery only affects a
//! foreground child, and ignores SIGTTOU so it can always reclaim the
//! terminal after one.

use std::sync::atomic::{AtomicBool, Ordering};

use nix::libc::c_int;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

static SIGCHLD_PENDING: AtomicBool = AtomicBool::new(false);

extern "C" fn sigchld_handler(_: c_int) {
    SIGCHLD_PENDING.store(true, Ordering::SeqCst);
}

/// Install the shell's signal dispositions.
///
/// SIGCHLD gets the flag-setting handler (with SA_RESTART so blocking reads
/// resume); SIGINT, SIGTSTP and SIGTTOU are ignored.
pub fn install_handlers() -> nix::Result<()> {
    let chld_action = SigAction::new(
        SigHandler::Handler(sigchld_handler),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    unsafe {
        signal::sigaction(Signal::SIGCHLD, &chld_action)?;
        signal::signal(Signal::SIGINT, SigHandler::SigIgn)?;
        signal::signal(Signal::SIGTSTP, SigHandler::SigIgn)?;
        signal::signal(Signal::SIGTTOU, SigHandler::SigIgn)?;
    }
    Ok(())
}

/// Restore default SIGINT/SIGTSTP dispositions; called in forked children
/// before exec, since ignored dispositions survive `execvp`.
pub fn restore_child_defaults() {
    unsafe {
        let _ = signal::signal(Signal::SIGINT, SigHandler::SigDfl);
        let _ = signal::signal(Signal::SIGTSTP, SigHandler::SigDfl);
        let _ = signal::signal(Signal::SIGTTOU, SigHandler::SigDfl);
    }
}

/// Consume the SIGCHLD flag. Returns whether a child notification arrived
/// since the last call.
pub fn take_child_pending() -> bool {
    SIGCHLD_PENDING.swap(false, Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_is_consumed_once() {
        SIGCHLD_PENDING.store(true, Ordering::SeqCst);
        assert!(take_child_pending());
        assert!(!take_child_pending());
    }

    #[test]
    fn test_install_handlers() {
        assert!(install_handlers().is_ok());
    }
}
