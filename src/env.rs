//! Process-wide shell state threaded through command execution.

use std::env as stdenv;
use std::path::PathBuf;

use nix::unistd::{self, Pid};

use crate::alias::AliasStore;
use crate::error::ExitCode;
use crate::jobs::JobTable;

/// The single mutable state value of the shell.
///
/// Owned by the interpreter and passed to every command. The current
/// working directory itself belongs to the OS; `current_dir` mirrors it so
/// `pwd` and relative `cd` never have to re-query.
///
/// Note: fields are public for simplicity; the shell is single-threaded and
/// everything mutates on the main loop.
#[derive(Debug)]
pub struct Environment {
    /// Mirror of the process working directory.
    pub current_dir: PathBuf,
    /// Previous working directory; unset until the first successful `cd`.
    pub oldpwd: Option<PathBuf>,
    /// The shell's own PID, captured at startup.
    pub shell_pid: Pid,
    /// Exit status of the last executed command, feeds `&&` short-circuit.
    pub last_status: ExitCode,
    /// When set to true, the read-eval loop terminates.
    pub should_exit: bool,
    /// Process exit code once `should_exit` is set.
    pub exit_code: i32,
    /// Defined aliases.
    pub aliases: AliasStore,
    /// Background jobs.
    pub jobs: JobTable,
}

impl Environment {
    /// Capture the current process state into a new `Environment`.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self {
            current_dir,
            oldpwd: None,
            shell_pid: unistd::getpid(),
            last_status: 0,
            should_exit: false,
            exit_code: 0,
            aliases: AliasStore::new(),
            jobs: JobTable::new(),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_captures_process_state() {
        let env = Environment::new();
        assert!(env.current_dir.is_absolute());
        assert_eq!(env.shell_pid, unistd::getpid());
        assert!(env.oldpwd.is_none());
        assert_eq!(env.last_status, 0);
        assert!(!env.should_exit);
    }
}
