//! Launching commands that are not built-ins.
//!
//! The verb is resolved against PATH before forking, so an unknown command
//! is reported without spawning anything. A foreground child is placed in
//! its own process group, handed the terminal when there is one, and waited
//! for; a background child is registered in the job table instead.

use std::borrow::Cow;
use std::ffi::{CString, OsStr};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};

use crate::env::Environment;
use crate::error::{ExitCode, SmashError};
use crate::sig;

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returned if it exists.
/// - Path with multiple components (e.g. `bin/tool` or `./tool`): returned
///   if it exists relative to the current directory.
/// - Single component: search each directory in `search_paths` (PATH) and
///   return the first existing match.
/// - Empty path: `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    if path.starts_with("./") && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        (Some(name), None) => find_in_path(search_paths, name.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(search_paths) {
        let candidate = dir.join(cmd);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

/// Run an external command, either foreground or background.
///
/// `line_text` is the original command line (trailing `&` already stripped);
/// it becomes the job's listing text when `background` is set. Returns the
/// foreground child's exit status, or 0 after launching a background job.
pub fn run(
    argv: &[String],
    background: bool,
    line_text: &str,
    env: &mut Environment,
) -> Result<ExitCode, SmashError> {
    let search_paths = std::env::var_os("PATH").unwrap_or_default();
    let resolved = match find_command_path(&search_paths, Path::new(&argv[0])) {
        Some(path) => path.into_owned(),
        None => {
            return Err(SmashError::CommandNotFound {
                name: argv[0].clone(),
            })
        }
    };

    let c_path = to_cstring(resolved.as_os_str().as_bytes())?;
    let c_argv: Vec<CString> = argv
        .iter()
        .map(|arg| to_cstring(arg.as_bytes()))
        .collect::<Result<_, _>>()?;

    match unsafe { unistd::fork() } {
        Ok(ForkResult::Child) => {
            // Own process group, default signal dispositions, then exec.
            let _ = unistd::setpgid(Pid::from_raw(0), Pid::from_raw(0));
            sig::restore_child_defaults();
            let _ = unistd::execv(&c_path, &c_argv);
            // Only reached when exec failed.
            eprintln!("smash error: {}: cannot execute", argv[0]);
            std::process::exit(127);
        }
        Ok(ForkResult::Parent { child }) => {
            let _ = unistd::setpgid(child, child);
            if background {
                env.jobs.add(child, line_text);
                Ok(0)
            } else {
                Ok(wait_in_foreground(child))
            }
        }
        Err(errno) => Err(SmashError::Subprocess {
            detail: format!("fork failed: {}", errno),
        }),
    }
}

/// Block until `pid` terminates, with the terminal handed to its process
/// group for the duration. Returns `WEXITSTATUS`, or 128+signal when the
/// child was killed by a signal.
pub fn wait_in_foreground(pid: Pid) -> ExitCode {
    give_terminal_to(pid);
    let status = loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => break code,
            Ok(WaitStatus::Signaled(_, signal, _)) => break 128 + signal as i32,
            Ok(_) => continue,
            Err(nix::errno::Errno::EINTR) => continue,
            Err(_) => break 0,
        }
    };
    give_terminal_to(unistd::getpgrp());
    status
}

/// Make `pgrp` the terminal's foreground process group. A no-op when stdin
/// is not a terminal (the shell still runs fine under a pipe).
fn give_terminal_to(pgrp: Pid) {
    let _ = unistd::tcsetpgrp(io::stdin(), pgrp);
}

fn to_cstring(bytes: &[u8]) -> Result<CString, SmashError> {
    CString::new(bytes).map_err(|_| SmashError::Subprocess {
        detail: "argument contains an interior NUL byte".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::lock_children;
    use std::ffi::OsString;
    use std::fs::{self, File};

    fn paths(s: &str) -> OsString {
        OsString::from(s)
    }

    #[test]
    fn test_absolute_existing_path() {
        let path = Path::new("/bin/sh");
        let found = find_command_path(&paths("/bin"), path).expect("found /bin/sh");
        assert_eq!(found.as_ref(), path);
    }

    #[test]
    fn test_absolute_missing_path() {
        assert!(find_command_path(&paths("/bin"), Path::new("/bin/nonexisting")).is_none());
    }

    #[test]
    fn test_single_component_found_in_path() {
        let found = find_command_path(&paths("/bin"), Path::new("sh"))
            .expect("found 'sh' via PATH search");
        assert!(found.as_ref().starts_with("/bin"));
        assert!(found.as_ref().ends_with("sh"));
    }

    #[test]
    fn test_single_component_missing_from_path() {
        assert!(find_command_path(&paths("/bin"), Path::new("no_such_cmd_12345")).is_none());
    }

    #[test]
    fn test_multi_component_relative_path() {
        let base = std::env::temp_dir().join(format!("smash_ext_{}", std::process::id()));
        let _ = fs::remove_dir_all(&base);
        fs::create_dir_all(base.join("bin")).unwrap();
        File::create(base.join("bin").join("tool")).unwrap();

        let relative = base.join("bin").join("tool");
        let found = find_command_path(&paths("/irrelevant"), &relative)
            .expect("found multi-component path");
        assert_eq!(found.as_ref(), relative.as_path());

        let _ = fs::remove_dir_all(base);
    }

    #[test]
    fn test_empty_path_resolves_to_nothing() {
        assert!(find_command_path(&paths("/bin"), Path::new("")).is_none());
    }

    #[test]
    fn test_command_not_found_error() {
        let _lock = lock_children();
        let mut env = Environment::new();
        let argv = vec!["definitely_not_a_command_12345".to_string()];
        let err = run(&argv, false, "definitely_not_a_command_12345", &mut env).unwrap_err();
        assert_eq!(
            err.to_string(),
            "smash error: definitely_not_a_command_12345: command not found"
        );
    }

    #[test]
    fn test_foreground_exit_status_propagates() {
        let _lock = lock_children();
        let mut env = Environment::new();
        let argv = vec!["sh".to_string(), "-c".to_string(), "exit 3".to_string()];
        let status = run(&argv, false, "sh -c 'exit 3'", &mut env).unwrap();
        assert_eq!(status, 3);
    }

    #[test]
    fn test_background_job_is_registered() {
        let _lock = lock_children();
        let mut env = Environment::new();
        let argv = vec!["sleep".to_string(), "5".to_string()];
        let status = run(&argv, true, "sleep 5", &mut env).unwrap();
        assert_eq!(status, 0);
        assert_eq!(env.jobs.len(), 1);
        let job = env.jobs.get(0).expect("job 0 registered");
        assert_eq!(job.command_text, "sleep 5");

        // Clean up the child.
        let _ = nix::sys::signal::kill(job.pid, nix::sys::signal::Signal::SIGKILL);
        let _ = waitpid(job.pid, None);
        env.jobs.remove(0);
    }
}
