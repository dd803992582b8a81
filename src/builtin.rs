//! Built-in commands known to the shell at compile time.
//!
//! Builtins are executed directly in-process without spawning a child.
//! Each command parses its own argv in `from_argv`; an argument error
//! becomes an [`ErrorCommand`] so the factory always yields something the
//! executor can run (the failure then surfaces as the command's diagnostic
//! and a non-zero status).

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use nix::sys::signal::{self, Signal};

use crate::alias;
use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::error::SmashError;
use crate::external;
use crate::interpreter::Factory;

/// A command implemented inside the shell process.
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the verb, e.g. "cd" or "jobs".
    fn name() -> &'static str;

    /// Parse the argument vector (without the verb itself).
    fn from_argv(args: &[String]) -> Result<Self, SmashError>;

    /// Executes the command using the provided output stream and shell state.
    ///
    /// Return value follows shell conventions: 0 for success, non-zero for
    /// failure. User-facing failures are returned as [`SmashError`].
    fn execute(self, out: &mut dyn Write, env: &mut Environment) -> Result<ExitCode, SmashError>;
}

/// Adapter giving every built-in the object-safe command interface.
struct Builtin<T>(T);

impl<T: BuiltinCommand> ExecutableCommand for Builtin<T> {
    fn execute(
        self: Box<Self>,
        out: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode, SmashError> {
        let Builtin(cmd) = *self;
        cmd.execute(out, env)
    }
}

/// Stand-in produced when argument parsing fails; running it reports the
/// error. This keeps the factory interface uniform.
struct ErrorCommand {
    err: SmashError,
}

impl ExecutableCommand for ErrorCommand {
    fn execute(
        self: Box<Self>,
        _out: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<ExitCode, SmashError> {
        Err(self.err)
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[String]) -> Option<Box<dyn ExecutableCommand>> {
        if name != T::name() {
            return None;
        }
        Some(match T::from_argv(args) {
            Ok(cmd) => Box::new(Builtin(cmd)),
            Err(err) => Box::new(ErrorCommand { err }),
        })
    }
}

/// Print the shell's own PID. Extra arguments are tolerated.
pub struct Showpid;

impl BuiltinCommand for Showpid {
    fn name() -> &'static str {
        "showpid"
    }

    fn from_argv(_args: &[String]) -> Result<Self, SmashError> {
        Ok(Showpid)
    }

    fn execute(self, out: &mut dyn Write, env: &mut Environment) -> Result<ExitCode, SmashError> {
        writeln!(out, "smash pid is {}", env.shell_pid)?;
        Ok(0)
    }
}

/// Print the current working directory. Extra arguments are tolerated.
pub struct Pwd;

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn from_argv(_args: &[String]) -> Result<Self, SmashError> {
        Ok(Pwd)
    }

    fn execute(self, out: &mut dyn Write, env: &mut Environment) -> Result<ExitCode, SmashError> {
        writeln!(out, "{}", env.current_dir.display())?;
        Ok(0)
    }
}

/// Change the current working directory.
///
/// Takes exactly one argument. `-` swaps with the previous directory; every
/// successful change records the old directory for the next `cd -`.
pub struct Cd {
    target: String,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn from_argv(args: &[String]) -> Result<Self, SmashError> {
        match args {
            [] => Err(SmashError::Arity {
                verb: "cd",
                detail: "expected 1 argument",
            }),
            [target] => Ok(Cd {
                target: target.clone(),
            }),
            _ => Err(SmashError::Arity {
                verb: "cd",
                detail: "too many arguments",
            }),
        }
    }

    fn execute(self, _out: &mut dyn Write, env: &mut Environment) -> Result<ExitCode, SmashError> {
        let target = if self.target == "-" {
            match &env.oldpwd {
                Some(previous) => previous.clone(),
                None => return Err(SmashError::OldPwdUnset),
            }
        } else {
            let path = PathBuf::from(&self.target);
            if path.is_absolute() {
                path
            } else {
                env.current_dir.join(path)
            }
        };

        let missing = SmashError::Filesystem {
            verb: "cd",
            detail: "target directory does not exist",
        };
        let metadata = fs::metadata(&target).map_err(|_| missing.clone())?;
        if !metadata.is_dir() {
            return Err(SmashError::Filesystem {
                verb: "cd",
                detail: "target is not a directory",
            });
        }

        let canonical = fs::canonicalize(&target).map_err(|_| missing.clone())?;
        std::env::set_current_dir(&canonical).map_err(|_| missing)?;
        env.oldpwd = Some(std::mem::replace(&mut env.current_dir, canonical));
        Ok(0)
    }
}

/// List running background jobs.
pub struct Jobs;

impl BuiltinCommand for Jobs {
    fn name() -> &'static str {
        "jobs"
    }

    fn from_argv(_args: &[String]) -> Result<Self, SmashError> {
        Ok(Jobs)
    }

    fn execute(self, out: &mut dyn Write, env: &mut Environment) -> Result<ExitCode, SmashError> {
        env.jobs.reconcile();
        env.jobs.list(out)?;
        Ok(0)
    }
}

/// Send a signal to a background job: `kill <signum> <job id>`, with the
/// signal number optionally prefixed by `-`.
pub struct Kill {
    signum: i32,
    id: u32,
}

impl BuiltinCommand for Kill {
    fn name() -> &'static str {
        "kill"
    }

    fn from_argv(args: &[String]) -> Result<Self, SmashError> {
        let invalid = SmashError::InvalidArguments { verb: "kill" };
        let [signum, id] = args else {
            return Err(invalid);
        };
        let signum: i32 = signum
            .strip_prefix('-')
            .unwrap_or(signum)
            .parse()
            .map_err(|_| invalid.clone())?;
        let id: u32 = id.parse().map_err(|_| invalid)?;
        Ok(Kill { signum, id })
    }

    fn execute(self, out: &mut dyn Write, env: &mut Environment) -> Result<ExitCode, SmashError> {
        env.jobs.reconcile();
        let job = env.jobs.get(self.id).ok_or(SmashError::NoSuchJob {
            verb: "kill",
            id: self.id,
        })?;
        let signal = Signal::try_from(self.signum)
            .map_err(|_| SmashError::InvalidArguments { verb: "kill" })?;
        signal::kill(job.pid, signal).map_err(|errno| SmashError::Subprocess {
            detail: format!("kill failed: {}", errno),
        })?;
        writeln!(out, "signal number {} was sent to pid {}", self.signum, job.pid)?;
        Ok(0)
    }
}

/// Bring a background job to the foreground.
///
/// With no argument, picks the job with the largest current ID; with one,
/// that job. Prints the job's command and pid, then blocks until it ends.
pub struct Fg {
    id: Option<u32>,
}

impl BuiltinCommand for Fg {
    fn name() -> &'static str {
        "fg"
    }

    fn from_argv(args: &[String]) -> Result<Self, SmashError> {
        let invalid = SmashError::InvalidArguments { verb: "fg" };
        match args {
            [] => Ok(Fg { id: None }),
            [id] => Ok(Fg {
                id: Some(id.parse().map_err(|_| invalid)?),
            }),
            _ => Err(invalid),
        }
    }

    fn execute(self, out: &mut dyn Write, env: &mut Environment) -> Result<ExitCode, SmashError> {
        env.jobs.reconcile();
        let job = match self.id {
            Some(id) => env
                .jobs
                .get(id)
                .ok_or(SmashError::NoSuchJob { verb: "fg", id })?,
            None => env
                .jobs
                .max_id()
                .and_then(|id| env.jobs.get(id))
                .ok_or(SmashError::EmptyJobList)?,
        };
        let (id, pid, text) = (job.id, job.pid, job.command_text.clone());

        writeln!(out, "{} : {}", text, pid)?;
        out.flush()?;
        let status = external::wait_in_foreground(pid);
        env.jobs.remove(id);
        Ok(status)
    }
}

/// Define an alias (`alias name='replacement'`) or list all definitions.
pub struct Alias {
    definition: Option<String>,
}

impl BuiltinCommand for Alias {
    fn name() -> &'static str {
        "alias"
    }

    fn from_argv(args: &[String]) -> Result<Self, SmashError> {
        Ok(Alias {
            definition: if args.is_empty() {
                None
            } else {
                Some(args.join(" "))
            },
        })
    }

    fn execute(self, out: &mut dyn Write, env: &mut Environment) -> Result<ExitCode, SmashError> {
        let Some(definition) = self.definition else {
            for (name, replacement) in env.aliases.iter() {
                writeln!(out, "{}='{}'", name, replacement)?;
            }
            return Ok(0);
        };

        let eq = definition.find('=').ok_or(SmashError::InvalidAliasFormat)?;
        let name = &definition[..eq];
        let replacement = strip_balanced_quotes(&definition[eq + 1..]);
        if !alias::is_valid_name(name) || replacement.is_empty() {
            return Err(SmashError::InvalidAliasFormat);
        }
        env.aliases.define(name, replacement);
        Ok(0)
    }
}

// The tokenizer has usually stripped quoting already; this catches raw
// definitions that still carry their single quotes.
fn strip_balanced_quotes(text: &str) -> &str {
    text.strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .unwrap_or(text)
}

/// Remove aliases by name, stopping at the first one that does not exist.
pub struct Unalias {
    names: Vec<String>,
}

impl BuiltinCommand for Unalias {
    fn name() -> &'static str {
        "unalias"
    }

    fn from_argv(args: &[String]) -> Result<Self, SmashError> {
        if args.is_empty() {
            return Err(SmashError::InvalidArguments { verb: "unalias" });
        }
        Ok(Unalias {
            names: args.to_vec(),
        })
    }

    fn execute(self, _out: &mut dyn Write, env: &mut Environment) -> Result<ExitCode, SmashError> {
        for name in self.names {
            if !env.aliases.remove(&name) {
                return Err(SmashError::UnknownAlias { name });
            }
        }
        Ok(0)
    }
}

/// Byte-compare two regular files; prints `0` when identical, `1` when not.
pub struct Diff {
    left: String,
    right: String,
}

impl BuiltinCommand for Diff {
    fn name() -> &'static str {
        "diff"
    }

    fn from_argv(args: &[String]) -> Result<Self, SmashError> {
        let [left, right] = args else {
            return Err(SmashError::Arity {
                verb: "diff",
                detail: "expected 2 arguments",
            });
        };
        Ok(Diff {
            left: left.clone(),
            right: right.clone(),
        })
    }

    fn execute(self, out: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode, SmashError> {
        let (left_meta, right_meta) = match (fs::metadata(&self.left), fs::metadata(&self.right)) {
            (Ok(l), Ok(r)) => (l, r),
            _ => {
                return Err(SmashError::Filesystem {
                    verb: "diff",
                    detail: "expected valid paths for files",
                })
            }
        };
        if !left_meta.is_file() || !right_meta.is_file() {
            return Err(SmashError::Filesystem {
                verb: "diff",
                detail: "paths are not files",
            });
        }

        let open_failed = SmashError::Filesystem {
            verb: "diff",
            detail: "failed to open file",
        };
        let left = File::open(&self.left).map_err(|_| open_failed.clone())?;
        let right = File::open(&self.right).map_err(|_| open_failed)?;

        let identical =
            left_meta.len() == right_meta.len() && streams_identical(left, right)?;
        writeln!(out, "{}", if identical { 0 } else { 1 })?;
        Ok(0)
    }
}

fn streams_identical(left: File, right: File) -> Result<bool, SmashError> {
    let mut left = BufReader::new(left);
    let mut right = BufReader::new(right);
    loop {
        let consumed = {
            let l = left.fill_buf().map_err(SmashError::from)?;
            let r = right.fill_buf().map_err(SmashError::from)?;
            if l.is_empty() || r.is_empty() {
                return Ok(l.is_empty() && r.is_empty());
            }
            let n = l.len().min(r.len());
            if l[..n] != r[..n] {
                return Ok(false);
            }
            n
        };
        left.consume(consumed);
        right.consume(consumed);
    }
}

/// Exit the shell. `quit kill` first SIGTERMs every running job, escalating
/// to SIGKILL after a grace period.
pub struct Quit {
    kill_jobs: bool,
}

impl BuiltinCommand for Quit {
    fn name() -> &'static str {
        "quit"
    }

    fn from_argv(args: &[String]) -> Result<Self, SmashError> {
        match args {
            [] => Ok(Quit { kill_jobs: false }),
            [arg] if arg == "kill" => Ok(Quit { kill_jobs: true }),
            _ => Err(SmashError::Arity {
                verb: "quit",
                detail: "unexpected arguments",
            }),
        }
    }

    fn execute(self, out: &mut dyn Write, env: &mut Environment) -> Result<ExitCode, SmashError> {
        if self.kill_jobs {
            env.jobs.reconcile();
            env.jobs.kill_all(out)?;
        }
        env.should_exit = true;
        env.exit_code = 0;
        Ok(0)
    }
}

/// The factories for every built-in, in dispatch order.
pub(crate) fn default_factories() -> Vec<Box<dyn CommandFactory>> {
    vec![
        Box::new(Factory::<Showpid>::default()),
        Box::new(Factory::<Pwd>::default()),
        Box::new(Factory::<Cd>::default()),
        Box::new(Factory::<Jobs>::default()),
        Box::new(Factory::<Kill>::default()),
        Box::new(Factory::<Fg>::default()),
        Box::new(Factory::<Alias>::default()),
        Box::new(Factory::<Unalias>::default()),
        Box::new(Factory::<Diff>::default()),
        Box::new(Factory::<Quit>::default()),
    ]
}
