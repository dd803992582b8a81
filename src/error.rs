use std::io;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Exit status reported for a command that could not be resolved.
pub const STATUS_NOT_FOUND: ExitCode = 127;

/// User-facing errors of the shell.
///
/// Every variant renders the exact diagnostic line the shell prints, always
/// starting with the `smash error: ` prefix. Variants group the error kinds
/// rather than one type per message: parse, arity, lookup, filesystem and
/// subprocess failures, plus the `cd -` special case.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SmashError {
    /// Malformed line: unbalanced quotes, misplaced `&` or `&&`.
    #[error("smash error: invalid arguments")]
    Parse,

    /// A built-in was given arguments it cannot make sense of.
    #[error("smash error: {verb}: invalid arguments")]
    InvalidArguments { verb: &'static str },

    /// Wrong number of arguments for a built-in. `detail` carries the
    /// per-verb canonical text, e.g. "expected 1 argument".
    #[error("smash error: {verb}: {detail}")]
    Arity { verb: &'static str, detail: &'static str },

    /// A job id that is not present in the job table.
    #[error("smash error: {verb}: job id {id} does not exist")]
    NoSuchJob { verb: &'static str, id: u32 },

    /// `fg` with no argument while the job table is empty.
    #[error("smash error: fg: jobs list is empty")]
    EmptyJobList,

    /// `cd -` before any successful `cd`.
    #[error("smash error: cd: old pwd not set")]
    OldPwdUnset,

    /// Filesystem-level failure of a built-in, e.g. a missing `cd` target.
    #[error("smash error: {verb}: {detail}")]
    Filesystem { verb: &'static str, detail: &'static str },

    /// The verb resolved to neither a built-in nor an executable on PATH.
    #[error("smash error: {name}: command not found")]
    CommandNotFound { name: String },

    /// Malformed alias definition.
    #[error("smash error: alias: invalid alias format")]
    InvalidAliasFormat,

    /// `unalias` of a name that is not defined.
    #[error("smash error: unalias: {name} alias does not exist")]
    UnknownAlias { name: String },

    /// fork/exec-level failure.
    #[error("smash error: {detail}")]
    Subprocess { detail: String },
}

impl From<io::Error> for SmashError {
    fn from(err: io::Error) -> Self {
        SmashError::Subprocess {
            detail: err.to_string(),
        }
    }
}
