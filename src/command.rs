use std::io::Write;

use crate::env::Environment;
use crate::error::SmashError;

pub use crate::error::ExitCode;

/// Object-safe trait for any command the shell can execute in-process.
pub trait ExecutableCommand {
    /// Executes the command against the shell state, writing any output to
    /// `out`. Returns the exit status; user-facing failures come back as
    /// [`SmashError`] and are printed by the executor.
    fn execute(
        self: Box<Self>,
        out: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode, SmashError>;
}

/// Factory that tries to create a command from a verb and its arguments.
///
/// Returns `None` when the factory doesn't recognize the verb, so the
/// executor can fall through to the next factory (and ultimately to
/// external lookup).
pub trait CommandFactory {
    fn try_create(&self, name: &str, args: &[String]) -> Option<Box<dyn ExecutableCommand>>;
}
