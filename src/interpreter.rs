//! The executor and the read-eval loop.

use std::io::{self, BufRead, Write};

use anyhow::Context;

use crate::alias;
use crate::builtin;
use crate::command::{CommandFactory, ExitCode};
use crate::env::Environment;
use crate::error::SmashError;
use crate::external;
use crate::lexer;
use crate::parser::{self, SimpleCommand};
use crate::sig;

/// Factory allows creating instances of ExecutableCommand.
///
/// One instance per built-in command type; see [`crate::builtin`] for the
/// commands and the matching `CommandFactory` implementation.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The interactive command processor.
///
/// Owns the shell state and the built-in command factories. Each input line
/// goes through tokenize → alias-expand → parse, then the command list is
/// folded left to right: a non-zero status short-circuits the remaining
/// `&&`-linked commands.
pub struct Interpreter {
    env: Environment,
    factories: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
            factories: builtin::default_factories(),
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Execute one input line, writing output and diagnostics to `out`.
    ///
    /// Command failures never abort the shell; they are printed and folded
    /// into the line's exit status.
    pub fn run_line(&mut self, line: &str, out: &mut dyn Write) -> io::Result<()> {
        if let Err(err) = self.eval_line(line, out) {
            writeln!(out, "{}", err)?;
            self.env.last_status = 1;
        }
        Ok(())
    }

    fn eval_line(&mut self, line: &str, out: &mut dyn Write) -> Result<(), SmashError> {
        let tokens = lexer::split_into_tokens(line)?;
        let tokens = alias::expand_tokens(&self.env.aliases, tokens)?;
        let Some(list) = parser::parse_command_list(tokens)? else {
            return Ok(());
        };

        // Job listing text: the line as typed, minus the trailing `&`.
        let mut text = line.trim();
        if list.commands.last().is_some_and(|c| c.background) {
            if let Some(stripped) = text.strip_suffix('&') {
                text = stripped.trim_end();
            }
        }

        for command in &list.commands {
            let status = match self.dispatch(command, text, out) {
                Ok(status) => status,
                Err(err) => {
                    writeln!(out, "{}", err)?;
                    1
                }
            };
            self.env.last_status = status;
            if self.env.should_exit || status != 0 {
                break;
            }
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        command: &SimpleCommand,
        line_text: &str,
        out: &mut dyn Write,
    ) -> Result<ExitCode, SmashError> {
        let name = &command.argv[0];
        let args = &command.argv[1..];
        for factory in &self.factories {
            if let Some(cmd) = factory.try_create(name, args) {
                // A background marker on a built-in is ignored; built-ins
                // always run in-process.
                return cmd.execute(out, &mut self.env);
            }
        }
        external::run(&command.argv, command.background, line_text, &mut self.env)
    }

    /// The read-eval loop: prompt, read, run, until `quit` or EOF.
    ///
    /// Returns the process exit code.
    pub fn repl(&mut self) -> anyhow::Result<i32> {
        let stdin = io::stdin();
        let mut stdin = stdin.lock();
        let mut out = io::stdout();

        loop {
            if sig::take_child_pending() {
                self.env.jobs.reconcile();
            }

            write!(out, "smash > ").context("failed to write prompt")?;
            out.flush().context("failed to flush prompt")?;

            let mut line = String::new();
            match stdin.read_line(&mut line) {
                Ok(0) => break, // EOF
                Ok(_) => {
                    self.run_line(&line, &mut out)?;
                    out.flush()?;
                    if self.env.should_exit {
                        break;
                    }
                }
                // The reap flag is checked at the top of the loop.
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err).context("failed to read from stdin"),
            }
        }

        Ok(self.env.exit_code)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
