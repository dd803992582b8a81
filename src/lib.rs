//! smash — a small interactive Unix command shell.
//!
//! This crate provides the building blocks of a line-oriented shell: a
//! tokenizer and parser for simple commands joined by `&&`, an
//! insertion-ordered alias store, a job table with lowest-free-ID recycling,
//! SIGCHLD-driven reaping, and the built-in commands the shell understands.
//!
//! The main entry point is [`Interpreter`], which owns the shell state and
//! drives the read-eval loop. The public modules expose the individual
//! pieces for testing and reuse.

pub mod alias;
pub mod builtin;
pub mod command;
pub mod env;
pub mod error;
pub mod external;
pub mod interpreter;
pub mod jobs;
pub mod lexer;
pub mod parser;
pub mod sig;

#[cfg(test)]
mod test_util;

/// Just a convenient re-export of the interactive command runner.
pub use interpreter::Interpreter;
