use anyhow::Context;

use smash::{sig, Interpreter};

fn main() -> anyhow::Result<()> {
    sig::install_handlers().context("failed to install signal handlers")?;

    let mut shell = Interpreter::new();
    let code = shell.repl()?;
    std::process::exit(code);
}
