//! Turns a token stream into a sequence of simple commands joined by `&&`.

use crate::error::SmashError;
use crate::lexer::Token;

/// One simple command: argv (argv[0] is the verb) plus a background flag.
///
/// Only the final command of a line may carry `background`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleCommand {
    pub argv: Vec<String>,
    pub background: bool,
}

/// Non-empty sequence of simple commands joined by `&&`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandList {
    pub commands: Vec<SimpleCommand>,
}

/// Parse a token stream into a [`CommandList`].
///
/// Placement rules: `&&` must have a command on both sides, and a lone `&`
/// is legal only as the very last token, where it marks the final command
/// as background. An empty stream parses to `None` (the caller re-prompts).
pub fn parse_command_list(tokens: Vec<Token>) -> Result<Option<CommandList>, SmashError> {
    if tokens.is_empty() {
        return Ok(None);
    }

    let mut commands = Vec::new();
    let mut argv: Vec<String> = Vec::new();
    let mut background = false;
    let last = tokens.len() - 1;

    for (i, token) in tokens.into_iter().enumerate() {
        match token {
            Token::Word(w) => argv.push(w),
            Token::AndOp => {
                // Rejects `&& cmd`, `cmd1 && && cmd2` and `cmd &&`.
                if argv.is_empty() || i == last {
                    return Err(SmashError::Parse);
                }
                commands.push(SimpleCommand {
                    argv: std::mem::take(&mut argv),
                    background: false,
                });
            }
            Token::Ampersand => {
                if i != last || argv.is_empty() {
                    return Err(SmashError::Parse);
                }
                background = true;
            }
        }
    }

    if argv.is_empty() {
        return Err(SmashError::Parse);
    }
    commands.push(SimpleCommand { argv, background });

    Ok(Some(CommandList { commands }))
}
