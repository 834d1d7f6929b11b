//! Interactive command loop.
//!
//! Each input line is parsed with the same clap command set as one-shot
//! invocations and run against the session's single registry.

use crate::commands::{Command, Session};
use clap::Parser;
use std::io::{self, BufRead, Write};

const PROMPT: &str = "(dojo) ";

#[derive(Debug, Parser)]
#[command(name = "dojo", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

/// Reads commands from `input` until EOF or `quit`/`exit`.
///
/// Command failures are printed and the loop continues; only I/O errors on
/// the streams end it early.
pub fn run_shell<R: BufRead, W: Write>(
    session: &mut Session,
    input: R,
    mut output: W,
) -> io::Result<()> {
    writeln!(
        output,
        "Welcome to the Dojo room allocator. Type `help` for commands, `quit` to leave."
    )?;

    let mut lines = input.lines();
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            break;
        };
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if matches!(trimmed, "quit" | "exit") {
            writeln!(output, "Good Bye!")?;
            break;
        }

        match ShellLine::try_parse_from(trimmed.split_whitespace()) {
            Ok(parsed) => match session.execute(parsed.command) {
                Ok(text) => write!(output, "{text}")?,
                Err(err) => writeln!(output, "Error: {err}")?,
            },
            Err(err) => write!(output, "{err}")?,
        }
    }
    Ok(())
}
