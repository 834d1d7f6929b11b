//! `dojo` command-line entry point.
//!
//! # Responsibility
//! - Parse global flags, start file logging, and own the process registry.
//! - Run one command, or the interactive shell when none is given.

mod commands;
mod shell;

use clap::Parser;
use commands::{Command, Session};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "dojo", version)]
#[command(about = "Office and living space allocation for the Dojo")]
struct Cli {
    /// trace|debug|info|warn|error (defaults by build mode)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Directory for rolling log files [default: ./logs]
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Directory report files are written into
    #[arg(long, global = true, default_value = ".")]
    output_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_cli_logging(cli.log_level.as_deref(), cli.log_dir.as_deref());

    let mut session = Session::new(cli.output_dir);
    match cli.command {
        None | Some(Command::Shell) => {
            let stdin = std::io::stdin();
            match shell::run_shell(&mut session, stdin.lock(), std::io::stdout()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("error: {err}");
                    ExitCode::FAILURE
                }
            }
        }
        Some(command) => match session.execute(command) {
            Ok(output) => {
                print!("{output}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::FAILURE
            }
        },
    }
}

/// Starts file logging; failures are reported and the command still runs.
fn init_cli_logging(level: Option<&str>, log_dir: Option<&Path>) {
    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(err) => {
            eprintln!("warning: logging disabled: {err}");
            return;
        }
    };
    let (level, log_dir) = resolve_log_settings(level, log_dir, &cwd);

    if let Err(err) = dojo_core::init_logging(level, &log_dir.to_string_lossy()) {
        eprintln!("warning: logging disabled: {err}");
    }
}

/// Applies defaults: build-mode level and `<cwd>/logs`; relative dirs are
/// resolved against `cwd`.
fn resolve_log_settings<'a>(
    level: Option<&'a str>,
    log_dir: Option<&Path>,
    cwd: &Path,
) -> (&'a str, PathBuf) {
    let log_dir = match log_dir {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => cwd.join(dir),
        None => cwd.join("logs"),
    };
    (level.unwrap_or(dojo_core::default_log_level()), log_dir)
}

#[cfg(test)]
mod tests {
    use super::{resolve_log_settings, Cli, Command};
    use clap::Parser;
    use dojo_core::{PersonCategory, RoomKind};
    use std::path::{Path, PathBuf};

    #[test]
    fn log_settings_keep_explicit_level_and_resolve_relative_dir() {
        let requested = String::from("warn");
        let (level, dir) = resolve_log_settings(
            Some(requested.as_str()),
            Some(Path::new("var/logs")),
            Path::new("/srv/dojo"),
        );
        assert_eq!(level, "warn");
        assert_eq!(dir, PathBuf::from("/srv/dojo/var/logs"));
    }

    #[test]
    fn log_settings_fall_back_to_defaults() {
        let (level, dir) = resolve_log_settings(None, None, Path::new("/srv/dojo"));
        assert_eq!(level, dojo_core::default_log_level());
        assert_eq!(dir, PathBuf::from("/srv/dojo/logs"));

        let (_, absolute) =
            resolve_log_settings(None, Some(Path::new("/var/log/dojo")), Path::new("/srv/dojo"));
        assert_eq!(absolute, PathBuf::from("/var/log/dojo"));
    }

    #[test]
    fn no_subcommand_means_shell() {
        let cli = Cli::try_parse_from(["dojo"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.output_dir, std::path::PathBuf::from("."));
    }

    #[test]
    fn positional_arguments_parse_into_domain_types() {
        let cli = Cli::try_parse_from([
            "dojo",
            "--output-dir",
            "/tmp/out",
            "add-person",
            "Ann",
            "Lee",
            "FELLOW",
            "Y",
        ])
        .unwrap();
        match cli.command {
            Some(Command::AddPerson {
                category,
                wants_accommodation,
                ..
            }) => {
                assert_eq!(category, PersonCategory::Fellow);
                assert_eq!(wants_accommodation.as_deref(), Some("Y"));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["dojo", "create-room", "livingspace", "Mara", "Ruby"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::CreateRoom { kind: RoomKind::LivingSpace, ref names }) if names.len() == 2
        ));
    }

    #[test]
    fn state_commands_default_database_path() {
        let cli = Cli::try_parse_from(["dojo", "save-state"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::SaveState { ref db }) if db.as_os_str() == "dojo.db"
        ));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(Cli::try_parse_from(["dojo", "create-room", "cupboard", "Broom"]).is_err());
    }
}
