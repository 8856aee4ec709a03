use std::ffi::OsString;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::commands;
use crate::error::{CliError, ExitStatus};
use crate::formatter::{OutputFormat, emit_result};
use crate::util::Verbosity;

const NAME: &str = "xamldoc";

pub fn run() -> ExitCode {
    let verbose = std::env::args().any(|arg| arg == "--verbose");
    init_tracing(verbose);
    match run_cli(std::env::args()) {
        Ok(code) => code,
        Err(err) => {
            err.print();
            err.exit_code()
        }
    }
}

/// Parses CLI arguments and dispatches to the selected command. Returns a POSIX
/// `sysexits`-compatible `ExitCode` so automation can react deterministically.
pub fn run_cli<I, S>(args: I) -> Result<ExitCode, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let command = build_cli();
    let matches = command.try_get_matches_from(args)?;

    let verbosity = Verbosity {
        json: matches.get_flag("json"),
        verbose: matches.get_flag("verbose"),
    };
    let output = if verbosity.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let result = dispatch(verbosity, &matches)?;
    emit_result(result, output)
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Defines the root `clap::Command` tree: global output flags plus the `generate`,
/// `inspect`, `list` and `schema` subcommands.
fn build_cli() -> Command {
    Command::new(NAME)
        .about("Generate Markdown documentation from XAML workflow projects")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit newline-delimited JSON instead of human-readable text."),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log resolved project paths and per-document results."),
        )
        .subcommand_required(true)
        .subcommand(commands::generate::command())
        .subcommand(commands::inspect::command())
        .subcommand(commands::list::command())
        .subcommand(commands::schema::command())
}

fn dispatch(
    verbosity: Verbosity,
    matches: &ArgMatches,
) -> Result<commands::CommandResult, CliError> {
    match matches.subcommand() {
        Some(("generate", sub)) => commands::generate::run(verbosity, sub),
        Some(("inspect", sub)) => commands::inspect::run(verbosity, sub),
        Some(("list", sub)) => commands::list::run(verbosity, sub),
        Some(("schema", _)) => commands::schema::run(),
        _ => Err(CliError::new("missing command", ExitStatus::Usage)),
    }
}
