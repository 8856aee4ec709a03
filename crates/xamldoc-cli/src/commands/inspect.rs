use std::path::PathBuf;

use clap::{Arg, ArgMatches, Command};
use xamldoc::{DocumentExtractor, discover_project, project_relative_path};

use crate::commands::CommandResult;
use crate::error::{CliError, ExitStatus};
use crate::util::Verbosity;

pub fn command() -> Command {
    Command::new("inspect")
        .about("Print the metadata extracted from one workflow file")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .required(true)
                .help("Workflow (.xaml) file to inspect."),
        )
}

pub fn run(verbosity: Verbosity, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let file = matches
        .get_one::<String>("file")
        .map(PathBuf::from)
        .ok_or_else(|| CliError::new("workflow file required", ExitStatus::Usage))?;
    if !file.is_file() {
        return Err(CliError::new(
            format!("{} is not a file", file.display()),
            ExitStatus::Usage,
        ));
    }

    let path = file.canonicalize()?;
    let mut workflow = DocumentExtractor::new().extract_file(&path)?;

    let project = discover_project(&path)?;
    if let Some(relative) = project_relative_path(project.root(), &path) {
        workflow.set_relative_path(relative);
    }
    if verbosity.verbose {
        tracing::info!(
            project = %project.root().display(),
            arguments = workflow.arguments().len(),
            "extracted workflow"
        );
    }

    Ok(CommandResult::Inspected { workflow })
}
