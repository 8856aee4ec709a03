use clap::{Arg, ArgAction, ArgMatches, Command};
use xamldoc::{DiscoveryOptions, discover_project, discover_workflows};

use crate::commands::CommandResult;
use crate::error::CliError;
use crate::util::{self, Verbosity};

pub fn command() -> Command {
    Command::new("list")
        .about("List the workflow files that would be documented")
        .arg(
            Arg::new("path")
                .value_name("PATH")
                .default_value(".")
                .help("Project root or any path inside the project."),
        )
        .arg(
            Arg::new("no-recursive")
                .long("no-recursive")
                .action(ArgAction::SetTrue)
                .help("Only list workflows at the top level of the project."),
        )
        .arg(
            Arg::new("include-private")
                .long("include-private")
                .action(ArgAction::SetTrue)
                .help("Include workflows marked private in project.json."),
        )
}

pub fn run(verbosity: Verbosity, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let path = matches
        .get_one::<String>("path")
        .cloned()
        .unwrap_or_else(|| ".".to_string());
    let options = DiscoveryOptions {
        recursive: !matches.get_flag("no-recursive"),
        include_private: matches.get_flag("include-private"),
    };

    let project = discover_project(&path)?;
    if verbosity.verbose {
        tracing::info!(
            project = %project.root().display(),
            configured = project.has_config(),
            "resolved project root"
        );
    }
    let files = discover_workflows(&project, &options)?
        .iter()
        .map(|file| util::project_relative(project.root(), file))
        .collect();

    Ok(CommandResult::Listed {
        project_root: project.root().display().to_string(),
        files,
    })
}
