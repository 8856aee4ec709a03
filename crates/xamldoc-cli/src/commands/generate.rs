use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use serde::Serialize;
use xamldoc::{DiscoveryOptions, FailurePolicy, GenerationRequest, generate};

use crate::commands::CommandResult;
use crate::error::{CliError, ExitStatus};
use crate::util::{self, Verbosity};

#[derive(Clone, Debug, Serialize)]
pub struct WrittenSummary {
    pub source: String,
    pub path: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct FailureSummary {
    pub path: String,
    pub message: String,
}

pub fn command() -> Command {
    Command::new("generate")
        .about("Write a Markdown page per workflow plus an index")
        .arg(
            Arg::new("path")
                .value_name("PATH")
                .default_value(".")
                .help("Project root or any path inside the project."),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("DIR")
                .required(true)
                .help("Directory receiving the generated documentation."),
        )
        .arg(
            Arg::new("no-recursive")
                .long("no-recursive")
                .action(ArgAction::SetTrue)
                .help("Only document workflows at the top level of the project."),
        )
        .arg(
            Arg::new("include-private")
                .long("include-private")
                .action(ArgAction::SetTrue)
                .help("Also document workflows marked private in project.json."),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .action(ArgAction::SetTrue)
                .help("Write into the output directory even if it is not empty."),
        )
        .arg(
            Arg::new("keep-going")
                .long("keep-going")
                .action(ArgAction::SetTrue)
                .help("Report malformed workflows and continue with the rest."),
        )
        .arg(
            Arg::new("jobs")
                .long("jobs")
                .short('j')
                .value_name("N")
                .value_parser(value_parser!(usize))
                .default_value("1")
                .help("Number of workflows processed in parallel."),
        )
        .arg(
            Arg::new("template")
                .long("template")
                .value_name("FILE")
                .help("Handlebars template replacing the built-in workflow page."),
        )
        .arg(
            Arg::new("no-index")
                .long("no-index")
                .action(ArgAction::SetTrue)
                .help("Skip writing README.md."),
        )
}

pub fn run(verbosity: Verbosity, matches: &ArgMatches) -> Result<CommandResult, CliError> {
    let path = matches
        .get_one::<String>("path")
        .cloned()
        .ok_or_else(|| CliError::new("project path required", ExitStatus::Usage))?;
    let output = matches
        .get_one::<String>("output")
        .cloned()
        .ok_or_else(|| CliError::new("--output is required", ExitStatus::Usage))?;
    let jobs = util::validate_jobs(matches.get_one::<usize>("jobs").copied().unwrap_or(1))?;

    let request = GenerationRequest {
        project_path: PathBuf::from(path),
        output_dir: PathBuf::from(output),
        discovery: DiscoveryOptions {
            recursive: !matches.get_flag("no-recursive"),
            include_private: matches.get_flag("include-private"),
        },
        force: matches.get_flag("force"),
        jobs,
        failure_policy: if matches.get_flag("keep-going") {
            FailurePolicy::Continue
        } else {
            FailurePolicy::Abort
        },
        template: matches.get_one::<String>("template").map(PathBuf::from),
        write_index: !matches.get_flag("no-index"),
    };

    let report = generate(&request)?;
    if verbosity.verbose {
        for doc in &report.written {
            tracing::info!(
                source = %doc.source.display(),
                path = %doc.path.display(),
                "wrote workflow page"
            );
        }
        tracing::info!(
            project = %report.project_root.display(),
            output = %report.output_dir.display(),
            written = report.written.len(),
            failed = report.failures.len(),
            "generated documentation"
        );
    }
    for failure in &report.failures {
        tracing::warn!(path = %failure.path.display(), "{}", failure.message);
    }

    let root = report.project_root.as_path();
    Ok(CommandResult::Generated {
        project: report.project_name.clone(),
        project_root: root.display().to_string(),
        output_dir: report.output_dir.display().to_string(),
        written: report
            .written
            .iter()
            .map(|doc| WrittenSummary {
                source: util::project_relative(root, &doc.source),
                path: doc.path.display().to_string(),
            })
            .collect(),
        index: report.index.as_ref().map(|p| p.display().to_string()),
        failures: report
            .failures
            .iter()
            .map(|failure| FailureSummary {
                path: util::project_relative(root, &failure.path),
                message: failure.message.clone(),
            })
            .collect(),
    })
}
