use std::process::ExitCode;

use serde_json::json;
use xamldoc::WorkflowMetadata;

use crate::commands::CommandResult;
use crate::error::CliError;

pub enum OutputFormat {
    Text,
    Json,
}

/// Renders a `CommandResult` as either human-readable text or a single JSON line and
/// converts the outcome into its exit code.
pub fn emit_result(result: CommandResult, format: OutputFormat) -> Result<ExitCode, CliError> {
    match format {
        OutputFormat::Text => print_text(&result)?,
        OutputFormat::Json => print_json(&result)?,
    };
    Ok(ExitCode::from(result.exit_status().code()))
}

fn print_text(result: &CommandResult) -> Result<(), CliError> {
    match result {
        CommandResult::Generated {
            project,
            project_root,
            output_dir,
            written,
            index,
            failures,
        } => {
            println!(
                "Documented {} workflow(s) of '{}' ({}) into {}",
                written.len(),
                project,
                project_root,
                output_dir
            );
            for doc in written {
                println!("  [OK] {} -> {}", doc.source, doc.path);
            }
            if let Some(index) = index {
                println!("  index: {index}");
            }
            for failure in failures {
                println!("  [ERR] {}: {}", failure.path, failure.message);
            }
        }
        CommandResult::Inspected { workflow } => print_workflow(workflow)?,
        CommandResult::Listed {
            project_root,
            files,
        } => {
            println!("Workflows in {} ({}):", project_root, files.len());
            for file in files {
                println!("  - {file}");
            }
        }
        CommandResult::Schema { schema } => {
            println!("{}", serde_json::to_string_pretty(schema)?);
        }
    }
    Ok(())
}

fn print_workflow(workflow: &WorkflowMetadata) -> Result<(), CliError> {
    println!("Workflow: {}", workflow.name()?);
    let source = workflow
        .relative_path()
        .unwrap_or_else(|| workflow.source_path());
    println!("Source: {}", source.display());
    let description = workflow.description()?;
    if !description.is_empty() {
        println!("Description: {description}");
    }
    if workflow.arguments().is_empty() {
        println!("Arguments: none");
        return Ok(());
    }
    println!("Arguments ({}):", workflow.arguments().len());
    for argument in workflow.arguments() {
        let default = if argument.default_value().is_empty() {
            String::new()
        } else {
            format!(" = {}", argument.default_value())
        };
        println!(
            "  - {} [{}] {}{}",
            argument.name(),
            argument.direction(),
            argument.type_name(),
            default
        );
        if !argument.annotation().is_empty() {
            println!("      {}", argument.annotation());
        }
    }
    Ok(())
}

fn print_json(result: &CommandResult) -> Result<(), CliError> {
    let payload = json!(result);
    println!("{payload}");
    Ok(())
}
