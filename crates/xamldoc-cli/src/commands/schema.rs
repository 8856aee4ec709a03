use clap::Command;

use crate::commands::CommandResult;
use crate::error::CliError;

pub fn command() -> Command {
    Command::new("schema").about("Print the JSON schema of `inspect --json` workflow output")
}

pub fn run() -> Result<CommandResult, CliError> {
    Ok(CommandResult::Schema {
        schema: xamldoc::metadata_schema(),
    })
}
