use serde::Serialize;
use xamldoc::WorkflowMetadata;

use crate::error::ExitStatus;

pub mod generate;
pub mod inspect;
pub mod list;
pub mod schema;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandResult {
    Generated {
        project: String,
        project_root: String,
        output_dir: String,
        written: Vec<generate::WrittenSummary>,
        #[serde(skip_serializing_if = "Option::is_none")]
        index: Option<String>,
        failures: Vec<generate::FailureSummary>,
    },
    Inspected {
        workflow: WorkflowMetadata,
    },
    Listed {
        project_root: String,
        files: Vec<String>,
    },
    Schema {
        schema: serde_json::Value,
    },
}

impl CommandResult {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            CommandResult::Generated { failures, .. } => {
                if failures.is_empty() {
                    ExitStatus::Ok
                } else {
                    ExitStatus::Data
                }
            }
            _ => ExitStatus::Ok,
        }
    }
}
