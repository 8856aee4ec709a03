use std::path::Path;

use xamldoc::project_relative_path;

use crate::error::{CliError, ExitStatus};

#[derive(Clone, Copy, Debug, Default)]
pub struct Verbosity {
    pub json: bool,
    pub verbose: bool,
}

pub fn validate_jobs(jobs: usize) -> Result<usize, CliError> {
    if jobs == 0 {
        return Err(CliError::new(
            "--jobs must be at least 1",
            ExitStatus::Usage,
        ));
    }
    Ok(jobs)
}

pub fn project_relative(root: &Path, path: &Path) -> String {
    project_relative_path(root, path).unwrap_or_else(|| path.to_string_lossy().into_owned())
}
