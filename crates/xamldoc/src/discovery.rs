use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::XamldocError;
use crate::project::{Project, project_relative_path};

/// Extension of workflow source files.
pub const WORKFLOW_EXTENSION: &str = "xaml";
/// File-name prefix of temporary and backup copies written by the designer.
pub const TEMPORARY_PREFIX: char = '~';

#[derive(Clone, Debug)]
pub struct DiscoveryOptions {
    pub recursive: bool,
    pub include_private: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            include_private: false,
        }
    }
}

/// Lists the workflow files of `project`, sorted by path.
pub fn discover_workflows(
    project: &Project,
    options: &DiscoveryOptions,
) -> Result<Vec<PathBuf>, XamldocError> {
    let root = project.root();
    let walker = WalkBuilder::new(root)
        .max_depth(if options.recursive { None } else { Some(1) })
        .hidden(true)
        .ignore(true)
        .git_ignore(true)
        .build();

    let mut found = Vec::new();
    for result in walker {
        let entry = result.map_err(|err| XamldocError::Io(std::io::Error::other(err)))?;
        let path = entry.path();
        if !entry.file_type().is_some_and(|ft| ft.is_file()) || !is_workflow_file(path) {
            continue;
        }
        if !options.include_private && is_private(project, path) {
            continue;
        }
        found.push(path.to_path_buf());
    }

    found.sort();
    Ok(found)
}

/// True for `*.xaml` files that are not temporary copies.
pub fn is_workflow_file(path: &Path) -> bool {
    let has_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(WORKFLOW_EXTENSION));
    let temporary = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(TEMPORARY_PREFIX));
    has_extension && !temporary
}

fn is_private(project: &Project, path: &Path) -> bool {
    project_relative_path(project.root(), path)
        .is_some_and(|relative| project.config().is_private(&relative))
}
