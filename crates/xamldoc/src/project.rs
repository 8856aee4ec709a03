use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use semver::Version;
use serde::Deserialize;

use crate::error::XamldocError;

/// File name of the project configuration that marks a project root.
pub const PROJECT_FILE: &str = "project.json";

/// Subset of `project.json` consumed by documentation generation. Unknown fields are
/// ignored.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub name: Option<String>,
    pub description: Option<String>,
    pub main: Option<String>,
    pub project_version: Option<String>,
    #[serde(default)]
    pub design_options: DesignOptions,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignOptions {
    #[serde(default)]
    pub library_options: LibraryOptions,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryOptions {
    #[serde(default)]
    pub private_workflows: Vec<String>,
}

impl ProjectConfig {
    pub fn parse(raw: &str) -> Result<Self, XamldocError> {
        let stripped = raw.trim_start_matches('\u{feff}');
        serde_json::from_str(stripped).map_err(|err| XamldocError::Project(err.to_string()))
    }

    /// Semantic version of the project, when `projectVersion` is present and valid.
    pub fn version(&self) -> Option<Version> {
        self.project_version
            .as_deref()
            .and_then(|raw| Version::parse(raw.trim()).ok())
    }

    /// Normalized (`/`-separated) project-relative paths of private workflows.
    pub fn private_workflows(&self) -> BTreeSet<String> {
        self.design_options
            .library_options
            .private_workflows
            .iter()
            .map(|entry| normalize_relative(entry))
            .collect()
    }

    pub fn is_private(&self, relative: &str) -> bool {
        let relative = normalize_relative(relative);
        self.private_workflows().contains(&relative)
    }

    /// Normalized path of the `main` entry point, if any.
    pub fn main_workflow(&self) -> Option<String> {
        self.main.as_deref().map(normalize_relative)
    }
}

/// Resolved project root plus its configuration.
#[derive(Clone, Debug)]
pub struct Project {
    root: PathBuf,
    config: ProjectConfig,
    has_config: bool,
}

impl Project {
    pub fn new(root: PathBuf, config: Option<ProjectConfig>) -> Self {
        Self {
            root,
            has_config: config.is_some(),
            config: config.unwrap_or_default(),
        }
    }

    /// Loads the project rooted at `root`, reading `project.json` when present.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, XamldocError> {
        let root = fs::canonicalize(root.as_ref())?;
        let config_path = root.join(PROJECT_FILE);
        let config = if config_path.is_file() {
            let raw = fs::read_to_string(&config_path)?;
            Some(ProjectConfig::parse(&raw).map_err(|err| err.context(config_path.display()))?)
        } else {
            None
        };
        Ok(Self::new(root, config))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Whether the root was identified by a `project.json` rather than by fallback.
    pub fn has_config(&self) -> bool {
        self.has_config
    }

    /// Display name: configured name, else the root folder name.
    pub fn display_name(&self) -> String {
        self.config
            .name
            .clone()
            .or_else(|| {
                self.root
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "Workflows".to_string())
    }
}

/// Finds the project governing `start`: the nearest ancestor containing
/// `project.json`, or the start directory itself when there is none.
pub fn discover(start: impl AsRef<Path>) -> Result<Project, XamldocError> {
    let canonical_start = normalize_start(start.as_ref())?;

    for ancestor in canonical_start.ancestors() {
        if ancestor.join(PROJECT_FILE).is_file() {
            return Project::open(ancestor);
        }
    }

    Ok(Project::new(canonical_start, None))
}

fn normalize_start(start: &Path) -> Result<PathBuf, XamldocError> {
    let mut cursor = start.to_path_buf();

    if !cursor.exists() {
        return Err(XamldocError::Project(format!(
            "start path {} does not exist",
            start.display()
        )));
    }

    if cursor.is_file() {
        cursor = cursor.parent().map(Path::to_path_buf).ok_or_else(|| {
            XamldocError::Project(format!(
                "file path {} has no parent directory",
                start.display()
            ))
        })?;
        if cursor.as_os_str().is_empty() {
            cursor = PathBuf::from(".");
        }
    }

    if !cursor.is_dir() {
        return Err(XamldocError::Project(format!(
            "start path {} is not a directory",
            cursor.display()
        )));
    }

    Ok(fs::canonicalize(cursor)?)
}

/// `/`-separated path of `path` relative to `root`, or `None` outside the root.
pub fn project_relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    Some(relative.to_string_lossy().replace('\\', "/"))
}

fn normalize_relative(raw: &str) -> String {
    raw.trim()
        .replace('\\', "/")
        .trim_start_matches("./")
        .trim_start_matches('/')
        .to_string()
}
