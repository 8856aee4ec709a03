use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use handlebars::Handlebars;
use markdown::{Constructs, ParseOptions};
use regex::Regex;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use crate::error::XamldocError;
use crate::model::WorkflowMetadata;
use crate::project::Project;

const WORKFLOW_TEMPLATE: &str = include_str!("../templates/workflow.md.hbs");
const INDEX_TEMPLATE: &str = include_str!("../templates/index.md.hbs");

/// File name of the generated index document.
pub const INDEX_FILE: &str = "README.md";
const FALLBACK_STEM: &str = "workflow";

/// A rendered workflow page and the file name it should be written to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedDocument {
    pub file_name: String,
    pub body: String,
}

/// One row of the index document.
#[derive(Clone, Debug, Serialize)]
pub struct IndexEntry {
    pub name: String,
    pub link: String,
    pub source: String,
    pub summary: String,
    pub main: bool,
}

#[derive(Serialize)]
struct FrontMatter<'a> {
    name: &'a str,
    source: &'a str,
    arguments: usize,
}

#[derive(Serialize)]
struct WorkflowContext {
    name: String,
    description: String,
    arguments: Vec<ArgumentRow>,
}

#[derive(Serialize)]
struct ArgumentRow {
    name: String,
    direction: String,
    type_name: String,
    default_value: String,
    description: String,
}

#[derive(Serialize)]
struct IndexContext<'a> {
    project_name: String,
    version: Option<String>,
    description: String,
    workflows: &'a [IndexEntry],
}

/// Markdown renderer backed by Handlebars with HTML escaping disabled.
pub struct MarkdownRenderer {
    registry: Handlebars<'static>,
    workflow_template: String,
    index_template: String,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        Self {
            registry,
            workflow_template: WORKFLOW_TEMPLATE.to_string(),
            index_template: INDEX_TEMPLATE.to_string(),
        }
    }

    /// Replaces the built-in workflow page template.
    pub fn with_workflow_template(mut self, template: impl Into<String>) -> Self {
        self.workflow_template = template.into();
        self
    }

    pub fn with_workflow_template_file(self, path: &Path) -> Result<Self, XamldocError> {
        let raw = fs::read_to_string(path)
            .map_err(|err| XamldocError::Template(format!("{}: {err}", path.display())))?;
        Ok(self.with_workflow_template(raw))
    }

    /// Renders YAML front matter plus the workflow page body.
    pub fn render_workflow(
        &self,
        metadata: &WorkflowMetadata,
    ) -> Result<RenderedDocument, XamldocError> {
        let name = metadata.name()?;
        let description = metadata.description()?;
        let source = display_source(metadata);

        let front_matter = serde_yaml::to_string(&FrontMatter {
            name,
            source: &source,
            arguments: metadata.arguments().len(),
        })?;

        let context = WorkflowContext {
            name: name.to_string(),
            description: description.trim().to_string(),
            arguments: metadata
                .arguments()
                .iter()
                .map(|argument| ArgumentRow {
                    name: escape_cell(argument.name()),
                    direction: argument.direction().to_string(),
                    type_name: escape_cell(argument.type_name()),
                    default_value: escape_cell(argument.default_value()),
                    description: escape_cell(argument.annotation()),
                })
                .collect(),
        };

        let page = self.render(&self.workflow_template, &context)?;
        Ok(RenderedDocument {
            file_name: output_file_name(metadata)?,
            body: format!("---\n{front_matter}---\n\n{page}"),
        })
    }

    /// Renders the index page linking every documented workflow.
    pub fn render_index(
        &self,
        project: &Project,
        entries: &[IndexEntry],
    ) -> Result<String, XamldocError> {
        let config = project.config();
        let context = IndexContext {
            project_name: project.display_name(),
            version: config.version().map(|v| v.to_string()),
            description: config.description.clone().unwrap_or_default(),
            workflows: entries,
        };
        self.render(&self.index_template, &context)
    }

    fn render<T: Serialize>(&self, template: &str, context: &T) -> Result<String, XamldocError> {
        let body = self
            .registry
            .render_template(template, context)
            .map_err(|e| XamldocError::Template(e.to_string()))?;
        validate_markdown(&body)?;
        Ok(body)
    }
}

/// Builds the index row for a rendered workflow.
pub fn index_entry(
    metadata: &WorkflowMetadata,
    rendered: &RenderedDocument,
    project: &Project,
) -> Result<IndexEntry, XamldocError> {
    let source = display_source(metadata);
    let main = project
        .config()
        .main_workflow()
        .is_some_and(|main| metadata.relative_path().is_some() && main == source);
    Ok(IndexEntry {
        name: escape_link_text(metadata.name()?),
        link: rendered.file_name.clone(),
        source: escape_cell(&source),
        summary: escape_cell(
            metadata
                .description()?
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .unwrap_or_default(),
        ),
        main,
    })
}

/// Output file name for a workflow page.
///
/// Prefers the project-relative path with separators flattened to `_`, so workflows
/// sharing a display name in different folders do not collide. Falls back to the
/// workflow name.
pub fn output_file_name(metadata: &WorkflowMetadata) -> Result<String, XamldocError> {
    let stem = match metadata.relative_path() {
        Some(relative) => flatten_relative(relative),
        None => metadata.name()?.to_string(),
    };
    Ok(format!("{}.md", sanitize_stem(&stem)))
}

fn flatten_relative(relative: &Path) -> String {
    let without_extension: PathBuf = relative.with_extension("");
    without_extension
        .to_string_lossy()
        .replace(['/', '\\'], "_")
}

fn sanitize_stem(raw: &str) -> String {
    static RESERVED: OnceLock<Regex> = OnceLock::new();
    let re = RESERVED
        .get_or_init(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).expect("Invalid regex"));

    let normalized: String = raw.nfc().collect();
    let replaced = re.replace_all(&normalized, "_");
    let trimmed = replaced.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

fn display_source(metadata: &WorkflowMetadata) -> String {
    match metadata.relative_path() {
        Some(relative) => relative.to_string_lossy().replace('\\', "/"),
        None => metadata.source_path().display().to_string(),
    }
}

/// Makes text safe for a single Markdown table cell.
pub fn escape_cell(value: &str) -> String {
    value
        .trim()
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace(['\n', '\r'], "<br>")
}

/// Cell escaping plus the brackets that would end a link label early.
pub fn escape_link_text(value: &str) -> String {
    escape_cell(value).replace('[', "\\[").replace(']', "\\]")
}

fn validate_markdown(body: &str) -> Result<(), XamldocError> {
    let options = ParseOptions {
        constructs: Constructs {
            frontmatter: true,
            ..Constructs::gfm()
        },
        ..ParseOptions::gfm()
    };
    markdown::to_mdast(body, &options)
        .map(|_| ())
        .map_err(|e| XamldocError::Template(format!("rendered markdown is invalid: {e}")))
}
