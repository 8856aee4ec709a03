use std::path::{Path, PathBuf};
use std::thread;

use crate::discovery::{DiscoveryOptions, discover_workflows};
use crate::error::XamldocError;
use crate::extractor::DocumentExtractor;
use crate::output::{DocumentWriter, OutputDirectory, WrittenDocument};
use crate::project::{self, Project, project_relative_path};
use crate::render::{INDEX_FILE, IndexEntry, MarkdownRenderer, index_entry};

/// What to do when a single workflow cannot be documented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop and return the first failure.
    #[default]
    Abort,
    /// Record the failure in the report and keep going.
    Continue,
}

#[derive(Clone, Debug)]
pub struct GenerationRequest {
    /// Project root, or any path inside the project.
    pub project_path: PathBuf,
    pub output_dir: PathBuf,
    pub discovery: DiscoveryOptions,
    pub force: bool,
    pub jobs: usize,
    pub failure_policy: FailurePolicy,
    pub template: Option<PathBuf>,
    pub write_index: bool,
}

impl GenerationRequest {
    pub fn new(project_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            output_dir: output_dir.into(),
            discovery: DiscoveryOptions::default(),
            force: false,
            jobs: 1,
            failure_policy: FailurePolicy::Abort,
            template: None,
            write_index: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GenerationFailure {
    pub path: PathBuf,
    pub message: String,
    pub malformed: bool,
}

#[derive(Clone, Debug)]
pub struct GenerationReport {
    pub project_root: PathBuf,
    pub project_name: String,
    pub output_dir: PathBuf,
    pub written: Vec<WrittenDocument>,
    pub index: Option<PathBuf>,
    pub failures: Vec<GenerationFailure>,
}

impl GenerationReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Discovers, extracts, renders and writes documentation for a whole project.
pub fn generate(request: &GenerationRequest) -> Result<GenerationReport, XamldocError> {
    let project = project::discover(&request.project_path)?;
    let files = discover_workflows(&project, &request.discovery)?;

    let renderer = match &request.template {
        Some(path) => MarkdownRenderer::new().with_workflow_template_file(path)?,
        None => MarkdownRenderer::new(),
    };
    let writer = DocumentWriter::new(OutputDirectory::prepare(
        &request.output_dir,
        request.force,
    )?);
    if request.write_index {
        writer.reserve(INDEX_FILE)?;
    }
    let extractor = DocumentExtractor::new();

    let pipeline = Pipeline {
        project: &project,
        extractor: &extractor,
        renderer: &renderer,
        writer: &writer,
    };
    let outcomes = run_all(&files, request.jobs, request.failure_policy, |path| {
        pipeline.document(path)
    });

    let mut written = Vec::new();
    let mut entries = Vec::new();
    let mut failures = Vec::new();
    for (path, outcome) in outcomes {
        match outcome {
            Ok((document, entry)) => {
                written.push(document);
                entries.push(entry);
            }
            Err(err) => match request.failure_policy {
                FailurePolicy::Abort => return Err(err.context(path.display())),
                FailurePolicy::Continue => failures.push(GenerationFailure {
                    malformed: err.is_malformed_document(),
                    message: err.to_string(),
                    path,
                }),
            },
        }
    }

    let index = if request.write_index {
        let body = renderer.render_index(&project, &entries)?;
        Some(writer.write_named(INDEX_FILE, &body)?)
    } else {
        None
    };

    Ok(GenerationReport {
        project_root: project.root().to_path_buf(),
        project_name: project.display_name(),
        output_dir: writer.directory().path().to_path_buf(),
        written,
        index,
        failures,
    })
}

struct Pipeline<'a> {
    project: &'a Project,
    extractor: &'a DocumentExtractor,
    renderer: &'a MarkdownRenderer,
    writer: &'a DocumentWriter,
}

impl Pipeline<'_> {
    fn document(&self, path: &Path) -> Result<(WrittenDocument, IndexEntry), XamldocError> {
        let mut metadata = self.extractor.extract_file(path)?;
        if let Some(relative) = project_relative_path(self.project.root(), path) {
            metadata.set_relative_path(relative);
        }
        let rendered = self.renderer.render_workflow(&metadata)?;
        let entry = index_entry(&metadata, &rendered, self.project)?;
        let document = self.writer.write(path, &rendered)?;
        Ok((document, entry))
    }
}

type Outcome<T> = (PathBuf, Result<T, XamldocError>);

/// Runs `job` for every file, preserving input order in the output. With a single job
/// and [`FailurePolicy::Abort`] processing stops at the first failure.
fn run_all<T, F>(files: &[PathBuf], jobs: usize, policy: FailurePolicy, job: F) -> Vec<Outcome<T>>
where
    T: Send,
    F: Fn(&Path) -> Result<T, XamldocError> + Sync,
{
    let jobs = jobs.clamp(1, files.len().max(1));
    if jobs == 1 {
        let mut outcomes = Vec::with_capacity(files.len());
        for path in files {
            let result = job(path);
            let failed = result.is_err();
            outcomes.push((path.clone(), result));
            if failed && policy == FailurePolicy::Abort {
                break;
            }
        }
        return outcomes;
    }

    let chunk_size = files.len().div_ceil(jobs);
    thread::scope(|scope| {
        let handles: Vec<_> = files
            .chunks(chunk_size)
            .map(|chunk| {
                let job = &job;
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|path| (path.clone(), job(path)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    fn fail_on_b(path: &Path) -> Result<String, XamldocError> {
        if path == Path::new("b") {
            Err(XamldocError::Usage("boom".into()))
        } else {
            Ok(path.display().to_string())
        }
    }

    #[test]
    fn sequential_abort_stops_at_first_failure() {
        let outcomes = run_all(&paths(&["a", "b", "c"]), 1, FailurePolicy::Abort, fail_on_b);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[1].1.is_err());
    }

    #[test]
    fn continue_policy_processes_everything() {
        let outcomes = run_all(
            &paths(&["a", "b", "c"]),
            1,
            FailurePolicy::Continue,
            fail_on_b,
        );
        assert_eq!(outcomes.len(), 3);
    }

    #[test]
    fn parallel_run_preserves_order() {
        let files = paths(&["a", "b", "c", "d", "e", "f", "g"]);
        let outcomes = run_all(&files, 3, FailurePolicy::Continue, fail_on_b);
        let order: Vec<_> = outcomes.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(order, files);
        assert!(outcomes[1].1.is_err());
        assert_eq!(outcomes[6].1.as_deref().unwrap(), "g");
    }

    #[test]
    fn empty_input_yields_no_outcomes() {
        let outcomes = run_all(&[], 4, FailurePolicy::Abort, fail_on_b);
        assert!(outcomes.is_empty());
    }
}
