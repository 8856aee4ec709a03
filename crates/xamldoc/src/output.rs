use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::XamldocError;
use crate::render::RenderedDocument;

/// A validated target directory for generated documentation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputDirectory {
    path: PathBuf,
}

impl OutputDirectory {
    /// Creates `path` when missing. An existing directory must be empty unless `force`
    /// is set.
    pub fn prepare(path: impl Into<PathBuf>, force: bool) -> Result<Self, XamldocError> {
        let path = path.into();
        if path.exists() {
            if !path.is_dir() {
                return Err(XamldocError::Output(format!(
                    "{} exists and is not a directory",
                    path.display()
                )));
            }
            if !force && fs::read_dir(&path)?.next().is_some() {
                return Err(XamldocError::Output(format!(
                    "{} is not empty; pass --force to write into it anyway",
                    path.display()
                )));
            }
        } else {
            fs::create_dir_all(&path)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Result of writing one document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrittenDocument {
    pub source: PathBuf,
    pub path: PathBuf,
}

/// Writes rendered documents into an [`OutputDirectory`].
///
/// Each output file name can be claimed once per writer; a second claim fails instead
/// of silently overwriting another workflow's page. Safe to share across threads.
pub struct DocumentWriter {
    directory: OutputDirectory,
    claimed: Mutex<BTreeMap<String, PathBuf>>,
}

impl DocumentWriter {
    pub fn new(directory: OutputDirectory) -> Self {
        Self {
            directory,
            claimed: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn directory(&self) -> &OutputDirectory {
        &self.directory
    }

    pub fn write(
        &self,
        source: &Path,
        rendered: &RenderedDocument,
    ) -> Result<WrittenDocument, XamldocError> {
        ensure_safe_name(&rendered.file_name)?;
        self.claim(&rendered.file_name, source)?;

        let target = self.directory.path().join(&rendered.file_name);
        fs::write(&target, &rendered.body)?;
        Ok(WrittenDocument {
            source: source.to_path_buf(),
            path: target,
        })
    }

    /// Claims `file_name` for a document written later with [`Self::write_named`], so
    /// no workflow page can take it first.
    pub fn reserve(&self, file_name: &str) -> Result<(), XamldocError> {
        ensure_safe_name(file_name)?;
        self.claim(file_name, self.directory.path())
    }

    /// Writes a document that is not tied to a workflow source, such as the index.
    pub fn write_named(&self, file_name: &str, body: &str) -> Result<PathBuf, XamldocError> {
        ensure_safe_name(file_name)?;
        self.claim(file_name, self.directory.path())?;
        let target = self.directory.path().join(file_name);
        fs::write(&target, body)?;
        Ok(target)
    }

    fn claim(&self, file_name: &str, source: &Path) -> Result<(), XamldocError> {
        let mut claimed = self.claimed.lock();
        if let Some(previous) = claimed.get(file_name) {
            if previous == source {
                return Ok(());
            }
            return Err(XamldocError::Output(format!(
                "{file_name} would be written for both {} and {}",
                previous.display(),
                source.display()
            )));
        }
        claimed.insert(file_name.to_string(), source.to_path_buf());
        Ok(())
    }
}

fn ensure_safe_name(name: &str) -> Result<(), XamldocError> {
    if name.is_empty() {
        return Err(XamldocError::Output(
            "output file name must not be empty".into(),
        ));
    }

    if name.contains('/') || name.contains('\\') || name == ".." {
        return Err(XamldocError::Output(format!(
            "output file name '{name}' must not contain path separators"
        )));
    }

    Ok(())
}
