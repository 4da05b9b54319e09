//! Handing finished artifacts to the outside world.
//!
//! The presentation layer picks an [`Artifact`] and passes its text and file
//! name to an [`ArtifactSink`]. [`FileSink`] writes into a directory, the
//! terminal equivalent of a browser download.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::job::JobSnapshot;

/// Which of the two generated files to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Artifact {
    /// `llms.txt`
    Summary,
    /// `llms-full.txt`
    Full,
}

impl Artifact {
    pub const ALL: [Artifact; 2] = [Artifact::Summary, Artifact::Full];

    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::Summary => "llms.txt",
            Artifact::Full => "llms-full.txt",
        }
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Receives exported text under a file name.
pub trait ArtifactSink {
    /// Delivers `contents` named `file_name`, returning where it ended up.
    fn deliver(&self, contents: &str, file_name: &str) -> Result<PathBuf, ExportError>;
}

/// Exports the selected artifact of a completed job through `sink`.
pub fn export_artifact(
    snapshot: &JobSnapshot,
    artifact: Artifact,
    sink: &dyn ArtifactSink,
) -> Result<PathBuf, ExportError> {
    let result = snapshot.result.as_ref().ok_or(ExportError::NoResult)?;
    sink.deliver(result.artifact(artifact), artifact.file_name())
}

/// Writes artifacts as files inside a directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    directory: PathBuf,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }
}

impl ArtifactSink for FileSink {
    fn deliver(&self, contents: &str, file_name: &str) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.directory).map_err(|e| ExportError::CreateDirectory {
            path: self.directory.clone(),
            source: e,
        })?;

        let path = self.directory.join(file_name);
        fs::write(&path, contents).map_err(|e| ExportError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        log::info!("Wrote {} ({} bytes)", path.display(), contents.len());
        Ok(path)
    }
}
