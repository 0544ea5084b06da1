use crate::extract::extract_url;
use rosetta_common::Result;
use std::path::{Path, PathBuf};

/// A source file and its full text.
#[derive(Debug, Clone)]
pub struct CodeEntry {
    pub path: PathBuf,
    pub code: String,
}

impl CodeEntry {
    /// Read `path` into memory. Missing or unreadable files are `RobotError::Io`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let code = std::fs::read_to_string(&path)?;
        tracing::debug!(path = %path.display(), bytes = code.len(), "source.loaded");
        Ok(Self { path, code })
    }

    /// The task URL embedded in this file's comments, if any.
    pub fn extract_url(&self) -> Option<String> {
        extract_url(&self.code)
    }
}
