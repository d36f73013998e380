//! Write-then-rename output staging
//!
//! Files are written into a hidden temporary directory next to the final
//! destination and moved into place by [`StagingDir::commit`]. Dropping an
//! uncommitted stage removes everything written so far.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use shapecad_core::error::{Result, ShapecadError};

pub struct StagingDir {
    temp: TempDir,
    target_dir: PathBuf,
    staged: Vec<String>,
}

impl StagingDir {
    /// Create a stage for files that will land in the directory of `output_path`
    pub fn for_output(output_path: &Path) -> Result<Self> {
        let target_dir = match output_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !target_dir.is_dir() {
            return Err(ShapecadError::write_failed(
                output_path,
                format!("directory {} does not exist", target_dir.display()),
            ));
        }

        let temp = tempfile::Builder::new()
            .prefix(".shapecad-")
            .tempdir_in(&target_dir)
            .map_err(|e| ShapecadError::write_failed(output_path, e.to_string()))?;

        Ok(Self { temp, target_dir, staged: Vec::new() })
    }

    /// Temporary path for a file named `file_name`; registers it for commit
    pub fn stage(&mut self, file_name: &str) -> PathBuf {
        if !self.staged.iter().any(|s| s == file_name) {
            self.staged.push(file_name.to_string());
        }
        self.temp.path().join(file_name)
    }

    /// Final location of a staged file name
    pub fn final_path(&self, file_name: &str) -> PathBuf {
        self.target_dir.join(file_name)
    }

    /// Move every staged file that was actually written into place
    pub fn commit(self) -> Result<Vec<PathBuf>> {
        let mut committed = Vec::new();
        for name in &self.staged {
            let from = self.temp.path().join(name);
            if !from.exists() {
                continue;
            }
            let to = self.target_dir.join(name);
            fs::rename(&from, &to).map_err(|e| ShapecadError::write_failed(&to, e.to_string()))?;
            committed.push(to);
        }
        tracing::debug!(files = committed.len(), "Committed staged output");
        Ok(committed)
    }
}

/// File name component of a path, as UTF-8
pub fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| ShapecadError::write_failed(path, "output path has no file name"))
}
