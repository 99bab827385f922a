//! Per-task temporary storage
//!
//! Every conversion task stages its input and receives the converter's output in
//! a private directory. The directory is deleted by [`TempResource::release`] on
//! normal exit paths and by `Drop` when the owning future is cancelled or panics,
//! so no scratch file outlives its task.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Prefix of every scratch directory created by the manager
pub const TEMP_PREFIX: &str = "batchconv-";

/// Creates uniquely named scratch directories under a common root
#[derive(Clone, Debug)]
pub struct TempResourceManager {
    root: PathBuf,
}

impl TempResourceManager {
    /// Create a manager rooted at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Create a manager rooted at the configured directory, or the system temp dir
    pub fn from_config(temp_dir: Option<&Path>) -> Result<Self> {
        match temp_dir {
            Some(dir) => Self::new(dir),
            None => Self::new(std::env::temp_dir()),
        }
    }

    /// Root directory under which scratch directories are created
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Acquire an empty scratch directory with a random, unique name
    pub async fn acquire(&self) -> Result<TempResource> {
        let root = self.root.clone();
        let dir = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new().prefix(TEMP_PREFIX).tempdir_in(root)
        })
        .await
        .map_err(|e| std::io::Error::other(format!("temp dir task failed: {e}")))??;

        debug!(path = ?dir.path(), "acquired temp resource");
        Ok(TempResource { dir: Some(dir) })
    }
}

/// Scratch directory owned by exactly one conversion task
#[derive(Debug)]
pub struct TempResource {
    dir: Option<TempDir>,
}

impl TempResource {
    /// Directory backing this resource
    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }

    /// Path for the staged input, keeping the original extension
    pub fn input_path(&self, extension: Option<&str>) -> PathBuf {
        self.path()
            .join(format!("input{}", extension.unwrap_or_default()))
    }

    /// Path the converter writes its output to
    pub fn output_path(&self, output_format: &str) -> PathBuf {
        self.path().join(format!("output{output_format}"))
    }

    /// Delete the directory and everything in it
    ///
    /// Deletion errors are logged, not returned: the task outcome is already final.
    pub async fn release(mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        let path = dir.path().to_path_buf();
        let result = tokio::task::spawn_blocking(move || dir.close()).await;
        match result {
            Ok(Ok(())) => debug!(?path, "released temp resource"),
            Ok(Err(e)) => warn!(?path, error = %e, "failed to delete temp resource"),
            Err(e) => warn!(?path, error = %e, "temp resource cleanup task failed"),
        }
    }
}
