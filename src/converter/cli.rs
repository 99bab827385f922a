//! CLI-based converter using the external ImageMagick binary

use super::{ConversionJob, Converter};
use crate::error::ConversionError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Longest stderr excerpt kept in an error
const MAX_STDERR_CHARS: usize = 512;

/// CLI-based converter using the external ImageMagick binary
///
/// Each conversion spawns one child process. The child is killed when the
/// conversion future is dropped, so timeouts and request cancellation never leave
/// a converter process behind.
///
/// # Examples
///
/// ```no_run
/// use batchconv::converter::CliConverter;
/// use std::path::PathBuf;
///
/// // Create with explicit path
/// let converter = CliConverter::new(PathBuf::from("/usr/bin/magick"));
///
/// // Or auto-discover from PATH
/// let converter = CliConverter::from_path().expect("ImageMagick not found in PATH");
/// ```
pub struct CliConverter {
    binary_path: PathBuf,
}

impl CliConverter {
    /// Create a new CLI converter with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find ImageMagick in PATH
    ///
    /// Prefers the `magick` entry point (ImageMagick 7) and falls back to the
    /// legacy `convert` binary.
    pub fn from_path() -> Option<Self> {
        which::which("magick")
            .or_else(|_| which::which("convert"))
            .ok()
            .map(Self::new)
    }

    /// Binary this converter invokes
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

#[async_trait]
impl Converter for CliConverter {
    async fn convert(&self, job: &ConversionJob<'_>) -> Result<(), ConversionError> {
        let tool = self.binary_path.display().to_string();
        tracing::debug!(
            index = job.index,
            name = job.original_name,
            tool = %tool,
            args = ?job.args(),
            "invoking converter"
        );

        let output = Command::new(&self.binary_path)
            .args(job.args())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ConversionError::Spawn {
                tool: tool.clone(),
                reason: e.to_string(),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr: String = stderr.trim().chars().take(MAX_STDERR_CHARS).collect();
        Err(ConversionError::ExitStatus {
            code: output.status.code(),
            stderr,
        })
    }

    fn name(&self) -> &'static str {
        "imagemagick-cli"
    }
}
