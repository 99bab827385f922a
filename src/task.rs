//! Per-item conversion task
//!
//! A [`ConversionTask`] walks one batch item through
//! `Pending → Staged → Converting → Completed → Released`. Every failure along the
//! way is captured into the item's [`ConversionResult`]; nothing here returns an
//! error to the orchestrator.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use axum::body::Bytes;

use crate::converter::{ConversionJob, Converter};
use crate::error::{ConversionError, ItemError};
use crate::formats::extension_of;
use crate::temp::{TempResource, TempResourceManager};
use crate::types::{ConversionResult, ConvertedOutput, InputItem, Outcome, TaskState};

/// The unit of work for one batch item
pub struct ConversionTask<'a> {
    item: InputItem,
    output_format: &'a str,
    converter: &'a dyn Converter,
    temp: &'a TempResourceManager,
    timeout: Duration,
    state: TaskState,
}

impl<'a> ConversionTask<'a> {
    /// Create a pending task for `item`
    pub fn new(
        item: InputItem,
        output_format: &'a str,
        converter: &'a dyn Converter,
        temp: &'a TempResourceManager,
        timeout: Duration,
    ) -> Self {
        Self {
            item,
            output_format,
            converter,
            temp,
            timeout,
            state: TaskState::Pending,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Run the task to completion and release its temporary storage
    ///
    /// Always yields exactly one result carrying the item's index.
    pub async fn run(&mut self) -> ConversionResult {
        let started = Instant::now();
        let outcome = self.execute().await;

        match &outcome {
            Outcome::Success(output) => tracing::debug!(
                index = self.item.index,
                name = %self.item.original_name,
                output_bytes = output.bytes.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "item converted"
            ),
            Outcome::Failure(error) => tracing::warn!(
                index = self.item.index,
                name = %self.item.original_name,
                error = %error,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "item failed"
            ),
        }

        ConversionResult {
            index: self.item.index,
            original_name: self.item.original_name.clone(),
            outcome,
        }
    }

    async fn execute(&mut self) -> Outcome {
        if let Some(rejection) = self.item.rejection.clone() {
            self.transition(TaskState::Completed);
            self.transition(TaskState::Released);
            return Outcome::Failure(rejection);
        }

        let resource = match self.temp.acquire().await {
            Ok(resource) => resource,
            Err(e) => {
                self.transition(TaskState::Completed);
                self.transition(TaskState::Released);
                return Outcome::Failure(ItemError::Io(format!(
                    "failed to acquire temporary storage: {e}"
                )));
            }
        };

        let outcome = self.convert_in(&resource).await;
        self.transition(TaskState::Completed);

        // Deletes the staged input and the converter output together
        resource.release().await;
        self.transition(TaskState::Released);

        outcome
    }

    async fn convert_in(&mut self, resource: &TempResource) -> Outcome {
        let extension = extension_of(&self.item.original_name);
        let input = resource.input_path(extension.as_deref());
        if let Err(reason) = stage_input(input.clone(), self.item.content.clone()).await {
            return Outcome::Failure(ItemError::Io(format!("failed to stage input: {reason}")));
        }
        self.transition(TaskState::Staged);

        let output = resource.output_path(self.output_format);
        self.transition(TaskState::Converting);

        let job = ConversionJob {
            index: self.item.index,
            original_name: &self.item.original_name,
            input: &input,
            output: &output,
            output_format: self.output_format,
        };

        match tokio::time::timeout(self.timeout, self.converter.convert(&job)).await {
            Err(_) => {
                return Outcome::Failure(ItemError::Conversion(ConversionError::TimedOut(
                    self.timeout,
                )));
            }
            Ok(Err(e)) => return Outcome::Failure(ItemError::Conversion(e)),
            Ok(Ok(())) => {}
        }

        match tokio::fs::read(&output).await {
            Ok(bytes) => Outcome::Success(ConvertedOutput { bytes }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Outcome::Failure(ItemError::Conversion(ConversionError::MissingOutput(output)))
            }
            Err(e) => Outcome::Failure(ItemError::Io(format!("failed to read output: {e}"))),
        }
    }

    fn transition(&mut self, next: TaskState) {
        tracing::debug!(
            index = self.item.index,
            name = %self.item.original_name,
            from = ?self.state,
            to = ?next,
            "task state transition"
        );
        self.state = next;
    }
}

/// Write the upload to `path` on a blocking thread
///
/// `content` is a refcounted handle, so the upload is never copied in memory.
async fn stage_input(path: PathBuf, content: Bytes) -> Result<(), String> {
    tokio::task::spawn_blocking(move || std::fs::write(&path, &content))
        .await
        .map_err(|e| format!("staging task failed: {e}"))?
        .map_err(|e| e.to_string())
}
