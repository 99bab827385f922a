//! In-process converter double
//!
//! [`FakeConverter`] writes a deterministic "converted" file without spawning any
//! process. Behaviour is scripted per original file name, and every invocation is
//! recorded so tests can assert on argument vectors, call counts, and the peak
//! number of conversions that ran at once.
//!
//! This module is public on purpose: it lets code embedding [`ConversionService`]
//! test its own request handling without ImageMagick installed, and the crate's
//! integration tests use it through the public API. It never runs unless a caller
//! passes it to [`ConversionService::with_converter`]; [`ConversionService::new`]
//! only ever selects the process-backed or unavailable converter.
//!
//! ```
//! use batchconv::converter::FakeConverter;
//! use batchconv::{Config, ConversionService};
//! use std::sync::Arc;
//!
//! let converter = FakeConverter::new().with_failure("broken.png", "corrupt header");
//! let service = ConversionService::with_converter(Config::default(), Arc::new(converter))?;
//! assert_eq!(service.capabilities().converter, "fake");
//! # Ok::<(), batchconv::Error>(())
//! ```
//!
//! [`ConversionService`]: crate::ConversionService
//! [`ConversionService::with_converter`]: crate::ConversionService::with_converter
//! [`ConversionService::new`]: crate::ConversionService::new

use super::{ConversionJob, Converter};
use crate::error::ConversionError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::ffi::OsString;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted behaviour for one original file name
#[derive(Clone, Debug, Default)]
pub struct FakeBehavior {
    /// Sleep before producing the result
    pub delay: Option<Duration>,
    /// Fail with this message instead of writing output
    pub fail: Option<String>,
    /// Report success without writing an output file
    pub skip_output: bool,
}

/// One recorded call to [`FakeConverter::convert`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    /// Batch index of the item
    pub index: usize,
    /// Original file name of the item
    pub original_name: String,
    /// Target format
    pub output_format: String,
    /// Argument vector a process converter would have received
    pub args: Vec<OsString>,
}

#[derive(Default)]
struct Shared {
    behaviors: Mutex<HashMap<String, FakeBehavior>>,
    default_delay: Mutex<Option<Duration>>,
    invocations: Mutex<Vec<Invocation>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// Converter double with scripted per-file delays and failures
///
/// The converted output is [`FakeConverter::MARKER`] followed by the output format
/// and the input bytes, which makes converted content easy to recognise in tests.
/// Clones share state.
#[derive(Clone, Default)]
pub struct FakeConverter {
    shared: Arc<Shared>,
}

impl FakeConverter {
    /// Prefix of every file this converter writes
    pub const MARKER: &'static [u8] = b"converted:";

    /// Create a converter that succeeds immediately for every file
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every conversion that has no scripted delay of its own
    pub fn with_default_delay(self, delay: Duration) -> Self {
        *lock(&self.shared.default_delay) = Some(delay);
        self
    }

    /// Script the behaviour for one original file name
    pub fn with_behavior(self, original_name: impl Into<String>, behavior: FakeBehavior) -> Self {
        lock(&self.shared.behaviors).insert(original_name.into(), behavior);
        self
    }

    /// Delay the conversion of one file
    pub fn with_delay(self, original_name: impl Into<String>, delay: Duration) -> Self {
        self.with_behavior(
            original_name,
            FakeBehavior {
                delay: Some(delay),
                ..FakeBehavior::default()
            },
        )
    }

    /// Fail the conversion of one file
    pub fn with_failure(self, original_name: impl Into<String>, message: impl Into<String>) -> Self {
        self.with_behavior(
            original_name,
            FakeBehavior {
                fail: Some(message.into()),
                ..FakeBehavior::default()
            },
        )
    }

    /// Expected output for `input` converted to `output_format`
    pub fn expected_output(input: &[u8], output_format: &str) -> Vec<u8> {
        let mut bytes = Self::MARKER.to_vec();
        bytes.extend_from_slice(output_format.as_bytes());
        bytes.push(b'\n');
        bytes.extend_from_slice(input);
        bytes
    }

    /// Recorded invocations, in call order
    pub fn invocations(&self) -> Vec<Invocation> {
        lock(&self.shared.invocations).clone()
    }

    /// Number of times `convert` was called
    pub fn invocation_count(&self) -> usize {
        lock(&self.shared.invocations).len()
    }

    /// Highest number of conversions observed running at once
    pub fn peak_concurrency(&self) -> usize {
        self.shared.peak.load(Ordering::SeqCst)
    }

    /// Conversions currently running
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    fn behavior_for(&self, original_name: &str) -> FakeBehavior {
        let mut behavior = lock(&self.shared.behaviors)
            .get(original_name)
            .cloned()
            .unwrap_or_default();
        if behavior.delay.is_none() {
            behavior.delay = *lock(&self.shared.default_delay);
        }
        behavior
    }
}

// A poisoned lock only means another test thread panicked; the data is still usable.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Decrements the in-flight counter even when the conversion future is dropped
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Converter for FakeConverter {
    async fn convert(&self, job: &ConversionJob<'_>) -> Result<(), ConversionError> {
        lock(&self.shared.invocations).push(Invocation {
            index: job.index,
            original_name: job.original_name.to_string(),
            output_format: job.output_format.to_string(),
            args: job.args(),
        });

        let now = self.shared.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.shared.in_flight);

        let behavior = self.behavior_for(job.original_name);
        if let Some(delay) = behavior.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = behavior.fail {
            return Err(ConversionError::Failed(message));
        }
        if behavior.skip_output {
            return Ok(());
        }

        let input = tokio::fs::read(job.input)
            .await
            .map_err(|e| ConversionError::Failed(format!("cannot read input: {e}")))?;
        tokio::fs::write(job.output, Self::expected_output(&input, job.output_format))
            .await
            .map_err(|e| ConversionError::Failed(format!("cannot write output: {e}")))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
