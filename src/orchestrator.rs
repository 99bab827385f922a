//! Fan-out of conversion tasks with a completion barrier
//!
//! One [`Orchestrator::run`] call owns the whole task group of a request: a bounded
//! pool of `min(items, max_concurrent_conversions)` workers, a slot array indexed by
//! batch position, and the barrier that waits for every slot to be written.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::config::ConversionConfig;
use crate::converter::Converter;
use crate::error::{Error, Result};
use crate::task::ConversionTask;
use crate::temp::TempResourceManager;
use crate::types::{BatchRequest, ConversionResult, ResultSet};

/// Runs one [`ConversionTask`] per batch item and collects the results by index
#[derive(Clone)]
pub struct Orchestrator {
    converter: Arc<dyn Converter>,
    temp: TempResourceManager,
    max_concurrent: usize,
    conversion_timeout: Duration,
}

impl Orchestrator {
    /// Create an orchestrator using `converter` and scratch storage from `temp`
    pub fn new(
        converter: Arc<dyn Converter>,
        temp: TempResourceManager,
        config: &ConversionConfig,
    ) -> Self {
        Self {
            converter,
            temp,
            max_concurrent: config.max_concurrent_conversions.max(1),
            conversion_timeout: config.conversion_timeout,
        }
    }

    /// Worker pool size for a batch of `items` items
    pub fn worker_count(&self, items: usize) -> usize {
        items.min(self.max_concurrent).max(1)
    }

    /// Convert every item of `batch`, waiting for all of them to finish
    ///
    /// A failing item never stops its siblings. If `cancel` fires first, every
    /// in-flight conversion is dropped (killing its process and deleting its scratch
    /// directory) and `Error::Cancelled` is returned.
    pub async fn run(&self, batch: BatchRequest, cancel: &CancellationToken) -> Result<ResultSet> {
        let total = batch.len();
        let workers = self.worker_count(total);
        let started = Instant::now();
        tracing::info!(
            items = total,
            workers,
            output_format = %batch.output_format,
            "dispatching conversion tasks"
        );

        let collect = async move {
            let BatchRequest {
                items,
                output_format,
            } = batch;
            let mut slots: Vec<Option<ConversionResult>> = (0..total).map(|_| None).collect();

            let mut results = stream::iter(items)
                .map(|item| {
                    let mut task = ConversionTask::new(
                        item,
                        &output_format,
                        self.converter.as_ref(),
                        &self.temp,
                        self.conversion_timeout,
                    );
                    async move { task.run().await }
                })
                .buffer_unordered(workers);

            while let Some(result) = results.next().await {
                let index = result.index;
                match slots.get_mut(index) {
                    Some(slot) if slot.is_none() => *slot = Some(result),
                    Some(_) => {
                        return Err(Error::Other(format!(
                            "duplicate result for index {index}"
                        )));
                    }
                    None => {
                        return Err(Error::Other(format!(
                            "result index {index} outside batch of {total}"
                        )));
                    }
                }
            }
            Ok(slots)
        };

        // Cancelling drops `collect`, and with it every in-flight task
        let slots = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!(
                    items = total,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "batch cancelled, in-flight conversions terminated"
                );
                return Err(Error::Cancelled(
                    "request cancelled before all conversions finished".into(),
                ));
            }
            slots = collect => slots?,
        };

        let results = ResultSet::from_slots(slots)?;
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        tracing::info!(
            items = total,
            succeeded,
            failed = total - succeeded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "all conversion tasks completed"
        );
        Ok(results)
    }
}
