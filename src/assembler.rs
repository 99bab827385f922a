//! Response shaping from an ordered result set

use crate::archive::{ARCHIVE_FILE_NAME, ArchiveBuilder};
use crate::error::{Error, Result};
use crate::formats::{content_type_for, target_name};
use crate::types::{ConversionResponse, ConversionResult, FailedItem, Outcome, ResultSet};

/// Turns the results of a batch into the response body
///
/// - one item: its converted bytes, or its failure as the request error
/// - several items: a ZIP of every success in index order; failures are listed in
///   a manifest entry, and a batch where nothing converted is an error
pub struct ResultAssembler<'a> {
    output_format: &'a str,
}

impl<'a> ResultAssembler<'a> {
    /// Create an assembler for a batch targeting `output_format`
    pub fn new(output_format: &'a str) -> Self {
        Self { output_format }
    }

    /// Build the response for `results`
    pub async fn assemble(&self, results: ResultSet) -> Result<ConversionResponse> {
        let mut results = results.into_vec();
        match results.len() {
            0 => Err(Error::Other("cannot assemble an empty batch".into())),
            1 => {
                let result = results.remove(0);
                match result.outcome {
                    Outcome::Success(output) => Ok(ConversionResponse::Single {
                        file_name: target_name(&result.original_name, self.output_format),
                        content_type: content_type_for(self.output_format),
                        bytes: output.bytes,
                    }),
                    Outcome::Failure(source) => Err(Error::Item {
                        index: result.index,
                        name: result.original_name,
                        source,
                    }),
                }
            }
            _ => self.assemble_archive(results).await,
        }
    }

    async fn assemble_archive(
        &self,
        results: Vec<ConversionResult>,
    ) -> Result<ConversionResponse> {
        let mut builder = ArchiveBuilder::new();
        let mut failures: Vec<FailedItem> = Vec::new();

        for result in results {
            if let Some(failure) = result.failure_record() {
                failures.push(failure);
                continue;
            }
            if let Outcome::Success(output) = result.outcome {
                builder.add_converted(
                    result.index,
                    &result.original_name,
                    self.output_format,
                    output.bytes,
                );
            }
        }

        if builder.is_empty() {
            return Err(Error::BatchFailed { failures });
        }
        if !failures.is_empty() {
            tracing::warn!(
                failed = failures.len(),
                converted = builder.len(),
                "returning partial archive"
            );
            builder.add_failure_manifest(&failures)?;
        }

        let bytes = builder.build().await?;
        Ok(ConversionResponse::Archive {
            file_name: ARCHIVE_FILE_NAME.to_string(),
            bytes,
            failures,
        })
    }
}
