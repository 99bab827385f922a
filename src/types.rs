//! Core types for batchconv

use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{Error, ItemError, Result, ToHttpStatus};

/// One uploaded file as received from the transport, before validation
#[derive(Clone, Debug)]
pub struct UploadedFile {
    /// File name supplied by the client (may contain path components)
    pub file_name: String,
    /// Raw file content
    pub content: Bytes,
}

/// A validated batch, ready for dispatch
#[derive(Clone, Debug)]
pub struct BatchRequest {
    /// Items ordered by original name; `items[i].index == i`
    pub items: Vec<InputItem>,
    /// Target format shared by the whole batch, dotted and lower-case (e.g. ".png")
    pub output_format: String,
}

impl BatchRequest {
    /// Number of items in the batch
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the batch has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One batch item
#[derive(Clone, Debug)]
pub struct InputItem {
    /// Position in the batch, assigned once at intake
    pub index: usize,
    /// Sanitised original file name
    pub original_name: String,
    /// File content
    pub content: Bytes,
    /// Set when intake already classified the item as unconvertible
    pub rejection: Option<ItemError>,
}

/// Output of a successful conversion
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertedOutput {
    /// Converted file content
    pub bytes: Vec<u8>,
}

/// Outcome of one conversion task
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The item was converted
    Success(ConvertedOutput),
    /// The item failed; siblings are unaffected
    Failure(ItemError),
}

/// Terminal result of one conversion task
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionResult {
    /// Position of the item in the batch
    pub index: usize,
    /// Original file name of the item
    pub original_name: String,
    /// What happened
    pub outcome: Outcome,
}

impl ConversionResult {
    /// Whether the item converted successfully
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    /// Manifest record for a failed item, `None` on success
    pub fn failure_record(&self) -> Option<FailedItem> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Failure(error) => Some(FailedItem {
                index: self.index,
                name: self.original_name.clone(),
                code: error.error_code().to_string(),
                message: error.to_string(),
            }),
        }
    }
}

/// Complete, index-ordered results of a batch
///
/// Holds exactly one [`ConversionResult`] per batch index. Construction from the
/// orchestrator's slot array fails if any slot is empty or written twice.
#[derive(Clone, Debug)]
pub struct ResultSet {
    results: Vec<ConversionResult>,
}

impl ResultSet {
    /// Build a result set from an indexed slot array
    pub fn from_slots(slots: Vec<Option<ConversionResult>>) -> Result<Self> {
        let mut results = Vec::with_capacity(slots.len());
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(result) if result.index == index => results.push(result),
                Some(result) => {
                    return Err(Error::Other(format!(
                        "result for index {} stored in slot {}",
                        result.index, index
                    )));
                }
                None => {
                    return Err(Error::Other(format!(
                        "no result recorded for index {index}"
                    )));
                }
            }
        }
        Ok(Self { results })
    }

    /// Number of results
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = &ConversionResult> {
        self.results.iter()
    }

    /// Consume the set, yielding results in ascending index order
    pub fn into_vec(self) -> Vec<ConversionResult> {
        self.results
    }
}

/// Record of a failed item, reported alongside a partial archive
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FailedItem {
    /// Position of the item in the batch
    pub index: usize,
    /// Original file name
    pub name: String,
    /// Machine-readable failure code (e.g. "unsupported_format")
    pub code: String,
    /// Human-readable failure message
    pub message: String,
}

/// Fully assembled response body
#[derive(Clone, Debug)]
pub enum ConversionResponse {
    /// Single converted file
    Single {
        /// Download name (original name with the extension swapped)
        file_name: String,
        /// MIME type of the converted file
        content_type: String,
        /// Converted bytes
        bytes: Vec<u8>,
    },
    /// ZIP archive of all successful conversions
    Archive {
        /// Download name of the archive
        file_name: String,
        /// Encoded archive
        bytes: Vec<u8>,
        /// Items that failed and were left out of the archive
        failures: Vec<FailedItem>,
    },
}

/// Lifecycle of a single conversion task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Not yet started
    Pending,
    /// Input written to temporary storage
    Staged,
    /// Converter running
    Converting,
    /// Terminal outcome known
    Completed,
    /// Temporary storage deleted
    Released,
}

/// Converter and catalog information reported by `GET /capabilities`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Capabilities {
    /// Name of the active converter implementation
    pub converter: String,
    /// Whether the converter can actually run conversions
    pub converter_available: bool,
    /// Dotted extensions accepted as input and output
    pub supported_formats: Vec<String>,
    /// Maximum accepted request size in bytes
    pub max_request_bytes: u64,
    /// Maximum number of files per batch
    pub max_items: usize,
    /// Maximum number of conversions run at once per request
    pub max_concurrent_conversions: usize,
}
