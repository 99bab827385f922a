//! Request validation before dispatch
//!
//! Checks run in a fixed order: method, declared size, received size, parameter
//! presence and item count, then format support. Only the last step can mark single
//! items as failed; everything before it rejects the whole request before any
//! conversion starts.

use axum::http::Method;
use tracing::{debug, info};

use crate::config::LimitsConfig;
use crate::error::{Error, ItemError, Result};
use crate::formats::{extension_of, is_supported, normalize_format, sanitize_file_name};
use crate::types::{BatchRequest, InputItem, UploadedFile};

/// Validates inbound batches against the configured limits
#[derive(Clone, Debug)]
pub struct RequestIntake {
    max_request_bytes: u64,
    max_items: usize,
}

impl RequestIntake {
    /// Create an intake enforcing `limits`
    pub fn new(limits: &LimitsConfig) -> Self {
        Self {
            max_request_bytes: limits.max_request_bytes,
            max_items: limits.max_items,
        }
    }

    /// Maximum accepted request size in bytes
    pub fn max_request_bytes(&self) -> u64 {
        self.max_request_bytes
    }

    /// Only `POST` submits a batch
    pub fn check_method(method: &Method) -> Result<()> {
        if *method == Method::POST {
            Ok(())
        } else {
            Err(Error::MethodNotAllowed(method.to_string()))
        }
    }

    /// Reject a request whose declared `Content-Length` exceeds the cap
    pub fn check_declared_size(&self, content_length: Option<u64>) -> Result<()> {
        match content_length {
            Some(declared) if declared > self.max_request_bytes => Err(Error::PayloadTooLarge {
                limit: self.max_request_bytes,
                actual: Some(declared),
            }),
            _ => Ok(()),
        }
    }

    /// Validate the received files and produce an indexed batch
    ///
    /// Files are ordered by sanitised name (stable) before indices are assigned,
    /// so an identical submission always yields identical indices.
    pub fn build_batch(
        &self,
        files: Vec<UploadedFile>,
        output_format: Option<&str>,
    ) -> Result<BatchRequest> {
        let received: u64 = files.iter().map(|f| f.content.len() as u64).sum();
        if received > self.max_request_bytes {
            return Err(Error::PayloadTooLarge {
                limit: self.max_request_bytes,
                actual: Some(received),
            });
        }

        let output_format = output_format.and_then(normalize_format).ok_or_else(|| {
            Error::Validation("missing required parameter: outputFormat".into())
        })?;
        if files.is_empty() {
            return Err(Error::Validation("no input files provided".into()));
        }
        if files.len() > self.max_items {
            return Err(Error::Validation(format!(
                "too many files: {} exceeds the limit of {}",
                files.len(),
                self.max_items
            )));
        }
        if !is_supported(&output_format) {
            return Err(Error::UnsupportedFormat(output_format));
        }

        let mut files: Vec<UploadedFile> = files
            .into_iter()
            .map(|f| UploadedFile {
                file_name: sanitize_file_name(&f.file_name),
                content: f.content,
            })
            .collect();
        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        let items: Vec<InputItem> = files
            .into_iter()
            .enumerate()
            .map(|(index, file)| {
                let rejection = classify(&file.file_name, &output_format);
                if let Some(reason) = &rejection {
                    debug!(index, name = %file.file_name, %reason, "item rejected at intake");
                }
                InputItem {
                    index,
                    original_name: file.file_name,
                    content: file.content,
                    rejection,
                }
            })
            .collect();

        info!(
            items = items.len(),
            rejected = items.iter().filter(|i| i.rejection.is_some()).count(),
            received_bytes = received,
            output_format = %output_format,
            "batch accepted"
        );

        Ok(BatchRequest {
            items,
            output_format,
        })
    }
}

/// Per-item format check; `None` means the item can be converted
fn classify(file_name: &str, output_format: &str) -> Option<ItemError> {
    let reason = match extension_of(file_name) {
        None => "file has no extension".to_string(),
        Some(ext) if !is_supported(&ext) => format!("input format {ext} is not supported"),
        Some(ext) if ext == output_format => format!("file is already in {ext} format"),
        Some(_) => return None,
    };
    Some(ItemError::UnsupportedFormat { reason })
}
