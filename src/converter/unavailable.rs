//! Converter used when ImageMagick is unavailable

use super::{ConversionJob, Converter};
use crate::error::ConversionError;
use async_trait::async_trait;

/// Converter used when no ImageMagick binary is available or configured
///
/// Every conversion fails with [`ConversionError::ToolMissing`], so requests still
/// get a well-formed per-item failure instead of the service refusing to start.
///
/// # Examples
///
/// ```
/// use batchconv::converter::{Converter, UnavailableConverter};
///
/// let converter = UnavailableConverter;
/// assert!(!converter.is_available());
/// assert_eq!(converter.name(), "unavailable");
/// ```
pub struct UnavailableConverter;

#[async_trait]
impl Converter for UnavailableConverter {
    async fn convert(&self, _job: &ConversionJob<'_>) -> Result<(), ConversionError> {
        Err(ConversionError::ToolMissing(
            "image conversion requires the ImageMagick binary. \
             Configure converter.binary_path or ensure magick is in PATH."
                .into(),
        ))
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
