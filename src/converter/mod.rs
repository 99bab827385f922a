//! Format conversion capability
//!
//! The core treats conversion as an opaque external capability behind the
//! [`Converter`] trait. Implementations:
//!
//! - [`CliConverter`]: runs the ImageMagick binary (`magick` or `convert`)
//! - [`FakeConverter`]: in-process double with scripted delays and failures, public
//!   as a testing aid for embedders
//! - [`UnavailableConverter`]: used when no binary is configured or found
//!
//! ## Invocation convention
//!
//! The argument vector is built in one place, [`ConversionJob::args`]:
//!
//! ```text
//! <tool> <input> <output>                                  ordinary targets
//! <tool> <input> -alpha off -resize 256x256 <output>       .ico target
//! ```

mod cli;
pub mod fake;
mod unavailable;

pub use cli::CliConverter;
pub use fake::FakeConverter;
pub use unavailable::UnavailableConverter;

use crate::error::ConversionError;
use crate::formats::ICON_FORMAT;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;

/// Edge length of converted icons
pub const ICON_SIZE: &str = "256x256";

/// One conversion invocation
#[derive(Debug, Clone, Copy)]
pub struct ConversionJob<'a> {
    /// Batch index of the item, for logging
    pub index: usize,
    /// Original file name of the item
    pub original_name: &'a str,
    /// Staged input file
    pub input: &'a Path,
    /// Where the converter must write its output
    pub output: &'a Path,
    /// Dotted, lower-case target format
    pub output_format: &'a str,
}

impl ConversionJob<'_> {
    /// Whether the icon policy (alpha removal, fixed resize) applies
    pub fn is_icon(&self) -> bool {
        self.output_format == ICON_FORMAT
    }

    /// Argument vector passed to the converter binary
    pub fn args(&self) -> Vec<OsString> {
        let mut args = vec![self.input.as_os_str().to_os_string()];
        if self.is_icon() {
            args.extend(
                ["-alpha", "off", "-resize", ICON_SIZE]
                    .into_iter()
                    .map(OsString::from),
            );
        }
        args.push(self.output.as_os_str().to_os_string());
        args
    }
}

/// Capability that turns a staged input file into the requested format
///
/// Implementations write the converted file to [`ConversionJob::output`]; the
/// calling task reads it back and owns its deletion. Implementations must be
/// cancel-safe: dropping the returned future must stop any external work.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Convert `job.input` into `job.output`
    async fn convert(&self, job: &ConversionJob<'_>) -> Result<(), ConversionError>;

    /// Whether this converter can perform conversions at all
    fn is_available(&self) -> bool {
        true
    }

    /// Human-readable name for logging and capability reporting
    fn name(&self) -> &'static str;
}
