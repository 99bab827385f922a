//! Conversion service: intake, orchestration and assembly behind one handle

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::assembler::ResultAssembler;
use crate::config::Config;
use crate::converter::{CliConverter, Converter, UnavailableConverter};
use crate::error::{Error, Result};
use crate::formats::SUPPORTED_FORMATS;
use crate::intake::RequestIntake;
use crate::orchestrator::Orchestrator;
use crate::temp::TempResourceManager;
use crate::types::{BatchRequest, Capabilities, ConversionResponse, UploadedFile};

/// Shared, cheaply cloneable entry point for batch conversions
///
/// # Examples
///
/// ```no_run
/// use batchconv::{Config, ConversionService};
/// use batchconv::types::UploadedFile;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let service = ConversionService::new(Config::default())?;
///
/// let files = vec![UploadedFile {
///     file_name: "cat.png".to_string(),
///     content: std::fs::read("cat.png")?.into(),
/// }];
/// let response = service
///     .convert_files(files, Some(".jpg"), &CancellationToken::new())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConversionService {
    config: Arc<Config>,
    converter: Arc<dyn Converter>,
    temp: TempResourceManager,
    intake: RequestIntake,
    orchestrator: Orchestrator,
}

impl ConversionService {
    /// Create a service, selecting the converter from the configuration
    ///
    /// An explicit `converter.binary_path` wins; otherwise PATH is searched for
    /// `magick`/`convert` when `converter.search_path` is set. Without either, every
    /// conversion fails with a "converter not available" item error.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let converter: Arc<dyn Converter> = if let Some(ref binary) = config.converter.binary_path
        {
            // Use explicitly configured binary path
            Arc::new(CliConverter::new(binary.clone()))
        } else if config.converter.search_path {
            // Search PATH for ImageMagick
            CliConverter::from_path()
                .map(|c| Arc::new(c) as Arc<dyn Converter>)
                .unwrap_or_else(|| Arc::new(UnavailableConverter))
        } else {
            // No binary configured and PATH search disabled
            Arc::new(UnavailableConverter)
        };

        Self::with_converter(config, converter)
    }

    /// Create a service with a caller-supplied converter
    pub fn with_converter(config: Config, converter: Arc<dyn Converter>) -> Result<Self> {
        config.validate()?;

        let temp = TempResourceManager::from_config(config.conversion.temp_dir.as_deref())?;
        let orchestrator = Orchestrator::new(converter.clone(), temp.clone(), &config.conversion);
        let intake = RequestIntake::new(&config.limits);

        tracing::info!(
            converter = converter.name(),
            available = converter.is_available(),
            temp_root = ?temp.root(),
            max_concurrent = config.conversion.max_concurrent_conversions,
            "conversion service initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            converter,
            temp,
            intake,
            orchestrator,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Request validator configured from the limits
    pub fn intake(&self) -> &RequestIntake {
        &self.intake
    }

    /// Root directory of per-task scratch storage
    pub fn temp_root(&self) -> &Path {
        self.temp.root()
    }

    /// Validate uploaded files and convert them
    pub async fn convert_files(
        &self,
        files: Vec<UploadedFile>,
        output_format: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<ConversionResponse> {
        let batch = self.intake.build_batch(files, output_format)?;
        self.convert(batch, cancel).await
    }

    /// Convert a validated batch and assemble the response
    ///
    /// The whole operation runs under `conversion.request_timeout`; when it
    /// expires, in-flight conversions are terminated and their scratch storage
    /// deleted before `Error::RequestTimedOut` is returned.
    pub async fn convert(
        &self,
        batch: BatchRequest,
        cancel: &CancellationToken,
    ) -> Result<ConversionResponse> {
        let timeout = self.config.conversion.request_timeout;
        let output_format = batch.output_format.clone();

        let work = async move {
            let results = self.orchestrator.run(batch, cancel).await?;
            ResultAssembler::new(&output_format).assemble(results).await
        };

        match tokio::time::timeout(timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_secs = timeout.as_secs(), "request timed out");
                Err(Error::RequestTimedOut(timeout))
            }
        }
    }

    /// Converter and catalog information
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            converter: self.converter.name().to_string(),
            converter_available: self.converter.is_available(),
            supported_formats: SUPPORTED_FORMATS.iter().map(|f| f.to_string()).collect(),
            max_request_bytes: self.config.limits.max_request_bytes,
            max_items: self.config.limits.max_items,
            max_concurrent_conversions: self.config.conversion.max_concurrent_conversions,
        }
    }
}
