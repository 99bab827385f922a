//! `batchconv [config.json]`
//!
//! Serves the conversion API until SIGINT/SIGTERM.

use std::path::PathBuf;

use batchconv::logging::init_logging;
use batchconv::{Config, ConversionService, run_with_shutdown};

#[tokio::main]
async fn main() -> batchconv::Result<()> {
    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => Config::from_json_file(&path)?,
        None => Config::default(),
    };

    init_logging(&config.logging);

    let service = ConversionService::new(config.clone())?;
    let capabilities = service.capabilities();
    tracing::info!(
        converter = %capabilities.converter,
        available = capabilities.converter_available,
        max_concurrent = capabilities.max_concurrent_conversions,
        "batchconv starting"
    );
    if !capabilities.converter_available {
        tracing::warn!("ImageMagick not found; every conversion will fail until it is installed");
    }

    run_with_shutdown(service, config).await
}
