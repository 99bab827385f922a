//! Application state for the API server

use crate::{Config, ConversionService};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the conversion service and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The conversion service handling every batch
    pub service: Arc<ConversionService>,

    /// Configuration (field names, limits)
    pub config: Arc<Config>,

    /// Server shutdown signal; each request cancels on a child of this token
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create a new AppState
    pub fn new(
        service: Arc<ConversionService>,
        config: Arc<Config>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            service,
            config,
            shutdown,
        }
    }
}
