//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the batchconv REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the batchconv REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "batchconv REST API",
        version = "0.1.0",
        description = "Concurrent batch image conversion. Upload files with a target format; receive the converted file, or a ZIP archive when several files were sent. `POST /convert` is an alias of `POST /`.",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Conversion
        crate::api::routes::convert_batch,

        // System
        crate::api::routes::get_capabilities,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::Capabilities,
        crate::types::FailedItem,
        crate::types::TaskState,

        // Config types from config.rs
        crate::config::Config,
        crate::config::LimitsConfig,
        crate::config::ConversionConfig,
        crate::config::ConverterConfig,
        crate::config::LoggingConfig,
        crate::config::ServerIntegrationConfig,
        crate::config::ApiConfig,

        // API request types from routes
        crate::api::routes::ConvertForm,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "conversion", description = "Batch conversion - Upload files and receive converted output"),
        (name = "system", description = "System endpoints - Health checks, capabilities, OpenAPI spec"),
    )
)]
pub struct ApiDoc;
