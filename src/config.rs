//! Configuration types for batchconv

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Request admission limits
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LimitsConfig {
    /// Maximum accepted request size in bytes (default: 2 GiB)
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: u64,

    /// Maximum number of files in one batch (default: 256)
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_bytes: default_max_request_bytes(),
            max_items: default_max_items(),
        }
    }
}

/// Conversion scheduling and scratch storage
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ConversionConfig {
    /// Upper bound on conversions running at once within one request (default: 4)
    ///
    /// The worker pool of a request is sized to `min(items, max_concurrent_conversions)`.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_conversions: usize,

    /// Time budget for a single conversion, in seconds (default: 120)
    ///
    /// A conversion exceeding it is killed and reported as a per-item failure.
    #[serde(default = "default_conversion_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub conversion_timeout: Duration,

    /// Time budget for a whole request, in seconds (default: 600)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub request_timeout: Duration,

    /// Root directory for per-task scratch storage (default: system temp dir)
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub temp_dir: Option<PathBuf>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_conversions: default_max_concurrent(),
            conversion_timeout: default_conversion_timeout(),
            request_timeout: default_request_timeout(),
            temp_dir: None,
        }
    }
}

/// External converter binary selection
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ConverterConfig {
    /// Path to the ImageMagick executable (auto-detected if None)
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub binary_path: Option<PathBuf>,

    /// Whether to search PATH for `magick`/`convert` if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            search_path: true,
        }
    }
}

/// Log output settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output (default: false)
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Main configuration for the conversion service
///
/// Fields are organized into logical sub-configs:
/// - [`limits`](LimitsConfig): request admission
/// - [`conversion`](ConversionConfig): concurrency, timeouts, scratch storage
/// - [`converter`](ConverterConfig): external binary selection
/// - [`server`](ServerIntegrationConfig): HTTP API
/// - [`logging`](LoggingConfig): log output
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Request admission limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Conversion scheduling and scratch storage
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// External converter selection
    #[serde(default)]
    pub converter: ConverterConfig,

    /// API server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that would make the service unusable
    pub fn validate(&self) -> Result<()> {
        fn invalid(key: &str, message: &str) -> Error {
            Error::Config {
                message: message.to_string(),
                key: Some(key.to_string()),
            }
        }

        if self.limits.max_request_bytes == 0 {
            return Err(invalid("max_request_bytes", "must be greater than zero"));
        }
        if self.limits.max_items == 0 {
            return Err(invalid("max_items", "must be greater than zero"));
        }
        if self.conversion.max_concurrent_conversions == 0 {
            return Err(invalid(
                "max_concurrent_conversions",
                "must be greater than zero",
            ));
        }
        if self.conversion.conversion_timeout.is_zero() {
            return Err(invalid("conversion_timeout", "must be greater than zero"));
        }
        if self.conversion.request_timeout.is_zero() {
            return Err(invalid("request_timeout", "must be greater than zero"));
        }
        if self.server.api.file_field.trim().is_empty() {
            return Err(invalid("file_field", "must not be empty"));
        }
        if self.server.api.format_field.trim().is_empty() {
            return Err(invalid("format_field", "must not be empty"));
        }
        Ok(())
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// Multipart field carrying the uploaded files (default: "inputFile")
    #[serde(default = "default_file_field")]
    pub file_field: String,

    /// Multipart field carrying the target format (default: "outputFormat")
    #[serde(default = "default_format_field")]
    pub format_field: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
            file_field: default_file_field(),
            format_field: default_format_field(),
        }
    }
}

fn default_max_request_bytes() -> u64 {
    2 << 30
}

fn default_max_items() -> usize {
    256
}

fn default_max_concurrent() -> usize {
    4
}

fn default_conversion_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_file_field() -> String {
    "inputFile".to_string()
}

fn default_format_field() -> String {
    "outputFormat".to_string()
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
