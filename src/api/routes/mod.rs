//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`convert`]: batch conversion
//! - [`system`]: health, capabilities and the OpenAPI document

use serde::{Deserialize, Serialize};

mod convert;
mod system;

pub use convert::*;
pub use system::*;

/// Multipart form accepted by `POST /` (documentation only)
///
/// The handler streams the form field by field; this type exists so the OpenAPI
/// document describes the expected parts.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConvertForm {
    /// Files to convert; repeat the part for several files
    #[schema(value_type = Vec<String>, format = Binary)]
    pub input_file: Vec<Vec<u8>>,
    /// Target format, e.g. ".png" (a missing leading dot is added)
    pub output_format: String,
}
