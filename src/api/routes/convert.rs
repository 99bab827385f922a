//! Batch conversion handler

use std::time::Instant;

use crate::api::AppState;
use crate::error::{Error, Result};
use crate::intake::RequestIntake;
use crate::types::{ConversionResponse, UploadedFile};
use axum::{
    extract::{FromRequest, Multipart, Request, State, multipart::MultipartError},
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

/// Response header carrying the number of items missing from a partial archive
pub const FAILURES_HEADER: &str = "x-conversion-failures";

/// Headers a browser client may read from a conversion response
const EXPOSED_HEADERS: &str = "Content-Disposition, X-Conversion-Failures";

/// POST / - Convert a batch of uploaded files
///
/// Registered for every method so other verbs get a JSON 405 instead of an empty one.
#[utoipa::path(
    post,
    path = "/",
    tag = "conversion",
    request_body(
        content = super::ConvertForm,
        content_type = "multipart/form-data",
        description = "One or more `inputFile` parts and an `outputFormat` field"
    ),
    responses(
        (status = 200, description = "Converted file (one item) or application/zip archive (several items)", content_type = "application/octet-stream"),
        (status = 400, description = "Missing parameters or unsupported format", body = crate::error::ApiError),
        (status = 405, description = "Method other than POST", body = crate::error::ApiError),
        (status = 413, description = "Request exceeds the size limit", body = crate::error::ApiError),
        (status = 500, description = "Conversion or archive assembly failed", body = crate::error::ApiError),
        (status = 503, description = "Cancelled by server shutdown", body = crate::error::ApiError),
        (status = 504, description = "Request timed out", body = crate::error::ApiError)
    )
)]
pub async fn convert_batch(State(state): State<AppState>, request: Request) -> Response {
    let started = Instant::now();
    let method = request.method().clone();

    match run_conversion(&state, request).await {
        Ok(converted) => {
            let response = into_http_response(converted);
            tracing::info!(
                %method,
                status = response.status().as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "conversion request completed"
            );
            response
        }
        Err(e) => {
            tracing::warn!(
                %method,
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "conversion request failed"
            );
            e.into_response()
        }
    }
}

async fn run_conversion(state: &AppState, request: Request) -> Result<ConversionResponse> {
    RequestIntake::check_method(request.method())?;

    let intake = state.service.intake();
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    intake.check_declared_size(declared)?;

    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|rejection| Error::Validation(rejection.body_text()))?;

    let api = &state.config.server.api;
    let limit = intake.max_request_bytes();
    let mut files = Vec::new();
    let mut output_format: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == api.file_field {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
            // Browsers send an empty, unnamed part when no file was chosen
            if file_name.is_empty() && content.is_empty() {
                continue;
            }
            files.push(UploadedFile { file_name, content });
        } else if name == api.format_field {
            output_format = Some(field.text().await.map_err(|e| multipart_error(e, limit))?);
        }
    }

    // Child of the server token: shutdown cancels every in-flight batch
    let cancel = state.shutdown.child_token();
    state
        .service
        .convert_files(files, output_format.as_deref(), &cancel)
        .await
}

fn multipart_error(error: MultipartError, limit: u64) -> Error {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge {
            limit,
            actual: None,
        }
    } else {
        Error::Validation(format!("malformed multipart body: {}", error.body_text()))
    }
}

fn into_http_response(converted: ConversionResponse) -> Response {
    let (file_name, content_type, bytes, failures) = match converted {
        ConversionResponse::Single {
            file_name,
            content_type,
            bytes,
        } => (file_name, content_type, bytes, 0),
        ConversionResponse::Archive {
            file_name,
            bytes,
            failures,
        } => (file_name, "application/zip".to_string(), bytes, failures.len()),
    };

    let mut response = (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, content_disposition(&file_name)),
            (
                header::ACCESS_CONTROL_EXPOSE_HEADERS,
                EXPOSED_HEADERS.to_string(),
            ),
        ],
        bytes,
    )
        .into_response();

    if failures > 0 {
        response.headers_mut().insert(
            HeaderName::from_static(FAILURES_HEADER),
            HeaderValue::from(failures),
        );
    }
    response
}

/// `attachment` disposition with a header-safe quoted file name
fn content_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}
