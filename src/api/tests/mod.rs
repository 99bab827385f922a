use super::*;
use crate::Config;
use crate::converter::FakeConverter;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use std::io::Read;
use std::time::Duration;
use tower::ServiceExt;

mod convert;

const BOUNDARY: &str = "----batchconvTestBoundary7MA4YWxk";

/// Router backed by a fake converter, with scratch storage in a fresh temp dir
struct TestApp {
    router: Router,
    converter: FakeConverter,
    shutdown: CancellationToken,
    scratch: tempfile::TempDir,
}

impl TestApp {
    fn new(converter: FakeConverter) -> Self {
        Self::with_config(converter, |_| {})
    }

    fn with_config(converter: FakeConverter, configure: impl FnOnce(&mut Config)) -> Self {
        let scratch = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.conversion.temp_dir = Some(scratch.path().to_path_buf());
        configure(&mut config);

        let service = Arc::new(
            ConversionService::with_converter(config.clone(), Arc::new(converter.clone()))
                .unwrap(),
        );
        let shutdown = CancellationToken::new();
        let router = create_router(service, Arc::new(config), shutdown.clone());

        Self {
            router,
            converter,
            shutdown,
            scratch,
        }
    }

    async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Entries left behind in the scratch root
    fn leftovers(&self) -> usize {
        std::fs::read_dir(self.scratch.path()).unwrap().count()
    }
}

/// Hand-built multipart body with `inputFile` parts and an optional `outputFormat`
fn multipart_body(files: &[(&str, &[u8])], output_format: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, content) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"inputFile\"; filename=\"{name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(format) = output_format {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"outputFormat\"\r\n\r\n\
                 {format}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn convert_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("content-length", body.len())
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn error_code(response: axum::response::Response) -> String {
    let body = body_bytes(response).await;
    let api_error: crate::ApiError = serde_json::from_slice(&body).unwrap();
    api_error.error.code
}

/// (name, content) of every archive entry, in archive order
fn zip_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut content = Vec::new();
            file.read_to_end(&mut content).unwrap();
            (file.name().to_string(), content)
        })
        .collect()
}

fn header<'a>(response: &'a axum::response::Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_api_server_serves_until_shutdown() {
    let scratch = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.conversion.temp_dir = Some(scratch.path().to_path_buf());
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);
    let service = Arc::new(
        ConversionService::with_converter((*config).clone(), Arc::new(FakeConverter::new()))
            .unwrap(),
    );
    let shutdown = CancellationToken::new();

    let api_handle = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { start_api_server(service, config, shutdown).await }
    });

    // Give it a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), api_handle)
        .await
        .expect("server should stop after shutdown")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let app = TestApp::with_config(FakeConverter::new(), |config| {
        config.server.api.cors_enabled = true;
        config.server.api.cors_origins = vec!["*".to_string()];
    });

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let app = TestApp::with_config(FakeConverter::new(), |config| {
        config.server.api.cors_enabled = false;
    });

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let app = TestApp::with_config(FakeConverter::new(), |config| {
        config.server.api.cors_origins = vec!["http://app.example.com".to_string()];
    });

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://app.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(
        header(&response, "access-control-allow-origin"),
        Some("http://app.example.com")
    );
}
