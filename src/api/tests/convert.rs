use super::*;
use crate::api::routes::FAILURES_HEADER;
use crate::converter::fake::FakeBehavior;

#[tokio::test]
async fn test_single_file_returns_converted_bytes() {
    let app = TestApp::new(FakeConverter::new());

    let body = multipart_body(&[("holiday.png", b"png-data")], Some(".jpg"));
    let response = app.send(convert_request("/", body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "content-type"), Some("image/jpeg"));
    assert_eq!(
        header(&response, "content-disposition"),
        Some("attachment; filename=\"holiday.jpg\"")
    );
    assert_eq!(
        header(&response, "access-control-expose-headers"),
        Some("Content-Disposition, X-Conversion-Failures")
    );
    assert!(header(&response, FAILURES_HEADER).is_none());
    assert_eq!(
        body_bytes(response).await,
        FakeConverter::expected_output(b"png-data", ".jpg")
    );
    assert_eq!(app.leftovers(), 0);
}

#[tokio::test]
async fn test_two_files_return_ordered_archive() {
    let app = TestApp::new(FakeConverter::new());

    // Submitted out of order; entries follow the sorted names
    let body = multipart_body(&[("dog.bmp", b"dog"), ("cat.png", b"cat")], Some(".jpg"));
    let response = app.send(convert_request("/", body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "content-type"), Some("application/zip"));
    assert_eq!(
        header(&response, "content-disposition"),
        Some("attachment; filename=\"convertedimages.zip\"")
    );

    let entries = zip_entries(&body_bytes(response).await);
    let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["cat.jpg", "dog.jpg"]);
    assert_eq!(entries[0].1, FakeConverter::expected_output(b"cat", ".jpg"));
    assert_eq!(entries[1].1, FakeConverter::expected_output(b"dog", ".jpg"));
    assert_eq!(app.leftovers(), 0);
}

#[tokio::test]
async fn test_convert_alias_route() {
    let app = TestApp::new(FakeConverter::new());

    let body = multipart_body(&[("a.gif", b"a")], Some("png"));
    let response = app.send(convert_request("/convert", body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "content-type"), Some("image/png"));
}

#[tokio::test]
async fn test_missing_output_format_is_rejected_without_conversions() {
    let app = TestApp::new(FakeConverter::new());

    let body = multipart_body(&[("cat.png", b"cat")], None);
    let response = app.send(convert_request("/", body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "validation_error");
    assert_eq!(app.converter.invocation_count(), 0);
}

#[tokio::test]
async fn test_zero_files_is_rejected() {
    let app = TestApp::new(FakeConverter::new());

    let body = multipart_body(&[], Some(".png"));
    let response = app.send(convert_request("/", body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "validation_error");
}

#[tokio::test]
async fn test_non_multipart_body_is_rejected() {
    let app = TestApp::new(FakeConverter::new());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "validation_error");
}

#[tokio::test]
async fn test_unknown_output_format_invokes_nothing() {
    let app = TestApp::new(FakeConverter::new());

    let body = multipart_body(&[("a.png", b"a"), ("b.png", b"b")], Some(".docx"));
    let response = app.send(convert_request("/", body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "unsupported_format");
    assert_eq!(app.converter.invocation_count(), 0);
}

#[tokio::test]
async fn test_icon_target_requests_alpha_removal_and_resize() {
    let app = TestApp::new(FakeConverter::new());

    let body = multipart_body(&[("logo.png", b"logo")], Some(".ico"));
    let response = app.send(convert_request("/", body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "content-type"), Some("image/x-icon"));

    let invocations = app.converter.invocations();
    assert_eq!(invocations.len(), 1);
    let args: Vec<String> = invocations[0]
        .args
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert_eq!(args.len(), 6);
    assert_eq!(&args[1..5], &["-alpha", "off", "-resize", "256x256"]);
    assert!(args[5].ends_with("output.ico"));
}

#[tokio::test]
async fn test_other_methods_are_not_allowed() {
    let app = TestApp::new(FakeConverter::new());

    for (method, uri) in [
        (Method::GET, "/"),
        (Method::PUT, "/"),
        (Method::DELETE, "/convert"),
        (Method::PATCH, "/convert"),
    ] {
        let request = Request::builder()
            .method(method.clone())
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.send(request).await;

        assert_eq!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "{method} {uri}"
        );
        assert_eq!(header(&response, "allow"), Some("POST"));
        assert_eq!(error_code(response).await, "method_not_allowed");
    }
}

#[tokio::test]
async fn test_declared_length_over_cap_is_rejected_before_reading() {
    let app = TestApp::with_config(FakeConverter::new(), |config| {
        config.limits.max_request_bytes = 256;
    });

    static BIG: [u8; 512] = [7; 512];
    let body = multipart_body(&[("big.png", &BIG)], Some(".jpg"));
    let response = app.send(convert_request("/", body)).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(error_code(response).await, "payload_too_large");
    assert_eq!(app.converter.invocation_count(), 0);
}

#[tokio::test]
async fn test_streamed_body_over_cap_is_rejected() {
    let app = TestApp::with_config(FakeConverter::new(), |config| {
        config.limits.max_request_bytes = 256;
    });

    static BIG: [u8; 512] = [7; 512];
    let body = multipart_body(&[("big.png", &BIG)], Some(".jpg"));
    // No Content-Length: the limit is enforced while the body is read
    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.converter.invocation_count(), 0);
}

#[tokio::test]
async fn test_one_unsupported_item_does_not_fail_the_batch() {
    let app = TestApp::new(FakeConverter::new());

    let body = multipart_body(
        &[("a.png", b"a"), ("b.docx", b"b"), ("c.png", b"c")],
        Some(".jpg"),
    );
    let response = app.send(convert_request("/", body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, FAILURES_HEADER), Some("1"));

    let entries = zip_entries(&body_bytes(response).await);
    let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["a.jpg", "c.jpg", "conversion_failures.json"]);

    let manifest: Vec<crate::types::FailedItem> = serde_json::from_slice(&entries[2].1).unwrap();
    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest[0].index, 1);
    assert_eq!(manifest[0].name, "b.docx");
    assert_eq!(manifest[0].code, "unsupported_format");

    // The rejected item never reached the converter
    assert_eq!(app.converter.invocation_count(), 2);
    assert_eq!(app.leftovers(), 0);
}

#[tokio::test]
async fn test_converter_failure_is_isolated() {
    let converter = FakeConverter::new().with_failure("b.png", "corrupt image");
    let app = TestApp::new(converter);

    let body = multipart_body(&[("a.png", b"a"), ("b.png", b"b")], Some(".webp"));
    let response = app.send(convert_request("/", body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, FAILURES_HEADER), Some("1"));
    let entries = zip_entries(&body_bytes(response).await);
    assert_eq!(entries[0].0, "a.webp");
    assert_eq!(entries[1].0, "conversion_failures.json");
    assert_eq!(app.leftovers(), 0);
}

#[tokio::test]
async fn test_single_file_conversion_failure_is_500() {
    let converter = FakeConverter::new().with_failure("a.png", "corrupt image");
    let app = TestApp::new(converter);

    let body = multipart_body(&[("a.png", b"a")], Some(".jpg"));
    let response = app.send(convert_request("/", body)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_code(response).await, "conversion_failed");
    assert_eq!(app.leftovers(), 0);
}

#[tokio::test]
async fn test_single_file_same_format_is_400() {
    let app = TestApp::new(FakeConverter::new());

    let body = multipart_body(&[("a.PNG", b"a")], Some(".png"));
    let response = app.send(convert_request("/", body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "unsupported_format");
    assert_eq!(app.converter.invocation_count(), 0);
}

#[tokio::test]
async fn test_all_items_failing_is_a_batch_failure() {
    let app = TestApp::new(FakeConverter::new());

    let body = multipart_body(&[("a.txt2", b"a"), ("b.xyz", b"b")], Some(".png"));
    let response = app.send(convert_request("/", body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_bytes(response).await;
    let api_error: crate::ApiError = serde_json::from_slice(&body).unwrap();
    assert_eq!(api_error.error.code, "batch_failed");
    let failures = api_error.error.details.unwrap()["failures"].clone();
    assert_eq!(failures.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_output_from_converter_is_reported() {
    let converter = FakeConverter::new().with_behavior(
        "a.png",
        FakeBehavior {
            skip_output: true,
            ..FakeBehavior::default()
        },
    );
    let app = TestApp::new(converter);

    let body = multipart_body(&[("a.png", b"a")], Some(".jpg"));
    let response = app.send(convert_request("/", body)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_code(response).await, "conversion_failed");
}

#[tokio::test]
async fn test_duplicate_target_names_are_disambiguated() {
    let app = TestApp::new(FakeConverter::new());

    let body = multipart_body(&[("photo.bmp", b"1"), ("photo.gif", b"2")], Some(".png"));
    let response = app.send(convert_request("/", body)).await;

    let entries = zip_entries(&body_bytes(response).await);
    let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["photo.png", "photo-1.png"]);
}

#[tokio::test]
async fn test_shutdown_cancels_in_flight_batch() {
    let converter = FakeConverter::new().with_default_delay(Duration::from_secs(60));
    let app = TestApp::new(converter);

    let shutdown = app.shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.cancel();
    });

    let body = multipart_body(&[("a.png", b"a"), ("b.png", b"b")], Some(".jpg"));
    let response = app.send(convert_request("/", body)).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(error_code(response).await, "cancelled");
    assert_eq!(app.converter.in_flight(), 0);
    assert_eq!(app.leftovers(), 0);
}

#[tokio::test]
async fn test_request_timeout_is_504() {
    let converter = FakeConverter::new().with_default_delay(Duration::from_secs(60));
    let app = TestApp::with_config(converter, |config| {
        config.conversion.request_timeout = Duration::from_secs(1);
    });

    let body = multipart_body(&[("a.png", b"a")], Some(".jpg"));
    let response = app.send(convert_request("/", body)).await;

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(error_code(response).await, "request_timeout");
    assert_eq!(app.leftovers(), 0);
}

#[tokio::test]
async fn test_custom_field_names() {
    let app = TestApp::with_config(FakeConverter::new(), |config| {
        config.server.api.file_field = "files".to_string();
    });

    // Default field name is ignored once reconfigured
    let body = multipart_body(&[("a.png", b"a")], Some(".jpg"));
    let response = app.send(convert_request("/", body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.converter.invocation_count(), 0);
}
