//! Integration tests for the generation wire contract against a mock service.

use httpmock::prelude::*;
use photomosaic_core::{GenerationParameters, ImageArtifact, PoolCollection};
use photomosaic_request::{GenerationRequest, build_request};
use photomosaic_transport::{GenerationClient, TransportError};

fn ascii_image(name: &str) -> ImageArtifact {
    ImageArtifact::new(name, "image/jpeg", format!("bytes-of-{name}").into_bytes())
}

fn fixture_request(pool_size: usize, stride: u32, output_width: u32) -> GenerationRequest {
    let input = ImageArtifact::new("photo.png", "image/png", b"input-bytes".to_vec());
    let pool = PoolCollection::from_selection(
        (0..pool_size)
            .map(|index| ascii_image(&format!("tile-{index}.jpg")))
            .collect(),
    );
    build_request(
        Some(&input),
        Some(&pool),
        GenerationParameters::new(stride, output_width),
    )
    .expect("fixture request should build")
}

#[test]
fn wire_contract_tests_posts_all_fields_and_returns_bytes() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/generate_mosaic")
            .header_exists("content-type")
            .body_contains("name=\"input\"; filename=\"photo.png\"")
            .body_contains("name=\"pool\"; filename=\"tile-0.jpg\"")
            .body_contains("name=\"pool\"; filename=\"tile-4.jpg\"")
            .body_contains("name=\"stride\"\r\n\r\n20\r\n")
            .body_contains("name=\"output_width\"\r\n\r\n800\r\n");
        then.status(200)
            .header("content-type", "image/jpeg")
            .body(b"MOSAIC-JPEG");
    });

    let client = GenerationClient::http(&server.base_url()).expect("client should build");
    let image = client
        .generate(&fixture_request(5, 20, 800))
        .expect("generation should succeed");

    mock.assert();
    assert_eq!(image.bytes, b"MOSAIC-JPEG".to_vec());
    assert_eq!(image.content_type.as_deref(), Some("image/jpeg"));
}

#[test]
fn wire_contract_tests_sends_untyped_pool_file_as_octet_stream() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/generate_mosaic")
            .body_contains("name=\"pool\"; filename=\"tile.heic\"")
            .body_contains("application/octet-stream");
        then.status(200)
            .header("content-type", "image/jpeg")
            .body(b"MOSAIC-JPEG");
    });

    let input = ImageArtifact::new("photo.png", "image/png", b"input-bytes".to_vec());
    let pool = PoolCollection::from_selection(vec![ImageArtifact::new(
        "tile.heic",
        "",
        b"heic-bytes".to_vec(),
    )]);
    let request = build_request(Some(&input), Some(&pool), GenerationParameters::default())
        .expect("request should build");

    let client = GenerationClient::http(&server.base_url()).expect("client should build");
    let image = client
        .generate(&request)
        .expect("untyped pool file must still be sent");

    mock.assert();
    assert_eq!(image.bytes, b"MOSAIC-JPEG".to_vec());
}

#[test]
fn wire_contract_tests_maps_error_status_and_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/generate_mosaic");
        then.status(400)
            .header("content-type", "application/json")
            .body(r#"{"error": "No pool images provided"}"#);
    });

    let client = GenerationClient::http(&server.base_url()).expect("client should build");
    let failure = client
        .generate(&fixture_request(1, 30, 1000))
        .expect_err("400 must fail");

    assert_eq!(
        failure,
        TransportError::Status {
            status: 400,
            detail: Some("No pool images provided".to_string()),
        }
    );
}

#[test]
fn wire_contract_tests_treats_empty_success_body_as_malformed() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/generate_mosaic");
        then.status(200);
    });

    let client = GenerationClient::http(&server.base_url()).expect("client should build");
    let failure = client
        .generate(&fixture_request(1, 30, 1000))
        .expect_err("empty body must fail");
    assert!(matches!(failure, TransportError::MalformedResponse(_)));
}

#[test]
fn wire_contract_tests_reports_unreachable_service() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("port should bind");
        listener.local_addr().expect("addr should resolve").port()
    };
    let client =
        GenerationClient::http(&format!("http://127.0.0.1:{port}")).expect("client should build");
    let failure = client
        .generate(&fixture_request(1, 30, 1000))
        .expect_err("unreachable service must fail");
    assert!(matches!(failure, TransportError::Connect(_)));
}
