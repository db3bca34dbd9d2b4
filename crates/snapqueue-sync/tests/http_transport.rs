// crates/snapqueue-sync/tests/http_transport.rs
// ============================================================================
// Module: HTTP Transport Tests
// Description: Exercise the reqwest transports against a local tiny_http server.
// Purpose: Validate wire format, response limits, and redirect handling.
// Dependencies: snapqueue-sync, snapqueue-core, tiny_http, url, tokio
// ============================================================================

//! ## Overview
//! Each test binds a one-shot server on `127.0.0.1:0`, answers a single
//! request on a background thread, and inspects what the client saw.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::thread;

use common::RecordingSink;
use common::record;
use snapqueue_core::DeliveryForm;
use snapqueue_core::DeliveryOutcome;
use snapqueue_core::QueueStore;
use snapqueue_core::RemoteId;
use snapqueue_core::classify_response;
use snapqueue_sync::CatalogClient;
use snapqueue_sync::CatalogFetchError;
use snapqueue_sync::HttpCatalogClient;
use snapqueue_sync::HttpEndpointConfig;
use snapqueue_sync::HttpUploadTransport;
use snapqueue_sync::SyncEventSink;
use snapqueue_sync::SyncNotifier;
use snapqueue_sync::SyncTrigger;
use snapqueue_sync::SyncWorker;
use snapqueue_sync::TransportError;
use snapqueue_sync::UploadTransport;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;
use tiny_http::StatusCode;
use url::form_urlencoded;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Request details captured by the local server.
struct SeenRequest {
    method: String,
    content_type: Option<String>,
    body: String,
}

/// Serves one request with the given status and body.
fn serve_once(status: u16, body: &'static str) -> (String, thread::JoinHandle<SeenRequest>) {
    serve_once_with(Response::from_string(body).with_status_code(StatusCode(status)))
}

/// Serves one request with a prepared response.
fn serve_once_with(
    response: Response<std::io::Cursor<Vec<u8>>>,
) -> (String, thread::JoinHandle<SeenRequest>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let url = format!("http://{addr}/upload");
    let handle = thread::spawn(move || {
        let mut request = server.recv().unwrap();
        let mut body = String::new();
        request.as_reader().read_to_string(&mut body).unwrap();
        let seen = SeenRequest {
            method: request.method().to_string(),
            content_type: request
                .headers()
                .iter()
                .find(|header| header.field.equiv("Content-Type"))
                .map(|header| header.value.as_str().to_string()),
            body,
        };
        let _ = request.respond(response);
        seen
    });
    (url, handle)
}

fn upload(url: &str) -> HttpUploadTransport {
    HttpUploadTransport::new(HttpEndpointConfig::parse(url).unwrap()).unwrap()
}

fn sample_form() -> DeliveryForm {
    DeliveryForm {
        image_data: "data:image/jpeg;base64,/9j/4AAQ+Zg==".to_string(),
        caption: "harbor at dusk & fog".to_string(),
    }
}

// ============================================================================
// SECTION: Upload
// ============================================================================

#[tokio::test]
async fn upload_posts_urlencoded_form_fields() {
    let (url, handle) = serve_once(200, r#"{"code":"success"}"#);
    let form = sample_form();

    let response = upload(&url).send(&form).await.unwrap();
    let seen = handle.join().unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(classify_response(response.status, &response.body), DeliveryOutcome::Confirmed);
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.content_type.as_deref(), Some("application/x-www-form-urlencoded"));
    let fields: Vec<(String, String)> = form_urlencoded::parse(seen.body.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("image_data".to_string(), form.image_data.clone()),
            ("caption".to_string(), form.caption.clone()),
        ]
    );
}

#[tokio::test]
async fn oversized_response_is_rejected() {
    let (url, handle) = serve_once(200, r#"{"code":"success","padding":"xxxxxxxxxxxxxxxx"}"#);
    let mut config = HttpEndpointConfig::parse(&url).unwrap();
    config.max_response_bytes = 8;
    let transport = HttpUploadTransport::new(config).unwrap();

    let result = transport.send(&sample_form()).await;
    handle.join().unwrap();

    assert!(matches!(result, Err(TransportError::ResponseTooLarge { limit: 8, .. })));
}

#[tokio::test]
async fn redirects_are_not_followed() {
    let response = Response::from_string("moved")
        .with_status_code(StatusCode(302))
        .with_header(Header::from_bytes("Location", "http://127.0.0.1:1/elsewhere").unwrap());
    let (url, handle) = serve_once_with(response);

    let response = upload(&url).send(&sample_form()).await.unwrap();
    handle.join().unwrap();

    assert_eq!(response.status, 302);
    assert!(matches!(
        classify_response(response.status, &response.body),
        DeliveryOutcome::ServerRejected { status: 302, .. }
    ));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let result = upload("http://127.0.0.1:1/upload").send(&sample_form()).await;
    assert!(matches!(result, Err(TransportError::Transport(_))));
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

#[tokio::test]
async fn catalog_fetch_parses_items() {
    let (url, handle) = serve_once(
        200,
        r#"{"code":"success","result":{"data":{"images":[{"id":7,"image_url":"https://cdn.example/1.jpg","caption":"one"}]}}}"#,
    );
    let client = HttpCatalogClient::new(HttpEndpointConfig::parse(&url).unwrap()).unwrap();

    let items = client.fetch().await.unwrap();
    let seen = handle.join().unwrap();

    assert_eq!(seen.method, "GET");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, RemoteId::Number(7));
    assert_eq!(items[0].image_url, "https://cdn.example/1.jpg");
    assert_eq!(items[0].caption, "one");
}

#[tokio::test]
async fn catalog_error_status_is_reported() {
    let (url, handle) = serve_once(503, "unavailable");
    let client = HttpCatalogClient::new(HttpEndpointConfig::parse(&url).unwrap()).unwrap();

    let result = client.fetch().await;
    handle.join().unwrap();

    assert_eq!(result, Err(CatalogFetchError::Status(503)));
}

// ============================================================================
// SECTION: End To End
// ============================================================================

#[tokio::test]
async fn pass_over_http_removes_confirmed_record() {
    let (url, handle) = serve_once(200, r#"{"code":"success"}"#);
    let store = common::memory_store();
    store.insert(record("over the wire")).unwrap();
    let sink = RecordingSink::new();
    let worker = SyncWorker::new(
        Arc::new(store.clone()),
        Arc::new(upload(&url)) as Arc<dyn UploadTransport>,
        SyncNotifier::default(),
        snapqueue_sync::RetryPolicy::default(),
        Arc::clone(&sink) as Arc<dyn SyncEventSink>,
    );

    let report = worker.run_pass(SyncTrigger::Manual).await.unwrap();
    let seen = handle.join().unwrap();

    assert_eq!(report.confirmed, 1);
    assert!(store.list_all().unwrap().is_empty());
    assert!(seen.body.contains("caption=over+the+wire"));
}
