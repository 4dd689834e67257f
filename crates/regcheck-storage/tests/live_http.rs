// crates/regcheck-storage/tests/live_http.rs
// ============================================================================
// Module: Live HTTP Probe Tests
// Description: Azure and Swift probes against local tiny_http servers.
// Purpose: Prove request shapes and status mapping without cloud access.
// ============================================================================

//! Live HTTP probe tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::mpsc;
use std::thread;

use regcheck_core::AzureContainerRequest;
use regcheck_core::ObjectStoreProbe;
use regcheck_core::ProbeError;
use regcheck_core::ProbeTimeouts;
use regcheck_core::SwiftAuthVersion;
use regcheck_core::SwiftContainerRequest;
use regcheck_storage::LiveObjectStore;
use regcheck_storage::live::azure;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Seen request: method, url, and selected headers.
#[derive(Debug, Clone)]
struct Seen {
    method: String,
    url: String,
    authorization: Option<String>,
    auth_token: Option<String>,
}

fn header_value(request: &tiny_http::Request, name: &str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|header| header.field.as_str().as_str().eq_ignore_ascii_case(name))
        .map(|header| header.value.as_str().to_string())
}

/// Serves `count` requests, answering each with `respond(index, url, port)`.
fn serve<F>(count: usize, respond: F) -> (u16, mpsc::Receiver<Seen>)
where
    F: Fn(usize, &str, u16) -> Response<std::io::Cursor<Vec<u8>>> + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for index in 0..count {
            let request = server.recv().unwrap();
            let seen = Seen {
                method: request.method().to_string(),
                url: request.url().to_string(),
                authorization: header_value(&request, "Authorization"),
                auth_token: header_value(&request, "X-Auth-Token"),
            };
            let response = respond(index, &seen.url, port);
            tx.send(seen).unwrap();
            request.respond(response).unwrap();
        }
    });
    (port, rx)
}

fn header(name: &str, value: &str) -> Header {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).unwrap()
}

// ============================================================================
// SECTION: Azure
// ============================================================================

#[test]
fn string_to_sign_has_canonical_layout() {
    let text = azure::string_to_sign("acct", "quay", "Mon, 05 Jan 2026 10:00:00 GMT");
    let lines: Vec<&str> = text.split('\n').collect();
    assert_eq!(lines[0], "GET");
    assert!(lines[1..12].iter().all(|line| line.is_empty()));
    assert_eq!(lines[12], "x-ms-date:Mon, 05 Jan 2026 10:00:00 GMT");
    assert!(lines[13].starts_with("x-ms-version:"));
    assert_eq!(lines[14], "/acct/quay");
    assert_eq!(lines[15], "restype:container");
}

#[test]
fn signing_rejects_invalid_key() {
    assert!(matches!(azure::sign("not base64!!", "text"), Err(ProbeError::Rejected(_))));
    let signature = azure::sign("c2VjcmV0LWtleQ==", "text").unwrap();
    assert_eq!(signature.len(), 44);
    assert_eq!(signature, azure::sign("c2VjcmV0LWtleQ==", "text").unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn azure_shared_key_request_succeeds() {
    let (port, seen) = serve(1, |_, _, _| Response::from_string("").with_status_code(200));
    let probe = LiveObjectStore::new(ProbeTimeouts::default());
    let request = AzureContainerRequest {
        endpoint: format!("http://127.0.0.1:{port}"),
        account_name: "acct".to_string(),
        account_key: Some("c2VjcmV0LWtleQ==".to_string()),
        sas_token: None,
        container: "quay".to_string(),
    };
    probe.azure_container(&request).await.unwrap();
    let seen = seen.recv().unwrap();
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.url, "/quay?restype=container");
    assert!(seen.authorization.unwrap().starts_with("SharedKey acct:"));
}

#[tokio::test(flavor = "multi_thread")]
async fn azure_missing_container_is_not_found() {
    let (port, seen) = serve(1, |_, _, _| Response::from_string("").with_status_code(404));
    let probe = LiveObjectStore::new(ProbeTimeouts::default());
    let request = AzureContainerRequest {
        endpoint: format!("http://127.0.0.1:{port}/"),
        account_name: "acct".to_string(),
        account_key: None,
        sas_token: Some("?sv=2021&sig=abc".to_string()),
        container: "missing".to_string(),
    };
    let err = probe.azure_container(&request).await.unwrap_err();
    assert!(matches!(err, ProbeError::NotFound(_)));
    let seen = seen.recv().unwrap();
    assert_eq!(seen.url, "/missing?sv=2021&sig=abc&restype=container");
    assert!(seen.authorization.is_none());
}

// ============================================================================
// SECTION: Swift
// ============================================================================

fn swift_request(port: u16, container: &str) -> SwiftContainerRequest {
    SwiftContainerRequest {
        auth_url: format!("http://127.0.0.1:{port}/auth/v1.0"),
        auth_version: SwiftAuthVersion::V1,
        user: "test:tester".to_string(),
        password: "testing".to_string(),
        container: container.to_string(),
        tenant_id: None,
        user_domain_name: None,
        ca_pem: None,
    }
}

fn swift_v1_server() -> (u16, mpsc::Receiver<Seen>) {
    serve(2, |index, _, port| {
        if index == 0 {
            Response::from_string("")
                .with_status_code(200)
                .with_header(header("X-Storage-Url", &format!("http://127.0.0.1:{port}/v1/AUTH_test")))
                .with_header(header("X-Auth-Token", "AUTH_tk123"))
        } else {
            Response::from_string(r#"[{"name":"quay","count":0,"bytes":0}]"#)
                .with_status_code(200)
                .with_header(header("Content-Type", "application/json"))
        }
    })
}

#[tokio::test(flavor = "multi_thread")]
async fn swift_v1_lists_container() {
    let (port, seen) = swift_v1_server();
    let probe = LiveObjectStore::new(ProbeTimeouts::default());
    probe.swift_container(&swift_request(port, "quay")).await.unwrap();
    let auth = seen.recv().unwrap();
    assert_eq!(auth.url, "/auth/v1.0");
    let listing = seen.recv().unwrap();
    assert!(listing.url.starts_with("/v1/AUTH_test?format=json"));
    assert_eq!(listing.auth_token.as_deref(), Some("AUTH_tk123"));
}

#[tokio::test(flavor = "multi_thread")]
async fn swift_missing_container_is_not_found() {
    let (port, _seen) = swift_v1_server();
    let probe = LiveObjectStore::new(ProbeTimeouts::default());
    let err = probe.swift_container(&swift_request(port, "quay-other")).await.unwrap_err();
    assert!(matches!(err, ProbeError::NotFound(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn swift_rejected_auth_is_rejected() {
    let (port, _seen) = serve(1, |_, _, _| Response::from_string("").with_status_code(401));
    let probe = LiveObjectStore::new(ProbeTimeouts::default());
    let err = probe.swift_container(&swift_request(port, "quay")).await.unwrap_err();
    assert!(matches!(err, ProbeError::Rejected(_)));
}
