// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end tests of the HTTP surface.
//!
//! Requests are driven through the router with `tower::ServiceExt::oneshot`,
//! with the peer address injected as `ConnectInfo` the same way
//! `into_make_service_with_connect_info` does for real connections.

use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use lanshare_core::domain::config::ShareConfigManifest;
use lanshare_core::domain::probe::{NoopProbe, ReachabilityProbe};
use lanshare_core::domain::storage::StorageProvider;
use lanshare_core::domain::upload::UploadLimits;
use lanshare_core::infrastructure::LocalStorageProvider;
use lanshare_core::presentation::{app, AppState};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

const LAN_PEER: &str = "192.168.1.20:51000";
const PUBLIC_PEER: &str = "8.8.8.8:51000";
const BOUNDARY: &str = "lanshare-test-boundary";

#[derive(Default)]
struct RecordingProbe {
    seen: Mutex<Vec<IpAddr>>,
}

impl ReachabilityProbe for RecordingProbe {
    fn probe(&self, ip: IpAddr) {
        self.seen.lock().unwrap().push(ip);
    }
}

struct TestShare {
    _temp_dir: TempDir,
    storage: Arc<dyn StorageProvider>,
    router: Router,
}

fn share_with(config: ShareConfigManifest, probe: Arc<dyn ReachabilityProbe>) -> TestShare {
    let temp_dir = TempDir::new().unwrap();
    let storage: Arc<dyn StorageProvider> =
        Arc::new(LocalStorageProvider::new(temp_dir.path().join("uploads")).unwrap());

    let mut config = config;
    config.spec.server.index_file = temp_dir.path().join("index.html");

    let state = AppState::from_config(&config, storage.clone(), probe).unwrap();
    TestShare {
        _temp_dir: temp_dir,
        storage,
        router: app(Arc::new(state)),
    }
}

fn share() -> TestShare {
    share_with(ShareConfigManifest::default(), Arc::new(NoopProbe))
}

fn share_with_limits(limits: UploadLimits) -> TestShare {
    let mut config = ShareConfigManifest::default();
    config.spec.limits = limits;
    share_with(config, Arc::new(NoopProbe))
}

fn request(method: &str, uri: &str, peer: &str, body: Body) -> Request<Body> {
    let mut request = Request::builder().method(method).uri(uri).body(body).unwrap();
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

fn multipart_body(field: &str, filename: Option<&str>, contents: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    match filename {
        Some(filename) => body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, filename
            )
            .as_bytes(),
        ),
        None => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n", field).as_bytes(),
        ),
    }
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(peer: &str, field: &str, filename: Option<&str>, contents: &[u8]) -> Request<Body> {
    let body = multipart_body(field, filename, contents);
    let len = body.len();
    let mut request = request("POST", "/file", peer, Body::from(body));
    request.headers_mut().insert(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={}", BOUNDARY).parse().unwrap(),
    );
    request
        .headers_mut()
        .insert(header::CONTENT_LENGTH, len.to_string().parse().unwrap());
    request
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(router, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn listed(router: &Router) -> Vec<String> {
    let (status, body) = send_json(router, request("GET", "/list", LAN_PEER, Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    let mut files: Vec<String> = body["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    files.sort();
    files
}

#[tokio::test]
async fn test_public_address_is_denied_everywhere() {
    let share = share();

    for (method, uri) in [("GET", "/list"), ("GET", "/ping"), ("GET", "/file?filename=a.txt"), ("DELETE", "/file")] {
        let (status, body) = send_json(&share.router, request(method, uri, PUBLIC_PEER, Body::empty())).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} {}", method, uri);
        assert_eq!(body["error"], "Access denied. Only local network access is allowed.");
    }

    let (status, _) = send_json(&share.router, upload_request(PUBLIC_PEER, "file", Some("a.txt"), b"x")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(!share.storage.root().join("a.txt").exists());
}

#[tokio::test]
async fn test_missing_peer_address_is_denied() {
    let share = share();
    let request = Request::builder().uri("/ping").body(Body::empty()).unwrap();

    let (status, _) = send_json(&share.router, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_ping_from_lan_and_loopback_mapped_peer() {
    let share = share();

    let (status, body) = send_json(&share.router, request("GET", "/ping", LAN_PEER, Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "pong");

    let (status, _) = send_json(
        &share.router,
        request("GET", "/ping", "[::ffff:10.0.0.5]:40000", Body::empty()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_probe_runs_for_every_caller() {
    let probe = Arc::new(RecordingProbe::default());
    let share = share_with(ShareConfigManifest::default(), probe.clone());

    send(&share.router, request("GET", "/ping", LAN_PEER, Body::empty())).await;
    send(&share.router, request("GET", "/ping", PUBLIC_PEER, Body::empty())).await;

    let seen = probe.seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec!["192.168.1.20".parse::<IpAddr>().unwrap(), "8.8.8.8".parse::<IpAddr>().unwrap()]
    );
}

#[tokio::test]
async fn test_upload_list_download_purge() {
    let share = share();
    assert!(listed(&share.router).await.is_empty());

    let (status, body) = send_json(&share.router, upload_request(LAN_PEER, "file", Some("a.txt"), b"0123456789")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "File uploaded successfully");
    assert_eq!(body["filename"], "a.txt");

    assert_eq!(listed(&share.router).await, vec!["a.txt"]);

    let response = share
        .router
        .clone()
        .oneshot(request("GET", "/file?filename=a.txt", LAN_PEER, Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "10");
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/octet-stream");
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"a.txt\""));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"0123456789");

    let (status, body) = send_json(&share.router, request("DELETE", "/file", LAN_PEER, Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Shared file system closed");

    assert!(listed(&share.router).await.is_empty());
}

#[tokio::test]
async fn test_upload_overwrites_existing_file() {
    let share = share();

    send(&share.router, upload_request(LAN_PEER, "file", Some("a.txt"), b"first version")).await;
    send(&share.router, upload_request(LAN_PEER, "file", Some("a.txt"), b"second")).await;

    assert_eq!(listed(&share.router).await, vec!["a.txt"]);
    let (_, bytes) = send(&share.router, request("GET", "/file?filename=a.txt", LAN_PEER, Body::empty())).await;
    assert_eq!(bytes, b"second");
}

#[tokio::test]
async fn test_traversal_filename_is_stored_by_base_name() {
    let share = share();

    let (status, body) = send_json(
        &share.router,
        upload_request(LAN_PEER, "file", Some("../../etc/evil.txt"), b"payload"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filename"], "evil.txt");

    assert!(share.storage.root().join("evil.txt").exists());
    assert!(!share.storage.root().parent().unwrap().join("evil.txt").exists());
    assert_eq!(listed(&share.router).await, vec!["evil.txt"]);
}

#[tokio::test]
async fn test_dot_dot_filename_is_rejected() {
    let share = share();

    let (status, body) = send_json(&share.router, upload_request(LAN_PEER, "file", Some(".."), b"x")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(listed(&share.router).await.is_empty());
}

#[tokio::test]
async fn test_upload_without_file_part() {
    let share = share();

    let (status, body) = send_json(&share.router, upload_request(LAN_PEER, "other", Some("a.txt"), b"x")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");

    let (status, body) = send_json(&share.router, upload_request(LAN_PEER, "file", None, b"x")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");

    let (status, body) = send_json(&share.router, request("POST", "/file", LAN_PEER, Body::from("plain"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn test_download_errors() {
    let share = share();

    let (status, body) = send_json(&share.router, request("GET", "/file", LAN_PEER, Body::empty())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No filename specified");

    let (status, body) = send_json(&share.router, request("GET", "/file?filename=", LAN_PEER, Body::empty())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No filename specified");

    let (status, body) = send_json(
        &share.router,
        request("GET", "/file?filename=missing.txt", LAN_PEER, Body::empty()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "File not found");
}

#[tokio::test]
async fn test_duplicate_filename_query_is_json_error() {
    let share = share();

    let (status, body) = send_json(
        &share.router,
        request("GET", "/file?filename=a.txt&filename=b.txt", LAN_PEER, Body::empty()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("filename"));
}

#[tokio::test]
async fn test_unknown_route_and_method_are_json_errors() {
    let share = share();

    let (status, body) = send_json(&share.router, request("PUT", "/file", LAN_PEER, Body::empty())).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "Method not allowed");

    let (status, body) = send_json(&share.router, request("GET", "/nowhere", LAN_PEER, Body::empty())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");

    let (status, _) = send_json(&share.router, request("GET", "/nowhere", PUBLIC_PEER, Body::empty())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_quota_rejects_upload_and_leaves_no_trace() {
    let share = share_with_limits(UploadLimits {
        max_file_bytes: 16,
        max_total_bytes: 20,
        max_request_bytes: 4096,
    });

    let (status, _) = send_json(&share.router, upload_request(LAN_PEER, "file", Some("a.bin"), &[1u8; 10])).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send_json(&share.router, upload_request(LAN_PEER, "file", Some("b.bin"), &[2u8; 10])).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(&share.router, upload_request(LAN_PEER, "file", Some("c.bin"), &[3u8; 1])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("20"));

    assert_eq!(listed(&share.router).await, vec!["a.bin", "b.bin"]);
    assert_eq!(share.storage.total_size().await.unwrap(), 20);
}

#[tokio::test]
async fn test_file_ceiling_rejects_upload() {
    let share = share_with_limits(UploadLimits {
        max_file_bytes: 16,
        max_total_bytes: 1024,
        max_request_bytes: 4096,
    });

    let (status, _) = send_json(&share.router, upload_request(LAN_PEER, "file", Some("exact.bin"), &[0u8; 16])).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(&share.router, upload_request(LAN_PEER, "file", Some("big.bin"), &[0u8; 17])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(listed(&share.router).await, vec!["exact.bin"]);
}

#[tokio::test]
async fn test_declared_length_over_request_ceiling() {
    let share = share_with_limits(UploadLimits {
        max_file_bytes: 16,
        max_total_bytes: 1024,
        max_request_bytes: 64,
    });

    let (status, _) = send_json(&share.router, upload_request(LAN_PEER, "file", Some("a.bin"), &[0u8; 100])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(listed(&share.router).await.is_empty());
}

#[tokio::test]
async fn test_purge_then_upload_recreates_directory() {
    let share = share();

    send(&share.router, upload_request(LAN_PEER, "file", Some("a.txt"), b"a")).await;
    send(&share.router, request("DELETE", "/file", LAN_PEER, Body::empty())).await;
    assert!(!share.storage.root().exists());

    let (status, _) = send_json(&share.router, upload_request(LAN_PEER, "file", Some("b.txt"), b"b")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed(&share.router).await, vec!["b.txt"]);
}

#[tokio::test]
async fn test_index_page() {
    let share = share();

    let (status, _) = send(&share.router, request("GET", "/", LAN_PEER, Body::empty())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let index = share.storage.root().parent().unwrap().join("index.html");
    std::fs::write(&index, "<html>share</html>").unwrap();

    let (status, bytes) = send(&share.router, request("GET", "/", LAN_PEER, Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"<html>share</html>");
}

#[tokio::test]
async fn test_forwarded_for_only_when_trusted() {
    let mut config = ShareConfigManifest::default();
    config.spec.network.trust_forwarded_for = true;
    let trusted = share_with(config, Arc::new(NoopProbe));
    let untrusted = share();

    let forwarded = |peer: &str| {
        let mut req = request("GET", "/ping", peer, Body::empty());
        req.headers_mut()
            .insert("x-forwarded-for", "10.0.0.9, 8.8.4.4".parse().unwrap());
        req
    };

    let (status, _) = send(&trusted.router, forwarded(PUBLIC_PEER)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&untrusted.router, forwarded(PUBLIC_PEER)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
