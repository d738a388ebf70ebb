use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use basket_axum::{axum, BasketApp};
use basket_blob::{BlobBackend, MemoryBlobBackend};
use basket_files::{FileService, FileServiceConfig};
use basket_store::{FileStore, MemoryFileStore};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const BOUNDARY: &str = "basket-test-boundary";

struct TestApp {
    app: BasketApp,
    blobs: MemoryBlobBackend,
    store: MemoryFileStore,
}

fn build(max_file_size: u64) -> TestApp {
    let store = MemoryFileStore::new();
    let blobs = MemoryBlobBackend::new().with_chunk_size(5);
    let service = FileService::new(
        Arc::new(store.clone()),
        Arc::new(blobs.clone()),
        FileServiceConfig::new(max_file_size),
    );
    TestApp {
        app: BasketApp::new(service),
        blobs,
        store,
    }
}

fn multipart_body(field: &str, filename: Option<&str>, data: &[u8]) -> Vec<u8> {
    let disposition = match filename {
        Some(name) => format!("form-data; name=\"{field}\"; filename=\"{name}\""),
        None => format!("form-data; name=\"{field}\""),
    };
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/file/upload")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn upload(app: &BasketApp, name: &str, data: &[u8]) -> Value {
    let res = app
        .router
        .clone()
        .oneshot(upload_request(multipart_body("file", Some(name), data)))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    json_body(res).await["response"].clone()
}

#[tokio::test]
async fn health_ok() {
    let t = build(1024);

    let res = t.app.router.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), "ok");
}

#[tokio::test]
async fn upload_returns_wrapped_file_without_source_ref() {
    let t = build(1024);

    let res = t
        .app
        .router
        .clone()
        .oneshot(upload_request(multipart_body("file", Some("report.v2.csv"), b"a,b,c\n1,2,3\n")))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    assert!(res.headers().get("x-request-id").is_some());
    let body = json_body(res).await;
    let file = &body["response"];
    assert_eq!(file["title"], "report");
    assert_eq!(file["name"], "report.v2.csv");
    assert_eq!(file["description"], "");
    assert_eq!(file["size"], 12);
    assert_eq!(file["download_count"], 0);
    assert!(file.get("source_ref").is_none());
    assert!(file.get("source_id").is_none());
    assert_eq!(t.store.len(), 1);
}

#[tokio::test]
async fn upload_without_file_part_is_400() {
    let t = build(1024);

    let res = t
        .app
        .router
        .oneshot(upload_request(multipart_body("other", Some("a.txt"), b"x")))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    let body = json_body(res).await;
    assert_eq!(body["name"], "BadRequest");
    assert_eq!(body["className"], "bad-request");
    assert_eq!(body["message"], "file is required");
}

#[tokio::test]
async fn upload_without_filename_is_400() {
    let t = build(1024);

    let res = t
        .app
        .router
        .oneshot(upload_request(multipart_body("file", None, b"x")))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(json_body(res).await["message"], "file name is required");
}

#[tokio::test]
async fn oversized_upload_is_400_and_never_reaches_backend() {
    let t = build(100);

    let res = t
        .app
        .router
        .oneshot(upload_request(multipart_body("file", Some("big.bin"), &[7u8; 500])))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(json_body(res).await["message"], "file size is too large");
    assert_eq!(t.blobs.upload_calls(), 0);
    assert!(t.store.is_empty());
}

#[tokio::test]
async fn upload_at_exact_limit_is_accepted() {
    let t = build(100);
    let file = upload(&t.app, "edge.bin", &[1u8; 100]).await;
    assert_eq!(file["size"], 100);
}

#[tokio::test]
async fn upload_with_json_body_is_400() {
    let t = build(1024);

    let res = t
        .app
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/file/upload")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(json_body(res).await["code"], 400);
}

#[tokio::test]
async fn get_roundtrips_uploaded_file() {
    let t = build(1024);
    let uploaded = upload(&t.app, "notes.md", b"# notes").await;
    let id = uploaded["id"].as_str().unwrap();

    let res = t
        .app
        .router
        .oneshot(get_request(&format!("/api/v1/file/{id}")))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(json_body(res).await["response"], uploaded);
}

#[tokio::test]
async fn get_unknown_id_is_404() {
    let t = build(1024);

    let res = t
        .app
        .router
        .oneshot(get_request(&format!("/api/v1/file/{}", uuid::Uuid::new_v4())))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 404);
    let body = json_body(res).await;
    assert_eq!(body["name"], "NotFound");
    assert_eq!(body["code"], 404);
    assert_eq!(body["className"], "not-found");
    assert_eq!(body["message"], "file not found");
}

#[tokio::test]
async fn malformed_id_is_400() {
    let t = build(1024);

    let res = t.app.router.oneshot(get_request("/api/v1/file/not-a-uuid")).await.unwrap();

    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(json_body(res).await["name"], "BadRequest");
}

#[tokio::test]
async fn patch_updates_non_empty_fields() {
    let t = build(1024);
    let uploaded = upload(&t.app, "notes.md", b"# notes").await;
    let id = uploaded["id"].as_str().unwrap();

    let res = t
        .app
        .router
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/api/v1/file/{id}"))
                .header("content-type", "application/json")
                .body(Body::from(json!({"description": "team sync", "title": ""}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    let file = json_body(res).await["response"].clone();
    assert_eq!(file["description"], "team sync");
    assert_eq!(file["title"], "notes");
    assert_eq!(file["created_at"], uploaded["created_at"]);
}

#[tokio::test]
async fn patch_with_malformed_json_is_400() {
    let t = build(1024);
    let uploaded = upload(&t.app, "notes.md", b"# notes").await;
    let id = uploaded["id"].as_str().unwrap();

    let res = t
        .app
        .router
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri(format!("/api/v1/file/{id}"))
                .header("content-type", "application/json")
                .body(Body::from("{\"title\":"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    assert_eq!(json_body(res).await["className"], "bad-request");
}

#[tokio::test]
async fn download_streams_bytes_and_counts() {
    let t = build(1024);
    let data: Vec<u8> = (0..=255u8).cycle().take(300).collect();
    let uploaded = upload(&t.app, "report.v2.csv", &data).await;
    let id = uploaded["id"].as_str().unwrap();

    let res = t
        .app
        .router
        .clone()
        .oneshot(get_request(&format!("/api/v1/file/{id}/download")))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.headers()["content-type"], "application/octet-stream");
    let disposition = res.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"report.v2.csv\""));
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.as_ref(), data.as_slice());

    let res = t
        .app
        .router
        .oneshot(get_request(&format!("/api/v1/file/{id}")))
        .await
        .unwrap();
    assert_eq!(json_body(res).await["response"]["download_count"], 1);
}

#[tokio::test]
async fn download_unknown_id_is_404() {
    let t = build(1024);

    let res = t
        .app
        .router
        .oneshot(get_request(&format!("/api/v1/file/{}/download", uuid::Uuid::new_v4())))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn backend_failure_is_500_with_generic_message() {
    let t = build(1024);
    let uploaded = upload(&t.app, "gone.txt", b"bytes").await;
    let id = uploaded["id"].as_str().unwrap();
    let record = t.store.get(uuid::Uuid::parse_str(id).unwrap()).await.unwrap();
    t.blobs.delete(&record.source_ref).await.unwrap();

    let res = t
        .app
        .router
        .oneshot(get_request(&format!("/api/v1/file/{id}/download")))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 500);
    let body = json_body(res).await;
    assert_eq!(body["name"], "GeneralError");
    assert_eq!(body["className"], "general-error");
    assert_eq!(body["message"], "internal server error");
    assert!(!body.to_string().contains(record.source_ref.as_str()));
}

#[tokio::test]
async fn delete_returns_one_and_removes_file() {
    let t = build(1024);
    let uploaded = upload(&t.app, "tmp.txt", b"tmp").await;
    let id = uploaded["id"].as_str().unwrap();

    let res = t
        .app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/file/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(json_body(res).await, json!({"response": 1}));
    assert!(t.blobs.is_empty());

    let res = t
        .app
        .router
        .oneshot(get_request(&format!("/api/v1/file/{id}")))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn request_id_is_preserved_when_provided() {
    let t = build(1024);

    let provided = HeaderValue::from_static("req-test-123");
    let res = t
        .app
        .router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .header("x-request-id", provided.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.headers().get("x-request-id").unwrap(), &provided);
}
