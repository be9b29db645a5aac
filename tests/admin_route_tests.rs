mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use cffc::db::{TimestampPatch, Timestamper, Vendor, VendorStore};
use cffc::server::router::{AppState, app_router};
use cffc::{Cid, StoreError, StoreResult};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// Records the last call and answers with a canned outcome.
#[derive(Default)]
struct StubTimestamper {
    outcome: Mutex<Option<StoreError>>,
    seen: Mutex<Vec<(String, Uuid, String)>>,
    delay: Option<Duration>,
}

impl StubTimestamper {
    fn failing(err: StoreError) -> Self {
        Self {
            outcome: Mutex::new(Some(err)),
            ..Self::default()
        }
    }

    async fn answer(&self, table: &str, id: Uuid, cid: &Cid) -> StoreResult<()> {
        self.seen
            .lock()
            .unwrap()
            .push((table.to_string(), id, cid.to_string()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.outcome.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Timestamper for StubTimestamper {
    async fn patch_timestamps(
        &self,
        table: &str,
        id: Uuid,
        _patch: &TimestampPatch,
        cid: &Cid,
    ) -> StoreResult<()> {
        self.answer(table, id, cid).await
    }

    async fn undelete(&self, table: &str, id: Uuid, cid: &Cid) -> StoreResult<()> {
        self.answer(table, id, cid).await
    }
}

fn app(stub: Arc<StubTimestamper>) -> Router {
    app_router(AppState::new(stub, Duration::from_secs(5)))
}

fn undelete_request(path: &str) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_check_answers_ok() {
    let resp = app(Arc::default())
        .oneshot(Request::get("/hc").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn unknown_path_is_404() {
    let resp = app(Arc::default())
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_forwards_table_id_and_request_id() {
    let stub = Arc::new(StubTimestamper::default());
    let id = Uuid::new_v4();
    let body = serde_json::json!({
        "fields": ["mtime"],
        "values": { "mtime": "2024-01-01T00:00:00Z" },
        "origin": { "mtime": "2023-12-31T00:00:00Z" },
    });
    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/ts/strains/{id}"))
        .header("content-type", "application/json")
        .header("x-request-id", "trace-me")
        .body(Body::from(body.to_string()))
        .unwrap();

    let resp = app(stub.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(resp.headers()["x-request-id"], "trace-me");

    let seen = stub.seen.lock().unwrap();
    assert_eq!(
        seen.as_slice(),
        &[("strains".to_string(), id, "trace-me".to_string())]
    );
}

#[tokio::test]
async fn missing_request_id_gets_a_generated_one() {
    let stub = Arc::new(StubTimestamper::default());
    let resp = app(stub.clone())
        .oneshot(undelete_request(&format!("/undel/vendors/{}", Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let echoed = resp.headers()["x-request-id"].to_str().unwrap().to_string();
    assert_eq!(echoed.len(), 16);
    assert_eq!(stub.seen.lock().unwrap()[0].2, echoed);
}

#[tokio::test]
async fn malformed_id_is_a_validation_error() {
    let stub = Arc::new(StubTimestamper::default());
    let resp = app(stub.clone())
        .oneshot(undelete_request("/undel/vendors/not-a-uuid"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    assert!(stub.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_patch_body_uses_the_error_envelope() {
    let stub = Arc::new(StubTimestamper::default());
    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/ts/vendors/{}", Uuid::new_v4()))
        .header("content-type", "application/json")
        .body(Body::from("{\"fields\": [\"mtime\""))
        .unwrap();

    let resp = app(stub.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.headers().contains_key("x-request-id"));
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    assert!(body["error"]["message"].as_str().is_some_and(|m| !m.is_empty()));
    assert!(stub.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn patch_without_json_content_type_is_a_validation_error() {
    let stub = Arc::new(StubTimestamper::default());
    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/ts/vendors/{}", Uuid::new_v4()))
        .body(Body::from("{}"))
        .unwrap();

    let resp = app(stub.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    assert!(stub.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn store_errors_map_to_statuses() {
    let id = Uuid::new_v4();
    let cases = [
        (
            StoreError::Conflict {
                table: "vendors",
                id,
            },
            StatusCode::CONFLICT,
        ),
        (
            StoreError::NotDeleted {
                table: "vendors",
                id,
            },
            StatusCode::CONFLICT,
        ),
        (StoreError::not_found("vendors", id), StatusCode::NOT_FOUND),
        (
            StoreError::IdExhausted {
                table: "vendors",
                attempts: 5,
            },
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, status) in cases {
        let stub = Arc::new(StubTimestamper::failing(err));
        let resp = app(stub)
            .oneshot(undelete_request(&format!("/undel/vendors/{id}")))
            .await
            .unwrap();
        assert_eq!(resp.status(), status);
    }
}

#[tokio::test]
async fn slow_handler_hits_the_deadline() {
    let stub = Arc::new(StubTimestamper {
        delay: Some(Duration::from_millis(200)),
        ..StubTimestamper::default()
    });
    let router = app_router(AppState::new(stub, Duration::from_millis(20)));
    let resp = router
        .oneshot(undelete_request(&format!("/undel/vendors/{}", Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);
    assert!(resp.headers().contains_key("x-request-id"));
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], "REQUEST_TIMEOUT");
}

#[tokio::test]
async fn undelete_of_live_row_is_conflict_end_to_end() {
    let store = common::store("route-undelete").await;
    let vendor = store
        .insert_vendor(
            &Vendor {
                name: "live".to_string(),
                ..Vendor::default()
            },
            &common::cid(),
        )
        .await
        .unwrap();

    let router = app_router(AppState::new(Arc::new(store), Duration::from_secs(5)));
    let resp = router
        .clone()
        .oneshot(undelete_request(&format!("/undel/vendors/{}", vendor.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = router
        .oneshot(undelete_request(&format!("/undel/sqlite_master/{}", vendor.id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
