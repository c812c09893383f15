//! Shared fixtures for dispatch-server integration tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use dispatch_common::config::ServiceSettings;
use dispatch_server::{build_router, AppState};
use serde_json::Value;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

pub const LEGACY_PAYLOAD: &str =
    "TN05423869,DISP000004268324,ERDN0051,31-10-2025 09:09,450kms,9hrs,Gravel(25MT),TN36 AY0948,ERODE";

pub const EXTENDED_PAYLOAD: &str =
    "TN07000001,LES123,DISP000000000001,SLMN0001,15-09-2025 10:00,30kms,1hrs,Rough Stone (10 MT),TN30 AB1234,SALEM";

/// Router over a fresh in-memory database; the template lives in a temp dir
pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    pub dir: TempDir,
}

/// In-memory database with the full schema. One connection so every query
/// sees the same memory database.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Should open in-memory database");
    dispatch_common::db::create_schema(&pool)
        .await
        .expect("Should create schema");
    pool
}

pub async fn setup_app() -> TestApp {
    let db = setup_test_db().await;
    let dir = TempDir::new().expect("Should create temp dir");
    let state = AppState::new(
        db.clone(),
        ServiceSettings::default(),
        dir.path().join("template.docx"),
    );

    TestApp {
        router: build_router(state),
        db,
        dir,
    }
}

impl TestApp {
    /// Send a request and return status, headers and raw body
    pub async fn send_raw(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router should respond");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read body");
        (status, headers, bytes.to_vec())
    }

    /// Send an optional JSON body and parse the JSON response
    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Should build request");

        let (status, _, bytes) = self.send_raw(request).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    /// Store a scan from a raw payload and return its id
    pub async fn create_from_raw(&self, raw: &str) -> String {
        let (status, body) = self
            .send("POST", "/api/scans", Some(serde_json::json!({ "raw": raw })))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body["id"].as_str().expect("id should be a string").to_string()
    }
}

/// Error code from the standard error envelope
pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}
