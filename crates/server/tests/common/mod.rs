//! Common test utilities for in-process API testing.
//!
//! This module provides a test fixture that builds the router over a real
//! engine (SQLite stores in a temp dir, filesystem mover), so requests can be
//! sent with `oneshot` and their effects checked on disk.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use dropsort_core::config::DatabaseConfig;
use dropsort_core::{
    Config, FolderStore, HistoryLedger, MonitorConfig, SortingEngine,
    SqliteFolderStore, SqliteHistoryLedger,
};
use dropsort_server::state::AppState;


/// Test fixture for API testing.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_folder_creation() {
///     let fixture = TestFixture::new();
///     let response = fixture.post("/api/v1/folders", json!({ ... })).await;
///     assert_eq!(response.status, StatusCode::CREATED);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Engine behind the router, for direct assertions
    pub engine: Arc<SortingEngine>,
    /// Temporary directory for the database and watched folders
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            monitor: MonitorConfig {
                max_watches: 2,
                settle_delay_ms: 20,
                scan_existing: true,
                revert_guard_linger_ms: 200,
            },
            ..Config::default()
        };

        let folders: Arc<dyn FolderStore> =
            Arc::new(SqliteFolderStore::new(&db_path).expect("Failed to create folder store"));
        let ledger: Arc<dyn HistoryLedger> =
            Arc::new(SqliteHistoryLedger::new(&db_path).expect("Failed to create ledger"));
        let engine = Arc::new(SortingEngine::from_config(&config, folders, ledger));

        let state = Arc::new(AppState::new(config, Arc::clone(&engine)));
        let router = dropsort_server::api::create_router(state);

        Self {
            router,
            engine,
            temp_dir,
        }
    }

    /// Create `<temp>/<name>/in` and return (source, destination).
    pub fn dirs(&self, name: &str) -> (PathBuf, PathBuf) {
        let base = self.temp_dir.path().join(name);
        let source = base.join("in");
        std::fs::create_dir_all(&source).expect("Failed to create source dir");
        (source, base.join("out"))
    }

    /// Poll `GET path` until `check` accepts the body or the deadline passes.
    pub async fn poll<F>(&self, path: &str, mut check: F) -> TestResponse
    where
        F: FnMut(&Value) -> bool,
    {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        loop {
            let response = self.get(path).await;
            if check(&response.body) || tokio::time::Instant::now() >= deadline {
                return response;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(path);
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();

        let body = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).to_string()))
        };

        TestResponse { status, body }
    }
}
