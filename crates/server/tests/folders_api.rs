//! Folder API integration tests.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestFixture;

fn folder_body(name: &str, source: &std::path::Path, destination: &std::path::Path) -> serde_json::Value {
    json!({
        "name": name,
        "source": source,
        "destination": destination,
        "rule": { "criteria": "extension", "value": ".pdf,.docx" },
        "ignore": ["tmp"]
    })
}

#[tokio::test]
async fn test_health_and_config() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["active_watches"], 0);

    let response = fixture.get("/api/v1/config").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["monitor"]["max_watches"], 2);
    assert_eq!(response.body["logging"]["format"], "pretty");
}

#[tokio::test]
async fn test_create_list_get_delete_folder() {
    let fixture = TestFixture::new();
    let (source, destination) = fixture.dirs("docs");

    let response = fixture
        .post("/api/v1/folders", folder_body("Docs", &source, &destination))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let id = response.body["id"].as_str().unwrap().to_string();
    assert_eq!(response.body["rule"]["criteria"], "extension");
    assert_eq!(response.body["rule"]["value"], ".pdf,.docx");
    assert_eq!(response.body["ignore"], json!(["tmp"]));
    assert_eq!(response.body["monitoring"], false);

    let response = fixture.get("/api/v1/folders").await;
    assert_eq!(response.body["total"], 1);

    let response = fixture.get(&format!("/api/v1/folders/{id}")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["name"], "Docs");

    let response = fixture.delete(&format!("/api/v1/folders/{id}")).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = fixture.get(&format!("/api/v1/folders/{id}")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["category"], "not_found");
}

#[tokio::test]
async fn test_invalid_folders_are_bad_requests() {
    let fixture = TestFixture::new();
    let (source, destination) = fixture.dirs("docs");

    let mut bad_rule = folder_body("Docs", &source, &destination);
    bad_rule["rule"] = json!({ "criteria": "pattern", "value": "([unclosed" });
    let response = fixture.post("/api/v1/folders", bad_rule).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let mut bad_date = folder_body("Docs", &source, &destination);
    bad_date["rule"] = json!({ "criteria": "creationDate", "value": "2024-01-31" });
    let response = fixture.post("/api/v1/folders", bad_date).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let missing_source = folder_body("Docs", &fixture.temp_dir.path().join("nope"), &destination);
    let response = fixture.post("/api/v1/folders", missing_source).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["category"], "validation");

    let response = fixture
        .post("/api/v1/folders", folder_body("Docs", &source, &destination))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    let response = fixture
        .post("/api/v1/folders", folder_body("Again", &source, &destination))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_start_stop_and_capacity() {
    let fixture = TestFixture::new();
    let mut ids = Vec::new();
    for name in ["a", "b", "c"] {
        let (source, destination) = fixture.dirs(name);
        let response = fixture
            .post("/api/v1/folders", folder_body(name, &source, &destination))
            .await;
        ids.push(response.body["id"].as_str().unwrap().to_string());
    }

    for id in &ids[..2] {
        let response = fixture.post_empty(&format!("/api/v1/folders/{id}/start")).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["success"], true);
    }

    let response = fixture
        .post_empty(&format!("/api/v1/folders/{}/start", ids[0]))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let response = fixture
        .post_empty(&format!("/api/v1/folders/{}/start", ids[2]))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["success"], false);
    assert!(response.body["message"].as_str().unwrap().contains("(2)"));

    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.body["active_watches"], 2);

    let response = fixture
        .post_empty(&format!("/api/v1/folders/{}/stop", ids[0]))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let response = fixture.get(&format!("/api/v1/folders/{}", ids[0])).await;
    assert_eq!(response.body["monitoring"], false);

    let response = fixture
        .post_empty(&format!("/api/v1/folders/{}/stop", ids[0]))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["success"], false);

    fixture.engine.shutdown().await;
}

#[tokio::test]
async fn test_unknown_folder_start_is_not_found() {
    let fixture = TestFixture::new();
    let response = fixture.post_empty("/api/v1/folders/missing/start").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "not_found");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.get("/api/v1/health").await;

    let (status, text) = fixture.get_text("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(text.contains("dropsort_http_requests_total"));
    assert!(text.contains("dropsort_active_watches"));
}
