//! API integration tests against a real listener

use mathboard_server::{Database, ServerConfig};
use serde_json::{json, Value};
use tempfile::TempDir;

async fn spawn_app() -> (String, TempDir) {
    let db = Database::open_memory().unwrap();

    let static_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        static_dir.path().join("index.html"),
        "<!doctype html><title>Mathboard</title>",
    )
    .unwrap();

    let config = ServerConfig {
        static_dir: static_dir.path().to_path_buf(),
        ..Default::default()
    };
    let app = mathboard_server::server::app(db, &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), static_dir)
}

#[tokio::test]
async fn health_reports_ok() {
    let (base, _static_dir) = spawn_app().await;

    let body: Value = reqwest::get(format!("{}/api/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "mathboard-server");
}

#[tokio::test]
async fn create_and_list_users() {
    let (base, _static_dir) = spawn_app().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/users", base))
        .json(&json!({ "name": "SmokeTest" }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "success");
    assert_eq!(body["data"]["name"], "SmokeTest");
    assert_eq!(body["data"]["icon"], "smile");
    assert_eq!(body["data"]["id"], 1);

    let body: Value = client
        .get(format!("{}/api/users", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], "SmokeTest");
}

#[tokio::test]
async fn create_user_requires_name() {
    let (base, _static_dir) = spawn_app().await;
    let client = reqwest::Client::new();

    for payload in [json!({}), json!({ "name": "" })] {
        let resp = client
            .post(format!("{}/api/users", base))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Name is required");
    }
}

#[tokio::test]
async fn duplicate_profile_name_is_rejected() {
    let (base, _static_dir) = spawn_app().await;
    let client = reqwest::Client::new();

    let payload = json!({ "name": "Twin" });
    let first = client
        .post(format!("{}/api/users", base))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert!(first.status().is_success());

    let second = client
        .post(format!("{}/api/users", base))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 400);

    let body: Value = second.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("UNIQUE"));
}

#[tokio::test]
async fn results_compute_correctness_server_side() {
    let (base, _static_dir) = spawn_app().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/api/users", base))
        .json(&json!({ "name": "Quizzer" }))
        .send()
        .await
        .unwrap();

    let body: Value = client
        .post(format!("{}/api/results", base))
        .json(&json!({
            "user_id": 1,
            "factor_a": 6,
            "factor_b": 7,
            "user_answer": 42,
            "time_taken_ms": 1500,
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["message"], "success");
    assert_eq!(body["data"]["is_correct"], true);

    let body: Value = client
        .post(format!("{}/api/results", base))
        .json(&json!({
            "user_id": 1,
            "factor_a": 6,
            "factor_b": 7,
            "user_answer": 41,
            "time_taken_ms": 1500,
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["is_correct"], false);
}

#[tokio::test]
async fn results_require_all_fields() {
    let (base, _static_dir) = spawn_app().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/results", base))
        .json(&json!({ "user_id": 1, "factor_a": 6 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Missing required fields");
}

#[tokio::test]
async fn stats_aggregate_per_factor_pair() {
    let (base, _static_dir) = spawn_app().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/api/users", base))
        .json(&json!({ "name": "Statist" }))
        .send()
        .await
        .unwrap();

    for (answer, time) in [(12, 1000), (13, 3000)] {
        client
            .post(format!("{}/api/results", base))
            .json(&json!({
                "user_id": 1,
                "factor_a": 3,
                "factor_b": 4,
                "user_answer": answer,
                "time_taken_ms": time,
            }))
            .send()
            .await
            .unwrap();
    }

    let body: Value = client
        .get(format!("{}/api/stats/1", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["attempts"], 2);
    assert_eq!(rows[0]["correct_count"], 1);
    assert_eq!(rows[0]["avg_time"], 2000.0);
}

#[tokio::test]
async fn spa_fallback_serves_index() {
    let (base, _static_dir) = spawn_app().await;

    let resp = reqwest::get(format!("{}/stats", base)).await.unwrap();
    assert!(resp.status().is_success());

    let text = resp.text().await.unwrap();
    assert!(text.contains("Mathboard"));
}
