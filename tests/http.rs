mod common;

use pretty_assertions::assert_eq;
use sentiment_api::api::{ErrorBody, PredictResponse};
use sentiment_api::{
    cors_layer, router, Normalizer, Sentiment, SentimentService, TrainingConfig,
    TrainingPipeline,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::tempdir;

async fn spawn_server(origins: &[&str]) -> SocketAddr {
    let dir = tempdir().unwrap();
    let pipeline = TrainingPipeline::new(Normalizer::new(), TrainingConfig::default());
    pipeline
        .fit_and_save(&common::polarized_reviews(), dir.path())
        .unwrap();
    let service = SentimentService::load(dir.path()).unwrap();
    let origins: Vec<String> = origins.iter().map(|o| o.to_string()).collect();
    let app = router(Arc::new(service), cors_layer(&origins).unwrap());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn post_raw(addr: SocketAddr, body: &'static str) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("http://{addr}/api/predict"))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn classifies_reviews() {
    let addr = spawn_server(&["*"]).await;
    for (review, expected) in [
        (
            "This movie was absolutely wonderful and brilliant!",
            Sentiment::Positive,
        ),
        (
            "This movie was terrible and boring, a complete waste of time.",
            Sentiment::Negative,
        ),
    ] {
        let response = reqwest::Client::new()
            .post(format!("http://{addr}/api/predict"))
            .json(&serde_json::json!({ "review": review }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: PredictResponse = response.json().await.unwrap();
        assert_eq!(body, PredictResponse { sentiment: expected });
    }
}

#[tokio::test]
async fn rejects_empty_and_malformed_bodies() {
    let addr = spawn_server(&["*"]).await;
    for body in [
        r#"{"review":""}"#,
        r#"{"review":"   "}"#,
        r#"{}"#,
        r#"{"review":7}"#,
        "this is not json",
        "",
    ] {
        let response = post_raw(addr, body).await;
        assert_eq!(response.status(), 400, "body {body:?}");
        let error: ErrorBody = response.json().await.unwrap();
        assert_eq!(
            error,
            ErrorBody {
                error: "Empty review".to_string()
            }
        );
    }
}

#[tokio::test]
async fn response_body_is_exactly_the_label() {
    let addr = spawn_server(&["*"]).await;
    let response = post_raw(addr, r#"{"review":"A wonderful film."}"#).await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "sentiment": "Positive" }));
}

#[tokio::test]
async fn cors_headers_follow_configuration() {
    let addr = spawn_server(&["*"]).await;
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/api/predict"))
        .header("origin", "http://localhost:3000")
        .json(&serde_json::json!({ "review": "good" }))
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );

    let addr = spawn_server(&["http://localhost:3000"]).await;
    let allowed = reqwest::Client::new()
        .post(format!("http://{addr}/api/predict"))
        .header("origin", "http://localhost:3000")
        .json(&serde_json::json!({ "review": "good" }))
        .send()
        .await
        .unwrap();
    assert_eq!(
        allowed.headers()["access-control-allow-origin"],
        "http://localhost:3000"
    );
    let denied = reqwest::Client::new()
        .post(format!("http://{addr}/api/predict"))
        .header("origin", "http://evil.example")
        .json(&serde_json::json!({ "review": "good" }))
        .send()
        .await
        .unwrap();
    assert!(denied
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}

#[tokio::test]
async fn health_check_reports_ok() {
    let addr = spawn_server(&["*"]).await;
    let response = reqwest::get(format!("http://{addr}/healthz")).await.unwrap();
    assert_eq!(response.status(), 200);
}
