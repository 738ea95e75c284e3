//! Router-level tests for the HTTP API, driven with `tower::ServiceExt`.
//!
//! Run with:
//!   cargo test --features channel-axum --test test_http_api

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

use smartqa::config::Config;
use smartqa::llm::LlmProvider;
use smartqa::llm::providers::dummy::DummyProvider;
use smartqa::subsystems::comms::CommsState;
use smartqa::subsystems::comms::axum_channel::build_router;
use smartqa::subsystems::history::ChatHistory;
use smartqa::subsystems::qa::QaEngine;
use smartqa::subsystems::rag::RagService;
use smartqa::subsystems::settings::SettingsStore;

// ── helpers ──────────────────────────────────────────────────────────────────

fn router(dir: &TempDir) -> Router {
    let config = Config::test_default(dir.path());
    let (tx, _rx) = mpsc::channel(8);
    let state = CommsState::new(
        Arc::new(QaEngine::open(&config)),
        Arc::new(RagService::open(&config, LlmProvider::Dummy(DummyProvider)).unwrap()),
        Arc::new(SettingsStore::open(&config.settings.path).unwrap()),
        Arc::new(ChatHistory::open(&config.history.path, config.history.cap)),
        tx,
    );
    build_router(Arc::new(state))
}

async fn call(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = router.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

// ── service info ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn root_and_status() {
    let dir = TempDir::new().unwrap();
    let app = router(&dir);

    let (status, body) = call(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "欢迎使用智能服务API" }));

    let (status, body) = call(&app, Method::GET, "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["status"], json!("running"));
    assert_eq!(body["model"], json!("dummy"));
    assert!(body["datetime"].as_str().is_some_and(|s| !s.is_empty()));
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let dir = TempDir::new().unwrap();
    let req = Request::builder()
        .uri("/api/status")
        .header("origin", "http://example.com")
        .body(Body::empty())
        .unwrap();
    let resp = router(&dir).oneshot(req).await.unwrap();
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
}

// ── document assistant ───────────────────────────────────────────────────────

#[tokio::test]
async fn chat_endpoints_without_documents() {
    let dir = TempDir::new().unwrap();
    let app = router(&dir);

    let (status, body) =
        call(&app, Method::POST, "/chat", Some(json!({ "user_id": "u1", "query": "房贷利率" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["docs"], json!([]));
    assert!(body["answer"].as_str().unwrap().contains("无相关背景知识"));

    let (status, body) =
        call(&app, Method::POST, "/api/chat/ask", Some(json!({ "query": "房贷利率" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["used_knowledge"], json!(false));
    assert_eq!(body["knowledge_items"], json!([]));
    assert!(body["processing_time"].is_number());
}

#[tokio::test]
async fn blank_query_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (status, body) =
        call(&router(&dir), Method::POST, "/api/chat/ask", Some(json!({ "query": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("invalid"));
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn knowledge_search_and_stats_on_empty_index() {
    let dir = TempDir::new().unwrap();
    let app = router(&dir);

    let (status, body) =
        call(&app, Method::POST, "/api/knowledge/search", Some(json!({ "query": "存款" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "results": [], "count": 0 }));

    let (_, body) = call(&app, Method::GET, "/api/knowledge/stats", None).await;
    assert_eq!(body, json!({ "success": true, "count": 0, "domains": [] }));
}

// ── FAQ ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn faq_ask_add_and_stats() {
    let dir = TempDir::new().unwrap();
    let app = router(&dir);

    let (status, body) =
        call(&app, Method::POST, "/api/faq/ask", Some(json!({ "query": "如何开立银行账户?" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["record_id"], json!(1));
    assert_eq!(body["result"]["matched"], json!(true));

    let entry = json!({
        "question": "信用卡年费怎么收?",
        "answer": "首年免年费。",
        "keywords": ["信用卡", "年费"],
    });
    let (status, body) = call(&app, Method::POST, "/api/faq/entries", Some(entry)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["record"]["id"], json!(3));
    assert_eq!(body["record"]["category"], json!("信用卡"));

    let (_, body) = call(&app, Method::GET, "/api/faq/stats", None).await;
    assert_eq!(body["records"], json!(3));
    assert_eq!(body["categories"]["信用卡"], json!(1));
}

#[tokio::test]
async fn faq_entry_without_answer_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (status, body) = call(
        &router(&dir),
        Method::POST,
        "/api/faq/entries",
        Some(json!({ "question": "问题", "answer": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("invalid"));
}

// ── settings & history ───────────────────────────────────────────────────────

#[tokio::test]
async fn settings_update_and_reset() {
    let dir = TempDir::new().unwrap();
    let app = router(&dir);

    let (_, body) = call(&app, Method::GET, "/api/settings", None).await;
    assert_eq!(body["night_mode"], json!(false));

    let (status, body) =
        call(&app, Method::PUT, "/api/settings", Some(json!({ "night_mode": true }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["night_mode"], json!(true));
    assert_eq!(body["font_size"], json!("medium"));

    let (_, body) = call(&app, Method::POST, "/api/settings/reset", None).await;
    assert_eq!(body["night_mode"], json!(false));
}

#[tokio::test]
async fn history_records_and_clears() {
    let dir = TempDir::new().unwrap();
    let app = router(&dir);

    call(&app, Method::POST, "/api/faq/ask", Some(json!({ "query": "如何开立银行账户?" }))).await;
    let (_, body) = call(&app, Method::GET, "/api/history", None).await;
    assert_eq!(body["count"], json!(2));
    assert_eq!(body["entries"][0]["is_user"], json!(true));

    let (status, _) = call(&app, Method::DELETE, "/api/history", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = call(&app, Method::GET, "/api/history", None).await;
    assert_eq!(body["count"], json!(0));
}
