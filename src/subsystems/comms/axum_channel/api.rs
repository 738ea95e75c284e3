//! Axum handlers for the JSON API.
//!
//! Each handler receives [`AxumState`] via [`axum::extract::State`] and
//! returns an axum [`Response`]. Errors are JSON `{error, message}` bodies.

use std::time::Duration;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::subsystems::qa::NewEntry;
use crate::subsystems::settings::Settings;

use super::AxumState;

/// Upper bound on one retrieval-plus-generation round trip.
const RAG_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_SEARCH_LIMIT: usize = 3;

// ── Request types ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct ChatRequest {
    query: String,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct SearchRequest {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Deserialize)]
pub(super) struct AskRequest {
    query: String,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Build a JSON error response body.
fn json_error(code: &str, msg: impl std::fmt::Display) -> Json<serde_json::Value> {
    Json(json!({ "error": code, "message": format!("{msg}") }))
}

fn error_response(channel_id: &str, what: &str, e: AppError) -> Response {
    warn!(channel_id, "{what} failed: {e}");
    let (status, code) = match &e {
        AppError::Knowledge(_) => (StatusCode::BAD_REQUEST, "invalid"),
        AppError::Rag(_) => (StatusCode::BAD_GATEWAY, "retrieval"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    };
    (status, json_error(code, e)).into_response()
}

fn empty_query() -> Response {
    (StatusCode::BAD_REQUEST, json_error("invalid", "query must not be empty")).into_response()
}

fn timed_out() -> Response {
    (StatusCode::GATEWAY_TIMEOUT, json_error("timeout", "LLM request timed out")).into_response()
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET /
pub(super) async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "欢迎使用智能服务API" }))
}

/// GET /api/status
pub(super) async fn status(State(state): State<AxumState>) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "status": "running",
        "model": state.comms.model(),
        "datetime": Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }))
}

/// POST /chat — `{answer, docs}`.
pub(super) async fn chat(
    State(state): State<AxumState>,
    Json(req): Json<ChatRequest>,
) -> Response {
    if req.query.trim().is_empty() {
        return empty_query();
    }
    let user_id = req.user_id.as_deref().unwrap_or("anonymous");
    let answer = state.comms.ask_rag(&state.channel_id, &req.query, None);
    match tokio::time::timeout(RAG_TIMEOUT, answer).await {
        Ok(Ok(out)) => {
            debug!(user_id, docs = out.docs.len(), "chat answered");
            Json(json!({ "answer": out.answer, "docs": out.docs })).into_response()
        }
        Ok(Err(e)) => error_response(&state.channel_id, "chat", e),
        Err(_) => timed_out(),
    }
}

/// POST /api/chat/ask — the front-end shape of `/chat`.
pub(super) async fn chat_ask(
    State(state): State<AxumState>,
    Json(req): Json<ChatRequest>,
) -> Response {
    if req.query.trim().is_empty() {
        return empty_query();
    }
    let answer = state.comms.ask_rag(&state.channel_id, &req.query, None);
    match tokio::time::timeout(RAG_TIMEOUT, answer).await {
        Ok(Ok(out)) => Json(json!({
            "success": true,
            "answer": out.answer,
            "used_knowledge": !out.docs.is_empty(),
            "knowledge_items": out.docs,
            "processing_time": out.elapsed,
        }))
        .into_response(),
        Ok(Err(e)) => error_response(&state.channel_id, "chat ask", e),
        Err(_) => timed_out(),
    }
}

/// POST /api/knowledge/search
pub(super) async fn knowledge_search(
    State(state): State<AxumState>,
    Json(req): Json<SearchRequest>,
) -> Response {
    let limit = req.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    match state.comms.search_knowledge(&req.query, limit).await {
        Ok(docs) => {
            let results: Vec<_> = docs
                .into_iter()
                .map(|d| json!({ "id": d.id, "content": d.content, "metadata": d.metadata }))
                .collect();
            Json(json!({ "success": true, "count": results.len(), "results": results }))
                .into_response()
        }
        Err(e) => error_response(&state.channel_id, "knowledge search", e),
    }
}

/// GET /api/knowledge/stats
pub(super) async fn knowledge_stats(State(state): State<AxumState>) -> Json<serde_json::Value> {
    let stats = state.comms.knowledge_stats().await;
    Json(json!({ "success": true, "count": stats.count, "domains": stats.sources }))
}

/// POST /api/faq/ask
pub(super) async fn faq_ask(State(state): State<AxumState>, Json(req): Json<AskRequest>) -> Response {
    if req.query.trim().is_empty() {
        return empty_query();
    }
    match state.comms.ask_faq(&state.channel_id, req.query).await {
        Ok(answer) => Json(json!({ "success": true, "result": answer })).into_response(),
        Err(e) => error_response(&state.channel_id, "faq ask", e),
    }
}

/// POST /api/faq/entries
pub(super) async fn faq_add(State(state): State<AxumState>, Json(entry): Json<NewEntry>) -> Response {
    match state.comms.add_faq_entry(entry).await {
        Ok(record) => {
            (StatusCode::CREATED, Json(json!({ "success": true, "record": record }))).into_response()
        }
        Err(e) => error_response(&state.channel_id, "faq add", e),
    }
}

/// GET /api/faq/stats
pub(super) async fn faq_stats(State(state): State<AxumState>) -> Json<serde_json::Value> {
    let stats = state.comms.faq_stats();
    let categories: serde_json::Map<_, _> = stats
        .categories
        .into_iter()
        .map(|(name, n)| (name, json!(n)))
        .collect();
    Json(json!({ "success": true, "records": stats.records, "categories": categories }))
}

/// GET /api/settings
pub(super) async fn settings_get(State(state): State<AxumState>) -> Json<Settings> {
    Json(state.comms.settings())
}

/// PUT /api/settings — merge the body into the stored settings.
pub(super) async fn settings_put(
    State(state): State<AxumState>,
    Json(patch): Json<Settings>,
) -> Response {
    match state.comms.update_settings(patch) {
        Ok(settings) => Json(settings).into_response(),
        Err(e) => error_response(&state.channel_id, "settings update", e),
    }
}

/// POST /api/settings/reset
pub(super) async fn settings_reset(State(state): State<AxumState>) -> Response {
    match state.comms.reset_settings() {
        Ok(settings) => Json(settings).into_response(),
        Err(e) => error_response(&state.channel_id, "settings reset", e),
    }
}

/// GET /api/history
pub(super) async fn history_get(State(state): State<AxumState>) -> Json<serde_json::Value> {
    let entries = state.comms.history();
    Json(json!({ "success": true, "count": entries.len(), "entries": entries }))
}

/// DELETE /api/history
pub(super) async fn history_clear(State(state): State<AxumState>) -> Response {
    match state.comms.clear_history().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(&state.channel_id, "history clear", e),
    }
}
