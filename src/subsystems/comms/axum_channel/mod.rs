//! Axum-based HTTP channel — the JSON API consumed by the web and mobile
//! front ends.
//!
//! Implements [`Component`] so it slots into the comms subsystem lifecycle:
//! `run()` drives the axum event loop; the shared [`CancellationToken`] is
//! wired to axum's graceful shutdown. CORS is open to every origin.
//!
//! ## URL layout
//!
//! ```text
//! GET    /                         welcome message
//! GET    /api/status
//! POST   /chat                     document assistant, raw shape
//! POST   /api/chat/ask             document assistant, front-end shape
//! POST   /api/knowledge/search
//! GET    /api/knowledge/stats
//! POST   /api/faq/ask
//! POST   /api/faq/entries
//! GET    /api/faq/stats
//! GET    /api/settings
//! PUT    /api/settings
//! POST   /api/settings/reset
//! GET    /api/history
//! DELETE /api/history
//! GET    /favicon.ico              → 204
//! ```

mod api;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::error::AppError;
use crate::subsystems::runtime::{Component, ComponentFuture};

use super::state::{CommsEvent, CommsState};

// ── Shared request state ──────────────────────────────────────────────────────

/// Axum router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone — all fields are reference-counted.
#[derive(Clone)]
pub(crate) struct AxumState {
    /// Channel identifier used in log spans.
    pub channel_id: Arc<str>,
    pub comms: Arc<CommsState>,
}

// ── AxumChannel ───────────────────────────────────────────────────────────────

pub struct AxumChannel {
    channel_id: String,
    bind_addr: String,
    state: Arc<CommsState>,
}

impl AxumChannel {
    pub fn new(
        channel_id: impl Into<String>,
        bind_addr: impl Into<String>,
        state: Arc<CommsState>,
    ) -> Self {
        Self { channel_id: channel_id.into(), bind_addr: bind_addr.into(), state }
    }
}

impl Component for AxumChannel {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(run_axum(self.channel_id, self.bind_addr, self.state, shutdown))
    }
}

// ── Server loop ───────────────────────────────────────────────────────────────

async fn run_axum(
    channel_id: String,
    bind_addr: String,
    comms: Arc<CommsState>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let router = router_for(&channel_id, comms.clone());

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AppError::Comms(format!("axum bind failed on {bind_addr}: {e}")))?;

    info!(%channel_id, %bind_addr, "axum channel listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Comms(format!("axum server error: {e}")))?;

    info!(%channel_id, "axum channel shut down");
    comms.report_event(CommsEvent::ChannelShutdown { channel_id });
    Ok(())
}

// ── Router ────────────────────────────────────────────────────────────────────

/// Build the API router over `comms`. Exposed so the routes can be driven
/// without a listening socket.
pub fn build_router(comms: Arc<CommsState>) -> Router {
    router_for("http", comms)
}

fn router_for(channel_id: &str, comms: Arc<CommsState>) -> Router {
    let state = AxumState { channel_id: Arc::from(channel_id), comms };
    Router::new()
        .route("/",                     get(api::root))
        .route("/api/status",           get(api::status))
        .route("/chat",                 post(api::chat))
        .route("/api/chat/ask",         post(api::chat_ask))
        .route("/api/knowledge/search", post(api::knowledge_search))
        .route("/api/knowledge/stats",  get(api::knowledge_stats))
        .route("/api/faq/ask",          post(api::faq_ask))
        .route("/api/faq/entries",      post(api::faq_add))
        .route("/api/faq/stats",        get(api::faq_stats))
        .route("/api/settings",         get(api::settings_get).put(api::settings_put))
        .route("/api/settings/reset",   post(api::settings_reset))
        .route("/api/history",          get(api::history_get).delete(api::history_clear))
        .route("/favicon.ico",          get(|| async { StatusCode::NO_CONTENT }))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
