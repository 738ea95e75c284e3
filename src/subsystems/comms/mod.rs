//! Comms subsystem — manages all external I/O channels.
//!
//! # Architecture
//!
//! Each channel (console, HTTP) implements [`Component`] and is spawned as an
//! independent concurrent task by [`start`] via [`spawn_components`].
//! Channels capture their shared [`Arc<CommsState>`] at construction time;
//! no state is passed through the generic `Component::run` signature.
//!
//! An intra-subsystem [`mpsc`] channel lets running channels signal the
//! comms manager (lifecycle events, session tracking). This is drained in a
//! short-lived background task that dies naturally when all channel senders
//! are dropped.
//!
//! # Starting
//!
//! [`start`] is synchronous — it returns a [`SubsystemHandle`] as soon as
//! the tasks are spawned. The caller decides when (or whether) to await it.

mod state;
#[cfg(feature = "channel-axum")]
pub mod axum_channel;
#[cfg(feature = "channel-pty")]
pub mod pty;

pub use state::{CommsEvent, CommsState};

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;
use crate::subsystems::history::ChatHistory;
use crate::subsystems::qa::QaEngine;
use crate::subsystems::rag::RagService;
use crate::subsystems::runtime::{Component, SubsystemHandle, spawn_components};
use crate::subsystems::settings::SettingsStore;

/// Engines shared by every channel.
pub struct Services {
    pub qa: Arc<QaEngine>,
    pub rag: Arc<RagService>,
    pub settings: Arc<SettingsStore>,
    pub history: Arc<ChatHistory>,
}

// ── start ───────────────────────────────────────────────────────────────────

/// Spawn the configured comms channels and return a [`SubsystemHandle`].
///
/// `interactive` adds the console channel. The HTTP channel is added when
/// `[server] enabled` is set. If any channel exits with an error the shared
/// `shutdown` token is cancelled so siblings stop cooperatively.
pub fn start(
    config: &Config,
    services: Services,
    interactive: bool,
    shutdown: CancellationToken,
) -> SubsystemHandle {
    // Intra-subsystem event channel: channels → manager.
    let (event_tx, event_rx) = mpsc::channel::<CommsEvent>(32);
    let state = Arc::new(CommsState::new(
        services.qa,
        services.rag,
        services.settings,
        services.history,
        event_tx,
    ));

    let mut components: Vec<Box<dyn Component>> = Vec::new();

    #[cfg(feature = "channel-pty")]
    {
        if interactive {
            info!("loading pty channel");
            components.push(Box::new(pty::PtyChannel::new("pty0", state.clone())));
        }
    }
    #[cfg(not(feature = "channel-pty"))]
    let _ = interactive;

    #[cfg(feature = "channel-axum")]
    {
        if config.server_should_load() {
            info!(bind = %config.server.bind, "loading axum channel");
            components.push(Box::new(axum_channel::AxumChannel::new(
                "http0",
                config.server.bind.clone(),
                state.clone(),
            )));
        }
    }
    #[cfg(not(feature = "channel-axum"))]
    let _ = config;

    if components.is_empty() {
        info!("no comms channels configured");
    }

    // Background event drain: monitoring only, ends when every channel has
    // dropped its sender.
    drop(state);
    tokio::spawn(async move {
        let mut rx = event_rx;
        while let Some(event) = rx.recv().await {
            match event {
                CommsEvent::ChannelShutdown { ref channel_id } => {
                    debug!(channel_id, "channel reported shutdown");
                }
                CommsEvent::SessionStarted { ref channel_id } => {
                    debug!(channel_id, "channel session started");
                }
            }
        }
    });

    spawn_components(components, shutdown)
}
