//! Liveness endpoint with a best-effort operator ping.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use tracing::warn;

use gigwatch_notify::{ChannelMessage, Notifier};

/// Body returned to uptime probes.
const HEALTH_BODY: &str = "Healthcheck: Server Active";
/// Message sent to the operator chat on each probe.
const HEALTH_PING: &str = "Healthcheck: Server Active ✅️";

pub struct AppState {
    pub notifier: Arc<dyn Notifier>,
    pub ops_chat: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new().route("/", get(health)).with_state(state)
}

/// Answer the probe immediately; the operator ping goes out in the
/// background and its failure is only logged.
async fn health(State(state): State<Arc<AppState>>) -> &'static str {
    let notifier = state.notifier.clone();
    let ops_chat = state.ops_chat.clone();
    tokio::spawn(async move {
        let ping = ChannelMessage::plain(HEALTH_PING);
        if let Err(e) = notifier.send(&ops_chat, &ping).await {
            warn!(chat = %ops_chat, error = %e, "healthcheck ping failed");
        }
    });
    HEALTH_BODY
}
