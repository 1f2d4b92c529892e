// ABOUTME: HTTP ingress exposing the platform webhook, goal-alert webhook, and healthcheck routes.
// ABOUTME: Validates payloads via the normalizer and enqueues updates; never blocks on handling.

use std::future::Future;

use anyhow::{Context as _, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use crate::bus::QueuedUpdate;
use crate::metrics;
use crate::normalize;

/// Fixed liveness body; independent of queue depth and the outbound client.
pub const HEALTHCHECK_BODY: &str = "The bot is still running fine :)";

/// Acknowledgement returned once a goal alert has been enqueued.
pub const ALERT_ACK_BODY: &str = "Thank you for the submission! It's being forwarded.";

/// State shared by the ingress handlers: the queue's send side.
#[derive(Clone)]
pub struct IngressState {
    pub queue_tx: UnboundedSender<QueuedUpdate>,
}

/// Build the ingress router with the three data routes.
pub fn router(state: IngressState) -> Router {
    Router::new()
        .route("/platform", post(platform_update))
        .route("/external/{recipient_id}", post(goal_alert))
        .route("/healthcheck", get(healthcheck))
        .with_state(state)
}

/// Serve the app until the shutdown future resolves, then stop accepting
/// new connections and let in-flight requests complete.
pub async fn serve(
    bind_addr: &str,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    tracing::info!(addr = %bind_addr, "Starting ingress server");
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind ingress listener on {}", bind_addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Ingress server failed")?;
    Ok(())
}

/// POST /platform -- enqueue a platform update envelope.
pub async fn platform_update(
    State(state): State<IngressState>,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let update = match normalize::normalize_platform_update(body) {
        Ok(update) => update,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected platform update");
            metrics::record_ingress_request("platform", "bad_request");
            return (StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    match state.queue_tx.send(QueuedUpdate::new(update)) {
        Ok(()) => {
            metrics::record_ingress_request("platform", "accepted");
            (StatusCode::OK, String::new())
        }
        Err(e) => {
            tracing::error!(error = %e, "Update queue closed, rejecting platform update");
            metrics::record_ingress_request("platform", "queue_closed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Dispatcher unavailable".to_string(),
            )
        }
    }
}

/// POST /external/{recipient_id} -- validate and enqueue a goal alert.
///
/// Validation failures return a 4xx before anything touches the queue.
pub async fn goal_alert(
    State(state): State<IngressState>,
    Path(recipient_id): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let update = match normalize::normalize_goal_alert(&recipient_id, &body) {
        Ok(update) => update,
        Err(e) => {
            tracing::debug!(recipient_segment = %recipient_id, error = %e, "Rejected goal alert");
            metrics::record_ingress_request("external", "bad_request");
            return (StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    match state.queue_tx.send(QueuedUpdate::new(update)) {
        Ok(()) => {
            metrics::record_ingress_request("external", "accepted");
            (StatusCode::OK, ALERT_ACK_BODY.to_string())
        }
        Err(e) => {
            tracing::error!(error = %e, "Update queue closed, rejecting goal alert");
            metrics::record_ingress_request("external", "queue_closed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Dispatcher unavailable".to_string(),
            )
        }
    }
}

/// GET /healthcheck -- liveness probe, succeeds even with a stalled queue.
pub async fn healthcheck() -> &'static str {
    HEALTHCHECK_BODY
}
