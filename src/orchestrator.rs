// ABOUTME: Lifecycle orchestrator supervising the outbound client, dispatch loop, and ingress.
// ABOUTME: Drives Created -> Starting -> Running -> Stopping -> Stopped with ordered shutdown.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use crate::bus::SharedData;
use crate::config::Config;
use crate::dispatch;
use crate::handlers;
use crate::metrics;
use crate::server::{self, IngressState};
use crate::telegram::OutboundClient;

/// Process lifecycle states, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LifecycleState::Created => "created",
            LifecycleState::Starting => "starting",
            LifecycleState::Running => "running",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Supervises the three long-lived tasks without sitting on the data path.
///
/// Owns the outbound client and lends it to handlers via the registry; the
/// shutdown sequence guarantees the client outlives every handler
/// invocation that might use it.
pub struct Orchestrator {
    config: Arc<Config>,
    outbound: Arc<dyn OutboundClient>,
    state: LifecycleState,
}

impl Orchestrator {
    pub fn new(config: Arc<Config>, outbound: Arc<dyn OutboundClient>) -> Self {
        Self {
            config,
            outbound,
            state: LifecycleState::Created,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    fn transition(&mut self, next: LifecycleState) {
        tracing::info!(from = %self.state, to = %next, "Lifecycle transition");
        self.state = next;
    }

    /// Run the gateway until the shutdown future resolves.
    ///
    /// Any failure before `Running` is fatal and aborts startup. On
    /// shutdown: the ingress stops accepting connections and drains
    /// in-flight requests, the queue's send side closes, the dispatch loop
    /// finishes the update it is handling plus whatever was already
    /// enqueued, and only then is the outbound client released.
    pub async fn run(mut self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        self.transition(LifecycleState::Starting);

        self.outbound
            .register_webhook(&self.config.platform_webhook_url())
            .await
            .context("Webhook registration failed during startup")?;

        let registry = handlers::build_registry(Arc::clone(&self.outbound));
        registry
            .verify_complete()
            .context("Handler registry is incomplete")?;

        let shared = Arc::new(SharedData {
            base_url: self.config.gateway.base_url.clone(),
        });

        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let dispatch_task = tokio::spawn(dispatch::run_dispatch_loop(
            queue_rx,
            Arc::new(registry),
            shared,
        ));

        let metrics_handle = metrics::init_metrics()?;
        let app = build_app(IngressState { queue_tx: queue_tx.clone() }, metrics_handle);

        self.transition(LifecycleState::Running);
        server::serve(&self.config.bind_addr(), app, shutdown).await?;

        self.transition(LifecycleState::Stopping);
        // Close the queue so the dispatch loop drains and exits; the ingress
        // held the only other sender and has already shut down.
        drop(queue_tx);
        dispatch_task
            .await
            .context("Dispatch loop terminated abnormally")?;

        self.transition(LifecycleState::Stopped);
        Ok(())
    }
}

/// Compose the ingress routes with the metrics endpoint and request tracing.
fn build_app(state: IngressState, metrics_handle: PrometheusHandle) -> Router {
    let metrics_routes = Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(Arc::new(metrics_handle));

    server::router(state)
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
}

/// GET /metrics -- Prometheus text format.
async fn render_metrics(
    axum::extract::State(handle): axum::extract::State<Arc<PrometheusHandle>>,
) -> String {
    handle.render()
}

// =============================================================================
// Tests
// =============================================================================
