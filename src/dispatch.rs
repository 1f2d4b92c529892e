// ABOUTME: Dispatch loop -- sole consumer of the update queue.
// ABOUTME: Builds a per-update Context and invokes the registered handler, isolating failures.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::bus::{Context, QueuedUpdate, SharedData, Update};
use crate::metrics;
use crate::registry::HandlerRegistry;
use crate::telegram;

/// Consume the update queue until it is closed and drained.
///
/// Updates are handled sequentially, which preserves per-producer FIFO
/// ordering. A failing handler invocation is logged and dropped; it never
/// terminates the loop or blocks subsequent updates. When every sender has
/// been dropped the loop finishes whatever was already enqueued, then
/// exits, so no update is dropped mid-handling on shutdown.
pub async fn run_dispatch_loop(
    mut rx: UnboundedReceiver<QueuedUpdate>,
    registry: Arc<HandlerRegistry>,
    shared: Arc<SharedData>,
) {
    tracing::info!(handlers = registry.len(), "Dispatch loop started");

    while let Some(queued) = rx.recv().await {
        let tag = queued.update.tag();
        let recipient_id = resolve_recipient(&queued.update);
        let queued_for_ms = (Utc::now() - queued.received_at).num_milliseconds();

        tracing::debug!(
            tag = %tag,
            recipient_id = ?recipient_id,
            queued_for_ms,
            "Dispatching update"
        );

        let Some(handler) = registry.get(tag) else {
            // Unreachable when startup completeness checking is in place
            tracing::error!(tag = %tag, "No handler registered for update tag, dropping update");
            metrics::record_dispatch(tag.as_str(), "unregistered");
            continue;
        };

        let ctx = Context {
            recipient_id,
            shared: Arc::clone(&shared),
        };

        match handler.handle(queued.update, ctx).await {
            Ok(()) => {
                metrics::record_dispatch(tag.as_str(), "ok");
            }
            Err(e) => {
                tracing::error!(
                    tag = %tag,
                    recipient_id = ?recipient_id,
                    error = %e,
                    "Update handler failed, dropping update"
                );
                metrics::record_dispatch(tag.as_str(), "error");
            }
        }
    }

    tracing::info!("Update queue closed, dispatch loop exiting");
}

/// Resolve the recipient for a per-update Context.
///
/// Goal alerts name their recipient directly; platform updates reply to
/// their sender when one is resolvable.
fn resolve_recipient(update: &Update) -> Option<i64> {
    match update {
        Update::GoalAlert(alert) => Some(alert.recipient_id),
        Update::Platform(envelope) => telegram::sender_id(envelope),
    }
}

// =============================================================================
// Tests
// =============================================================================
