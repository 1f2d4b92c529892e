// ABOUTME: Core update types for the unified dispatch queue.
// ABOUTME: Defines Update (tagged inbound event), Context, and the queue envelope.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::registry::UpdateTag;

/// A goal-tracker alert targeting a single chat recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalAlert {
    /// Numeric chat identity of the user who should receive the alert
    pub recipient_id: i64,
    /// Name of the goal that is about to derail
    pub title: String,
    /// Human-readable deadline summary, forwarded verbatim
    pub summary: String,
}

/// A single inbound event entering the dispatch queue.
///
/// Exactly two sources feed the queue: the chat platform's own webhook
/// (opaque envelope, examined only for command routing) and the goal
/// tracker's per-user webhook.
#[derive(Debug, Clone)]
pub enum Update {
    /// Native platform update envelope, passed through largely unexamined
    Platform(Box<teloxide::types::Update>),
    /// Alert from the third-party goal tracker
    GoalAlert(GoalAlert),
}

impl Update {
    /// The variant tag used for handler lookup.
    pub fn tag(&self) -> UpdateTag {
        match self {
            Update::Platform(_) => UpdateTag::Platform,
            Update::GoalAlert(_) => UpdateTag::GoalAlert,
        }
    }
}

/// Queue envelope wrapping an Update with its enqueue timestamp.
#[derive(Debug, Clone)]
pub struct QueuedUpdate {
    pub update: Update,
    /// When the ingress accepted this update; used only for operator logging
    pub received_at: DateTime<Utc>,
}

impl QueuedUpdate {
    pub fn new(update: Update) -> Self {
        Self {
            update,
            received_at: Utc::now(),
        }
    }
}

/// Immutable process-wide data shared with every handler invocation.
///
/// Built once at startup and never mutated afterward.
#[derive(Debug, Clone)]
pub struct SharedData {
    /// Externally visible base URL of this gateway, without trailing slash
    pub base_url: String,
}

/// Ephemeral per-dispatch context, constructed once per dequeued Update.
///
/// Lives for exactly one handler invocation; never persisted or reused.
#[derive(Debug, Clone)]
pub struct Context {
    /// Resolved recipient: the alert's target for goal alerts, the sender
    /// for platform updates with a resolvable sender
    pub recipient_id: Option<i64>,
    pub shared: Arc<SharedData>,
}

// =============================================================================
// Tests
// =============================================================================
