// ABOUTME: Handler registry mapping update variant tags to their handlers.
// ABOUTME: Populated once at startup, checked for completeness, then immutable.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::bus::{Context, Update};

/// Closed set of update variant tags.
///
/// Must stay in sync with the `Update` enum; `ALL` is the source of truth
/// for the startup completeness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateTag {
    Platform,
    GoalAlert,
}

impl UpdateTag {
    pub const ALL: [UpdateTag; 2] = [UpdateTag::Platform, UpdateTag::GoalAlert];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateTag::Platform => "platform",
            UpdateTag::GoalAlert => "goal_alert",
        }
    }
}

impl std::fmt::Display for UpdateTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A handler bound to exactly one update tag.
///
/// Handlers receive a freshly constructed Context per invocation and must
/// not assume any shared mutable state between invocations.
#[async_trait]
pub trait UpdateHandler: Send + Sync {
    async fn handle(&self, update: Update, ctx: Context) -> Result<()>;
}

/// Immutable tag-to-handler mapping shared by all dispatch iterations.
///
/// There is no runtime registration or deregistration; the registry is
/// built once during startup and verified complete before the process
/// starts consuming the queue.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<UpdateTag, Arc<dyn UpdateHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tag: UpdateTag, handler: Arc<dyn UpdateHandler>) {
        if self.handlers.insert(tag, handler).is_some() {
            tracing::warn!(tag = %tag, "Replaced an already-registered update handler");
        }
    }

    pub fn get(&self, tag: UpdateTag) -> Option<&Arc<dyn UpdateHandler>> {
        self.handlers.get(&tag)
    }

    /// Verify that every variant tag has a registered handler.
    ///
    /// A missing handler is a configuration defect and fatal at startup.
    pub fn verify_complete(&self) -> Result<()> {
        for tag in UpdateTag::ALL {
            if !self.handlers.contains_key(&tag) {
                anyhow::bail!("no handler registered for update tag '{}'", tag);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
