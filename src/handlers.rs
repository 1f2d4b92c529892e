// ABOUTME: Built-in update handlers: the /start command reply and goal-alert forwarding.
// ABOUTME: Provides build_registry wiring every update tag to its handler at startup.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use async_trait::async_trait;

use crate::bus::{Context, Update};
use crate::registry::{HandlerRegistry, UpdateHandler, UpdateTag};
use crate::telegram::{self, MessageFormat, OutboundClient};

/// Instructional reply for the /start command, embedding the sender's
/// ready-to-use alert-webhook URL.
pub fn start_reply_text(base_url: &str, recipient_id: i64) -> String {
    format!(
        "Your goal alert webhook URL: <code>{base_url}/external/{recipient_id}</code>.\n\n\
         To check that the bot is still running, call <code>{base_url}/healthcheck</code>."
    )
}

/// Human-readable derail alert mirroring the tracker payload verbatim.
pub fn derail_alert_text(title: &str, summary: &str) -> String {
    format!("The goal <b>{title}</b> is about to derail! {summary}")
}

/// Handles platform updates; replies to /start with webhook instructions.
///
/// Platform updates that are not a recognized command are ignored.
pub struct StartHandler {
    outbound: Arc<dyn OutboundClient>,
}

impl StartHandler {
    pub fn new(outbound: Arc<dyn OutboundClient>) -> Self {
        Self { outbound }
    }
}

#[async_trait]
impl UpdateHandler for StartHandler {
    async fn handle(&self, update: Update, ctx: Context) -> Result<()> {
        let Update::Platform(envelope) = update else {
            anyhow::bail!("start handler received a non-platform update");
        };

        match telegram::command_of(&envelope) {
            Some("start") => {}
            Some(other) => {
                tracing::debug!(command = %other, "Ignoring unrecognized command");
                return Ok(());
            }
            None => {
                tracing::debug!(update_id = envelope.id.0, "Ignoring non-command platform update");
                return Ok(());
            }
        }

        let recipient_id = ctx
            .recipient_id
            .context("platform update has no resolvable sender")?;
        let text = start_reply_text(&ctx.shared.base_url, recipient_id);
        self.outbound
            .send_message(recipient_id, &text, MessageFormat::Html)
            .await
    }
}

/// Forwards goal-tracker alerts to their recipient as an HTML message.
pub struct GoalAlertHandler {
    outbound: Arc<dyn OutboundClient>,
}

impl GoalAlertHandler {
    pub fn new(outbound: Arc<dyn OutboundClient>) -> Self {
        Self { outbound }
    }
}

#[async_trait]
impl UpdateHandler for GoalAlertHandler {
    async fn handle(&self, update: Update, _ctx: Context) -> Result<()> {
        let Update::GoalAlert(alert) = update else {
            anyhow::bail!("goal alert handler received a non-alert update");
        };

        let text = derail_alert_text(&alert.title, &alert.summary);
        self.outbound
            .send_message(alert.recipient_id, &text, MessageFormat::Html)
            .await
    }
}

/// Wire every update tag to its built-in handler.
///
/// Called once during startup; the resulting registry is immutable.
pub fn build_registry(outbound: Arc<dyn OutboundClient>) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register(
        UpdateTag::Platform,
        Arc::new(StartHandler::new(Arc::clone(&outbound))),
    );
    registry.register(UpdateTag::GoalAlert, Arc::new(GoalAlertHandler::new(outbound)));
    registry
}

// =============================================================================
// Tests
// =============================================================================
