// ABOUTME: Tests for the built-in handlers using a recording fake outbound client.
// ABOUTME: Validates the /start reply and the derail-alert forwarding behavior.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use goalgate::bus::{Context, GoalAlert, SharedData, Update};
use goalgate::handlers::{build_registry, derail_alert_text};
use goalgate::registry::UpdateTag;
use goalgate::telegram::{MessageFormat, OutboundClient};

/// Recording fake for the outbound client.
#[derive(Default)]
struct RecordingOutbound {
    sent: Mutex<Vec<(i64, String, MessageFormat)>>,
}

#[async_trait]
impl OutboundClient for RecordingOutbound {
    async fn send_message(
        &self,
        recipient_id: i64,
        text: &str,
        format: MessageFormat,
    ) -> Result<()> {
        self.sent
            .lock()
            .await
            .push((recipient_id, text.to_string(), format));
        Ok(())
    }

    async fn register_webhook(&self, _url: &str) -> Result<()> {
        Ok(())
    }
}

fn context(recipient_id: Option<i64>) -> Context {
    Context {
        recipient_id,
        shared: Arc::new(SharedData {
            base_url: "https://gateway.example.com".to_string(),
        }),
    }
}

fn platform_update(sender_id: i64, text: &str) -> Update {
    // teloxide's custom UpdateKind deserializer does not work through
    // serde_json::from_value, so round-trip through a string.
    let value = serde_json::json!({
        "update_id": 1,
        "message": {
            "message_id": 10,
            "date": 0,
            "chat": {"id": sender_id, "type": "private", "first_name": "A"},
            "from": {"id": sender_id, "is_bot": false, "first_name": "A"},
            "text": text
        }
    });
    let envelope: teloxide::types::Update =
        serde_json::from_str(&value.to_string()).expect("valid platform envelope");
    Update::Platform(Box::new(envelope))
}

// =============================================================================
// /start command
// =============================================================================

#[tokio::test]
async fn test_start_command_replies_with_personal_webhook_url() {
    let outbound = Arc::new(RecordingOutbound::default());
    let registry = build_registry(outbound.clone());

    let handler = registry.get(UpdateTag::Platform).expect("platform handler");
    handler
        .handle(platform_update(7, "/start"), context(Some(7)))
        .await
        .expect("start handler");

    let sent = outbound.sent.lock().await;
    assert_eq!(sent.len(), 1);
    let (recipient, text, format) = &sent[0];
    assert_eq!(*recipient, 7);
    assert_eq!(*format, MessageFormat::Html);
    assert!(text.contains("https://gateway.example.com"));
    assert!(text.contains("/external/7"));
}

#[tokio::test]
async fn test_non_command_platform_update_is_ignored() {
    let outbound = Arc::new(RecordingOutbound::default());
    let registry = build_registry(outbound.clone());

    let handler = registry.get(UpdateTag::Platform).expect("platform handler");
    handler
        .handle(platform_update(7, "just chatting"), context(Some(7)))
        .await
        .expect("non-command ignored");

    assert!(outbound.sent.lock().await.is_empty());
}

#[tokio::test]
async fn test_unrecognized_command_is_ignored() {
    let outbound = Arc::new(RecordingOutbound::default());
    let registry = build_registry(outbound.clone());

    let handler = registry.get(UpdateTag::Platform).expect("platform handler");
    handler
        .handle(platform_update(7, "/stop"), context(Some(7)))
        .await
        .expect("unknown command ignored");

    assert!(outbound.sent.lock().await.is_empty());
}

#[tokio::test]
async fn test_start_without_resolvable_sender_fails() {
    let outbound = Arc::new(RecordingOutbound::default());
    let registry = build_registry(outbound.clone());

    let handler = registry.get(UpdateTag::Platform).expect("platform handler");
    let result = handler
        .handle(platform_update(7, "/start"), context(None))
        .await;

    assert!(result.is_err());
    assert!(outbound.sent.lock().await.is_empty());
}

// =============================================================================
// Goal alerts
// =============================================================================

#[tokio::test]
async fn test_goal_alert_sends_exact_derail_message() {
    let outbound = Arc::new(RecordingOutbound::default());
    let registry = build_registry(outbound.clone());

    let update = Update::GoalAlert(GoalAlert {
        recipient_id: 42,
        title: "Write paper".to_string(),
        summary: "2 hours to derail".to_string(),
    });
    let handler = registry.get(UpdateTag::GoalAlert).expect("alert handler");
    handler
        .handle(update, context(Some(42)))
        .await
        .expect("alert handler");

    let sent = outbound.sent.lock().await;
    assert_eq!(
        *sent,
        vec![(
            42,
            "The goal <b>Write paper</b> is about to derail! 2 hours to derail".to_string(),
            MessageFormat::Html
        )]
    );
}

#[tokio::test]
async fn test_goal_alert_summary_not_transformed() {
    let outbound = Arc::new(RecordingOutbound::default());
    let registry = build_registry(outbound.clone());

    let summary = "+2 due in 00:30 (<i>already escaped?</i>)";
    let update = Update::GoalAlert(GoalAlert {
        recipient_id: 5,
        title: "gym".to_string(),
        summary: summary.to_string(),
    });
    let handler = registry.get(UpdateTag::GoalAlert).expect("alert handler");
    handler
        .handle(update, context(Some(5)))
        .await
        .expect("alert handler");

    let sent = outbound.sent.lock().await;
    assert_eq!(sent[0].1, derail_alert_text("gym", summary));
    assert!(sent[0].1.ends_with(summary));
}
