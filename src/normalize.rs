// ABOUTME: Variant normalizer converting raw inbound HTTP payloads into tagged Updates.
// ABOUTME: Pure validation layer; invalid input never reaches the dispatch queue.

use serde_json::Value;
use thiserror::Error;

use crate::bus::{GoalAlert, Update};

/// Client-input failure surfaced at the HTTP boundary as a 4xx.
///
/// Never enqueued and never logged as a system fault.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("recipient id must be a positive integer, got '{0}'")]
    InvalidRecipientId(String),
    #[error("missing or non-string field '{0}'")]
    MissingField(&'static str),
    #[error("malformed platform update envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),
}

/// Parse the chat platform's native update envelope.
///
/// No domain validation beyond what the platform's own update model
/// enforces; command routing happens later in the dispatch loop.
pub fn normalize_platform_update(body: Value) -> Result<Update, ValidationError> {
    // teloxide's custom UpdateKind deserializer does not work through
    // serde_json::from_value, so round-trip through a string.
    let envelope: teloxide::types::Update =
        serde_json::from_str(&body.to_string()).map_err(ValidationError::MalformedEnvelope)?;
    Ok(Update::Platform(Box::new(envelope)))
}

/// Parse a goal-tracker alert from the path's recipient segment and the
/// JSON body.
///
/// The tracker wraps the alert fields in a top-level `goal` object:
/// `{"goal": {"title": ..., "summary": ...}}`. The recipient segment must
/// parse as a positive integer.
pub fn normalize_goal_alert(recipient_segment: &str, body: &Value) -> Result<Update, ValidationError> {
    let recipient_id: i64 = recipient_segment
        .parse()
        .map_err(|_| ValidationError::InvalidRecipientId(recipient_segment.to_string()))?;
    if recipient_id <= 0 {
        return Err(ValidationError::InvalidRecipientId(
            recipient_segment.to_string(),
        ));
    }

    let goal = body
        .get("goal")
        .filter(|g| g.is_object())
        .ok_or(ValidationError::MissingField("goal"))?;
    let title = goal
        .get("title")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingField("title"))?;
    let summary = goal
        .get("summary")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingField("summary"))?;

    Ok(Update::GoalAlert(GoalAlert {
        recipient_id,
        title: title.to_string(),
        summary: summary.to_string(),
    }))
}

// =============================================================================
// Tests
// =============================================================================
