// ABOUTME: Telegram outbound client and platform-envelope helpers.
// ABOUTME: Wraps teloxide behind the OutboundClient trait and digs sender/command out of updates.

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{AllowedUpdate, MediaKind, MessageKind, ParseMode, Update as TgUpdate, UpdateKind};

/// Formatting applied to an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFormat {
    Plain,
    Html,
}

/// Long-lived session used to send messages to chat-platform recipients.
///
/// Acquired once at startup and lent read-only to handlers; safe for
/// concurrent sends from multiple logical callers. Behind a trait so tests
/// can substitute a recording fake.
#[async_trait]
pub trait OutboundClient: Send + Sync {
    async fn send_message(&self, recipient_id: i64, text: &str, format: MessageFormat)
        -> Result<()>;

    /// One-time startup call registering this gateway as the platform's
    /// webhook target.
    async fn register_webhook(&self, url: &str) -> Result<()>;
}

/// Telegram implementation of the outbound client, backed by teloxide.
pub struct TelegramOutbound {
    bot: Bot,
}

impl TelegramOutbound {
    /// Create the bot session and validate the token via `getMe`.
    pub async fn connect(token: &str) -> Result<Self> {
        let bot = Bot::new(token);
        let me = bot.get_me().await.context("Failed to call Telegram getMe")?;
        tracing::info!(
            bot_username = %me.username(),
            bot_id = %me.id.0,
            "Telegram bot authenticated"
        );
        Ok(Self { bot })
    }
}

#[async_trait]
impl OutboundClient for TelegramOutbound {
    async fn send_message(
        &self,
        recipient_id: i64,
        text: &str,
        format: MessageFormat,
    ) -> Result<()> {
        let mut req = self.bot.send_message(ChatId(recipient_id), text);
        if format == MessageFormat::Html {
            req = req.parse_mode(ParseMode::Html);
        }
        req.await
            .with_context(|| format!("Failed to send message to recipient {}", recipient_id))?;
        crate::metrics::record_message_sent();
        Ok(())
    }

    async fn register_webhook(&self, url: &str) -> Result<()> {
        tracing::info!(url = %url, "Registering platform webhook");
        let target = url
            .parse()
            .with_context(|| format!("Invalid webhook URL '{}'", url))?;
        self.bot
            .set_webhook(target)
            .allowed_updates(vec![AllowedUpdate::Message])
            .await
            .context("Failed to register platform webhook")?;
        Ok(())
    }
}

/// Numeric sender identity of a platform update, when resolvable.
pub fn sender_id(update: &TgUpdate) -> Option<i64> {
    let UpdateKind::Message(message) = &update.kind else {
        return None;
    };
    message.from.as_ref().map(|user| user.id.0 as i64)
}

/// Text content of a platform update's message, if it carries any.
pub fn message_text(update: &TgUpdate) -> Option<&str> {
    let UpdateKind::Message(message) = &update.kind else {
        return None;
    };
    match &message.kind {
        MessageKind::Common(common) => match &common.media_kind {
            MediaKind::Text(text) => Some(text.text.as_str()),
            _ => None,
        },
        _ => None,
    }
}

/// The command a platform update carries, if its message is a command.
pub fn command_of(update: &TgUpdate) -> Option<&str> {
    message_text(update).and_then(parse_command)
}

/// Parse a bot command name from message text.
///
/// Commands start with `/`; an optional `@botname` suffix is stripped.
pub fn parse_command(text: &str) -> Option<&str> {
    let first = text.trim().split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message_update(text: &str) -> TgUpdate {
        // teloxide's custom UpdateKind deserializer does not work through
        // serde_json::from_value, so round-trip through a string.
        let value = json!({
            "update_id": 1,
            "message": {
                "message_id": 10,
                "date": 0,
                "chat": {"id": 7, "type": "private", "first_name": "A"},
                "from": {"id": 7, "is_bot": false, "first_name": "A"},
                "text": text
            }
        });
        serde_json::from_str(&value.to_string()).expect("valid message update")
    }

    #[test]
    fn test_parse_command_plain() {
        assert_eq!(parse_command("/start"), Some("start"));
    }

    #[test]
    fn test_parse_command_with_bot_suffix() {
        assert_eq!(parse_command("/start@goalgate_bot"), Some("start"));
    }

    #[test]
    fn test_parse_command_with_args() {
        assert_eq!(parse_command("/start now please"), Some("start"));
    }

    #[test]
    fn test_parse_command_not_a_command() {
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("/"), None);
    }

    #[test]
    fn test_sender_id_from_message() {
        let update = message_update("hello");
        assert_eq!(sender_id(&update), Some(7));
    }

    #[test]
    fn test_message_text_extraction() {
        let update = message_update("hello there");
        assert_eq!(message_text(&update), Some("hello there"));
    }

    #[test]
    fn test_command_of_start() {
        let update = message_update("/start");
        assert_eq!(command_of(&update), Some("start"));
    }

    #[test]
    fn test_command_of_plain_text() {
        let update = message_update("just chatting");
        assert_eq!(command_of(&update), None);
    }

    #[test]
    fn test_telegram_outbound_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TelegramOutbound>();
    }
}
