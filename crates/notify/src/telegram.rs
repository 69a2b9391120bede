//! Telegram Bot API notifier.
//!
//! Delivers messages via the Telegram Bot API `sendMessage` endpoint.
//! Supports HTML formatting, inline keyboards, and rate limit handling.

use std::time::Duration;

use crate::traits::{ChannelMessage, MessageFormat, Notifier, NotifyError};

/// Ceiling on one `sendMessage` round trip. Sends happen one after the
/// other, so a hung request must not stall the broadcasts behind it.
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends messages via the Telegram Bot API.
#[derive(Debug)]
pub struct TelegramNotifier {
    bot_token: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    /// Creates a new `TelegramNotifier`.
    ///
    /// Returns [`NotifyError::Config`] if the token is empty.
    pub fn new(bot_token: impl Into<String>) -> Result<Self, NotifyError> {
        let bot_token = bot_token.into();
        if bot_token.is_empty() {
            return Err(NotifyError::Config(
                "Telegram bot token must not be empty".to_string(),
            ));
        }
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        Ok(Self { bot_token, client })
    }
}

/// Build the `sendMessage` request body for one message.
fn build_payload(channel: &str, message: &ChannelMessage) -> serde_json::Value {
    let mut body = serde_json::json!({
        "chat_id": channel,
        "text": message.text,
        "disable_web_page_preview": message.disable_link_preview,
    });

    if message.format == MessageFormat::Html {
        body["parse_mode"] = serde_json::Value::String("HTML".to_string());
    }

    if !message.buttons.is_empty() {
        // One button per keyboard row.
        let rows: Vec<serde_json::Value> = message
            .buttons
            .iter()
            .map(|button| serde_json::json!([{ "text": button.label, "url": button.url }]))
            .collect();
        body["reply_markup"] = serde_json::json!({ "inline_keyboard": rows });
    }

    body
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    /// Sends a message via the Telegram `sendMessage` API.
    async fn send(&self, channel: &str, message: &ChannelMessage) -> Result<(), NotifyError> {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.bot_token
        );
        let body = build_payload(channel, message);

        tracing::debug!(
            chat_id = %channel,
            format = ?message.format,
            "Sending Telegram message"
        );

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        let resp_body: serde_json::Value = response.json().await?;

        if resp_body.get("ok") == Some(&serde_json::Value::Bool(true)) {
            tracing::debug!(chat_id = %channel, "Telegram message sent");
            return Ok(());
        }

        // Handle rate limiting (HTTP 429).
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp_body
                .get("parameters")
                .and_then(|p| p.get("retry_after"))
                .and_then(|v| v.as_u64())
                .unwrap_or(30);
            return Err(NotifyError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let description = resp_body
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown Telegram API error");

        Err(NotifyError::Api(description.to_string()))
    }

    /// Returns the provider name for this notifier.
    fn provider_name(&self) -> &str {
        "telegram"
    }
}
