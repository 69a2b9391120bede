//! Notifier trait definition and shared message types.

/// Errors that can occur during message delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider rejected the message: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

/// How the provider should interpret the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageFormat {
    #[default]
    Plain,
    Html,
}

/// An inline button attached below a message.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionButton {
    pub label: String,
    pub url: String,
}

/// A rendered message ready for delivery to one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMessage {
    pub text: String,
    pub format: MessageFormat,
    pub disable_link_preview: bool,
    pub buttons: Vec<ActionButton>,
}

impl ChannelMessage {
    /// Plain-text message with no buttons (operational pings).
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: MessageFormat::Plain,
            disable_link_preview: false,
            buttons: Vec::new(),
        }
    }
}

/// Trait for message delivery providers.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message to the given channel or chat.
    async fn send(&self, channel: &str, message: &ChannelMessage) -> Result<(), NotifyError>;

    /// Human-readable name for this provider (e.g., "telegram").
    fn provider_name(&self) -> &str;
}
