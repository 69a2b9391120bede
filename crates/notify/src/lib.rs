//! Message delivery for listing broadcasts.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable delivery providers
//! - Telegram Bot API implementation
//! - Rendering of listings into broadcast messages

pub mod format;
pub mod telegram;
pub mod traits;

pub use telegram::TelegramNotifier;
pub use traits::{ActionButton, ChannelMessage, MessageFormat, Notifier, NotifyError};
