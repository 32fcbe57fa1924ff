//! Minimal Telegram Bot API client.
//!
//! Covers the three calls the monitoring service needs: credential
//! validation (`getMe`), long-polled update fetching (`getUpdates`) and
//! plain-text message delivery (`sendMessage`). Anything fancier (media,
//! keyboards, webhooks) is out of scope.

pub mod client;
pub mod error;
pub mod types;

pub use client::Bot;
pub use error::Error;
pub use types::{Chat, Message, Update, User};
