use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use telegram::Bot;

use crate::database::models::Destination;

/// Delivery seam between the monitoring core and the chat transport.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn notify(&self, destination: Destination, text: &str) -> Result<()>;
}

/// Sends notifications through the Telegram Bot API.
pub struct TelegramNotifier {
    bot: Arc<Bot>,
}

impl TelegramNotifier {
    pub fn new(bot: Arc<Bot>) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Notify for TelegramNotifier {
    async fn notify(&self, destination: Destination, text: &str) -> Result<()> {
        self.bot.send_message(destination.chat_id, destination.thread_id, text).await?;
        Ok(())
    }
}
