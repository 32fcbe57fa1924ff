//! Conversational command surface, driven by Telegram long polling.

pub mod address;
pub mod interval;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use telegram::{Bot, Message};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::database::Store;
use crate::database::models::{Destination, Principal, Site};
use crate::monitoring::Probe;
use address::resolve_scheme;
use interval::{interval_text, parse_interval};

const HELP_TEXT: &str = "Welcome to Website Monitor Bot!\n\n\
                         Commands:\n\
                         /add <url> <interval> - Add a website to monitor (interval in minutes, hours or days)\n\
                         /list - List monitored websites\n\
                         /remove <url> - Remove a website from monitoring\n\
                         /ping <url> - Check website status once, or /ping all for every site\n\
                         /digest <on|off> - Toggle the daily health digest";

const ADD_USAGE: &str = "Usage: /add <domain> <interval>\n\n\
                         Examples:\n\
                         - /add example.com 30m\n\
                         - /add example.com 2h\n\
                         - /add example.com 3d\n\n\
                         Intervals:\n\
                         - Minutes (m): 5-60\n\
                         - Hours (h): 1-24\n\
                         - Days (d): 1-7";

/// A recognized slash command with its raw argument tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Start,
    Add(&'a str),
    List,
    Remove(&'a str),
    Ping(&'a str),
    Digest(&'a str),
}

impl<'a> Command<'a> {
    /// Parse a message text. Non-commands and unknown commands yield
    /// `None` and are ignored silently.
    pub fn parse(text: &'a str) -> Option<Self> {
        let rest = text.trim().strip_prefix('/')?;
        let (name, args) = match rest.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (rest, ""),
        };
        // Group chats address commands as /add@BotName.
        let name = name.split('@').next().unwrap_or(name);

        match name {
            "start" => Some(Self::Start),
            "add" => Some(Self::Add(args)),
            "list" => Some(Self::List),
            "remove" => Some(Self::Remove(args)),
            "ping" => Some(Self::Ping(args)),
            "digest" => Some(Self::Digest(args)),
            _ => None,
        }
    }

    /// Generic reply when a handler fails for reasons that are not the
    /// user's fault. The real cause goes to the log, not the chat.
    fn failure_reply(&self) -> &'static str {
        match self {
            Self::Add(_) => "❌ Error adding site to monitoring",
            Self::Remove(_) => "Error removing site from monitoring",
            Self::Ping(_) => "Error checking site",
            _ => "Something went wrong, please try again later",
        }
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    /// Bad user input; the text goes back to the chat verbatim and is
    /// never logged as a system fault.
    #[error("{0}")]
    Validation(String),

    /// Store or transport trouble; logged, answered generically.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Dispatches incoming commands against the store and the prober.
pub struct CommandHandler {
    bot: Arc<Bot>,
    store: Arc<dyn Store>,
    prober: Arc<dyn Probe>,
}

impl CommandHandler {
    pub fn new(bot: Arc<Bot>, store: Arc<dyn Store>, prober: Arc<dyn Probe>) -> Self {
        Self { bot, store, prober }
    }

    /// Long-poll for updates forever, dispatching every text message.
    /// Fetch failures back off briefly and retry; they never tear the
    /// loop down.
    pub async fn run(self, poll_timeout_secs: u64) {
        info!("command loop started");

        let mut offset = 0i64;
        loop {
            let updates = match self.bot.get_updates(offset, poll_timeout_secs).await {
                Ok(updates) => updates,
                Err(error) => {
                    error!(%error, "failed to fetch updates");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                if let Some(message) = update.message {
                    self.handle_message(&message).await;
                }
            }
        }
    }

    async fn handle_message(&self, message: &Message) {
        let Some(text) = message.text.as_deref() else { return };
        let Some(command) = Command::parse(text) else { return };

        let destination =
            Destination { chat_id: message.chat.id, thread_id: message.message_thread_id };

        let reply = match self.dispatch(command, message, destination).await {
            Ok(reply) => reply,
            Err(CommandError::Validation(reason)) => reason,
            Err(CommandError::Internal(error)) => {
                error!(%error, ?command, "command failed");
                command.failure_reply().to_string()
            }
        };

        if let Err(error) =
            self.bot.send_message(destination.chat_id, destination.thread_id, &reply).await
        {
            warn!(%error, chat_id = destination.chat_id, "failed to deliver reply");
        }
    }

    async fn dispatch(
        &self,
        command: Command<'_>,
        message: &Message,
        destination: Destination,
    ) -> Result<String, CommandError> {
        match command {
            Command::Start => self.handle_start(message, destination).await,
            Command::Add(args) => self.handle_add(args, message, destination).await,
            Command::List => self.handle_list(destination).await,
            Command::Remove(args) => self.handle_remove(args, destination).await,
            Command::Ping(args) => self.handle_ping(args, destination).await,
            Command::Digest(args) => self.handle_digest(args, message, destination).await,
        }
    }

    async fn handle_start(
        &self,
        message: &Message,
        destination: Destination,
    ) -> Result<String, CommandError> {
        let user_id = sender(message)?;
        self.store.upsert_principal(&Principal::new(user_id, destination)).await?;

        Ok(HELP_TEXT.to_string())
    }

    async fn handle_add(
        &self,
        args: &str,
        message: &Message,
        destination: Destination,
    ) -> Result<String, CommandError> {
        let user_id = sender(message)?;

        let mut parts = args.split_whitespace();
        let (Some(address), Some(cadence)) = (parts.next(), parts.next()) else {
            return Err(CommandError::Validation(ADD_USAGE.to_string()));
        };

        let minutes = parse_interval(cadence)
            .map_err(|error| CommandError::Validation(format!("Error: {error}")))?;
        let url = resolve_scheme(self.prober.as_ref(), address)
            .await
            .map_err(|error| CommandError::Validation(format!("Error: {error}")))?;

        let site = Site::new(url.clone(), user_id, destination, minutes);
        self.store.create_site(&site).await?;

        info!(%url, minutes, chat_id = destination.chat_id, "site registered");
        Ok(format!(
            "✅ Added {url} to monitoring\n⏰ Check interval: {}",
            interval_text(minutes)
        ))
    }

    async fn handle_list(&self, destination: Destination) -> Result<String, CommandError> {
        let sites = self.store.list_active_for_chat(destination.chat_id).await?;
        if sites.is_empty() {
            return Ok("No sites are being monitored".to_string());
        }

        let listing = sites
            .iter()
            .map(|site| format!("{} (every {} minutes)", site.url, site.interval_minutes))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(format!("Monitored sites:\n{listing}"))
    }

    async fn handle_remove(
        &self,
        args: &str,
        destination: Destination,
    ) -> Result<String, CommandError> {
        let Some(address) = args.split_whitespace().next() else {
            return Err(CommandError::Validation("Usage: /remove <url>".to_string()));
        };

        let url = resolve_scheme(self.prober.as_ref(), address)
            .await
            .map_err(|error| CommandError::Validation(format!("Error: {error}")))?;

        // Deactivation is idempotent; removing something unknown still
        // reads as success.
        self.store.deactivate_site(&url, destination.chat_id).await?;

        Ok(format!("Removed {url} from monitoring"))
    }

    async fn handle_ping(
        &self,
        args: &str,
        destination: Destination,
    ) -> Result<String, CommandError> {
        let Some(address) = args.split_whitespace().next() else {
            return Err(CommandError::Validation("Usage: /ping <url>".to_string()));
        };

        if address.eq_ignore_ascii_case("all") {
            let sites = self.store.list_active_for_chat(destination.chat_id).await?;
            if sites.is_empty() {
                return Ok("No sites are being monitored".to_string());
            }

            let outcomes = join_all(sites.iter().map(|site| self.prober.probe(&site.url))).await;
            let lines = sites
                .iter()
                .zip(&outcomes)
                .map(|(site, outcome)| match (outcome.healthy(), &outcome.error) {
                    (true, _) => format!("✅ {}: 200", site.url),
                    (false, Some(detail)) => {
                        format!("⚠️ {}: {} ({detail})", site.url, outcome.status)
                    }
                    (false, None) => format!("⚠️ {}: {}", site.url, outcome.status),
                })
                .collect::<Vec<_>>()
                .join("\n");

            // One aggregate reply and nothing else.
            return Ok(format!("Status for all monitored sites:\n{lines}"));
        }

        let outcome = self.prober.probe(address).await;
        let mut reply = format!("Status for {address}:\nStatus: {}", outcome.status);
        if let Some(detail) = &outcome.error {
            reply.push_str(&format!("\nError: {detail}"));
        }

        Ok(reply)
    }

    async fn handle_digest(
        &self,
        args: &str,
        message: &Message,
        destination: Destination,
    ) -> Result<String, CommandError> {
        let user_id = sender(message)?;

        let enabled = match args.trim().to_ascii_lowercase().as_str() {
            "on" => true,
            "off" => false,
            _ => return Err(CommandError::Validation("Usage: /digest <on|off>".to_string())),
        };

        self.store.set_daily_digest(user_id, destination, enabled).await?;

        Ok(if enabled {
            "Daily digest enabled".to_string()
        } else {
            "Daily digest disabled".to_string()
        })
    }
}

fn sender(message: &Message) -> Result<i64, CommandError> {
    message
        .from
        .as_ref()
        .map(|user| user.id)
        .ok_or_else(|| CommandError::Validation("Could not identify the sender".to_string()))
}
