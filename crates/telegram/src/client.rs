use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::Error;
use crate::types::{ApiResponse, GetUpdatesPayload, Message, SendMessagePayload, Update, User};

/// Baseline timeout for ordinary API calls; long polls get their own.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Handle to one bot identity on the Telegram Bot API.
///
/// Cheap to share behind an `Arc`; the underlying HTTP client pools
/// connections internally.
pub struct Bot {
    client: reqwest::Client,
    base_url: String,
}

impl Bot {
    pub fn new(token: &str) -> Result<Self, Error> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self { client, base_url: format!("https://api.telegram.org/bot{token}") })
    }

    /// Validate credentials by asking the API who this token belongs to.
    pub async fn get_me(&self) -> Result<User, Error> {
        self.call("getMe", &serde_json::json!({}), None).await
    }

    /// Long-poll for updates past `offset`.
    ///
    /// Blocks server-side for up to `timeout_secs`; an empty vec simply
    /// means nothing arrived within the window.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, Error> {
        let payload = GetUpdatesPayload { offset, timeout: timeout_secs };

        // The transport timeout has to outlast the server-side hold.
        let timeout = Duration::from_secs(timeout_secs) + REQUEST_TIMEOUT;
        self.call("getUpdates", &payload, Some(timeout)).await
    }

    /// Send a plain-text message to a chat, optionally into a forum thread.
    pub async fn send_message(
        &self,
        chat_id: i64,
        thread_id: Option<i64>,
        text: &str,
    ) -> Result<Message, Error> {
        let payload = SendMessagePayload { chat_id, message_thread_id: thread_id, text };

        debug!(chat_id, thread_id, "sending message");
        self.call("sendMessage", &payload, None).await
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Option<Duration>) -> Result<T, Error>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = format!("{}/{method}", self.base_url);

        let mut request = self.client.post(&url).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response: ApiResponse<T> = request.send().await?.json().await?;

        if !response.ok {
            let description =
                response.description.unwrap_or_else(|| "no description given".to_string());
            return Err(Error::Api(format!("{method}: {description}")));
        }

        response.result.ok_or_else(|| Error::Api(format!("{method}: ok but result missing")))
    }
}
