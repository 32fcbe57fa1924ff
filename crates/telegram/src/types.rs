use serde::{Deserialize, Serialize};

/// Envelope every Bot API call answers with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

/// An incoming update delivered by `getUpdates`.
///
/// Only message updates are modeled; other kinds (edits, callbacks,
/// inline queries) deserialize with `message: None` and are ignored
/// upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    /// Topic thread inside a forum supergroup, when present.
    pub message_thread_id: Option<i64>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessagePayload<'a> {
    pub chat_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetUpdatesPayload {
    pub offset: i64,
    pub timeout: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_with_command_message_deserializes() {
        let raw = r#"{
            "update_id": 857204,
            "message": {
                "message_id": 42,
                "from": { "id": 1001, "is_bot": false, "first_name": "Ada" },
                "chat": { "id": -100123, "type": "supergroup" },
                "message_thread_id": 7,
                "text": "/add example.com 30m"
            }
        }"#;

        let update: Update = serde_json::from_str(raw).unwrap();
        assert_eq!(update.update_id, 857204);

        let message = update.message.unwrap();
        assert_eq!(message.chat.id, -100123);
        assert_eq!(message.message_thread_id, Some(7));
        assert_eq!(message.from.unwrap().id, 1001);
        assert_eq!(message.text.as_deref(), Some("/add example.com 30m"));
    }

    #[test]
    fn non_message_update_deserializes_without_message() {
        let raw = r#"{ "update_id": 857205, "edited_message": { "message_id": 43 } }"#;

        let update: Update = serde_json::from_str(raw).unwrap();
        assert!(update.message.is_none());
    }

    #[test]
    fn error_envelope_deserializes() {
        let raw = r#"{ "ok": false, "error_code": 401, "description": "Unauthorized" }"#;

        let response: ApiResponse<User> = serde_json::from_str(raw).unwrap();
        assert!(!response.ok);
        assert!(response.result.is_none());
        assert_eq!(response.description.as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn send_message_payload_omits_absent_thread() {
        let payload = SendMessagePayload { chat_id: 5, message_thread_id: None, text: "hi" };
        let raw = serde_json::to_string(&payload).unwrap();
        assert!(!raw.contains("message_thread_id"));
    }
}
