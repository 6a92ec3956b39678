use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::RelayError;

/// Telegram's identifier for the user who sent a message.
///
/// ```
/// use relay_core::SenderId;
///
/// let id = SenderId(42);
/// assert_eq!(id.to_string(), "42");
/// assert_eq!(serde_json::to_value(id).unwrap(), serde_json::json!(42));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderId(pub i64);

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The part of an inbound Telegram update the relay acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender_id: SenderId,
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
struct TelegramUpdate {
    #[serde(default)]
    message: Option<TelegramMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct TelegramMessage {
    #[serde(default)]
    from: Option<TelegramUser>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TelegramUser {
    #[serde(default)]
    id: Option<i64>,
}

impl InboundMessage {
    /// Extracts sender and text from a webhook payload.
    ///
    /// Anything that is not a message with a sender id and non-empty text is
    /// [`RelayError::MalformedRequest`].
    pub fn from_update(payload: &Value) -> Result<Self, RelayError> {
        let update = TelegramUpdate::deserialize(payload)
            .map_err(|_| RelayError::MalformedRequest("payload is not a telegram update"))?;
        let message = update
            .message
            .ok_or(RelayError::MalformedRequest("missing message"))?;
        let sender_id = message
            .from
            .and_then(|from| from.id)
            .map(SenderId)
            .ok_or(RelayError::MalformedRequest("missing message.from"))?;
        let text = message
            .text
            .filter(|text| !text.is_empty())
            .ok_or(RelayError::MalformedRequest("missing message.text"))?;
        Ok(Self { sender_id, text })
    }
}

/// Body posted to the processing backend's `/process-message`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingRequest {
    pub user_id: SenderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_id: Option<SenderId>,
    pub text: String,
}

impl ProcessingRequest {
    pub fn new(message: &InboundMessage, include_telegram_id: bool) -> Self {
        Self {
            user_id: message.sender_id,
            telegram_id: include_telegram_id.then_some(message.sender_id),
            text: message.text.clone(),
        }
    }
}

pub const PROCESSING_SUCCESS: &str = "success";

/// Outcome reported by the processing backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl ProcessingResponse {
    pub fn is_success(&self) -> bool {
        self.status == PROCESSING_SUCCESS
    }
}

/// `sendMessage` payload for the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub chat_id: SenderId,
    pub text: String,
}

impl OutboundMessage {
    pub fn new(recipient: SenderId, text: impl Into<String>) -> Self {
        Self {
            chat_id: recipient,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_sender_and_text() {
        let payload = json!({
            "update_id": 10,
            "message": {
                "message_id": 1,
                "from": { "id": 42, "is_bot": false, "first_name": "Ana" },
                "chat": { "id": 42, "type": "private" },
                "text": "coffee 5"
            }
        });
        let msg = InboundMessage::from_update(&payload).unwrap();
        assert_eq!(msg.sender_id, SenderId(42));
        assert_eq!(msg.text, "coffee 5");
    }

    #[test]
    fn rejects_incomplete_updates() {
        let cases = [
            json!({}),
            json!({ "message": null }),
            json!({ "message": { "text": "hi" } }),
            json!({ "message": { "from": {}, "text": "hi" } }),
            json!({ "message": { "from": { "id": 1 } } }),
            json!({ "message": { "from": { "id": 1 }, "text": "" } }),
            json!({ "message": { "from": { "id": "abc" }, "text": "hi" } }),
            json!([1, 2, 3]),
        ];
        for payload in cases {
            let err = InboundMessage::from_update(&payload).unwrap_err();
            assert!(
                matches!(err, RelayError::MalformedRequest(_)),
                "expected malformed for {payload}"
            );
        }
    }

    #[test]
    fn processing_request_wire_shape() {
        let msg = InboundMessage {
            sender_id: SenderId(7),
            text: "lunch 12".into(),
        };
        assert_eq!(
            serde_json::to_value(ProcessingRequest::new(&msg, false)).unwrap(),
            json!({ "userId": 7, "text": "lunch 12" })
        );
        assert_eq!(
            serde_json::to_value(ProcessingRequest::new(&msg, true)).unwrap(),
            json!({ "userId": 7, "telegramId": 7, "text": "lunch 12" })
        );
    }

    #[test]
    fn processing_response_tolerates_missing_message() {
        let resp: ProcessingResponse = serde_json::from_value(json!({ "status": "failure" })).unwrap();
        assert!(!resp.is_success());
        assert_eq!(resp.message, "");
    }
}
