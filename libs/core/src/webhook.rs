//! Framework-neutral webhook adapter.
//!
//! A transport shell hands over the request method and raw body and gets back a
//! [`WebhookReply`]; the shell only decides which [`ResponseStyle`] it speaks.
use axum::Json;
use axum::response::{IntoResponse, Response};
use http::{Method, StatusCode};
use serde_json::{Value, json};
use tracing::warn;

use crate::error::RelayError;
use crate::relay::Relay;

pub const PROCESSED_MESSAGE: &str = "Message processed successfully";
pub const INVALID_REQUEST_MESSAGE: &str = "Invalid request format";
pub const UNAUTHORIZED_MESSAGE: &str = "User not authorized";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method Not Allowed";

/// Body shape a shell answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStyle {
    /// `{"message": ..}` on success, `{"error": ..}` otherwise.
    Json,
    /// The bare message as `text/plain`.
    PlainText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookReply {
    pub status: StatusCode,
    pub message: &'static str,
    pub style: ResponseStyle,
}

impl WebhookReply {
    fn new(status: StatusCode, message: &'static str, style: ResponseStyle) -> Self {
        Self {
            status,
            message,
            style,
        }
    }

    pub fn body(&self) -> Value {
        if self.status.is_success() {
            json!({ "message": self.message })
        } else {
            json!({ "error": self.message })
        }
    }
}

impl IntoResponse for WebhookReply {
    fn into_response(self) -> Response {
        match self.style {
            ResponseStyle::Json => (self.status, Json(self.body())).into_response(),
            ResponseStyle::PlainText => (self.status, self.message).into_response(),
        }
    }
}

fn reply_for_error(err: &RelayError, style: ResponseStyle) -> WebhookReply {
    let message = match err {
        RelayError::MalformedRequest(_) => INVALID_REQUEST_MESSAGE,
        RelayError::Unauthorized(_) => UNAUTHORIZED_MESSAGE,
        RelayError::Store(_) | RelayError::Backend(_) => INTERNAL_ERROR_MESSAGE,
    };
    WebhookReply::new(err.status(), message, style)
}

/// Runs the relay for one HTTP request and maps the outcome to a terminal reply.
pub async fn handle_webhook(
    relay: &Relay,
    method: &Method,
    body: &[u8],
    style: ResponseStyle,
) -> WebhookReply {
    if *method != Method::POST {
        return WebhookReply::new(
            StatusCode::METHOD_NOT_ALLOWED,
            METHOD_NOT_ALLOWED_MESSAGE,
            style,
        );
    }

    let payload: Value = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "webhook body is not JSON");
            return reply_for_error(&RelayError::MalformedRequest("body is not JSON"), style);
        }
    };

    match relay.handle(&payload).await {
        Ok(_) => WebhookReply::new(StatusCode::OK, PROCESSED_MESSAGE, style),
        Err(err) => reply_for_error(&err, style),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::RelayOptions;
    use crate::testkit::{RecordingPlatform, ScriptedBackend, StaticAuthStore};
    use http_body_util::BodyExt;
    use std::sync::Arc;

    fn relay_with(backend: ScriptedBackend) -> (Relay, Arc<RecordingPlatform>) {
        let platform = Arc::new(RecordingPlatform::default());
        let relay = Relay::new(
            Arc::new(StaticAuthStore::allowing([42])),
            Arc::new(backend),
            platform.clone(),
            RelayOptions::default(),
        );
        (relay, platform)
    }

    async fn body_text(reply: WebhookReply) -> (StatusCode, String) {
        let response = reply.into_response();
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect")
            .to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn rejects_non_post_before_parsing() {
        let (relay, platform) = relay_with(ScriptedBackend::replying("success", "ok"));
        let reply = handle_webhook(&relay, &Method::GET, b"", ResponseStyle::PlainText).await;
        assert_eq!(
            body_text(reply).await,
            (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed".into())
        );
        assert!(platform.sent().is_empty());
    }

    #[tokio::test]
    async fn non_json_body_is_bad_request() {
        let (relay, _) = relay_with(ScriptedBackend::replying("success", "ok"));
        let reply = handle_webhook(&relay, &Method::POST, b"not json", ResponseStyle::Json).await;
        let (status, body) = body_text(reply).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body, json!({ "error": "Invalid request format" }));
    }

    #[tokio::test]
    async fn json_and_plain_styles_render_success() {
        let (relay, platform) = relay_with(ScriptedBackend::replying("success", "saved"));
        let payload = br#"{"message":{"from":{"id":42},"text":"coffee 5"}}"#;

        let json_reply = handle_webhook(&relay, &Method::POST, payload, ResponseStyle::Json).await;
        assert_eq!(json_reply.status, StatusCode::OK);
        assert_eq!(
            json_reply.body(),
            json!({ "message": "Message processed successfully" })
        );

        let plain = handle_webhook(&relay, &Method::POST, payload, ResponseStyle::PlainText).await;
        assert_eq!(
            body_text(plain).await,
            (StatusCode::OK, "Message processed successfully".into())
        );
        assert_eq!(platform.sent().len(), 2);
    }

    #[tokio::test]
    async fn unauthorized_and_internal_errors_map_to_statuses() {
        let (relay, _) = relay_with(ScriptedBackend::failing());

        let denied = handle_webhook(
            &relay,
            &Method::POST,
            br#"{"message":{"from":{"id":7},"text":"hi"}}"#,
            ResponseStyle::Json,
        )
        .await;
        assert_eq!(denied.status, StatusCode::FORBIDDEN);
        assert_eq!(denied.body(), json!({ "error": "User not authorized" }));

        let failed = handle_webhook(
            &relay,
            &Method::POST,
            br#"{"message":{"from":{"id":42},"text":"hi"}}"#,
            ResponseStyle::PlainText,
        )
        .await;
        assert_eq!(failed.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(failed.message, "Internal server error");
    }
}
