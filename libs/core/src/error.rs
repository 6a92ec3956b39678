use http::StatusCode;
use thiserror::Error;

use crate::types::SenderId;

/// Authorization store failures other than "user not found".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("authorization store request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("authorization store returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("processing backend request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("processing backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to decode processing backend response: {0}")]
    Decode(#[source] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("telegram request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("telegram returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("telegram {method} failed: {description}")]
    Rejected { method: String, description: String },
    #[error("failed to decode telegram response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Everything that can end a relay attempt early. Chat platform failures never end an
/// attempt; notices are best-effort.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("malformed request: {0}")]
    MalformedRequest(&'static str),
    #[error("sender {0} is not authorized")]
    Unauthorized(SenderId),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl RelayError {
    /// HTTP status reported to the webhook caller.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::Unauthorized(_) => StatusCode::FORBIDDEN,
            RelayError::Store(_) | RelayError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for logs and counters.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::MalformedRequest(_) => "malformed",
            RelayError::Unauthorized(_) => "unauthorized",
            RelayError::Store(_) => "store_error",
            RelayError::Backend(_) => "backend_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            RelayError::MalformedRequest("missing message").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RelayError::Unauthorized(SenderId(1)).status(),
            StatusCode::FORBIDDEN
        );
        let store = RelayError::from(StoreError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "down".into(),
        });
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.kind(), "store_error");
        let backend = RelayError::from(BackendError::Status {
            status: StatusCode::BAD_GATEWAY,
            body: "oops".into(),
        });
        assert_eq!(backend.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            backend.to_string(),
            "processing backend returned 502 Bad Gateway: oops"
        );
    }
}
