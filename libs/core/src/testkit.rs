//! In-memory collaborators for exercising the relay without a network.
use async_trait::async_trait;
use http::StatusCode;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

use crate::error::{BackendError, PlatformError, StoreError};
use crate::interfaces::{Authorization, AuthorizationStore, ChatPlatform, ProcessingBackend};
use crate::types::{OutboundMessage, ProcessingRequest, ProcessingResponse, SenderId};

/// Authorization store backed by a fixed set of ids.
#[derive(Default)]
pub struct StaticAuthStore {
    authorized: HashSet<SenderId>,
    unavailable: bool,
    lookups: AtomicUsize,
}

impl StaticAuthStore {
    pub fn allowing(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            authorized: ids.into_iter().map(SenderId).collect(),
            ..Self::default()
        }
    }

    /// Store whose every lookup fails.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorizationStore for StaticAuthStore {
    async fn lookup(&self, sender: SenderId) -> Result<Authorization, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(StoreError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "static store offline".into(),
            });
        }
        Ok(if self.authorized.contains(&sender) {
            Authorization::Authorized
        } else {
            Authorization::NotFound
        })
    }
}

type Responder =
    Box<dyn Fn(&ProcessingRequest) -> Result<ProcessingResponse, BackendError> + Send + Sync>;

/// Backend that answers through a closure and keeps every request it saw.
pub struct ScriptedBackend {
    responder: Responder,
    requests: Mutex<Vec<ProcessingRequest>>,
}

impl ScriptedBackend {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ProcessingRequest) -> Result<ProcessingResponse, BackendError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(status: &str, message: &str) -> Self {
        let response = ProcessingResponse {
            status: status.to_string(),
            message: message.to_string(),
        };
        Self::new(move |_| Ok(response.clone()))
    }

    pub fn failing() -> Self {
        Self::new(|_| {
            Err(BackendError::Status {
                status: StatusCode::BAD_GATEWAY,
                body: "scripted failure".into(),
            })
        })
    }

    pub fn requests(&self) -> Vec<ProcessingRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ProcessingBackend for ScriptedBackend {
    async fn process(
        &self,
        request: &ProcessingRequest,
    ) -> Result<ProcessingResponse, BackendError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        (self.responder)(request)
    }
}

/// Chat platform that records sends; optionally fails each one after recording it.
#[derive(Default)]
pub struct RecordingPlatform {
    sent: Mutex<Vec<OutboundMessage>>,
    failing: bool,
    notify: Notify,
}

impl RecordingPlatform {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Waits (up to two seconds) until at least `count` sends were attempted.
    pub async fn wait_for(&self, count: usize) -> Vec<OutboundMessage> {
        let wait = async {
            loop {
                let sent = self.sent();
                if sent.len() >= count {
                    return sent;
                }
                self.notify.notified().await;
            }
        };
        tokio::time::timeout(Duration::from_secs(2), wait)
            .await
            .unwrap_or_else(|_| self.sent())
    }
}

#[async_trait]
impl ChatPlatform for RecordingPlatform {
    async fn send_message(&self, message: &OutboundMessage) -> Result<(), PlatformError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.clone());
        self.notify.notify_one();
        if self.failing {
            return Err(PlatformError::Status {
                status: StatusCode::FORBIDDEN,
                body: "recording platform set to fail".into(),
            });
        }
        Ok(())
    }
}
