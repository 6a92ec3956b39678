//! Seams between the relay and its three collaborators.
//!
//! Production code wires the HTTP clients from this crate; tests plug in the in-memory
//! doubles from [`crate::testkit`].
use async_trait::async_trait;

use crate::error::{BackendError, PlatformError, StoreError};
use crate::types::{OutboundMessage, ProcessingRequest, ProcessingResponse, SenderId};

/// Result of an authorization lookup that reached the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Authorized,
    NotFound,
}

/// Read-only lookup of authorized senders.
#[async_trait]
pub trait AuthorizationStore: Send + Sync {
    async fn lookup(&self, sender: SenderId) -> Result<Authorization, StoreError>;
}

/// Service that interprets message text and produces a reply.
#[async_trait]
pub trait ProcessingBackend: Send + Sync {
    async fn process(&self, request: &ProcessingRequest)
    -> Result<ProcessingResponse, BackendError>;
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn send_message(&self, message: &OutboundMessage) -> Result<(), PlatformError>;
}
