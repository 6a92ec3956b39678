//! The relay attempt: authorize, forward, notify.
//!
//! [`Relay::handle`] owns the whole attempt for one inbound update. The three collaborator calls
//! run strictly one after another. Failure notices (unauthorized, internal error) are detached
//! tasks; the reply or generic notice is awaited before the attempt completes. Chat platform
//! failures are logged and counted, never returned.
use std::sync::Arc;
use std::time::Duration;

use relay_telemetry::{TelemetryLabels, record_counter};
use serde_json::Value;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, info, info_span, warn};

use crate::auth_store::SupabaseAuthStore;
use crate::backend::HttpProcessingBackend;
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::interfaces::{Authorization, AuthorizationStore, ChatPlatform, ProcessingBackend};
use crate::telegram::HttpTelegramApi;
use crate::types::{InboundMessage, OutboundMessage, ProcessingRequest, SenderId};

pub const UNAUTHORIZED_NOTICE: &str = "You are not authorized to use this bot.";
pub const PROCESSING_FAILED_NOTICE: &str = "Error: Unable to process the message.";
pub const INTERNAL_ERROR_NOTICE: &str = "Internal error. Please try again later.";

const RELAY_EVENTS_COUNTER: &str = "relay_events_total";
const NOTICE_FAILURES_COUNTER: &str = "relay_notices_failed_total";
const TELEMETRY_SERVICE: &str = "relay";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayOptions {
    /// Tell unknown senders they are not authorized before answering 403.
    pub notify_unauthorized: bool,
    /// Repeat the sender id as `telegramId` in backend requests.
    pub include_telegram_id: bool,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            notify_unauthorized: true,
            include_telegram_id: false,
        }
    }
}

impl RelayOptions {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            notify_unauthorized: config.notify_unauthorized,
            include_telegram_id: config.backend_legacy_telegram_id,
        }
    }
}

/// How a completed relay attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The backend succeeded and its message went to the sender.
    Replied,
    /// The backend reported a non-success status; the generic notice went out instead.
    ProcessingFailed,
}

impl RelayOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayOutcome::Replied => "replied",
            RelayOutcome::ProcessingFailed => "processing_failed",
        }
    }
}

#[derive(Clone)]
pub struct Relay {
    store: Arc<dyn AuthorizationStore>,
    backend: Arc<dyn ProcessingBackend>,
    platform: Arc<dyn ChatPlatform>,
    options: RelayOptions,
    notices: TaskTracker,
}

impl Relay {
    pub fn new(
        store: Arc<dyn AuthorizationStore>,
        backend: Arc<dyn ProcessingBackend>,
        platform: Arc<dyn ChatPlatform>,
        options: RelayOptions,
    ) -> Self {
        Self {
            store,
            backend,
            platform,
            options,
            notices: TaskTracker::new(),
        }
    }

    /// Wires the HTTP collaborators described by `config` around one shared client.
    pub fn from_config(config: &RelayConfig) -> reqwest::Result<Self> {
        let client = config.http_client()?;
        Ok(Self::new(
            Arc::new(SupabaseAuthStore::new(
                client.clone(),
                config.auth_store.clone(),
            )),
            Arc::new(HttpProcessingBackend::new(
                client.clone(),
                &config.backend_base_url,
            )),
            Arc::new(HttpTelegramApi::new(
                client,
                &config.platform_api_base,
                config.platform_api_token.clone(),
            )),
            RelayOptions::from_config(config),
        ))
    }

    pub fn options(&self) -> RelayOptions {
        self.options
    }

    /// Detached notices still being sent.
    pub fn pending_notices(&self) -> usize {
        self.notices.len()
    }

    /// Waits up to `grace` for detached notices to finish. Returns `false` if some were still
    /// in flight when the grace period ran out. Notices started afterwards are still tracked.
    pub async fn drain_notices(&self, grace: Duration) -> bool {
        self.notices.close();
        let drained = tokio::time::timeout(grace, self.notices.wait())
            .await
            .is_ok();
        self.notices.reopen();
        drained
    }

    /// Runs one relay attempt for a raw webhook payload.
    pub async fn handle(&self, payload: &Value) -> Result<RelayOutcome, RelayError> {
        let message = match InboundMessage::from_update(payload) {
            Ok(message) => message,
            Err(err) => {
                warn!(error = %err, "rejecting webhook payload");
                record_event(err.kind());
                return Err(err);
            }
        };

        let span = info_span!("relay.handle", sender_id = %message.sender_id);
        async {
            let result = self.relay(&message).await;
            match &result {
                Ok(outcome) => {
                    info!(outcome = outcome.as_str(), "relay attempt completed");
                    record_event(outcome.as_str());
                }
                Err(err) => {
                    record_event(err.kind());
                    self.on_failure(message.sender_id, err);
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn relay(&self, message: &InboundMessage) -> Result<RelayOutcome, RelayError> {
        let sender = message.sender_id;
        match self.store.lookup(sender).await? {
            Authorization::Authorized => {}
            Authorization::NotFound => return Err(RelayError::Unauthorized(sender)),
        }

        let request = ProcessingRequest::new(message, self.options.include_telegram_id);
        let response = self.backend.process(&request).await?;

        let (outcome, text) = if response.is_success() {
            (RelayOutcome::Replied, response.message)
        } else {
            warn!(status = %response.status, "processing backend did not succeed");
            (
                RelayOutcome::ProcessingFailed,
                PROCESSING_FAILED_NOTICE.to_string(),
            )
        };
        send_best_effort(self.platform.as_ref(), OutboundMessage::new(sender, text)).await;
        Ok(outcome)
    }

    fn on_failure(&self, sender: SenderId, err: &RelayError) {
        match err {
            RelayError::MalformedRequest(_) => {}
            RelayError::Unauthorized(_) => {
                warn!("access denied");
                if self.options.notify_unauthorized {
                    self.notify_detached(OutboundMessage::new(sender, UNAUTHORIZED_NOTICE));
                }
            }
            RelayError::Store(_) | RelayError::Backend(_) => {
                warn!(error = %err, kind = err.kind(), "relay attempt failed");
                self.notify_detached(OutboundMessage::new(sender, INTERNAL_ERROR_NOTICE));
            }
        }
    }

    /// Sends a notice on its own tracked task; the caller never waits for it.
    fn notify_detached(&self, message: OutboundMessage) {
        let platform = Arc::clone(&self.platform);
        self.notices.spawn(
            async move { send_best_effort(platform.as_ref(), message).await }.in_current_span(),
        );
    }
}

async fn send_best_effort(platform: &dyn ChatPlatform, message: OutboundMessage) {
    if let Err(err) = platform.send_message(&message).await {
        warn!(recipient = %message.chat_id, error = %err, "failed to send telegram message");
        record_counter(
            NOTICE_FAILURES_COUNTER,
            1,
            &TelemetryLabels::new(TELEMETRY_SERVICE),
        );
    }
}

fn record_event(outcome: &'static str) {
    record_counter(
        RELAY_EVENTS_COUNTER,
        1,
        &TelemetryLabels::new(TELEMETRY_SERVICE).with("outcome", outcome),
    );
}
