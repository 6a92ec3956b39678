use std::sync::Arc;
use std::time::Instant;

use axum::{
    Extension, Router,
    body::Bytes,
    extract::State,
    http::Method,
    middleware,
    routing::{any, get, post},
};
use relay_core::{Relay, ResponseStyle, WebhookReply, handle_webhook};
use relay_telemetry::{TelemetryLabels, record_histogram, with_common_fields};
use tracing::{Instrument, field, info_span};

use crate::request_id::{RequestId, with_request_id};

pub const WELCOME_MESSAGE: &str = "Welcome to the Connector Service!";
pub const WEBHOOK_PATH: &str = "/webhook";
pub const FUNCTION_WEBHOOK_PATH: &str = "/api/webhook";

const REQUEST_SECONDS: &str = "relay_webhook_request_seconds";

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

impl AppState {
    pub fn new(relay: Relay) -> Self {
        Self {
            relay: Arc::new(relay),
        }
    }
}

/// Routes for both transport shells plus the welcome page.
///
/// `POST /webhook` answers in JSON and leaves other methods to the router's 405.
/// `/api/webhook` accepts every method and answers in plain text, so the adapter
/// reports the 405 itself.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route(WEBHOOK_PATH, post(server_webhook))
        .route(FUNCTION_WEBHOOK_PATH, any(function_webhook))
        .layer(middleware::from_fn(with_request_id))
        .with_state(state)
}

async fn welcome() -> &'static str {
    WELCOME_MESSAGE
}

async fn server_webhook(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    method: Method,
    body: Bytes,
) -> WebhookReply {
    dispatch(&state, request_id, method, body, ResponseStyle::Json).await
}

async fn function_webhook(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    method: Method,
    body: Bytes,
) -> WebhookReply {
    dispatch(&state, request_id, method, body, ResponseStyle::PlainText).await
}

async fn dispatch(
    state: &AppState,
    request_id: Option<Extension<RequestId>>,
    method: Method,
    body: Bytes,
    style: ResponseStyle,
) -> WebhookReply {
    let span = info_span!(
        "webhook.request",
        method = %method,
        request_id = field::Empty,
    );
    let rid = request_id.map(|Extension(RequestId(id))| id);
    with_common_fields(&span, rid.as_deref());

    let started = Instant::now();
    let reply = handle_webhook(&state.relay, &method, &body, style)
        .instrument(span)
        .await;
    record_histogram(
        REQUEST_SECONDS,
        started.elapsed().as_secs_f64(),
        &TelemetryLabels::new("webhook").with("status", reply.status.as_str()),
    );
    reply
}
