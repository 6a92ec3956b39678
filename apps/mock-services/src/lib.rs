//! Local stand-ins for the relay's three collaborators, served from one port.
//!
//! ```text
//! GET  /rest/v1/{table}?telegram_id=eq.<id>   Supabase single-row lookup
//! POST /process-message                       BotService echo
//! POST /bot<token>/<method>                   Telegram Bot API envelope
//! ```
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tracing::info;

pub const DEFAULT_MOCK_BIND: &str = "0.0.0.0:9081";

#[derive(Debug, Clone)]
pub struct MockConfig {
    pub bind: SocketAddr,
    pub authorized_ids: HashSet<i64>,
}

impl MockConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_bind = lookup("MOCK_BIND").unwrap_or_else(|| DEFAULT_MOCK_BIND.into());
        let bind: SocketAddr = raw_bind
            .parse()
            .with_context(|| format!("invalid MOCK_BIND {raw_bind}"))?;
        let authorized_ids = lookup("MOCK_AUTHORIZED_IDS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| {
                id.parse::<i64>()
                    .with_context(|| format!("invalid id in MOCK_AUTHORIZED_IDS: {id}"))
            })
            .collect::<Result<_>>()?;
        Ok(Self {
            bind,
            authorized_ids,
        })
    }
}

#[derive(Clone, Default)]
pub struct MockState {
    authorized: Arc<HashSet<i64>>,
    webhook_url: Arc<Mutex<String>>,
}

impl MockState {
    pub fn new(authorized_ids: HashSet<i64>) -> Self {
        Self {
            authorized: Arc::new(authorized_ids),
            webhook_url: Arc::default(),
        }
    }
}

pub fn build_router(state: MockState) -> Router {
    Router::new()
        .route("/rest/v1/{table}", get(lookup_user))
        .route("/process-message", post(process_message))
        .route("/{bot}/{method}", get(bot_method).post(bot_method))
        .with_state(state)
}

async fn lookup_user(
    State(state): State<MockState>,
    Path(table): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let id = query
        .get("telegram_id")
        .and_then(|filter| filter.strip_prefix("eq."))
        .and_then(|raw| raw.parse::<i64>().ok());
    info!(%table, ?id, "SUPABASE LOOKUP");
    match id {
        Some(id) if state.authorized.contains(&id) => {
            Json(json!({ "id": id, "telegram_id": id })).into_response()
        }
        _ => (
            StatusCode::NOT_ACCEPTABLE,
            Json(json!({
                "code": "PGRST116",
                "details": "The result contains 0 rows",
                "hint": null,
                "message": "JSON object requested, multiple (or no) rows returned"
            })),
        )
            .into_response(),
    }
}

async fn process_message(Json(payload): Json<Value>) -> Json<Value> {
    info!("BOTSERVICE REQUEST: {}", payload);
    let text = payload["text"].as_str().unwrap_or_default();
    Json(json!({ "status": "success", "message": format!("Received: {text}") }))
}

async fn bot_method(
    State(state): State<MockState>,
    Path((bot, method)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    if !bot.starts_with("bot") {
        return telegram_error(StatusCode::NOT_FOUND, "Not Found");
    }
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    info!("TELEGRAM {}: {}", method, payload);

    match method.as_str() {
        "sendMessage" => Json(json!({
            "ok": true,
            "result": {
                "message_id": 1,
                "chat": { "id": payload["chat_id"] },
                "text": payload["text"]
            }
        }))
        .into_response(),
        "setWebhook" => {
            let url = payload["url"].as_str().unwrap_or_default().to_string();
            *state.webhook_url.lock().unwrap_or_else(|e| e.into_inner()) = url;
            Json(json!({ "ok": true, "result": true, "description": "Webhook was set" }))
                .into_response()
        }
        "getWebhookInfo" => {
            let url = state
                .webhook_url
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone();
            Json(json!({ "ok": true, "result": { "url": url, "pending_update_count": 0 } }))
                .into_response()
        }
        _ => telegram_error(StatusCode::NOT_FOUND, "Not Found: method not found"),
    }
}

fn telegram_error(status: StatusCode, description: &str) -> Response {
    (
        status,
        Json(json!({
            "ok": false,
            "error_code": status.as_u16(),
            "description": description
        })),
    )
        .into_response()
}
