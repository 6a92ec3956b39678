use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::PlatformError;
use crate::interfaces::ChatPlatform;
use crate::types::OutboundMessage;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WebhookInfo {
    #[serde(default)]
    pub url: String,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// Bot API calls used to register the relay's webhook.
#[async_trait]
pub trait TelegramWebhookApi: Send + Sync {
    async fn get_webhook_info(&self) -> Result<WebhookInfo, PlatformError>;
    async fn set_webhook(&self, url: &str, allowed_updates: &[String])
    -> Result<(), PlatformError>;
}

/// Telegram Bot API client bound to a single bot token.
#[derive(Clone)]
pub struct HttpTelegramApi {
    client: Client,
    api_base: String,
    bot_token: String,
}

impl HttpTelegramApi {
    pub fn new(client: Client, api_base: &str, bot_token: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        }
    }

    pub fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    async fn call<P, T>(&self, method: &str, payload: Option<&P>) -> Result<T, PlatformError>
    where
        P: Serialize + Sync + ?Sized,
        T: DeserializeOwned + Default,
    {
        let url = self.method_url(method);
        let req = match payload {
            Some(payload) => self.client.post(&url).json(payload),
            None => self.client.get(&url),
        };
        let res = req.send().await.map_err(PlatformError::Transport)?;
        let status = res.status();
        let body = res.bytes().await.map_err(PlatformError::Transport)?;
        if !status.is_success() {
            return Err(PlatformError::Status {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        let parsed: TelegramResponse<T> =
            serde_json::from_slice(&body).map_err(PlatformError::Decode)?;
        if parsed.ok {
            Ok(parsed.result.unwrap_or_default())
        } else {
            Err(PlatformError::Rejected {
                method: method.to_string(),
                description: parsed
                    .description
                    .unwrap_or_else(|| "unknown error".into()),
            })
        }
    }
}

#[async_trait]
impl ChatPlatform for HttpTelegramApi {
    async fn send_message(&self, message: &OutboundMessage) -> Result<(), PlatformError> {
        self.call::<_, Value>("sendMessage", Some(message))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl TelegramWebhookApi for HttpTelegramApi {
    async fn get_webhook_info(&self) -> Result<WebhookInfo, PlatformError> {
        self.call::<Value, WebhookInfo>("getWebhookInfo", None)
            .await
    }

    async fn set_webhook(
        &self,
        url: &str,
        allowed_updates: &[String],
    ) -> Result<(), PlatformError> {
        let payload = serde_json::json!({
            "url": url,
            "allowed_updates": allowed_updates,
        });
        self.call::<_, Value>("setWebhook", Some(&payload))
            .await
            .map(|_| ())
    }
}
