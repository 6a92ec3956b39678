use async_trait::async_trait;
use reqwest::Client;

use crate::error::BackendError;
use crate::interfaces::ProcessingBackend;
use crate::types::{ProcessingRequest, ProcessingResponse};

pub const PROCESS_MESSAGE_PATH: &str = "/process-message";

/// BotService client: one `POST {base}/process-message` per relay attempt, no retries.
#[derive(Clone)]
pub struct HttpProcessingBackend {
    client: Client,
    url: String,
}

impl HttpProcessingBackend {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), PROCESS_MESSAGE_PATH),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ProcessingBackend for HttpProcessingBackend {
    async fn process(
        &self,
        request: &ProcessingRequest,
    ) -> Result<ProcessingResponse, BackendError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(BackendError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }

        let body = response.bytes().await.map_err(BackendError::Transport)?;
        serde_json::from_slice(&body).map_err(BackendError::Decode)
    }
}
