use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::AuthStoreConfig;
use crate::error::StoreError;
use crate::interfaces::{Authorization, AuthorizationStore};
use crate::types::SenderId;

/// PostgREST error code for "single object requested, zero or several rows returned".
pub const PGRST_NOT_SINGLE: &str = "PGRST116";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
}

/// Looks senders up in the Supabase `users` table through its PostgREST API.
#[derive(Clone)]
pub struct SupabaseAuthStore {
    client: Client,
    config: AuthStoreConfig,
}

impl SupabaseAuthStore {
    pub fn new(client: Client, config: AuthStoreConfig) -> Self {
        Self { client, config }
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.url.trim_end_matches('/'),
            self.config.table
        )
    }
}

#[async_trait]
impl AuthorizationStore for SupabaseAuthStore {
    async fn lookup(&self, sender: SenderId) -> Result<Authorization, StoreError> {
        let filter = format!("eq.{sender}");
        let res = self
            .client
            .get(self.table_url())
            .query(&[("select", "id"), ("telegram_id", filter.as_str())])
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT)
            .send()
            .await
            .map_err(StoreError::Transport)?;

        let status = res.status();
        if status.is_success() {
            return Ok(Authorization::Authorized);
        }
        let body = res.text().await.unwrap_or_default();
        if status == StatusCode::NOT_ACCEPTABLE && is_not_single(&body) {
            debug!(sender_id = %sender, "user not found in authorization store");
            return Ok(Authorization::NotFound);
        }
        warn!(sender_id = %sender, status = %status, "authorization store query failed");
        Err(StoreError::Status { status, body })
    }
}

fn is_not_single(body: &str) -> bool {
    serde_json::from_str::<PostgrestError>(body)
        .ok()
        .and_then(|err| err.code)
        .is_some_and(|code| code == PGRST_NOT_SINGLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_not_single_error() {
        assert!(is_not_single(
            r#"{"code":"PGRST116","details":"The result contains 0 rows","hint":null,"message":"JSON object requested, multiple (or no) rows returned"}"#
        ));
        assert!(!is_not_single(r#"{"code":"42P01","message":"relation does not exist"}"#));
        assert!(!is_not_single("<html>bad gateway</html>"));
    }

    #[test]
    fn table_url_ignores_trailing_slash() {
        let store = SupabaseAuthStore::new(
            Client::new(),
            AuthStoreConfig {
                url: "https://db.example.co/".into(),
                api_key: "k".into(),
                table: "users".into(),
            },
        );
        assert_eq!(store.table_url(), "https://db.example.co/rest/v1/users");
    }
}
