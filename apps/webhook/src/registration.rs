//! Startup webhook registration with the Telegram Bot API.
use relay_core::{PlatformError, TelegramWebhookApi};
use relay_telemetry::{TelemetryLabels, record_counter};
use tracing::{info, warn};

/// Update kinds the relay asks Telegram to deliver.
pub const ALLOWED_UPDATES: &[&str] = &["message"];

const REGISTRATIONS_COUNTER: &str = "relay_webhook_registrations_total";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationResult {
    Applied,
    Noop,
    Error,
}

impl RegistrationResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationResult::Applied => "applied",
            RegistrationResult::Noop => "noop",
            RegistrationResult::Error => "error",
        }
    }
}

pub fn urls_match(current: &str, desired: &str) -> bool {
    current.trim_end_matches('/') == desired.trim_end_matches('/')
}

pub fn allowed_updates() -> Vec<String> {
    ALLOWED_UPDATES.iter().map(|s| s.to_string()).collect()
}

/// Points the bot's webhook at `want_url` unless it already is.
pub async fn register_webhook<TApi>(
    api: &TApi,
    want_url: &str,
) -> Result<RegistrationResult, PlatformError>
where
    TApi: TelegramWebhookApi + ?Sized,
{
    let info = api.get_webhook_info().await?;
    if !info.url.trim().is_empty() && urls_match(&info.url, want_url) {
        return Ok(RegistrationResult::Noop);
    }
    api.set_webhook(want_url, &allowed_updates()).await?;
    Ok(RegistrationResult::Applied)
}

/// Runs [`register_webhook`], logging and counting the result. Never fails.
pub async fn ensure_webhook<TApi>(api: &TApi, want_url: &str) -> RegistrationResult
where
    TApi: TelegramWebhookApi + ?Sized,
{
    let result = match register_webhook(api, want_url).await {
        Ok(result) => {
            info!(
                event = "telegram_webhook_register",
                action = result.as_str(),
                want_url = %want_url,
            );
            result
        }
        Err(err) => {
            warn!(
                event = "telegram_webhook_register",
                action = "error",
                want_url = %want_url,
                error = %err
            );
            RegistrationResult::Error
        }
    };
    record_counter(
        REGISTRATIONS_COUNTER,
        1,
        &TelemetryLabels::new("webhook").with("result", result.as_str()),
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use relay_core::WebhookInfo;
    use std::sync::Mutex;
    use tracing_test::traced_test;

    struct MockApi {
        info_url: String,
        fail_info: bool,
        set_calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl MockApi {
        fn new(info_url: &str) -> Self {
            Self {
                info_url: info_url.to_string(),
                fail_info: false,
                set_calls: Mutex::new(Vec::new()),
            }
        }

        fn set_calls(&self) -> Vec<(String, Vec<String>)> {
            self.set_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TelegramWebhookApi for MockApi {
        async fn get_webhook_info(&self) -> Result<WebhookInfo, PlatformError> {
            if self.fail_info {
                return Err(PlatformError::Rejected {
                    method: "getWebhookInfo".into(),
                    description: "Unauthorized".into(),
                });
            }
            Ok(WebhookInfo {
                url: self.info_url.clone(),
                extra: Default::default(),
            })
        }

        async fn set_webhook(
            &self,
            url: &str,
            allowed_updates: &[String],
        ) -> Result<(), PlatformError> {
            self.set_calls
                .lock()
                .unwrap()
                .push((url.to_string(), allowed_updates.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn trailing_slashes_are_ignored() {
        assert!(urls_match("https://relay/webhook/", "https://relay/webhook"));
        assert!(!urls_match("https://relay/webhook", "https://relay/api/webhook"));
    }

    #[tokio::test]
    async fn registers_when_url_differs() {
        let api = MockApi::new("");
        let result = register_webhook(&api, "https://relay.example.com/webhook")
            .await
            .unwrap();
        assert_eq!(result, RegistrationResult::Applied);
        assert_eq!(
            api.set_calls(),
            vec![(
                "https://relay.example.com/webhook".to_string(),
                vec!["message".to_string()]
            )]
        );
    }

    #[tokio::test]
    async fn no_update_when_url_matches() {
        let api = MockApi::new("https://relay.example.com/webhook/");
        let result = register_webhook(&api, "https://relay.example.com/webhook")
            .await
            .unwrap();
        assert_eq!(result, RegistrationResult::Noop);
        assert!(api.set_calls().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn failures_are_reported_not_raised() {
        let api = MockApi {
            fail_info: true,
            ..MockApi::new("")
        };
        assert_eq!(
            ensure_webhook(&api, "https://relay.example.com/webhook").await,
            RegistrationResult::Error
        );
        assert!(api.set_calls().is_empty());
        assert!(logs_contain("telegram_webhook_register"));
        assert!(logs_contain("getWebhookInfo failed: Unauthorized"));
    }
}
