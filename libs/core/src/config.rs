use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_BACKEND_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_USERS_TABLE: &str = "users";
pub const DEFAULT_LISTEN_PORT: u16 = 3000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Where and how to reach the hosted users table.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthStoreConfig {
    pub url: String,
    pub api_key: String,
    pub table: String,
}

impl fmt::Debug for AuthStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthStoreConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("table", &self.table)
            .finish()
    }
}

/// Process-wide settings, built once at startup and passed by reference.
#[derive(Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub auth_store: AuthStoreConfig,
    pub platform_api_token: String,
    pub platform_api_base: String,
    pub webhook_url: Option<String>,
    pub backend_base_url: String,
    pub backend_legacy_telegram_id: bool,
    pub notify_unauthorized: bool,
    pub bind_addr: IpAddr,
    pub listen_port: u16,
    pub http_timeout: Option<Duration>,
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("auth_store", &self.auth_store)
            .field("platform_api_token", &"<redacted>")
            .field("platform_api_base", &self.platform_api_base)
            .field("webhook_url", &self.webhook_url)
            .field("backend_base_url", &self.backend_base_url)
            .field("backend_legacy_telegram_id", &self.backend_legacy_telegram_id)
            .field("notify_unauthorized", &self.notify_unauthorized)
            .field("bind_addr", &self.bind_addr)
            .field("listen_port", &self.listen_port)
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let auth_store = AuthStoreConfig {
            url: required("SUPABASE_URL")?,
            api_key: required("SUPABASE_API_KEY")?,
            table: get("SUPABASE_USERS_TABLE").unwrap_or_else(|| DEFAULT_USERS_TABLE.into()),
        };

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: raw,
            })?,
            None => IpAddr::from([0, 0, 0, 0]),
        };
        let listen_port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: raw,
            })?,
            None => DEFAULT_LISTEN_PORT,
        };
        let http_timeout = match get("RELAY_HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "RELAY_HTTP_TIMEOUT_SECS",
                        value: raw,
                    });
                }
            },
            None => None,
        };

        Ok(Self {
            auth_store,
            platform_api_token: required("TELEGRAM_BOT_TOKEN")?,
            platform_api_base: get("TELEGRAM_API_BASE")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.into()),
            webhook_url: get("WEBHOOK_URL"),
            backend_base_url: get("BOT_SERVICE_URL")
                .unwrap_or_else(|| DEFAULT_BACKEND_BASE_URL.into()),
            backend_legacy_telegram_id: flag(&get, "BOT_SERVICE_LEGACY_TELEGRAM_ID", false)?,
            notify_unauthorized: flag(&get, "NOTIFY_UNAUTHORIZED", true)?,
            bind_addr,
            listen_port,
            http_timeout,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.listen_port)
    }

    /// Shared HTTP client for all outbound calls.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.http_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }
}

fn flag<G>(get: &G, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value: raw }),
        },
    }
}
