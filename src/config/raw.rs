use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde_with::serde_as;
use url::Url;

use crate::Result;
use crate::error::ConfigError;
use crate::types::UpdateMode;

use super::defaults::{
    default_api_base, default_bind, default_connect_timeout, default_dedup_cache_size,
    default_poll_timeout, default_port, default_request_timeout, default_service_name,
    default_update_queue_bound, default_updates,
};
use super::env::{env_duration, env_parse, env_string};
use super::{AppSettings, Config, HumantimeDuration, ServerSettings, TelegramSettings};

const MAX_POLL_TIMEOUT: Duration = Duration::from_secs(50);

pub(super) fn load(path: impl AsRef<Path>) -> std::result::Result<RawConfig, ConfigError> {
    let mut builder = ::config::Config::builder();
    let path = path.as_ref();
    builder = builder.add_source(::config::File::from(path).required(false));
    builder = builder.add_source(
        ::config::Environment::with_prefix("ERROR_RELAY")
            .separator("__")
            .try_parsing(true),
    );

    builder
        .build()
        .map_err(|err| ConfigError::Other(err.to_string()))?
        .try_deserialize()
        .map_err(|err| ConfigError::Parse(err.to_string()))
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub(super) telegram: RawTelegram,
    #[serde(default)]
    pub(super) server: RawServer,
    #[serde(default)]
    pub(super) app: RawApp,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub(super) struct RawTelegram {
    #[serde(default = "default_api_base")]
    pub(super) api_base: String,
    pub(super) token: Option<String>,
    pub(super) admin_id: Option<String>,
    #[serde(default = "default_updates")]
    pub(super) updates: String,
    #[serde(default = "default_poll_timeout")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) poll_timeout: Duration,
    #[serde(default)]
    pub(super) webhook_url: Option<String>,
    #[serde(default)]
    pub(super) webhook_secret: Option<String>,
    #[serde(default = "default_request_timeout")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) request_timeout: Duration,
    #[serde(default = "default_connect_timeout")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) connect_timeout: Duration,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawServer {
    #[serde(default = "default_bind")]
    pub(super) bind: IpAddr,
    #[serde(default = "default_port")]
    pub(super) port: u16,
    #[serde(default = "default_service_name")]
    pub(super) service_name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawApp {
    #[serde(default = "default_update_queue_bound")]
    pub(super) update_queue_bound: usize,
    #[serde(default = "default_dedup_cache_size")]
    pub(super) dedup_cache_size: usize,
}

impl RawConfig {
    pub(super) fn apply_env_overrides(&mut self) -> std::result::Result<(), ConfigError> {
        if let Some(port) = env_parse::<u16>("PORT")? {
            self.server.port = port;
        }
        if let Some(name) = env_string("SERVICE_NAME")? {
            self.server.service_name = name;
        }
        if let Some(token) = env_string("BOT_TOKEN")? {
            self.telegram.token = Some(token);
        }
        if let Some(admin_id) = env_string("ADMIN_ID")? {
            self.telegram.admin_id = Some(admin_id);
        }
        if let Some(base) = env_string("TELEGRAM_API_BASE")? {
            self.telegram.api_base = base;
        }
        if let Some(mode) = env_string("UPDATE_MODE")? {
            self.telegram.updates = mode;
        }
        if let Some(url) = env_string("WEBHOOK_URL")? {
            self.telegram.webhook_url = Some(url);
        }
        if let Some(secret) = env_string("WEBHOOK_SECRET")? {
            self.telegram.webhook_secret = Some(secret);
        }
        if let Some(timeout) = env_duration("REQUEST_TIMEOUT")? {
            self.telegram.request_timeout = timeout;
        }
        if let Some(timeout) = env_duration("POLL_TIMEOUT")? {
            self.telegram.poll_timeout = timeout;
        }
        Ok(())
    }

    pub(super) fn validate_and_build(self) -> Result<Config> {
        let RawConfig {
            telegram,
            server,
            app,
        } = self;

        let token = telegram.token.ok_or(ConfigError::MissingField {
            field: "telegram.token",
        })?;
        if token.trim().is_empty() {
            return Err(ConfigError::InvalidField {
                field: "telegram.token",
                message: "token cannot be empty".to_string(),
            }
            .into());
        }

        let admin_src = telegram.admin_id.ok_or(ConfigError::MissingField {
            field: "telegram.admin_id",
        })?;
        let admin_id = admin_src
            .trim()
            .parse::<i64>()
            .map_err(|err| ConfigError::InvalidField {
                field: "telegram.admin_id",
                message: format!("expected a numeric chat id, got {admin_src:?}: {err}"),
            })?;

        let api_base = Url::parse(&telegram.api_base).map_err(|err| ConfigError::InvalidField {
            field: "telegram.api_base",
            message: err.to_string(),
        })?;

        let updates = UpdateMode::from_str(&telegram.updates).map_err(|err| {
            ConfigError::InvalidField {
                field: "telegram.updates",
                message: err,
            }
        })?;

        let webhook_url = telegram
            .webhook_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(|err| ConfigError::InvalidField {
                field: "telegram.webhook_url",
                message: err.to_string(),
            })?;
        if let Some(url) = webhook_url.as_ref() {
            if url.scheme() != "https" {
                return Err(ConfigError::InvalidField {
                    field: "telegram.webhook_url",
                    message: "Telegram only delivers webhooks to https URLs".to_string(),
                }
                .into());
            }
        }

        if telegram.poll_timeout > MAX_POLL_TIMEOUT {
            return Err(ConfigError::InvalidField {
                field: "telegram.poll_timeout",
                message: format!(
                    "long polling timeout must not exceed {}",
                    humantime::format_duration(MAX_POLL_TIMEOUT)
                ),
            }
            .into());
        }
        if telegram.request_timeout.is_zero() {
            return Err(ConfigError::InvalidField {
                field: "telegram.request_timeout",
                message: "request timeout must be greater than zero".to_string(),
            }
            .into());
        }
        if server.port == 0 {
            return Err(ConfigError::InvalidField {
                field: "server.port",
                message: "port must be greater than zero".to_string(),
            }
            .into());
        }
        if app.update_queue_bound == 0 {
            return Err(ConfigError::InvalidField {
                field: "app.update_queue_bound",
                message: "queue bound must be greater than zero".to_string(),
            }
            .into());
        }
        if app.dedup_cache_size == 0 {
            return Err(ConfigError::InvalidField {
                field: "app.dedup_cache_size",
                message: "dedup cache size must be greater than zero".to_string(),
            }
            .into());
        }

        Ok(Config {
            telegram: TelegramSettings {
                api_base,
                token: token.into(),
                admin_id,
                updates,
                poll_timeout: telegram.poll_timeout,
                webhook_url,
                webhook_secret: telegram
                    .webhook_secret
                    .filter(|secret| !secret.trim().is_empty())
                    .map(Into::into),
                request_timeout: telegram.request_timeout,
                connect_timeout: telegram.connect_timeout,
            },
            server: ServerSettings {
                bind: server.bind,
                port: server.port,
                service_name: server.service_name,
            },
            app: AppSettings {
                update_queue_bound: app.update_queue_bound,
                dedup_cache_size: app.dedup_cache_size,
            },
        })
    }
}

impl Default for RawTelegram {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token: None,
            admin_id: None,
            updates: default_updates(),
            poll_timeout: default_poll_timeout(),
            webhook_url: None,
            webhook_secret: None,
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl Default for RawServer {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RawApp {
    fn default() -> Self {
        Self {
            update_queue_bound: default_update_queue_bound(),
            dedup_cache_size: default_dedup_cache_size(),
        }
    }
}
