use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::Result;
use crate::error::Error as RelayError;
use crate::types::UpdateMode;

mod defaults;
mod env;
mod raw;
mod serde;

use self::serde::HumantimeDuration;

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramSettings,
    pub server: ServerSettings,
    pub app: AppSettings,
}

#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub api_base: Url,
    pub token: SecretString,
    /// The only chat that receives notifications and may drive the panel.
    pub admin_id: i64,
    pub updates: UpdateMode,
    pub poll_timeout: Duration,
    pub webhook_url: Option<Url>,
    pub webhook_secret: Option<SecretString>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind: IpAddr,
    pub port: u16,
    pub service_name: String,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub update_queue_bound: usize,
    pub dedup_cache_size: usize,
}

impl Config {
    /// Load configuration from a file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration file cannot be read, parsed,
    /// when environment overrides are invalid, or when the resulting values
    /// fail validation.
    pub fn from_env_and_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut raw = raw::load(path).map_err(RelayError::from)?;
        raw.apply_env_overrides().map_err(RelayError::from)?;
        raw.validate_and_build()
    }
}

impl ServerSettings {
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}
