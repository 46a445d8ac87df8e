use std::env;
use std::time::Duration;

use super::{ClientConfig, ConfigError};

pub(super) const ENV_HOST: &str = "LAVALINK_HOST";
pub(super) const ENV_PASSWORD: &str = "LAVALINK_PASSWORD";
pub(super) const ENV_USER_ID: &str = "LAVALINK_USER_ID";
pub(super) const ENV_TLS: &str = "LAVALINK_TLS";
pub(super) const ENV_CLIENT_NAME: &str = "LAVALINK_CLIENT_NAME";
pub(super) const ENV_HANDSHAKE_TIMEOUT_SECS: &str = "LAVALINK_HANDSHAKE_TIMEOUT_SECS";

/// Parse a boolean flag the way operators tend to write them.
pub(super) fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

pub(super) fn parse_secs(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

impl ClientConfig {
    /// Load configuration from environment variables over the defaults.
    ///
    /// Reads `LAVALINK_HOST`, `LAVALINK_PASSWORD`, `LAVALINK_USER_ID`,
    /// `LAVALINK_TLS`, `LAVALINK_CLIENT_NAME` and
    /// `LAVALINK_HANDSHAKE_TIMEOUT_SECS`. Unset variables keep their default.
    /// The result is not validated; the client builder does that.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = ClientConfig::default();
        config.apply_env()?;
        Ok(config)
    }

    pub(super) fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(host) = var(ENV_HOST) {
            self.host = host;
        }
        if let Some(password) = var(ENV_PASSWORD) {
            self.password = password;
        }
        if let Some(user_id) = var(ENV_USER_ID) {
            self.user_id = user_id;
        }
        if let Some(tls) = var(ENV_TLS) {
            self.tls = parse_bool(ENV_TLS, &tls)?;
        }
        if let Some(client_name) = var(ENV_CLIENT_NAME).filter(|name| !name.is_empty()) {
            self.client_name = client_name;
        }
        if let Some(secs) = var(ENV_HANDSHAKE_TIMEOUT_SECS) {
            self.handshake_timeout = parse_secs(ENV_HANDSHAKE_TIMEOUT_SECS, &secs)?;
        }
        Ok(())
    }
}
