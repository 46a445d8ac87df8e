//! Configuration for the Lavalink client
//!
//! This module holds the connection configuration and the rules that gate a
//! connection attempt. Values can come from code, environment variables,
//! `.env` files (loaded by the binary) or a YAML file.
//! Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `env`: Environment variable loading
//! - `yaml`: YAML configuration file loading
//!
//! # Example
//! ```rust,no_run
//! use lavalink_client::config::ClientConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Build in code
//! let config = ClientConfig::new("lavalink.example.com:2333", "youshallnotpass", "1234567890")
//!     .with_tls(true);
//! config.validate()?;
//!
//! // Load from YAML file with environment variables underneath
//! let config = ClientConfig::from_file(&PathBuf::from("lavalink.yaml"))?;
//! println!("Connecting to {}", config.websocket_url()?);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::core::lavalink::{ClientError, ClientResult};
use crate::utils::host_validation::is_valid_host;

mod env;
mod yaml;

pub use yaml::{LavalinkYaml, YamlConfig};

/// Path of the node's WebSocket endpoint.
pub const WEBSOCKET_PATH: &str = "/v4/websocket";

/// Handshake deadline applied when none is configured.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Value sent in the `Client-Name` handshake header when none is configured.
pub const DEFAULT_CLIENT_NAME: &str = concat!("lavalink-client/", env!("CARGO_PKG_VERSION"));

/// Errors raised while loading configuration from the environment or a file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Connection configuration for one Lavalink node.
///
/// Immutable once handed to the client builder. The password is redacted
/// from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Node address, `domain[:port]` or `a.b.c.d[:port]`, no scheme
    pub host: String,
    /// Node password, sent verbatim as the `Authorization` header
    pub password: String,
    /// Bot user id, sent as the `User-Id` header
    pub user_id: String,
    /// Dial `wss://` instead of `ws://`
    pub tls: bool,
    /// Sent as the `Client-Name` header
    pub client_name: String,
    /// Upper bound on the dial + upgrade handshake
    pub handshake_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            password: String::new(),
            user_id: String::new(),
            tls: false,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("password", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("tls", &self.tls)
            .field("client_name", &self.client_name)
            .field("handshake_timeout", &self.handshake_timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Create a config with default client name and handshake timeout.
    pub fn new(
        host: impl Into<String>,
        password: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            password: password.into(),
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_client_name(mut self, client_name: impl Into<String>) -> Self {
        self.client_name = client_name.into();
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// True when no identifying field is set.
    ///
    /// Client name and timeout carry defaults, so they do not count.
    pub fn is_empty(&self) -> bool {
        self.host.is_empty() && self.password.is_empty() && self.user_id.is_empty() && !self.tls
    }

    /// Check the config before any I/O.
    ///
    /// Checks run in order: emptiness, host grammar, user id. The first
    /// failure wins.
    ///
    /// # Errors
    /// - [`ClientError::EmptyConfig`] if every identifying field is empty
    /// - [`ClientError::InvalidHost`] if the host is neither a domain nor an IPv4 address
    /// - [`ClientError::MissingIdentity`] if the user id is empty
    pub fn validate(&self) -> ClientResult<()> {
        if self.is_empty() {
            return Err(ClientError::EmptyConfig);
        }

        if !is_valid_host(&self.host) {
            return Err(ClientError::InvalidHost(self.host.clone()));
        }

        if self.user_id.is_empty() {
            return Err(ClientError::MissingIdentity);
        }

        Ok(())
    }

    /// `wss` when TLS is enabled, `ws` otherwise.
    pub fn scheme(&self) -> &'static str {
        if self.tls { "wss" } else { "ws" }
    }

    /// Full endpoint URL, e.g. `ws://127.0.0.1:2333/v4/websocket`.
    ///
    /// Hosts that pass the grammar but not URL parsing (port above 65535)
    /// are rejected here, as is any host the URL parser would rewrite to a
    /// different address.
    pub fn websocket_url(&self) -> ClientResult<Url> {
        let invalid = || ClientError::InvalidHost(self.host.clone());
        let raw = format!("{}://{}{}", self.scheme(), self.host, WEBSOCKET_PATH);
        let url = Url::parse(&raw).map_err(|_| invalid())?;

        let configured = self
            .host
            .rsplit_once(':')
            .map_or(self.host.as_str(), |(name, _)| name);
        match url.host_str() {
            Some(parsed) if parsed.eq_ignore_ascii_case(configured) => Ok(url),
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ClientConfig {
        ClientConfig::new("127.0.0.1:2333", "youshallnotpass", "123456789")
    }

    #[test]
    fn test_default_config_is_empty() {
        let config = ClientConfig::default();
        assert!(config.is_empty());
        assert_eq!(config.client_name, DEFAULT_CLIENT_NAME);
        assert_eq!(config.handshake_timeout, Duration::from_secs(30));
        assert!(matches!(config.validate(), Err(ClientError::EmptyConfig)));
    }

    #[test]
    fn test_tls_alone_is_not_empty() {
        let config = ClientConfig::default().with_tls(true);
        assert!(!config.is_empty());
        assert!(matches!(config.validate(), Err(ClientError::InvalidHost(_))));
    }

    #[test]
    fn test_invalid_host_rejected() {
        let config = ClientConfig::new("invalid-host", "pass", "TestClientId");
        match config.validate() {
            Err(ClientError::InvalidHost(host)) => assert_eq!(host, "invalid-host"),
            other => panic!("expected InvalidHost, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_identity_rejected() {
        let config = ClientConfig::new("127.0.0.1", "pass", "");
        assert!(matches!(config.validate(), Err(ClientError::MissingIdentity)));
    }

    #[test]
    fn test_host_checked_before_identity() {
        let config = ClientConfig::new("not a host", "pass", "");
        assert!(matches!(config.validate(), Err(ClientError::InvalidHost(_))));
    }

    #[test]
    fn test_accepted_hosts() {
        for host in ["127.0.0.1", "example.com", "example.com:2333", "10.0.0.5:443"] {
            let config = ClientConfig::new(host, "pass", "id");
            assert!(config.validate().is_ok(), "{host} should validate");
        }
    }

    #[test]
    fn test_websocket_url_scheme() {
        let url = valid().websocket_url().unwrap();
        assert_eq!(url.as_str(), "ws://127.0.0.1:2333/v4/websocket");

        let url = valid().with_tls(true).websocket_url().unwrap();
        assert_eq!(url.as_str(), "wss://127.0.0.1:2333/v4/websocket");
    }

    #[test]
    fn test_websocket_url_rejects_out_of_range_port() {
        let config = ClientConfig::new("example.com:99999", "pass", "id");
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.websocket_url(),
            Err(ClientError::InvalidHost(_))
        ));
    }

    #[test]
    fn test_leading_zero_octet_never_reaches_dial() {
        let config = ClientConfig::new("010.0.0.5:2333", "pass", "id");
        assert!(matches!(config.validate(), Err(ClientError::InvalidHost(_))));
        // Even unvalidated, the URL must not be rewritten to 8.0.0.5
        assert!(matches!(
            config.websocket_url(),
            Err(ClientError::InvalidHost(_))
        ));
    }

    #[test]
    fn test_websocket_url_keeps_configured_host() {
        let config = ClientConfig::new("Lavalink.Example.com:2333", "pass", "id");
        let url = config.websocket_url().unwrap();
        assert_eq!(url.host_str(), Some("lavalink.example.com"));
        assert_eq!(url.port(), Some(2333));
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", valid());
        assert!(!rendered.contains("youshallnotpass"));
        assert!(rendered.contains("<redacted>"));
    }
}
