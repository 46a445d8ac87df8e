use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::{ClientConfig, ConfigError};

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present
/// in the file win over environment variables.
///
/// # Example YAML structure
/// ```yaml
/// lavalink:
///   host: "lavalink.example.com:2333"
///   password: "youshallnotpass"
///   user_id: "123456789012345678"
///   tls: true
///   client_name: "my-bot/1.0"
///   handshake_timeout_secs: 30
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub lavalink: Option<LavalinkYaml>,
}

/// Node connection settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LavalinkYaml {
    pub host: Option<String>,
    pub password: Option<String>,
    pub user_id: Option<String>,
    pub tls: Option<bool>,
    pub client_name: Option<String>,
    pub handshake_timeout_secs: Option<u64>,
}

impl YamlConfig {
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }
}

impl ClientConfig {
    /// Load configuration from a YAML file, layered over the environment.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let yaml = YamlConfig::from_file(path)?;
        let mut config = ClientConfig::from_env()?;
        config.apply_yaml(yaml)?;
        Ok(config)
    }

    fn apply_yaml(&mut self, yaml: YamlConfig) -> Result<(), ConfigError> {
        let Some(lavalink) = yaml.lavalink else {
            return Ok(());
        };

        if let Some(host) = lavalink.host {
            self.host = host;
        }
        if let Some(password) = lavalink.password {
            self.password = password;
        }
        if let Some(user_id) = lavalink.user_id {
            self.user_id = user_id;
        }
        if let Some(tls) = lavalink.tls {
            self.tls = tls;
        }
        if let Some(client_name) = lavalink.client_name.filter(|name| !name.is_empty()) {
            self.client_name = client_name;
        }
        if let Some(secs) = lavalink.handshake_timeout_secs {
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "lavalink.handshake_timeout_secs",
                    value: secs.to_string(),
                });
            }
            self.handshake_timeout = Duration::from_secs(secs);
        }
        Ok(())
    }
}
