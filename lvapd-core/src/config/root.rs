use serde::Deserialize;

use crate::codec::PROTOCOL_VERSION;
use crate::config::security::SecurityConfig;
use crate::config::telemetry::LoggingConfig;
use crate::config::timeout::TimeoutConfig;

fn default_listen() -> String {
    "0.0.0.0:6633".to_string()
}

fn default_protocol_version() -> u8 {
    PROTOCOL_VERSION
}

/// Root configuration for the controller, loaded from a single TOML file.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Address the controller listens on for WTP connections.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Protocol version this controller accepts. Frames carrying any other
    /// version are rejected by the codec before dispatch.
    #[serde(default = "default_protocol_version")]
    pub protocol_version: u8,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen: default_listen(),
            protocol_version: default_protocol_version(),
            security: SecurityConfig::default(),
            timeouts: TimeoutConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
