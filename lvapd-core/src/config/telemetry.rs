use serde::Deserialize;

fn default_log_level() -> String {
    "info".to_string()
}

fn default_show_target() -> bool {
    false
}

/// Logging knobs wired into `tracing_subscriber` at binary startup.
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_show_target")]
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: default_log_level(), show_target: default_show_target() }
    }
}
