use std::path::Path;

use crate::config::root::Config;
use crate::error::ControllerError;

/// Load and validate a [`Config`] from a TOML file on disk.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ControllerError> {
    let raw = std::fs::read_to_string(path).map_err(ControllerError::Io)?;
    let config: Config = toml::from_str(&raw)
        .map_err(|e| ControllerError::Config(format!("invalid config: {e}")))?;
    validate_config(&config)?;
    Ok(config)
}

/// Reject configurations that would make the heartbeat/xid contract in §5
/// meaningless (a zero grace or deadline multiplier never times anything
/// out) or an empty listen address.
pub fn validate_config(config: &Config) -> Result<(), ControllerError> {
    if config.listen.trim().is_empty() {
        return Err(ControllerError::Config("listen address must not be empty".to_string()));
    }
    if config.timeouts.heartbeat_grace_multiplier == 0 {
        return Err(ControllerError::Config(
            "timeouts.heartbeat_grace_multiplier must be at least 1".to_string(),
        ));
    }
    if config.timeouts.xid_deadline_multiplier == 0 {
        return Err(ControllerError::Config(
            "timeouts.xid_deadline_multiplier must be at least 1".to_string(),
        ));
    }
    if config.security.max_wtps == 0 {
        return Err(ControllerError::Config("security.max_wtps must be at least 1".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_defaults_from_minimal_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen = \"127.0.0.1:6633\"").unwrap();
        let config = load_from_path(file.path()).unwrap();
        assert_eq!(config.listen, "127.0.0.1:6633");
        assert_eq!(config.security.max_wtps, 256);
    }

    #[test]
    fn rejects_zero_heartbeat_multiplier() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen = \"127.0.0.1:6633\"\n[timeouts]\nheartbeat_grace_multiplier = 0").unwrap();
        assert!(load_from_path(file.path()).is_err());
    }

    #[test]
    fn rejects_missing_file() {
        assert!(load_from_path("/nonexistent/path/config.toml").is_err());
    }
}
