use serde::Deserialize;

fn default_heartbeat_grace_multiplier() -> u32 {
    2
}

fn default_xid_deadline_multiplier() -> u32 {
    3
}

fn default_shutdown_drain_secs() -> u64 {
    10
}

/// Timing knobs derived from a WTP's announced heartbeat period (§5's
/// "implicit deadline" and the heartbeat contract in §4.5).
#[derive(Debug, Deserialize, Clone)]
pub struct TimeoutConfig {
    /// A WTP is torn down after this many missed heartbeat periods.
    #[serde(default = "default_heartbeat_grace_multiplier")]
    pub heartbeat_grace_multiplier: u32,

    /// A pending xid expires after this many heartbeat periods.
    #[serde(default = "default_xid_deadline_multiplier")]
    pub xid_deadline_multiplier: u32,

    /// How long the accept loop waits for in-flight connections to drain
    /// on graceful shutdown before forcing them closed.
    #[serde(default = "default_shutdown_drain_secs")]
    pub shutdown_drain_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        TimeoutConfig {
            heartbeat_grace_multiplier: default_heartbeat_grace_multiplier(),
            xid_deadline_multiplier: default_xid_deadline_multiplier(),
            shutdown_drain_secs: default_shutdown_drain_secs(),
        }
    }
}
