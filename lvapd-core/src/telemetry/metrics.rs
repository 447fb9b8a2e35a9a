use prometheus::{IntCounter, IntGauge, Registry};

use crate::error::ControllerError;

/// Counters and gauges backing the `COUNTERS(stats)` event. Owns its own
/// registry; an external collaborator (the administrative surface, out of
/// scope here) is expected to scrape it.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,
    pub wtps_connected: IntGauge,
    pub wtps_total: IntCounter,
    pub lvaps_active: IntGauge,
    pub lvap_spawns_total: IntCounter,
    pub lvap_handovers_total: IntCounter,
    pub lvap_teardowns_total: IntCounter,
    pub xid_timeouts_total: IntCounter,
    pub decode_errors_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, ControllerError> {
        let registry = Registry::new();
        let metrics = Metrics {
            wtps_connected: IntGauge::new("lvapd_wtps_connected", "Currently connected WTPs")
                .map_err(metric_err)?,
            wtps_total: IntCounter::new("lvapd_wtps_total", "Total WTP connections accepted")
                .map_err(metric_err)?,
            lvaps_active: IntGauge::new("lvapd_lvaps_active", "LVAPs currently admissible")
                .map_err(metric_err)?,
            lvap_spawns_total: IntCounter::new(
                "lvapd_lvap_spawns_total",
                "LVAP spawn (null to SPAWNING) transitions",
            )
            .map_err(metric_err)?,
            lvap_handovers_total: IntCounter::new(
                "lvapd_lvap_handovers_total",
                "LVAP handover (RUNNING to REMOVING) transitions",
            )
            .map_err(metric_err)?,
            lvap_teardowns_total: IntCounter::new(
                "lvapd_lvap_teardowns_total",
                "LVAPs torn down via clear_blocks",
            )
            .map_err(metric_err)?,
            xid_timeouts_total: IntCounter::new(
                "lvapd_xid_timeouts_total",
                "Pending transactions that expired before an ack arrived",
            )
            .map_err(metric_err)?,
            decode_errors_total: IntCounter::new(
                "lvapd_decode_errors_total",
                "Frames dropped due to a decode error",
            )
            .map_err(metric_err)?,
            registry,
        };

        metrics.registry.register(Box::new(metrics.wtps_connected.clone())).map_err(metric_err)?;
        metrics.registry.register(Box::new(metrics.wtps_total.clone())).map_err(metric_err)?;
        metrics.registry.register(Box::new(metrics.lvaps_active.clone())).map_err(metric_err)?;
        metrics
            .registry
            .register(Box::new(metrics.lvap_spawns_total.clone()))
            .map_err(metric_err)?;
        metrics
            .registry
            .register(Box::new(metrics.lvap_handovers_total.clone()))
            .map_err(metric_err)?;
        metrics
            .registry
            .register(Box::new(metrics.lvap_teardowns_total.clone()))
            .map_err(metric_err)?;
        metrics
            .registry
            .register(Box::new(metrics.xid_timeouts_total.clone()))
            .map_err(metric_err)?;
        metrics
            .registry
            .register(Box::new(metrics.decode_errors_total.clone()))
            .map_err(metric_err)?;
        Ok(metrics)
    }
}

fn metric_err(e: prometheus::Error) -> ControllerError {
    ControllerError::Config(format!("metrics registration failed: {e}"))
}
