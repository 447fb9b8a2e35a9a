//! Structured logging and metrics, wired up the way the proxy's
//! `telemetry` module does it, minus the OpenTelemetry export path this
//! controller has no use for.

mod metrics;
mod tracing;

pub use metrics::Metrics;
pub use tracing::init_tracing;
