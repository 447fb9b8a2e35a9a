//! Events raised by the controller core for external collaborators (the
//! administrative REST surface and northbound applications, both out of
//! scope here) to observe.

use uuid::Uuid;

use crate::ids::EtherAddress;

/// A point-in-time snapshot of the counters backing `COUNTERS(stats)`,
/// mirroring the gauges in [`crate::telemetry::Metrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub wtps_connected: u64,
    pub lvaps_active: u64,
    pub lvap_spawns_total: u64,
    pub lvap_handovers_total: u64,
    pub lvap_teardowns_total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    LvapJoin { addr: EtherAddress, tenant: Uuid },
    LvapLeave { addr: EtherAddress, tenant: Uuid },
    WtpUp { addr: EtherAddress },
    WtpDown { addr: EtherAddress },
    Counters(CounterSnapshot),
}
