//! The WTP resource: a physical access point's published capabilities and
//! liveness state. Holds no socket or I/O handle itself — the connection
//! registry that owns the actual transport lives in the `connection` module
//! and is keyed by the same [`EtherAddress`].

use tokio::time::Instant;

use crate::ids::EtherAddress;
use crate::resource::block::{BlockView, ResourceBlock};

/// A port descriptor published in a CAPS_RESPONSE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDescriptor {
    pub hwaddr: EtherAddress,
    pub port_id: u16,
    pub iface: String,
}

/// One physical access point as known to the controller.
#[derive(Debug, Clone)]
pub struct Wtp {
    pub addr: EtherAddress,
    pub blocks: Vec<ResourceBlock>,
    pub ports: Vec<PortDescriptor>,
    connected: bool,
    last_seen: Option<Instant>,
    heartbeat_period: Option<u32>,
}

impl Wtp {
    pub fn new(addr: EtherAddress) -> Self {
        Wtp {
            addr,
            blocks: Vec::new(),
            ports: Vec::new(),
            connected: false,
            last_seen: None,
            heartbeat_period: None,
        }
    }

    pub fn blocks(&self) -> BlockView<'_> {
        BlockView::new(&self.blocks)
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn heartbeat_period(&self) -> Option<u32> {
        self.heartbeat_period
    }

    pub fn last_seen(&self) -> Option<Instant> {
        self.last_seen
    }

    /// Record a HELLO: first HELLO from a new WTP also marks it connected.
    pub fn on_hello(&mut self, period: u32, now: Instant) {
        self.connected = true;
        self.heartbeat_period = Some(period);
        self.last_seen = Some(now);
    }

    /// Whether the WTP has missed its heartbeat grace window
    /// (`grace_multiplier * period` since the last HELLO).
    pub fn is_stale(&self, now: Instant, grace_multiplier: u32) -> bool {
        match (self.last_seen, self.heartbeat_period) {
            (Some(last), Some(period)) => {
                now.saturating_duration_since(last)
                    > std::time::Duration::from_secs(u64::from(period) * u64::from(grace_multiplier))
            }
            _ => false,
        }
    }

    pub fn mark_disconnected(&mut self) {
        self.connected = false;
        self.blocks.clear();
        self.ports.clear();
    }

    pub fn set_blocks(&mut self, blocks: Vec<ResourceBlock>) {
        self.blocks = blocks;
    }

    pub fn set_ports(&mut self, ports: Vec<PortDescriptor>) {
        self.ports = ports;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_wtp_starts_disconnected() {
        let wtp = Wtp::new(EtherAddress::from_bytes([1; 6]));
        assert!(!wtp.is_connected());
        assert_eq!(wtp.heartbeat_period(), None);
    }

    #[test]
    fn on_hello_marks_connected_and_records_period() {
        let mut wtp = Wtp::new(EtherAddress::from_bytes([1; 6]));
        let now = Instant::now();
        wtp.on_hello(5, now);
        assert!(wtp.is_connected());
        assert_eq!(wtp.heartbeat_period(), Some(5));
        assert_eq!(wtp.last_seen(), Some(now));
    }

    #[test]
    fn mark_disconnected_clears_resources() {
        let mut wtp = Wtp::new(EtherAddress::from_bytes([1; 6]));
        wtp.set_blocks(vec![ResourceBlock::new(
            wtp.addr,
            EtherAddress::from_bytes([2; 6]),
            6,
            crate::resource::block::Band::Band2GHz,
        )]);
        wtp.on_hello(5, Instant::now());
        wtp.mark_disconnected();
        assert!(!wtp.is_connected());
        assert!(wtp.blocks.is_empty());
    }
}
