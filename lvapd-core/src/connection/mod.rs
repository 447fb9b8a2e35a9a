//! Per-WTP connection: framing, send primitives, and the heartbeat
//! contract. One [`Connection`] is created per accepted socket and driven
//! by the server's read/write loop; this module owns no socket itself —
//! it is handed an outbound channel and turns state-machine [`Action`]s and
//! explicit send calls into wire [`Message`]s.

pub mod framing;
pub mod guards;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use uuid::Uuid;

use crate::codec::{
    AddLvap, AddTrafficRule, AddVap, DelLvap, DelVap, Message, ProbeResponse, SeqOnly, SetPort,
    WadrrRequest,
};
use crate::error::{ControllerError, Result};
use crate::ids::{Bssid, EtherAddress, Xid};
use crate::lvap::{Action, Csa, Lvap};
use crate::resource::{ResourceBlock, TxPolicy, Vap};
use crate::xid::{AwaitingKind, XidRegistry};

pub use framing::LvapCodec;
pub use guards::{WtpCounter, WtpGuard};

/// Handle for enqueueing outbound frames onto a connection's write half.
/// Cheap to clone; the owning task drains the channel into the socket.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    tx: mpsc::UnboundedSender<Message>,
}

impl ConnectionHandle {
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self { tx }
    }

    pub fn send(&self, msg: Message) -> Result<()> {
        self.tx.send(msg).map_err(|_| {
            ControllerError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "connection write half closed",
            ))
        })
    }
}

/// Rates in `TxPolicy::mcs` are Mbps; the wire carries them as half-Mbps
/// units (so 5.5 Mbps round-trips exactly as `11`).
fn rate_to_wire(mbps: f32) -> u8 {
    (mbps * 2.0).round() as u8
}

fn rate_from_wire(raw: u8) -> f32 {
    f32::from(raw) / 2.0
}

/// Per-WTP connection state: the outbound handle, the per-connection xid
/// registry, and the wire-level sequence counter (distinct from xid: `seq`
/// has no correlation role, it is a plain per-connection message counter).
pub struct Connection {
    pub peer_addr: std::net::SocketAddr,
    pub wtp_addr: Option<EtherAddress>,
    handle: ConnectionHandle,
    seq: u32,
    pub xids: XidRegistry,
}

impl Connection {
    pub fn new(peer_addr: std::net::SocketAddr, handle: ConnectionHandle) -> Self {
        Connection { peer_addr, wtp_addr: None, handle, seq: 0, xids: XidRegistry::new() }
    }

    fn next_seq(&mut self) -> u32 {
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        seq
    }

    /// First HELLO from a previously-unknown WTP: synchronize capabilities
    /// and outstanding status before the controller assigns it any LVAPs.
    pub fn register(&mut self) -> Result<()> {
        self.send_caps_request()?;
        self.send_lvap_status_request()?;
        self.send_vap_status_request()?;
        self.send_port_status_request()?;
        self.send_traffic_rule_status_request()
    }

    pub fn send_set_transmission_policy(
        &mut self,
        sta: EtherAddress,
        block: ResourceBlock,
        policy: &TxPolicy,
    ) -> Result<()> {
        let seq = self.next_seq();
        self.handle.send(Message::SetPort(SetPort {
            seq,
            no_ack: policy.no_ack,
            hwaddr: block.hwaddr,
            channel: block.channel,
            band: block.band.to_wire(),
            sta,
            rts_cts: policy.rts_cts,
            tx_mcast: policy.tx_mcast,
            ur_mcast_count: policy.ur_mcast_count,
            mcs: policy.mcs.iter().copied().map(rate_to_wire).collect(),
            ht_mcs: policy.ht_mcs.clone(),
        }))
    }

    pub fn send_add_lvap(
        &mut self,
        lvap: &Lvap,
        block: ResourceBlock,
        set_mask: bool,
        deadline: Instant,
    ) -> Result<Xid> {
        let xid = self.xids.allocate(lvap.addr, AwaitingKind::Add, deadline);
        let seq = self.next_seq();
        let ssids = if lvap.ssids.is_empty() { vec![String::new()] } else { lvap.ssids.clone() };
        self.handle.send(Message::AddLvap(AddLvap {
            seq,
            module_id: xid,
            set_mask,
            associated: lvap.associated,
            authenticated: lvap.authenticated,
            assoc_id: lvap.assoc_id,
            hwaddr: block.hwaddr,
            channel: block.channel,
            band: block.band.to_wire(),
            supported_band: u8::from(lvap.supported_band_ht20),
            sta: lvap.addr,
            encap: lvap.encap.unwrap_or(EtherAddress::ZERO),
            net_bssid: lvap.net_bssid,
            lvap_bssid: lvap.lvap_bssid,
            ssids,
        }))?;
        Ok(xid)
    }

    pub fn send_del_lvap(
        &mut self,
        lvap: &Lvap,
        block: ResourceBlock,
        csa: Option<Csa>,
        deadline: Instant,
    ) -> Result<Xid> {
        let xid = self.xids.allocate(lvap.addr, AwaitingKind::Del, deadline);
        let seq = self.next_seq();
        let (target_channel, switch_mode, switch_count) = match csa {
            Some(c) => (c.target_channel, c.switch_mode, c.switch_count),
            None => (block.channel, 0, 0),
        };
        self.handle.send(Message::DelLvap(DelLvap {
            seq,
            module_id: xid,
            sta: lvap.addr,
            target_hwaddr: block.hwaddr,
            target_channel,
            target_band: block.band.to_wire(),
            csa_switch_mode: switch_mode,
            csa_switch_count: switch_count,
        }))?;
        Ok(xid)
    }

    pub fn send_probe_response(&mut self, sta: EtherAddress, ssid: String) -> Result<()> {
        let seq = self.next_seq();
        self.handle.send(Message::ProbeResponse(ProbeResponse { seq, sta, ssid }))
    }

    pub fn send_caps_request(&mut self) -> Result<()> {
        let seq = self.next_seq();
        self.handle.send(Message::CapsRequest(SeqOnly { seq }))
    }

    pub fn send_lvap_status_request(&mut self) -> Result<()> {
        let seq = self.next_seq();
        self.handle.send(Message::LvapStatusRequest(SeqOnly { seq }))
    }

    pub fn send_vap_status_request(&mut self) -> Result<()> {
        let seq = self.next_seq();
        self.handle.send(Message::VapStatusRequest(SeqOnly { seq }))
    }

    pub fn send_port_status_request(&mut self) -> Result<()> {
        let seq = self.next_seq();
        self.handle.send(Message::PortStatusRequest(SeqOnly { seq }))
    }

    pub fn send_traffic_rule_status_request(&mut self) -> Result<()> {
        let seq = self.next_seq();
        self.handle.send(Message::TrafficRuleStatusRequest(SeqOnly { seq }))
    }

    pub fn send_add_vap(&mut self, vap: &Vap) -> Result<()> {
        let seq = self.next_seq();
        self.handle.send(Message::AddVap(AddVap {
            seq,
            hwaddr: vap.hwaddr,
            channel: vap.channel,
            band: vap.band.to_wire(),
            net_bssid: vap.net_bssid,
            ssid: vap.ssid.clone(),
        }))
    }

    pub fn send_del_vap(&mut self, net_bssid: Bssid) -> Result<()> {
        let seq = self.next_seq();
        self.handle.send(Message::DelVap(DelVap { seq, net_bssid }))
    }

    pub fn send_add_traffic_rule(
        &mut self,
        amsdu_aggregation: bool,
        quantum: u16,
        dscp: u8,
        ssid: String,
    ) -> Result<()> {
        let seq = self.next_seq();
        self.handle.send(Message::AddTrafficRule(AddTrafficRule {
            seq,
            amsdu_aggregation,
            quantum,
            dscp,
            ssid,
        }))
    }

    /// Framing-only: the WADRR scheduling data itself is computed and acted
    /// on by an external application, not this controller.
    pub fn send_wadrr_request(&mut self, tenant_id: Uuid) -> Result<()> {
        let seq = self.next_seq();
        self.handle.send(Message::WadrrRequest(WadrrRequest { seq, tenant_id }))
    }

    /// Turn one state-machine [`Action`] into an actual send, pushing any
    /// allocated xid into `lvap.pending` so the machine can later drain it.
    pub fn dispatch_action(&mut self, lvap: &mut Lvap, action: Action, deadline: Instant) -> Result<()> {
        match action {
            Action::SetTransmissionPolicy { block, policy } => {
                self.send_set_transmission_policy(lvap.addr, block, &policy)
            }
            Action::AddLvap { block, set_mask } => {
                let xid = self.send_add_lvap(lvap, block, set_mask, deadline)?;
                lvap.push_pending(xid);
                Ok(())
            }
            Action::DelLvap { block, csa } => {
                let xid = self.send_del_lvap(lvap, block, csa, deadline)?;
                lvap.push_pending(xid);
                Ok(())
            }
            Action::ProbeResponse { via: _, ssid } => self.send_probe_response(lvap.addr, ssid),
        }
    }
}

/// Deadline for one heartbeat grace window: `grace_multiplier * period`
/// seconds after the last HELLO. A WTP silent past this is torn down.
pub fn heartbeat_deadline(period: u32, grace_multiplier: u32) -> Duration {
    Duration::from_secs(u64::from(period) * u64::from(grace_multiplier))
}

/// Deadline for one pending xid: `deadline_multiplier * period` seconds
/// from now, per §5's "implicit deadline (heartbeat periods)".
pub fn xid_deadline(now: Instant, period: u32, deadline_multiplier: u32) -> Instant {
    now + Duration::from_secs(u64::from(period) * u64::from(deadline_multiplier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Band;

    fn addr(n: u8) -> EtherAddress {
        EtherAddress::from_bytes([n; 6])
    }

    fn connection() -> (Connection, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = ConnectionHandle::new(tx);
        (Connection::new("127.0.0.1:0".parse().unwrap(), handle), rx)
    }

    #[test]
    fn rate_round_trips_half_mbps_units() {
        assert_eq!(rate_to_wire(5.5), 11);
        assert_eq!(rate_from_wire(11), 5.5);
    }

    #[test]
    fn send_add_lvap_allocates_and_returns_xid() {
        let (mut conn, mut rx) = connection();
        let lvap = Lvap::new(addr(1), addr(1));
        let block = ResourceBlock::new(addr(2), addr(3), 6, Band::Band2GHz);
        let deadline = Instant::now() + Duration::from_secs(10);
        let xid = conn.send_add_lvap(&lvap, block, true, deadline).unwrap();
        assert!(conn.xids.is_pending(xid));
        let sent = rx.try_recv().unwrap();
        match sent {
            Message::AddLvap(m) => assert_eq!(m.module_id, xid),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn dispatch_action_pushes_xid_onto_lvap_pending() {
        let (mut conn, mut rx) = connection();
        let mut lvap = Lvap::new(addr(1), addr(1));
        let block = ResourceBlock::new(addr(2), addr(3), 6, Band::Band2GHz);
        let deadline = Instant::now() + Duration::from_secs(10);
        conn.dispatch_action(&mut lvap, Action::AddLvap { block, set_mask: true }, deadline).unwrap();
        assert_eq!(lvap.pending.len(), 1);
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn register_emits_caps_and_status_requests_in_order() {
        let (mut conn, mut rx) = connection();
        conn.register().unwrap();
        let mut types = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            types.push(msg.msg_type());
        }
        use crate::codec::MessageType::*;
        assert_eq!(
            types,
            vec![CapsRequest, LvapStatusRequest, VapStatusRequest, PortStatusRequest, TrafficRuleStatusRequest]
        );
    }
}
