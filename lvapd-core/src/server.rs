//! The dispatcher: accepts WTP connections, demultiplexes by WTP address,
//! and owns the global registries (WTPs, tenants, LVAPs). Mirrors the
//! proxy's accept-loop shape — `tokio::select!` between shutdown signals
//! and `listener.accept()`, one spawned task per connection guarded by a
//! connection-count slot — generalized to the controller's dispatch table
//! instead of raw byte forwarding.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::Instant;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::codec::Message;
use crate::config::Config;
use crate::connection::{xid_deadline, Connection, ConnectionHandle, LvapCodec, WtpCounter};
use crate::error::{ControllerError, ProtocolError, Result};
use crate::events::Event;
use crate::ids::EtherAddress;
use crate::lvap::{self, Lvap};
use crate::resource::{Band, PortDescriptor, ResourceBlock, Tenant, Wtp};
use crate::security::is_wtp_allowed;
use crate::telemetry::Metrics;

/// Registries mutated only while holding the controller's single lock —
/// the crate's concurrency contract (§5) forbids any sharding of this.
struct Registries {
    wtps: HashMap<EtherAddress, Wtp>,
    tenants: HashMap<Uuid, Tenant>,
    lvaps: HashMap<EtherAddress, Lvap>,
    connections: HashMap<EtherAddress, Connection>,
}

impl Registries {
    fn new() -> Self {
        Registries {
            wtps: HashMap::new(),
            tenants: HashMap::new(),
            lvaps: HashMap::new(),
            connections: HashMap::new(),
        }
    }

    fn tenant_by_name(&self, name: &str) -> Option<Uuid> {
        self.tenants.iter().find(|(_, t)| t.tenant_name == name).map(|(id, _)| *id)
    }
}

/// The controller. Cloneable: clones share the same registries and
/// metrics, so a handle can be held by the accept loop and by an
/// administrative surface (out of scope here) at once.
#[derive(Clone)]
pub struct Controller {
    config: Arc<Config>,
    metrics: Arc<Metrics>,
    wtp_counter: WtpCounter,
    registries: Arc<Mutex<Registries>>,
}

impl Controller {
    pub fn new(config: Config, metrics: Metrics) -> Self {
        Controller {
            config: Arc::new(config),
            metrics: Arc::new(metrics),
            wtp_counter: WtpCounter::new(),
            registries: Arc::new(Mutex::new(Registries::new())),
        }
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    /// Run the accept loop until SIGTERM/SIGINT, then drain in-flight
    /// connections for up to `timeouts.shutdown_drain_secs` before
    /// returning.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.listen).await.map_err(ControllerError::Io)?;
        info!(listen = %self.config.listen, "controller listening");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut sigterm = signal(SignalKind::terminate()).map_err(ControllerError::Io)?;
        let mut sigint = signal(SignalKind::interrupt()).map_err(ControllerError::Io)?;

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("received SIGTERM, shutting down");
                    let _ = shutdown_tx.send(true);
                    break;
                }
                _ = sigint.recv() => {
                    info!("received SIGINT, shutting down");
                    let _ = shutdown_tx.send(true);
                    break;
                }
                accepted = listener.accept() => {
                    let (socket, peer_addr) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(error = %e, "accept failed");
                            continue;
                        }
                    };
                    self.spawn_connection(socket, peer_addr, shutdown_rx.clone());
                }
            }
        }

        info!(timeout_secs = self.config.timeouts.shutdown_drain_secs, "draining connections");
        let drain = Duration::from_secs(self.config.timeouts.shutdown_drain_secs);
        let drained = tokio::time::timeout(drain, async {
            while self.wtp_counter.current() > 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await
        .is_ok();
        if !drained {
            warn!(remaining = self.wtp_counter.current(), "shutdown drain timed out");
        }
        Ok(())
    }

    fn spawn_connection(
        &self,
        socket: TcpStream,
        peer_addr: SocketAddr,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        if !is_wtp_allowed(peer_addr.ip(), &self.config.security.ip_filter) {
            warn!(%peer_addr, "rejected WTP connection: source address not allowed");
            return;
        }
        let Some(guard) = self.wtp_counter.try_acquire(self.config.security.max_wtps) else {
            warn!(%peer_addr, "rejected WTP connection: at capacity");
            return;
        };

        let controller = self.clone();
        tokio::spawn(async move {
            let _guard = guard;
            let _ = socket.set_nodelay(true);
            let (write_tx, mut write_rx) = mpsc::unbounded_channel();
            let handle = ConnectionHandle::new(write_tx);
            let (mut sink, mut stream) = Framed::new(socket, LvapCodec).split();

            let writer = tokio::spawn(async move {
                while let Some(msg) = write_rx.recv().await {
                    if sink.send(msg).await.is_err() {
                        break;
                    }
                }
            });

            let mut wtp_addr: Option<EtherAddress> = None;
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    next = stream.next() => {
                        match next {
                            Some(Ok(message)) => {
                                if let Err(e) = controller.handle_message(&mut wtp_addr, peer_addr, &handle, message).await {
                                    warn!(%peer_addr, error = %e, "error handling message");
                                }
                            }
                            Some(Err(e)) => {
                                controller.metrics.decode_errors_total.inc();
                                debug!(%peer_addr, error = %e, "dropping malformed frame");
                            }
                            None => break,
                        }
                    }
                }
            }

            controller.on_disconnect(wtp_addr).await;
            writer.abort();
        });
    }

    async fn on_disconnect(&self, wtp_addr: Option<EtherAddress>) {
        let Some(addr) = wtp_addr else { return };
        let mut registries = self.registries.lock().await;
        registries.connections.remove(&addr);
        if let Some(wtp) = registries.wtps.get_mut(&addr) {
            wtp.mark_disconnected();
        }
        let affected: Vec<EtherAddress> = registries
            .lvaps
            .iter()
            .filter(|(_, l)| l.blocks().iter().any(|b| b.wtp == addr))
            .map(|(a, _)| *a)
            .collect();
        for lvap_addr in affected {
            if let Some(lvap) = registries.lvaps.get_mut(&lvap_addr) {
                lvap.clear_blocks();
                lvap.target_blocks = None;
                lvap.pending.clear();
                self.metrics.lvap_teardowns_total.inc();
                if let Some(tenant_id) = lvap.tenant.take() {
                    if let Some(tenant) = registries.tenants.get_mut(&tenant_id) {
                        tenant.remove_lvap(lvap_addr);
                    }
                    info!(lvap = %lvap_addr, "LVAP_LEAVE: WTP disconnected");
                }
                lvap.state = lvap::State::Null;
            }
        }
        self.metrics.wtps_connected.dec();
        warn!(wtp = %addr, "WTP disconnected, cleared its LVAPs");
    }

    async fn handle_message(
        &self,
        wtp_addr: &mut Option<EtherAddress>,
        peer_addr: SocketAddr,
        handle: &ConnectionHandle,
        message: Message,
    ) -> Result<()> {
        match message {
            Message::Hello(hello) => {
                let now = Instant::now();
                let mut registries = self.registries.lock().await;
                let first_seen = !registries.wtps.contains_key(&hello.wtp);
                registries
                    .wtps
                    .entry(hello.wtp)
                    .or_insert_with(|| Wtp::new(hello.wtp))
                    .on_hello(hello.period, now);
                registries.connections.insert(hello.wtp, Connection::new(peer_addr, handle.clone()));
                let conn = registries.connections.get_mut(&hello.wtp).expect("just inserted");
                conn.wtp_addr = Some(hello.wtp);
                if first_seen {
                    conn.register()?;
                }
                *wtp_addr = Some(hello.wtp);
                self.metrics.wtps_connected.inc();
                self.metrics.wtps_total.inc();
                info!(wtp = %hello.wtp, period = hello.period, "HELLO");
                Ok(())
            }
            Message::CapsResponse(caps) => {
                let mut registries = self.registries.lock().await;
                if let Some(wtp) = registries.wtps.get_mut(&caps.wtp) {
                    wtp.set_blocks(
                        caps.blocks
                            .iter()
                            .map(|b| {
                                ResourceBlock::new(caps.wtp, b.hwaddr, b.channel, Band::from_wire(b.band))
                            })
                            .collect(),
                    );
                    wtp.set_ports(
                        caps.ports
                            .iter()
                            .map(|p| PortDescriptor {
                                hwaddr: p.hwaddr,
                                port_id: p.port_id,
                                iface: String::from_utf8_lossy(&p.iface)
                                    .trim_end_matches('\0')
                                    .to_string(),
                            })
                            .collect(),
                    );
                }
                debug!(wtp = %caps.wtp, blocks = caps.blocks.len(), ports = caps.ports.len(), "CAPS_RESPONSE");
                Ok(())
            }
            Message::StatusLvap(status) => {
                let now = Instant::now();
                let mut registries = self.registries.lock().await;
                let period = registries.wtps.get(&status.wtp).and_then(Wtp::heartbeat_period).unwrap_or(30);
                let deadline = xid_deadline(now, period, self.config.timeouts.xid_deadline_multiplier);
                let block = ResourceBlock::new(
                    status.wtp,
                    status.hwaddr,
                    status.channel,
                    Band::from_wire(status.band),
                );
                let report = lvap::StatusReport {
                    set_mask: status.set_mask,
                    associated: status.associated,
                    authenticated: status.authenticated,
                    assoc_id: status.assoc_id,
                    encap: status.encap,
                    block,
                    ssids: status.ssids.clone(),
                };
                let tenant_names: Vec<(Uuid, String)> = registries
                    .tenants
                    .iter()
                    .map(|(id, t)| (*id, t.tenant_name.clone()))
                    .collect();
                let lvap = registries
                    .lvaps
                    .entry(status.sta)
                    .or_insert_with(|| Lvap::new(status.sta, status.net_bssid));
                let (actions, events) = lvap::reconcile(lvap, report, |ssid| {
                    tenant_names.iter().find(|(_, name)| name == ssid).map(|(id, _)| *id)
                });
                for event in &events {
                    apply_event(&mut registries, *event);
                }
                if let Some(conn) = registries.connections.get_mut(&status.wtp) {
                    for action in actions {
                        let lvap = registries.lvaps.get_mut(&status.sta).expect("just inserted above");
                        conn.dispatch_action(lvap, action, deadline)?;
                    }
                }
                Ok(())
            }
            Message::AddLvapResponse(resp) => {
                let now = Instant::now();
                let mut registries = self.registries.lock().await;
                if registries.lvaps.get(&resp.sta).is_none() {
                    return Err(ControllerError::Protocol(ProtocolError::XidNotPending(resp.module_id)));
                }
                let lvap = registries.lvaps.get_mut(&resp.sta).expect("checked above");
                match lvap.handle_add_lvap_response(resp.module_id, now) {
                    Ok((actions, latency)) => {
                        if let Some(latency) = latency {
                            debug!(lvap = %resp.sta, latency_ms = latency.as_millis(), "LVAP spawned");
                        }
                        self.metrics.lvap_spawns_total.inc();
                        self.metrics.lvaps_active.inc();
                        if let Some(conn) = registries.connections.get_mut(&resp.wtp) {
                            for action in actions {
                                let lvap = registries.lvaps.get_mut(&resp.sta).expect("checked above");
                                conn.dispatch_action(lvap, action, now)?;
                            }
                        }
                        Ok(())
                    }
                    Err(e) => {
                        warn!(lvap = %resp.sta, error = %e, "ADD_LVAP_RESPONSE ignored");
                        Ok(())
                    }
                }
            }
            Message::DelLvapResponse(resp) => {
                let now = Instant::now();
                let mut registries = self.registries.lock().await;
                let period = registries.wtps.get(&resp.wtp).and_then(Wtp::heartbeat_period).unwrap_or(30);
                let deadline = xid_deadline(now, period, self.config.timeouts.xid_deadline_multiplier);
                if registries.lvaps.get(&resp.sta).is_none() {
                    return Err(ControllerError::Protocol(ProtocolError::XidNotPending(resp.module_id)));
                }
                let lvap = registries.lvaps.get_mut(&resp.sta).expect("checked above");
                match lvap.handle_del_lvap_response(resp.module_id, now) {
                    Ok(actions) => {
                        self.metrics.lvap_handovers_total.inc();
                        if let Some(conn) = registries.connections.get_mut(&resp.wtp) {
                            for action in actions {
                                let lvap = registries.lvaps.get_mut(&resp.sta).expect("checked above");
                                conn.dispatch_action(lvap, action, deadline)?;
                            }
                        }
                        Ok(())
                    }
                    Err(e) => {
                        warn!(lvap = %resp.sta, error = %e, "DEL_LVAP_RESPONSE ignored");
                        Ok(())
                    }
                }
            }
            Message::Bye => {
                debug!(%peer_addr, "BYE");
                Ok(())
            }
            other => {
                debug!(%peer_addr, msg_type = ?other.msg_type(), "unhandled message type");
                Ok(())
            }
        }
    }

    /// The handover/assignment entry point named in §4.6: assign `downlink`
    /// (and optional `uplinks`) to `lvap_addr`, creating the LVAP on first
    /// use.
    pub async fn assign(
        &self,
        lvap_addr: EtherAddress,
        net_bssid: EtherAddress,
        downlink: ResourceBlock,
        uplinks: Vec<ResourceBlock>,
    ) -> Result<()> {
        let now = Instant::now();
        let mut registries = self.registries.lock().await;
        let period = registries.wtps.get(&downlink.wtp).and_then(Wtp::heartbeat_period).unwrap_or(30);
        let deadline = xid_deadline(now, period, self.config.timeouts.xid_deadline_multiplier);
        let current_tenant = registries
            .lvaps
            .get(&lvap_addr)
            .and_then(|l| l.tenant)
            .and_then(|id| registries.tenants.get(&id))
            .cloned();

        let actions = {
            let lvap = registries
                .lvaps
                .entry(lvap_addr)
                .or_insert_with(|| Lvap::new(lvap_addr, net_bssid));
            lvap.assign(downlink, uplinks, current_tenant.as_ref(), now)?
        };
        self.metrics.lvap_spawns_total.inc();
        if let Some(conn) = registries.connections.get_mut(&downlink.wtp) {
            for action in actions {
                let lvap = registries.lvaps.get_mut(&lvap_addr).expect("just inserted above");
                conn.dispatch_action(lvap, action, deadline)?;
            }
        }
        Ok(())
    }

    /// Mutate the transmission policy on `lvap_addr`'s current downlink,
    /// re-emitting `SET_PORT` when it actually changes. The entry point an
    /// external application uses to update rate/RTS-CTS/no-ack settings on
    /// a live station, mirroring [`Controller::assign`]'s dispatch shape.
    pub async fn set_tx_policy(
        &self,
        lvap_addr: EtherAddress,
        policy: crate::resource::TxPolicy,
    ) -> Result<()> {
        let now = Instant::now();
        let mut registries = self.registries.lock().await;
        let downlink_wtp = registries
            .lvaps
            .get(&lvap_addr)
            .and_then(|l| l.downlink)
            .map(|b| b.wtp)
            .ok_or(crate::error::LogicError::UnboundLvap)?;

        let actions = {
            let lvap = registries.lvaps.get_mut(&lvap_addr).expect("checked above");
            lvap.set_tx_policy(policy)
        };
        if let Some(conn) = registries.connections.get_mut(&downlink_wtp) {
            for action in actions {
                let lvap = registries.lvaps.get_mut(&lvap_addr).expect("checked above");
                conn.dispatch_action(lvap, action, now)?;
            }
        }
        Ok(())
    }

    /// Periodically sweep for WTPs that missed their heartbeat grace
    /// window and pending transactions past their xid deadline; intended
    /// to be driven by a `tokio::time::interval` loop alongside
    /// [`Controller::run`].
    pub async fn sweep_timeouts(&self) {
        let now = Instant::now();
        let grace = self.config.timeouts.heartbeat_grace_multiplier;
        let stale: Vec<EtherAddress> = {
            let registries = self.registries.lock().await;
            registries
                .wtps
                .iter()
                .filter(|(_, w)| w.is_connected() && w.is_stale(now, grace))
                .map(|(a, _)| *a)
                .collect()
        };
        for addr in &stale {
            warn!(wtp = %addr, "heartbeat timeout");
            self.on_disconnect(Some(*addr)).await;
        }

        let mut registries = self.registries.lock().await;
        let mut expired: Vec<EtherAddress> = Vec::new();
        for conn in registries.connections.values_mut() {
            for (xid, txn) in conn.xids.expired(now) {
                conn.xids.take(xid);
                self.metrics.xid_timeouts_total.inc();
                warn!(lvap = %txn.lvap, xid, "pending transaction timed out");
                expired.push(txn.lvap);
            }
        }
        for lvap_addr in expired {
            let wtp_addr = registries.lvaps.get(&lvap_addr).and_then(|l| l.downlink).map(|b| b.wtp);
            let del_actions = registries
                .lvaps
                .get_mut(&lvap_addr)
                .map(|lvap| lvap.clear_blocks())
                .unwrap_or_default();
            if let Some(wtp_addr) = wtp_addr {
                if let Some(conn) = registries.connections.get_mut(&wtp_addr) {
                    conn.xids.clear_for_lvap(lvap_addr);
                    for action in del_actions {
                        let lvap = registries.lvaps.get_mut(&lvap_addr).expect("checked above");
                        if let Err(e) = conn.dispatch_action(lvap, action, now) {
                            warn!(lvap = %lvap_addr, error = %e, "failed to send DEL_LVAP after xid timeout");
                        }
                    }
                }
            }
            if let Some(lvap) = registries.lvaps.get_mut(&lvap_addr) {
                lvap.target_blocks = None;
                lvap.pending.clear();
                self.metrics.lvap_teardowns_total.inc();
                if let Some(tenant_id) = lvap.tenant.take() {
                    if let Some(tenant) = registries.tenants.get_mut(&tenant_id) {
                        tenant.remove_lvap(lvap_addr);
                    }
                    info!(lvap = %lvap_addr, "LVAP_LEAVE: pending transaction timed out");
                }
                lvap.state = lvap::State::Null;
            }
        }
    }
}

fn apply_event(registries: &mut Registries, event: Event) {
    match event {
        Event::LvapJoin { addr, tenant } => {
            if let Some(t) = registries.tenants.get_mut(&tenant) {
                t.insert_lvap(addr);
            }
            info!(lvap = %addr, tenant = %tenant, "LVAP_JOIN");
        }
        Event::LvapLeave { addr, tenant } => {
            if let Some(t) = registries.tenants.get_mut(&tenant) {
                t.remove_lvap(addr);
            }
            info!(lvap = %addr, tenant = %tenant, "LVAP_LEAVE");
        }
        Event::WtpUp { addr } => info!(wtp = %addr, "WTP_UP"),
        Event::WtpDown { addr } => info!(wtp = %addr, "WTP_DOWN"),
        Event::Counters(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_by_name_finds_matching_uuid() {
        let mut registries = Registries::new();
        let id = Uuid::from_u128(1);
        registries.tenants.insert(
            id,
            Tenant::new(id, "lab", crate::resource::BssidType::Unique, EtherAddress::ZERO),
        );
        assert_eq!(registries.tenant_by_name("lab"), Some(id));
        assert_eq!(registries.tenant_by_name("missing"), None);
    }
}
