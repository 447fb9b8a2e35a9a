//! The LVAP lifecycle state machine: a total function over (state, legal
//! target) pairs. Every transition is an explicit match arm; there is no
//! dynamic dispatch on state names, so an unreachable pair is a compile
//! error rather than a runtime one.

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::error::{LogicError, ProtocolError};
use crate::ids::{Bssid, EtherAddress, Xid};
use crate::resource::{ResourceBlock, Tenant, TxPolicy};

/// Channel-switch announcement parameters used when a handover crosses
/// channels. `1` means "switch may happen before the count elapses"; `3`
/// beacon intervals gives associated stations time to retune.
const CSA_SWITCH_MODE: u8 = 1;
const CSA_SWITCH_COUNT: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Null,
    Spawning,
    Running,
    Removing,
}

/// A channel-switch target attached to a teardown DEL_LVAP when the new
/// downlink's channel differs from the one being torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Csa {
    pub target_channel: u8,
    pub switch_mode: u8,
    pub switch_count: u8,
}

/// A command the state machine wants issued to an agent. Carries no xid:
/// the caller (the connection owning `block.wtp`) allocates one via its
/// `XidRegistry` and, for `AddLvap`/`DelLvap`, must feed it back into
/// [`Lvap::push_pending`] so the machine can later drain on the response.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetTransmissionPolicy { block: ResourceBlock, policy: TxPolicy },
    AddLvap { block: ResourceBlock, set_mask: bool },
    DelLvap { block: ResourceBlock, csa: Option<Csa> },
    ProbeResponse { via: ResourceBlock, ssid: String },
}

/// The per-client logical access point. See module docs for the lifecycle.
#[derive(Debug, Clone)]
pub struct Lvap {
    pub addr: EtherAddress,
    pub net_bssid: Bssid,
    pub lvap_bssid: Bssid,
    pub authenticated: bool,
    pub associated: bool,
    pub assoc_id: u16,
    pub encap: Option<EtherAddress>,
    pub ssids: Vec<String>,
    pub tenant: Option<Uuid>,
    pub supported_band_ht20: bool,
    pub downlink: Option<ResourceBlock>,
    pub uplink: Vec<ResourceBlock>,
    pub state: State,
    pub target_blocks: Option<(ResourceBlock, Vec<ResourceBlock>)>,
    pub pending: HashSet<Xid>,
    pub spawn_start_ts: Option<Instant>,
    pub tx_policy: Option<TxPolicy>,
}

impl Lvap {
    pub fn new(addr: EtherAddress, net_bssid: Bssid) -> Self {
        Lvap {
            addr,
            net_bssid,
            lvap_bssid: net_bssid,
            authenticated: false,
            associated: false,
            assoc_id: 0,
            encap: None,
            ssids: Vec::new(),
            tenant: None,
            supported_band_ht20: false,
            downlink: None,
            uplink: Vec::new(),
            state: State::Null,
            target_blocks: None,
            pending: HashSet::new(),
            spawn_start_ts: None,
            tx_policy: None,
        }
    }

    pub fn is_admissible(&self) -> bool {
        self.downlink.is_some()
    }

    /// `[downlink] ++ uplink`, per the blocks invariant.
    pub fn blocks(&self) -> Vec<ResourceBlock> {
        let mut all = Vec::with_capacity(1 + self.uplink.len());
        all.extend(self.downlink);
        all.extend(self.uplink.iter().copied());
        all
    }

    pub fn push_pending(&mut self, xid: Xid) {
        self.pending.insert(xid);
    }

    /// Assign a new downlink (and optional uplinks) to this LVAP, either as
    /// a fresh spawn (from `Null`) or a handover (from `Running`). Returns
    /// the empty action list when a SHARED-tenant reassignment is silently
    /// refused (the derived bssid has no matching VAP on the target block):
    /// that is not an error, per the spec's explicit non-error wording.
    pub fn assign(
        &mut self,
        downlink: ResourceBlock,
        uplinks: Vec<ResourceBlock>,
        current_tenant: Option<&Tenant>,
        now: Instant,
    ) -> Result<Vec<Action>, LogicError> {
        if !self.pending.is_empty() {
            return Err(LogicError::HandoverInProgress);
        }

        if let Some(tenant) = current_tenant {
            if tenant.bssid_type == crate::resource::BssidType::Shared {
                match tenant.shared_vap_on(downlink.hwaddr) {
                    None => return Ok(Vec::new()),
                    Some(vap) => {
                        self.tenant = None;
                        self.authenticated = false;
                        self.associated = false;
                        self.assoc_id = 0;
                        self.lvap_bssid = vap.net_bssid;
                    }
                }
            }
        }

        self.target_blocks = Some((downlink, uplinks));
        match self.state {
            State::Null => Ok(self.enter_spawning(now)),
            State::Running => Ok(self.enter_removing(now)),
            State::Spawning | State::Removing => Err(LogicError::InvalidTransition),
        }
    }

    /// null→SPAWNING and REMOVING→SPAWNING share this: start the spawn
    /// timer, assign the downlink (default tx policy + ADD_LVAP set_mask),
    /// assign each uplink (ADD_LVAP, no set_mask).
    fn enter_spawning(&mut self, now: Instant) -> Vec<Action> {
        let (downlink, uplinks) =
            self.target_blocks.take().expect("assign() always sets target_blocks first");
        self.downlink = Some(downlink);
        self.uplink = uplinks.clone();
        self.state = State::Spawning;
        self.spawn_start_ts = Some(now);

        let mut actions = Vec::with_capacity(2 + uplinks.len());
        let policy = TxPolicy::default_for(&downlink, self.supported_band_ht20);
        self.tx_policy = Some(policy.clone());
        actions.push(Action::SetTransmissionPolicy { block: downlink, policy });
        actions.push(Action::AddLvap { block: downlink, set_mask: true });
        for block in uplinks {
            actions.push(Action::AddLvap { block, set_mask: false });
        }
        actions
    }

    /// RUNNING→REMOVING: tear down the current downlink (with a CSA if the
    /// target channel differs) and every current uplink, then clear them.
    fn enter_removing(&mut self, now: Instant) -> Vec<Action> {
        let (new_downlink, _) = self.target_blocks.as_ref().expect("set just above");
        let mut actions = Vec::new();

        if let Some(old_downlink) = self.downlink.take() {
            let csa = if old_downlink.channel != new_downlink.channel {
                Some(Csa {
                    target_channel: new_downlink.channel,
                    switch_mode: CSA_SWITCH_MODE,
                    switch_count: CSA_SWITCH_COUNT,
                })
            } else {
                None
            };
            actions.push(Action::DelLvap { block: old_downlink, csa });
        }
        for block in self.uplink.drain(..) {
            actions.push(Action::DelLvap { block, csa: None });
        }

        self.state = State::Removing;
        self.spawn_start_ts = Some(now);
        actions
    }

    /// Tear every current block down without going through the state
    /// machine. Used on WTP disconnect or admin removal.
    pub fn clear_blocks(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some(block) = self.downlink.take() {
            actions.push(Action::DelLvap { block, csa: None });
        }
        for block in self.uplink.drain(..) {
            actions.push(Action::DelLvap { block, csa: None });
        }
        actions
    }

    /// Resend ADD_LVAP for the current downlink/uplinks. Idempotent on the
    /// agent: does not allocate pending xids or change state. A no-op when
    /// the LVAP has no downlink yet.
    pub fn refresh_lvap(&self) -> Vec<Action> {
        let Some(downlink) = self.downlink else {
            return Vec::new();
        };
        let mut actions = Vec::with_capacity(1 + self.uplink.len());
        actions.push(Action::AddLvap { block: downlink, set_mask: true });
        for block in &self.uplink {
            actions.push(Action::AddLvap { block: *block, set_mask: false });
        }
        actions
    }

    /// Mutate the per-station transmission policy on the current downlink
    /// and re-emit `SET_PORT` (a no-op when there is no downlink yet, or
    /// when the policy is unchanged).
    pub fn set_tx_policy(&mut self, policy: TxPolicy) -> Vec<Action> {
        if self.tx_policy.as_ref() == Some(&policy) {
            return Vec::new();
        }
        let Some(downlink) = self.downlink else {
            return Vec::new();
        };
        self.tx_policy = Some(policy.clone());
        vec![Action::SetTransmissionPolicy { block: downlink, policy }]
    }

    pub fn set_encap(&mut self, encap: Option<EtherAddress>) -> Vec<Action> {
        if self.encap == encap {
            return Vec::new();
        }
        self.encap = encap;
        self.refresh_lvap()
    }

    pub fn set_assoc_id(&mut self, assoc_id: u16) -> Vec<Action> {
        if self.assoc_id == assoc_id {
            return Vec::new();
        }
        self.assoc_id = assoc_id;
        self.refresh_lvap()
    }

    pub fn set_supported_band_ht20(&mut self, ht20: bool) -> Vec<Action> {
        if self.supported_band_ht20 == ht20 {
            return Vec::new();
        }
        self.supported_band_ht20 = ht20;
        self.refresh_lvap()
    }

    pub fn set_lvap_bssid(&mut self, bssid: Bssid) -> Vec<Action> {
        if self.lvap_bssid == bssid {
            return Vec::new();
        }
        self.lvap_bssid = bssid;
        self.refresh_lvap()
    }

    pub fn set_ssids(&mut self, ssids: Vec<String>) -> Vec<Action> {
        if self.ssids == ssids {
            return Vec::new();
        }
        self.ssids = ssids;
        self.refresh_lvap()
    }

    pub fn set_tenant(&mut self, tenant: Option<Uuid>) -> Vec<Action> {
        if self.tenant == tenant {
            return Vec::new();
        }
        self.tenant = tenant;
        self.refresh_lvap()
    }

    /// `xid` acknowledges one outstanding ADD_LVAP. When the last one
    /// drains, SPAWNING→RUNNING: records spawn latency and, if attached to
    /// a tenant, emits PROBE_RESPONSE toward the client.
    pub fn handle_add_lvap_response(
        &mut self,
        xid: Xid,
        now: Instant,
    ) -> Result<(Vec<Action>, Option<Duration>), ProtocolError> {
        if self.state != State::Spawning {
            return Err(ProtocolError::ResponseInWrongState);
        }
        if !self.pending.remove(&xid) {
            return Err(ProtocolError::XidNotPending(xid));
        }
        if !self.pending.is_empty() {
            return Ok((Vec::new(), None));
        }

        self.state = State::Running;
        let latency = self.spawn_start_ts.take().map(|start| now.saturating_duration_since(start));

        let mut actions = Vec::new();
        if self.tenant.is_some() {
            if let Some(block) = self.downlink {
                let ssid = self.ssids.first().cloned().unwrap_or_default();
                actions.push(Action::ProbeResponse { via: block, ssid });
            }
        }
        Ok((actions, latency))
    }

    /// `xid` acknowledges one outstanding DEL_LVAP. When the last one
    /// drains, REMOVING→SPAWNING using the blocks saved by the `assign`
    /// call that started this handover.
    pub fn handle_del_lvap_response(
        &mut self,
        xid: Xid,
        now: Instant,
    ) -> Result<Vec<Action>, ProtocolError> {
        if self.state != State::Removing {
            return Err(ProtocolError::ResponseInWrongState);
        }
        if !self.pending.remove(&xid) {
            return Err(ProtocolError::XidNotPending(xid));
        }
        if !self.pending.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.enter_spawning(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Band;

    fn addr(n: u8) -> EtherAddress {
        EtherAddress::from_bytes([n; 6])
    }

    fn block(wtp: u8, hwaddr: u8, channel: u8) -> ResourceBlock {
        ResourceBlock::new(addr(wtp), addr(hwaddr), channel, Band::Band2GHz)
    }

    #[test]
    fn cold_spawn_emits_policy_and_add_lvap_then_runs() {
        let mut lvap = Lvap::new(addr(1), addr(1));
        let now = Instant::now();
        let actions = lvap.assign(block(10, 20, 6), Vec::new(), None, now).unwrap();
        assert_eq!(lvap.state, State::Spawning);
        assert_eq!(actions.len(), 2);
        let xid = 77;
        lvap.push_pending(xid);
        assert_eq!(lvap.pending.len(), 1);

        let (actions, latency) = lvap.handle_add_lvap_response(xid, now).unwrap();
        assert_eq!(lvap.state, State::Running);
        assert!(lvap.pending.is_empty());
        assert!(actions.is_empty());
        assert!(latency.is_some());
    }

    #[test]
    fn running_to_removing_emits_del_lvap_without_csa_for_same_channel() {
        let mut lvap = Lvap::new(addr(1), addr(1));
        let now = Instant::now();
        lvap.assign(block(10, 20, 6), Vec::new(), None, now).unwrap();
        lvap.push_pending(1);
        lvap.handle_add_lvap_response(1, now).unwrap();

        let actions = lvap.assign(block(11, 21, 6), Vec::new(), None, now).unwrap();
        assert_eq!(lvap.state, State::Removing);
        assert_eq!(actions, vec![Action::DelLvap { block: block(10, 20, 6), csa: None }]);
    }

    #[test]
    fn cross_channel_handover_attaches_csa() {
        let mut lvap = Lvap::new(addr(1), addr(1));
        let now = Instant::now();
        lvap.assign(block(10, 20, 6), Vec::new(), None, now).unwrap();
        lvap.push_pending(1);
        lvap.handle_add_lvap_response(1, now).unwrap();

        let actions = lvap.assign(block(11, 21, 11), Vec::new(), None, now).unwrap();
        match &actions[0] {
            Action::DelLvap { csa: Some(csa), .. } => assert_eq!(csa.target_channel, 11),
            other => panic!("expected CSA del_lvap, got {other:?}"),
        }
    }

    #[test]
    fn full_handover_round_trip_reaches_running_on_new_block() {
        let mut lvap = Lvap::new(addr(1), addr(1));
        let now = Instant::now();
        lvap.assign(block(10, 20, 6), Vec::new(), None, now).unwrap();
        lvap.push_pending(1);
        lvap.handle_add_lvap_response(1, now).unwrap();

        lvap.assign(block(11, 21, 6), Vec::new(), None, now).unwrap();
        lvap.push_pending(2);
        let spawn_actions = lvap.handle_del_lvap_response(2, now).unwrap();
        assert_eq!(lvap.state, State::Spawning);
        assert!(lvap.target_blocks.is_none());
        assert!(matches!(spawn_actions[1], Action::AddLvap { block, set_mask: true } if block == block(11, 21, 6)));

        lvap.push_pending(3);
        lvap.handle_add_lvap_response(3, now).unwrap();
        assert_eq!(lvap.state, State::Running);
        assert_eq!(lvap.downlink, Some(block(11, 21, 6)));
    }

    #[test]
    fn assign_while_pending_is_handover_in_progress() {
        let mut lvap = Lvap::new(addr(1), addr(1));
        let now = Instant::now();
        lvap.assign(block(10, 20, 6), Vec::new(), None, now).unwrap();
        lvap.push_pending(1);
        let err = lvap.assign(block(11, 21, 6), Vec::new(), None, now).unwrap_err();
        assert_eq!(err, LogicError::HandoverInProgress);
    }

    #[test]
    fn shared_tenant_reassignment_silently_ignored_when_vap_absent() {
        let mut lvap = Lvap::new(addr(1), addr(1));
        let tenant = Tenant::new(
            Uuid::from_u128(1),
            "guest",
            crate::resource::BssidType::Shared,
            addr(0xaa),
        );
        let now = Instant::now();
        let actions = lvap.assign(block(10, 20, 6), Vec::new(), Some(&tenant), now).unwrap();
        assert!(actions.is_empty());
        assert_eq!(lvap.state, State::Null);
    }

    #[test]
    fn handle_add_lvap_response_rejects_unknown_xid() {
        let mut lvap = Lvap::new(addr(1), addr(1));
        let now = Instant::now();
        lvap.assign(block(10, 20, 6), Vec::new(), None, now).unwrap();
        let err = lvap.handle_add_lvap_response(999, now).unwrap_err();
        assert_eq!(err, ProtocolError::XidNotPending(999));
    }

    #[test]
    fn refresh_lvap_is_noop_without_downlink() {
        let lvap = Lvap::new(addr(1), addr(1));
        assert!(lvap.refresh_lvap().is_empty());
    }

    #[test]
    fn set_tx_policy_noop_without_downlink() {
        let mut lvap = Lvap::new(addr(1), addr(1));
        let policy = TxPolicy::default_for(&block(10, 20, 6), false);
        assert!(lvap.set_tx_policy(policy).is_empty());
    }

    #[test]
    fn set_tx_policy_reemits_set_port_on_change() {
        let mut lvap = Lvap::new(addr(1), addr(1));
        let now = Instant::now();
        lvap.assign(block(10, 20, 6), Vec::new(), None, now).unwrap();
        let initial = lvap.tx_policy.clone().expect("enter_spawning sets tx_policy");

        assert!(lvap.set_tx_policy(initial.clone()).is_empty());

        let mut changed = initial;
        changed.no_ack = true;
        let actions = lvap.set_tx_policy(changed.clone());
        assert_eq!(
            actions,
            vec![Action::SetTransmissionPolicy { block: block(10, 20, 6), policy: changed }]
        );
    }

    #[test]
    fn set_ssids_noop_when_unchanged_emits_nothing() {
        let mut lvap = Lvap::new(addr(1), addr(1));
        let now = Instant::now();
        lvap.assign(block(10, 20, 6), Vec::new(), None, now).unwrap();
        lvap.push_pending(1);
        lvap.handle_add_lvap_response(1, now).unwrap();
        assert!(lvap.set_ssids(Vec::new()).is_empty());
        let actions = lvap.set_ssids(vec!["lab".to_string()]);
        assert!(!actions.is_empty());
    }
}
