//! Reconciliation of an agent-pushed STATUS_LVAP report against the
//! controller's view of an LVAP.

use uuid::Uuid;

use super::state::{Action, Lvap};
use crate::events::Event;
use crate::ids::EtherAddress;
use crate::resource::ResourceBlock;

/// The fields of a STATUS_LVAP report relevant to reconciliation. `encap`
/// uses [`EtherAddress::ZERO`] as the wire's "no re-encapsulation" sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub set_mask: bool,
    pub associated: bool,
    pub authenticated: bool,
    pub assoc_id: u16,
    pub encap: EtherAddress,
    pub block: ResourceBlock,
    pub ssids: Vec<String>,
}

/// Apply a STATUS_LVAP report to `lvap`. `resolve_tenant` resolves the
/// incoming SSID (if any) to a known tenant's UUID; the caller looks this
/// up in its own tenant registry, keeping this function free of any
/// dependency on the tenant arena.
pub fn reconcile(
    lvap: &mut Lvap,
    report: StatusReport,
    resolve_tenant: impl FnOnce(&str) -> Option<Uuid>,
) -> (Vec<Action>, Vec<Event>) {
    let mut actions = Vec::new();
    let mut events = Vec::new();

    if report.set_mask {
        if let Some(old) = lvap.downlink {
            if old != report.block {
                actions.push(Action::DelLvap { block: old, csa: None });
            }
        }
        lvap.downlink = Some(report.block);
    } else {
        lvap.uplink.push(report.block);
    }

    lvap.authenticated = report.authenticated;
    lvap.associated = report.associated;
    lvap.assoc_id = report.assoc_id;
    lvap.encap = if report.encap == EtherAddress::ZERO { None } else { Some(report.encap) };

    let incoming_ssid = report.ssids.first().cloned();
    let current_ssid = lvap.ssids.first().cloned();

    if let (Some(current), Some(tenant)) = (&current_ssid, lvap.tenant) {
        if incoming_ssid.as_ref() != Some(current) {
            events.push(Event::LvapLeave { addr: lvap.addr, tenant });
            lvap.tenant = None;
        }
    }

    lvap.ssids = if report.ssids.is_empty() { Vec::new() } else { report.ssids[1..].to_vec() };

    if let Some(ssid) = &incoming_ssid {
        if let Some(tenant) = resolve_tenant(ssid) {
            lvap.tenant = Some(tenant);
            events.push(Event::LvapJoin { addr: lvap.addr, tenant });
        }
    }

    (actions, events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::EtherAddress;
    use crate::resource::Band;

    fn addr(n: u8) -> EtherAddress {
        EtherAddress::from_bytes([n; 6])
    }

    fn block() -> ResourceBlock {
        ResourceBlock::new(addr(1), addr(2), 6, Band::Band2GHz)
    }

    #[test]
    fn set_mask_true_replaces_stale_downlink() {
        let mut lvap = Lvap::new(addr(9), addr(9));
        lvap.downlink = Some(ResourceBlock::new(addr(1), addr(3), 6, Band::Band2GHz));
        let report = StatusReport {
            set_mask: true,
            associated: true,
            authenticated: true,
            assoc_id: 1,
            encap: EtherAddress::ZERO,
            block: block(),
            ssids: Vec::new(),
        };
        let (actions, _) = reconcile(&mut lvap, report, |_| None);
        assert_eq!(actions.len(), 1);
        assert_eq!(lvap.downlink, Some(block()));
    }

    #[test]
    fn set_mask_false_appends_uplink() {
        let mut lvap = Lvap::new(addr(9), addr(9));
        let report = StatusReport {
            set_mask: false,
            associated: false,
            authenticated: false,
            assoc_id: 0,
            encap: EtherAddress::ZERO,
            block: block(),
            ssids: Vec::new(),
        };
        let (actions, _) = reconcile(&mut lvap, report, |_| None);
        assert!(actions.is_empty());
        assert_eq!(lvap.uplink, vec![block()]);
    }

    #[test]
    fn ssid_change_emits_leave_then_join() {
        let mut lvap = Lvap::new(addr(9), addr(9));
        lvap.ssids = vec!["foo".to_string()];
        lvap.tenant = Some(Uuid::from_u128(1));
        let bar_tenant = Uuid::from_u128(2);
        let report = StatusReport {
            set_mask: true,
            associated: false,
            authenticated: false,
            assoc_id: 0,
            encap: EtherAddress::ZERO,
            block: block(),
            ssids: vec!["bar".to_string()],
        };
        let (_, events) = reconcile(&mut lvap, report, |ssid| (ssid == "bar").then_some(bar_tenant));
        assert_eq!(
            events,
            vec![
                Event::LvapLeave { addr: addr(9), tenant: Uuid::from_u128(1) },
                Event::LvapJoin { addr: addr(9), tenant: bar_tenant },
            ]
        );
        assert_eq!(lvap.tenant, Some(bar_tenant));
        assert!(lvap.ssids.is_empty());
    }

    #[test]
    fn unchanged_ssid_raises_no_events() {
        let mut lvap = Lvap::new(addr(9), addr(9));
        lvap.ssids = vec!["foo".to_string()];
        lvap.tenant = Some(Uuid::from_u128(1));
        let report = StatusReport {
            set_mask: true,
            associated: false,
            authenticated: false,
            assoc_id: 0,
            encap: EtherAddress::ZERO,
            block: block(),
            ssids: vec!["foo".to_string(), "extra".to_string()],
        };
        let (_, events) = reconcile(&mut lvap, report, |_| None);
        assert!(events.is_empty());
        assert_eq!(lvap.ssids, vec!["extra".to_string()]);
    }
}
