//! Per-connection transaction id allocation and pending-transaction bookkeeping.

use std::collections::HashMap;
use tokio::time::Instant;

use crate::ids::{EtherAddress, Xid};

/// What kind of acknowledgement a pending xid is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwaitingKind {
    Add,
    Del,
}

/// A single in-flight controller→agent transaction.
#[derive(Debug, Clone, Copy)]
pub struct PendingTransaction {
    pub lvap: EtherAddress,
    pub kind: AwaitingKind,
    pub deadline: Instant,
}

/// Allocates monotonically increasing xids for one WTP connection and
/// correlates agent responses back to the LVAP and kind that is awaiting
/// them. Wrapping on overflow is acceptable: the pending window is bounded
/// by outstanding LVAP transitions and always drains within seconds.
#[derive(Debug, Default)]
pub struct XidRegistry {
    next: Xid,
    pending: HashMap<Xid, PendingTransaction>,
}

impl XidRegistry {
    pub fn new() -> Self {
        Self { next: 0, pending: HashMap::new() }
    }

    /// Returns the current value and increments the counter, wrapping at
    /// `u32::MAX`.
    pub fn next_xid(&mut self) -> Xid {
        let xid = self.next;
        self.next = self.next.wrapping_add(1);
        xid
    }

    /// Allocate a new xid and record it as awaiting an acknowledgement.
    pub fn allocate(&mut self, lvap: EtherAddress, kind: AwaitingKind, deadline: Instant) -> Xid {
        let xid = self.next_xid();
        self.pending.insert(xid, PendingTransaction { lvap, kind, deadline });
        xid
    }

    /// Remove and return the bookkeeping entry for `xid`, if any is pending.
    pub fn take(&mut self, xid: Xid) -> Option<PendingTransaction> {
        self.pending.remove(&xid)
    }

    pub fn is_pending(&self, xid: Xid) -> bool {
        self.pending.contains_key(&xid)
    }

    /// Drop every pending transaction belonging to `lvap` (e.g. on forced
    /// cleanup) and return their xids.
    pub fn clear_for_lvap(&mut self, lvap: EtherAddress) -> Vec<Xid> {
        let xids: Vec<Xid> =
            self.pending.iter().filter(|(_, t)| t.lvap == lvap).map(|(x, _)| *x).collect();
        for xid in &xids {
            self.pending.remove(xid);
        }
        xids
    }

    /// Drop every pending transaction (used when the whole connection dies).
    pub fn clear_all(&mut self) -> Vec<PendingTransaction> {
        self.pending.drain().map(|(_, t)| t).collect()
    }

    /// Transactions whose deadline has already passed.
    pub fn expired(&self, now: Instant) -> Vec<(Xid, PendingTransaction)> {
        self.pending.iter().filter(|(_, t)| t.deadline <= now).map(|(x, t)| (*x, *t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_xid_increments_from_zero() {
        let mut reg = XidRegistry::new();
        assert_eq!(reg.next_xid(), 0);
        assert_eq!(reg.next_xid(), 1);
        assert_eq!(reg.next_xid(), 2);
    }

    #[test]
    fn next_xid_wraps_at_max() {
        let mut reg = XidRegistry { next: u32::MAX, pending: HashMap::new() };
        assert_eq!(reg.next_xid(), u32::MAX);
        assert_eq!(reg.next_xid(), 0);
    }

    #[test]
    fn allocate_and_take_round_trip() {
        let mut reg = XidRegistry::new();
        let lvap = EtherAddress::from_bytes([1, 2, 3, 4, 5, 6]);
        let deadline = Instant::now();
        let xid = reg.allocate(lvap, AwaitingKind::Add, deadline);
        assert!(reg.is_pending(xid));
        let taken = reg.take(xid).unwrap();
        assert_eq!(taken.lvap, lvap);
        assert_eq!(taken.kind, AwaitingKind::Add);
        assert!(!reg.is_pending(xid));
    }

    #[test]
    fn clear_for_lvap_only_drops_matching_entries() {
        let mut reg = XidRegistry::new();
        let a = EtherAddress::from_bytes([1, 1, 1, 1, 1, 1]);
        let b = EtherAddress::from_bytes([2, 2, 2, 2, 2, 2]);
        let deadline = Instant::now();
        let xa = reg.allocate(a, AwaitingKind::Add, deadline);
        let xb = reg.allocate(b, AwaitingKind::Del, deadline);
        let cleared = reg.clear_for_lvap(a);
        assert_eq!(cleared, vec![xa]);
        assert!(!reg.is_pending(xa));
        assert!(reg.is_pending(xb));
    }
}
