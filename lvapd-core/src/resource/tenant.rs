//! Tenants: administrative scopes (SSIDs) that LVAPs attach to, and the VAP
//! bookkeeping shared-bssid tenants need.

use std::collections::HashMap;

use uuid::Uuid;

use crate::ids::{Bssid, EtherAddress};
use crate::resource::block::Band;

/// Whether every LVAP in a tenant gets its own generated bssid, or all
/// LVAPs on a given WTP radio share one VAP bssid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BssidType {
    Unique,
    Shared,
}

/// A broadcast virtual AP published on a specific WTP radio for a SHARED
/// tenant. Modeled fully per the supplemented ADD_VAP/DEL_VAP/STATUS_VAP
/// trio; administration (creating/destroying these) stays out of scope,
/// but the shared-tenant reassignment check in the LVAP state machine
/// depends on looking them up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vap {
    pub hwaddr: EtherAddress,
    pub channel: u8,
    pub band: Band,
    pub net_bssid: Bssid,
    pub ssid: String,
}

/// An administrative scope identified by UUID and SSID (`tenant_name`).
#[derive(Debug, Clone)]
pub struct Tenant {
    pub uuid: Uuid,
    pub tenant_name: String,
    pub bssid_type: BssidType,
    /// BSSID prefix XOR-combined with a block's hwaddr to derive per-LVAP
    /// bssids (UNIQUE tenants) or to check VAP presence (SHARED tenants).
    pub bssid_prefix: EtherAddress,
    pub lvaps: HashMap<EtherAddress, ()>,
    pub vaps: HashMap<Bssid, Vap>,
}

impl Tenant {
    pub fn new(
        uuid: Uuid,
        tenant_name: impl Into<String>,
        bssid_type: BssidType,
        bssid_prefix: EtherAddress,
    ) -> Self {
        Tenant {
            uuid,
            tenant_name: tenant_name.into(),
            bssid_type,
            bssid_prefix,
            lvaps: HashMap::new(),
            vaps: HashMap::new(),
        }
    }

    pub fn insert_lvap(&mut self, addr: EtherAddress) {
        self.lvaps.insert(addr, ());
    }

    pub fn remove_lvap(&mut self, addr: EtherAddress) {
        self.lvaps.remove(&addr);
    }

    pub fn has_lvap(&self, addr: EtherAddress) -> bool {
        self.lvaps.contains_key(&addr)
    }

    /// The bssid a SHARED tenant would present on `hwaddr`, if that VAP has
    /// actually been published there.
    pub fn shared_vap_on(&self, hwaddr: EtherAddress) -> Option<&Vap> {
        let candidate = generate_bssid(self.bssid_prefix, hwaddr);
        self.vaps.get(&candidate)
    }
}

/// Deterministically derive a bssid by XOR-combining a tenant prefix with a
/// block's radio hardware address.
pub fn generate_bssid(prefix: EtherAddress, hwaddr: EtherAddress) -> Bssid {
    prefix.xor(&hwaddr)
}
