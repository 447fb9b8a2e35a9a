//! Shared fixtures for the integration tests in this directory: a test
//! WTP, a test tenant, and a couple of resource blocks to assign LVAPs to.

use lvapd_core::ids::EtherAddress;
use lvapd_core::resource::{Band, BssidType, ResourceBlock, Tenant, Wtp};
use uuid::Uuid;

pub fn wtp_addr(last_byte: u8) -> EtherAddress {
    EtherAddress::from_bytes([0x02, 0x00, 0x00, 0x00, 0x00, last_byte])
}

pub fn sta_addr(last_byte: u8) -> EtherAddress {
    EtherAddress::from_bytes([0xde, 0xad, 0xbe, 0xef, 0x00, last_byte])
}

pub fn test_wtp(addr: EtherAddress) -> Wtp {
    Wtp::new(addr)
}

pub fn test_block(wtp: EtherAddress, hwaddr: EtherAddress, channel: u8) -> ResourceBlock {
    ResourceBlock::new(wtp, hwaddr, channel, Band::Band2GHz)
}

pub fn test_tenant(name: &str, bssid_type: BssidType) -> (Uuid, Tenant) {
    let id = Uuid::from_u128(0xfeed);
    let prefix = EtherAddress::from_bytes([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    (id, Tenant::new(id, name, bssid_type, prefix))
}
