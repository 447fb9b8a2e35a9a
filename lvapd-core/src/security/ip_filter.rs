use std::net::IpAddr;

use crate::config::{IpFilterConfig, IpFilterMode};

/// Whether a connecting WTP's source address is allowed in, per the
/// configured allow/deny CIDR list. An empty list under `Allow` mode
/// admits everyone (no filter configured); an empty list under `Deny`
/// mode admits everyone too, since nothing has been denied.
pub fn is_wtp_allowed(addr: IpAddr, filter: &IpFilterConfig) -> bool {
    let matches = filter.networks.iter().any(|net| net.contains(&addr));
    match filter.mode {
        IpFilterMode::Allow => filter.networks.is_empty() || matches,
        IpFilterMode::Deny => !matches,
    }
}
