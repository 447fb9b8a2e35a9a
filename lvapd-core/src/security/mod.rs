//! WTP source-address filtering, mirroring the proxy's client ACL check.

mod ip_filter;

pub use ip_filter::is_wtp_allowed;
