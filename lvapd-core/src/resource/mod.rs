//! Pure value types for the controller's resource model: blocks, transmit
//! policies, WTPs and tenants. No I/O; mutation here never talks to a
//! socket, only the `connection`/`lvap` layers that sit on top do.

pub mod block;
pub mod tenant;
pub mod txpolicy;
pub mod wtp;

pub use block::{Band, BlockView, ResourceBlock};
pub use tenant::{generate_bssid, BssidType, Tenant, Vap};
pub use txpolicy::TxPolicy;
pub use wtp::{PortDescriptor, Wtp};
