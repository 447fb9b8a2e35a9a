//! The per-client LVAP: lifecycle state machine, handover orchestration,
//! and STATUS_LVAP reconciliation.

mod state;
mod status;

pub use state::{Action, Csa, Lvap, State};
pub use status::{reconcile, StatusReport};
