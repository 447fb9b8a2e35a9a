#![forbid(unsafe_code)]

pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod ids;
pub mod lvap;
pub mod resource;
pub mod security;
pub mod server;
pub mod telemetry;
pub mod xid;

pub use config::{load_from_path, Config};
pub use error::{ControllerError, Result};
pub use events::Event;
pub use ids::{EtherAddress, Xid};
pub use server::Controller;
