//! Framed binary wire protocol shared by the controller and WTP agents.
//!
//! Every message begins with a 6-byte header (`version:u8`, `type:u8`,
//! `length:u32 BE`, the length inclusive of the header itself) followed by a
//! type-specific payload. This module is pure: it only maps byte slices to
//! typed [`Message`] values and back, with no I/O of its own.

mod error;
mod header;
mod message;
mod wire;

pub use error::CodecError;
pub use header::{FrameHeader, HEADER_LEN, PROTOCOL_VERSION};
pub use message::{
    AddLvap, AddLvapResponse, AddTrafficRule, AddVap, AssocRequest, AssocResponse, AuthRequest,
    AuthResponse, CapsPort, CapsRequest, CapsResponse, CapsResourceBlock, DelLvap, DelLvapResponse,
    DelVap, Hello, LvapStatusRequest, Message, MessageType, PortStatusRequest, ProbeRequest,
    ProbeResponse, SeqOnly, SetPort, StatusLvap, StatusPort, StatusTrafficRule, StatusVap,
    TrafficRuleStatusRequest, VapStatusRequest, WadrrRequest,
};
