use thiserror::Error;

use crate::codec::CodecError;

/// Errors that can occur in the controller
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("logic error: {0}")]
    Logic(#[from] LogicError),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised when an incoming message does not fit the expected
/// application-level protocol state. These are logged and the offending
/// message is dropped; they never tear down the connection.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("xid {0} is not pending")]
    XidNotPending(u32),
    #[error("response received while LVAP is in the wrong state")]
    ResponseInWrongState,
}

/// Errors raised by the LVAP state machine itself. These are fatal for the
/// requesting caller (e.g. the assignment API) and are surfaced to whatever
/// administrative surface invoked the operation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicError {
    #[error("invalid LVAP state transition")]
    InvalidTransition,
    #[error("handover already in progress")]
    HandoverInProgress,
    #[error("LVAP has no downlink block assigned")]
    UnboundLvap,
}

pub type Result<T> = std::result::Result<T, ControllerError>;
