use thiserror::Error;

/// Errors raised while decoding a frame. All are recoverable: the caller
/// logs at warning and drops the offending frame, then keeps reading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("frame truncated: need at least {needed} bytes, have {got}")]
    TruncatedFrame { needed: usize, got: usize },

    #[error("unsupported protocol version: expected {expected}, got {got}")]
    BadVersion { expected: u8, got: u8 },

    #[error("unknown message type: 0x{0:02x}")]
    UnknownType(u8),

    #[error("declared frame length disagrees with payload: {0}")]
    FieldOverflow(String),

    #[error("invalid enum value for {field}: {value}")]
    BadEnum { field: &'static str, value: u32 },
}
