use super::error::CodecError;

/// Version byte carried by every frame. A frame whose version does not
/// match is rejected without being dispatched.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Size in bytes of the fixed header: `version(1) + type(1) + length(4)`.
pub const HEADER_LEN: usize = 6;

/// The 6-byte header shared by every message on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u8,
    pub msg_type: u8,
    /// Total frame length, inclusive of the header.
    pub length: u32,
}

impl FrameHeader {
    pub fn parse(buf: &[u8]) -> Result<FrameHeader, CodecError> {
        if buf.len() < HEADER_LEN {
            return Err(CodecError::TruncatedFrame { needed: HEADER_LEN, got: buf.len() });
        }
        let version = buf[0];
        let msg_type = buf[1];
        let length = u32::from_be_bytes([buf[2], buf[3], buf[4], buf[5]]);
        Ok(FrameHeader { version, msg_type, length })
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.version);
        out.push(self.msg_type);
        out.extend_from_slice(&self.length.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_with_encode() {
        let header = FrameHeader { version: PROTOCOL_VERSION, msg_type: 0x04, length: 16 };
        let mut buf = Vec::new();
        header.encode(&mut buf);
        let parsed = FrameHeader::parse(&buf).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn parse_rejects_short_buffer() {
        let err = FrameHeader::parse(&[0u8; 3]).unwrap_err();
        assert_eq!(err, CodecError::TruncatedFrame { needed: HEADER_LEN, got: 3 });
    }
}
