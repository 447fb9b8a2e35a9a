//! `tokio_util::codec` adapter wrapping the pure [`crate::codec`] functions
//! so a WTP socket can be driven through `Framed`.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{CodecError, FrameHeader, Message, HEADER_LEN};
use crate::error::ControllerError;

#[derive(Debug, Default)]
pub struct LvapCodec;

impl Decoder for LvapCodec {
    type Item = Message;
    type Error = ControllerError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, ControllerError> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }
        let header = FrameHeader::parse(&src[..HEADER_LEN]).map_err(ControllerError::Codec)?;
        let total = header.length as usize;
        if total < HEADER_LEN {
            src.split_to(total.max(HEADER_LEN));
            return Err(ControllerError::Codec(CodecError::FieldOverflow(format!(
                "declared length {total} shorter than header"
            ))));
        }
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }
        let frame = src.split_to(total);
        let message = Message::decode(&frame).map_err(ControllerError::Codec)?;
        Ok(Some(message))
    }
}

impl Encoder<Message> for LvapCodec {
    type Error = ControllerError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), ControllerError> {
        let frame = item.encode();
        dst.reserve(frame.len());
        dst.extend_from_slice(&frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Hello;
    use crate::ids::EtherAddress;

    #[test]
    fn decode_waits_for_full_frame_then_yields_message() {
        let mut codec = LvapCodec;
        let msg = Message::Hello(Hello {
            seq: 1,
            wtp: EtherAddress::from_bytes([1; 6]),
            period: 5,
        });
        let encoded = msg.encode();
        let mut buf = BytesMut::from(&encoded[..encoded.len() - 1]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(&encoded[encoded.len() - 1..]);
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, msg);
        assert!(buf.is_empty());
    }

    #[test]
    fn short_declared_length_drops_the_frame_instead_of_looping() {
        let mut codec = LvapCodec;
        let mut buf = BytesMut::from(&[1u8, 0, 0, 0, 0, 2][..]);
        assert!(codec.decode(&mut buf).is_err());
        assert!(buf.is_empty());
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn encode_then_decode_round_trips() {
        let mut codec = LvapCodec;
        let msg = Message::Hello(Hello {
            seq: 1,
            wtp: EtherAddress::from_bytes([2; 6]),
            period: 10,
        });
        let mut buf = BytesMut::new();
        codec.encode(msg.clone(), &mut buf).unwrap();
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, msg);
    }
}
