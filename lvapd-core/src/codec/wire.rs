//! Primitive big-endian readers/writers shared by the message codecs.

use super::error::CodecError;
use crate::ids::EtherAddress;

pub fn need(buf: &[u8], at: usize, len: usize) -> Result<(), CodecError> {
    if buf.len() < at + len {
        return Err(CodecError::TruncatedFrame { needed: at + len, got: buf.len() });
    }
    Ok(())
}

pub fn read_u8(buf: &[u8], at: usize) -> Result<u8, CodecError> {
    need(buf, at, 1)?;
    Ok(buf[at])
}

pub fn read_u16(buf: &[u8], at: usize) -> Result<u16, CodecError> {
    need(buf, at, 2)?;
    Ok(u16::from_be_bytes([buf[at], buf[at + 1]]))
}

pub fn read_u32(buf: &[u8], at: usize) -> Result<u32, CodecError> {
    need(buf, at, 4)?;
    Ok(u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]))
}

pub fn read_addr(buf: &[u8], at: usize) -> Result<EtherAddress, CodecError> {
    need(buf, at, 6)?;
    let mut raw = [0u8; 6];
    raw.copy_from_slice(&buf[at..at + 6]);
    Ok(EtherAddress::from_bytes(raw))
}

pub fn write_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

pub fn write_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

pub fn write_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

pub fn write_addr(out: &mut Vec<u8>, addr: &EtherAddress) {
    out.extend_from_slice(addr.as_bytes());
}

/// Read the remainder of `buf` starting at `at` as a UTF-8 string, lossily
/// substituting invalid sequences. SSIDs are free-form bytes in the
/// original protocol; lossy conversion keeps the codec infallible on them
/// while still round-tripping any payload actually produced by `write_tail`.
pub fn read_tail_string(buf: &[u8], at: usize) -> Result<String, CodecError> {
    if at > buf.len() {
        return Err(CodecError::FieldOverflow(format!(
            "declared prefix length {at} exceeds frame length {}",
            buf.len()
        )));
    }
    Ok(String::from_utf8_lossy(&buf[at..]).into_owned())
}

pub fn write_tail(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
}

/// Read `1..=10` length-prefixed strings (the `SSIDS` array), consuming the
/// remainder of the buffer starting at `at`.
pub fn read_ssids(buf: &[u8], mut at: usize) -> Result<Vec<String>, CodecError> {
    let mut out = Vec::new();
    while at < buf.len() {
        let len = read_u8(buf, at)? as usize;
        at += 1;
        need(buf, at, len)?;
        out.push(String::from_utf8_lossy(&buf[at..at + len]).into_owned());
        at += len;
    }
    if out.is_empty() || out.len() > 10 {
        return Err(CodecError::FieldOverflow(format!(
            "SSIDS must contain 1..=10 entries, got {}",
            out.len()
        )));
    }
    Ok(out)
}

pub fn write_ssids(out: &mut Vec<u8>, ssids: &[String]) {
    for ssid in ssids {
        let bytes = ssid.as_bytes();
        out.push(bytes.len() as u8);
        out.extend_from_slice(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssids_round_trip() {
        let ssids = vec!["lab".to_string(), "".to_string(), "guest-net".to_string()];
        let mut buf = Vec::new();
        write_ssids(&mut buf, &ssids);
        let parsed = read_ssids(&buf, 0).unwrap();
        assert_eq!(parsed, ssids);
    }

    #[test]
    fn ssids_rejects_empty_list() {
        assert!(read_ssids(&[], 0).is_err());
    }

    #[test]
    fn tail_string_rejects_prefix_past_end() {
        assert!(read_tail_string(&[1, 2, 3], 10).is_err());
    }
}
