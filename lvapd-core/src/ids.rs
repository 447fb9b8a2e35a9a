//! Identifiers shared across the codec, resource model and state machine.

use std::fmt;
use std::str::FromStr;

/// A 48-bit hardware address, rendered hex-colon (`aa:bb:cc:dd:ee:ff`).
///
/// Ordering is byte-sequence order, which also makes `EtherAddress` usable
/// as a stable map key independent of insertion order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EtherAddress([u8; 6]);

impl EtherAddress {
    pub const BROADCAST: EtherAddress = EtherAddress([0xff; 6]);
    pub const ZERO: EtherAddress = EtherAddress([0; 6]);

    pub const fn from_bytes(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// XOR-combine two addresses byte-wise. Used by `generate_bssid`.
    pub fn xor(&self, other: &EtherAddress) -> EtherAddress {
        let mut out = [0u8; 6];
        for i in 0..6 {
            out[i] = self.0[i] ^ other.0[i];
        }
        EtherAddress(out)
    }
}

impl fmt::Debug for EtherAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for EtherAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// Parse errors for the hex-colon textual form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid ethernet address")]
pub struct ParseEtherAddressError;

impl FromStr for EtherAddress {
    type Err = ParseEtherAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; 6];
        let mut parts = s.split(':');
        for slot in out.iter_mut() {
            let part = parts.next().ok_or(ParseEtherAddressError)?;
            *slot = u8::from_str_radix(part, 16).map_err(|_| ParseEtherAddressError)?;
        }
        if parts.next().is_some() {
            return Err(ParseEtherAddressError);
        }
        Ok(EtherAddress(out))
    }
}

/// A BSSID is just an [`EtherAddress`] used in the 802.11 BSSID role.
pub type Bssid = EtherAddress;

/// Transaction id correlating a controller command with its acknowledgement.
/// Unique per WTP connection within a session; wraps on overflow.
pub type Xid = u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_hex_colon() {
        let addr = EtherAddress::from_bytes([0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e]);
        assert_eq!(addr.to_string(), "00:1a:2b:3c:4d:5e");
    }

    #[test]
    fn round_trips_through_parse() {
        let addr = EtherAddress::from_bytes([0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);
        let parsed: EtherAddress = addr.to_string().parse().unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn ordering_is_byte_sequence() {
        let a = EtherAddress::from_bytes([0, 0, 0, 0, 0, 1]);
        let b = EtherAddress::from_bytes([0, 0, 0, 0, 0, 2]);
        assert!(a < b);
    }

    #[test]
    fn xor_is_its_own_inverse() {
        let a = EtherAddress::from_bytes([1, 2, 3, 4, 5, 6]);
        let b = EtherAddress::from_bytes([6, 5, 4, 3, 2, 1]);
        assert_eq!(a.xor(&b).xor(&b), a);
    }

    #[test]
    fn rejects_malformed_text() {
        assert!("not-a-mac".parse::<EtherAddress>().is_err());
        assert!("aa:bb:cc:dd:ee".parse::<EtherAddress>().is_err());
        assert!("aa:bb:cc:dd:ee:ff:00".parse::<EtherAddress>().is_err());
    }
}
