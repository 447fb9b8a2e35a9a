//! Per-station transmission policy on a block. Any mutation is expected to
//! be followed by a `SET_PORT` emission by the caller; this type itself does
//! no I/O.

use crate::resource::block::ResourceBlock;

/// Legacy 802.11b/g base rates (Mbps), used below channel 14.
const LEGACY_RATES: &[f32] = &[1.0, 2.0, 5.5, 11.0, 6.0, 9.0, 12.0, 18.0, 24.0, 36.0, 48.0, 54.0];

/// 802.11a/g base rates (Mbps), used above channel 14.
const OFDM_RATES: &[f32] = &[6.0, 9.0, 12.0, 18.0, 24.0, 36.0, 48.0, 54.0];

#[derive(Debug, Clone, PartialEq)]
pub struct TxPolicy {
    pub mcs: Vec<f32>,
    pub ht_mcs: Vec<u8>,
    pub rts_cts: u16,
    pub tx_mcast: u8,
    pub ur_mcast_count: u8,
    pub no_ack: bool,
}

impl TxPolicy {
    /// Build the default policy assigned when a downlink block is created,
    /// following the channel-dependent base rate set and the HT-MCS range
    /// enabled only for `HT20`-capable stations.
    pub fn default_for(block: &ResourceBlock, supported_band_is_ht20: bool) -> Self {
        let mcs = if block.is_ofdm_channel() { OFDM_RATES.to_vec() } else { LEGACY_RATES.to_vec() };
        let ht_mcs = if supported_band_is_ht20 { (0..=15).collect() } else { Vec::new() };
        TxPolicy { mcs, ht_mcs, rts_cts: 2347, tx_mcast: 0, ur_mcast_count: 3, no_ack: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::EtherAddress;
    use crate::resource::block::Band;

    fn addr(n: u8) -> EtherAddress {
        EtherAddress::from_bytes([n; 6])
    }

    #[test]
    fn legacy_rates_below_channel_15() {
        let block = ResourceBlock::new(addr(1), addr(2), 6, Band::Band2GHz);
        let policy = TxPolicy::default_for(&block, false);
        assert_eq!(policy.mcs, LEGACY_RATES.to_vec());
        assert!(policy.ht_mcs.is_empty());
    }

    #[test]
    fn ofdm_rates_above_channel_14() {
        let block = ResourceBlock::new(addr(1), addr(2), 36, Band::Band5GHz);
        let policy = TxPolicy::default_for(&block, false);
        assert_eq!(policy.mcs, OFDM_RATES.to_vec());
    }

    #[test]
    fn ht_mcs_populated_only_for_ht20() {
        let block = ResourceBlock::new(addr(1), addr(2), 6, Band::Band2GHz);
        let policy = TxPolicy::default_for(&block, true);
        assert_eq!(policy.ht_mcs, (0..=15).collect::<Vec<u8>>());
    }
}
