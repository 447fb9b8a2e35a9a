//! Resource blocks: the (radio, channel, band) units a WTP publishes for
//! the controller to assign LVAPs onto.

use crate::ids::EtherAddress;

/// 802.11 band enumeration carried on the wire as a single byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    Band2GHz,
    Band5GHz,
}

impl Band {
    pub fn from_wire(v: u8) -> Band {
        if v == 0 {
            Band::Band2GHz
        } else {
            Band::Band5GHz
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            Band::Band2GHz => 0,
            Band::Band5GHz => 1,
        }
    }
}

/// A radio resource owned by exactly one WTP. `(wtp, hwaddr, channel, band)`
/// uniquely identifies a block; that tuple is this type's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceBlock {
    pub wtp: EtherAddress,
    pub hwaddr: EtherAddress,
    pub channel: u8,
    pub band: Band,
}

impl ResourceBlock {
    pub fn new(wtp: EtherAddress, hwaddr: EtherAddress, channel: u8, band: Band) -> Self {
        Self { wtp, hwaddr, channel, band }
    }

    /// Whether 802.11a/g (>14) or 802.11b/g base rates apply to this channel.
    pub fn is_ofdm_channel(&self) -> bool {
        self.channel > 14
    }
}

/// A read-only queryable view over a WTP's published blocks, used by
/// handover to find a same-(channel, band) block on a different WTP.
pub struct BlockView<'a> {
    blocks: &'a [ResourceBlock],
}

impl<'a> BlockView<'a> {
    pub fn new(blocks: &'a [ResourceBlock]) -> Self {
        Self { blocks }
    }

    pub fn filter_by_channel(self, channel: u8) -> BlockViewOwned {
        BlockViewOwned {
            blocks: self.blocks.iter().filter(|b| b.channel == channel).copied().collect(),
        }
    }

    pub fn filter_by_band(self, band: Band) -> BlockViewOwned {
        BlockViewOwned { blocks: self.blocks.iter().filter(|b| b.band == band).copied().collect() }
    }

    pub fn first(self) -> Option<ResourceBlock> {
        self.blocks.first().copied()
    }
}

/// Owned continuation of a [`BlockView`] filter chain, so `filter_by_channel`
/// and `filter_by_band` can be composed in either order.
pub struct BlockViewOwned {
    blocks: Vec<ResourceBlock>,
}

impl BlockViewOwned {
    pub fn filter_by_channel(self, channel: u8) -> BlockViewOwned {
        BlockViewOwned { blocks: self.blocks.into_iter().filter(|b| b.channel == channel).collect() }
    }

    pub fn filter_by_band(self, band: Band) -> BlockViewOwned {
        BlockViewOwned { blocks: self.blocks.into_iter().filter(|b| b.band == band).collect() }
    }

    pub fn first(self) -> Option<ResourceBlock> {
        self.blocks.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> EtherAddress {
        EtherAddress::from_bytes([n; 6])
    }

    #[test]
    fn filter_chain_narrows_to_matching_block() {
        let blocks = vec![
            ResourceBlock::new(addr(1), addr(10), 1, Band::Band2GHz),
            ResourceBlock::new(addr(1), addr(11), 6, Band::Band2GHz),
            ResourceBlock::new(addr(1), addr(12), 11, Band::Band5GHz),
        ];
        let found = BlockView::new(&blocks).filter_by_channel(6).filter_by_band(Band::Band2GHz).first();
        assert_eq!(found, Some(blocks[1]));
    }

    #[test]
    fn filter_chain_returns_none_when_no_match() {
        let blocks = vec![ResourceBlock::new(addr(1), addr(10), 1, Band::Band2GHz)];
        let found = BlockView::new(&blocks).filter_by_channel(44).first();
        assert_eq!(found, None);
    }

    #[test]
    fn ofdm_channel_threshold_is_14() {
        let block = ResourceBlock::new(addr(1), addr(2), 14, Band::Band2GHz);
        assert!(!block.is_ofdm_channel());
        let block = ResourceBlock::new(addr(1), addr(2), 36, Band::Band5GHz);
        assert!(block.is_ofdm_channel());
    }
}
