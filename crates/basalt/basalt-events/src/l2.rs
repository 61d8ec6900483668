use crate::price::Price;
use std::fmt;

/// Book depth carried per side of an L2 update.
pub const DEPTH: usize = 5;

/// Wire message type tag for L2 market data.
pub const MSG_TYPE_L2: u16 = 1;

pub type Quantity = u64;

/// Fixed 8-byte security symbol, right-padded with zero bytes.
///
/// Equality is byte-exact. `repr(transparent)` over `[u8; 8]` means the id
/// can be reinterpreted as a `u64` (`to_bits`/`from_bits`), which is how the
/// store and generator keep identifiers inside a single atomic word.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SecurityId(pub [u8; 8]);

impl SecurityId {
    /// Builds an id from a symbol string, truncated to 8 bytes.
    pub fn new(symbol: &str) -> Self {
        let mut bytes = [0u8; 8];
        let len = symbol.len().min(8);
        bytes[..len].copy_from_slice(&symbol.as_bytes()[..len]);
        SecurityId(bytes)
    }

    #[inline(always)]
    pub const fn to_bits(self) -> u64 {
        u64::from_ne_bytes(self.0)
    }

    #[inline(always)]
    pub const fn from_bits(bits: u64) -> Self {
        SecurityId(bits.to_ne_bytes())
    }

    /// The symbol up to the first padding byte.
    pub fn as_str(&self) -> &str {
        let len = self.0.iter().position(|&b| b == 0).unwrap_or(8);
        std::str::from_utf8(&self.0[..len]).unwrap_or("")
    }
}

impl fmt::Display for SecurityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One price level: price plus displayed quantity. Exactly 16 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PriceLevel {
    pub price: Price,
    pub quantity: Quantity,
}

/// Fixed 8-byte message header shared by all wire records.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MessageHeader {
    pub seq_no: u32,
    pub length: u16,
    pub msg_type: u16,
}

/// L2 market-data record: top 5 levels per side, fixed 192-byte layout.
///
/// Bids are sorted descending by price, asks ascending; only the first
/// `num_bid_levels`/`num_ask_levels` entries are meaningful and the counts
/// never exceed [`DEPTH`]. Endianness is native; this record never leaves
/// the process.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct L2Update {
    pub header: MessageHeader,
    pub security_id: SecurityId,
    /// Nanosecond timestamp; the feed restamps this with its monotonic clock
    /// when latency statistics are enabled.
    pub timestamp_ns: u64,
    pub bids: [PriceLevel; DEPTH],
    pub asks: [PriceLevel; DEPTH],
    pub num_bid_levels: u8,
    pub num_ask_levels: u8,
    _pad: [u8; 6],
}

// The 192-byte size is a wire invariant, not an implementation detail.
const _: () = assert!(std::mem::size_of::<L2Update>() == 192);
const _: () = assert!(std::mem::size_of::<PriceLevel>() == 16);
const _: () = assert!(std::mem::size_of::<MessageHeader>() == 8);

impl L2Update {
    /// Empty record for the given security with the header pre-filled.
    pub fn new(security_id: SecurityId) -> Self {
        L2Update {
            header: MessageHeader {
                seq_no: 0,
                length: std::mem::size_of::<L2Update>() as u16,
                msg_type: MSG_TYPE_L2,
            },
            security_id,
            ..L2Update::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, size_of};

    /// The 192-byte layout is load-bearing: the SPSC ring stores records by
    /// value and the producer/consumer sides must agree on the exact size.
    #[test]
    fn l2_update_layout() {
        assert_eq!(size_of::<L2Update>(), 192, "L2Update layout changed");
        assert_eq!(align_of::<L2Update>(), 8);
        assert_eq!(size_of::<PriceLevel>(), 16);
        assert_eq!(size_of::<MessageHeader>(), 8);
        assert_eq!(size_of::<SecurityId>(), 8);
    }

    #[test]
    fn security_id_pads_and_truncates() {
        let short = SecurityId::new("AAPL");
        assert_eq!(short.0, *b"AAPL\0\0\0\0");
        assert_eq!(short.as_str(), "AAPL");

        let long = SecurityId::new("VERYLONGSYM");
        assert_eq!(long.as_str(), "VERYLONG");

        assert_eq!(SecurityId::default().as_str(), "");
    }

    #[test]
    fn security_id_bits_round_trip() {
        let id = SecurityId::new("GOOGL");
        assert_eq!(SecurityId::from_bits(id.to_bits()), id);
        assert_ne!(id.to_bits(), 0);
        assert_eq!(SecurityId::default().to_bits(), 0);
    }

    #[test]
    fn equality_is_byte_exact() {
        assert_ne!(SecurityId::new("AAPL"), SecurityId::new("AAPL "));
        assert_eq!(SecurityId::new("MSFT"), SecurityId::new("MSFT"));
    }

    #[test]
    fn new_record_header() {
        let msg = L2Update::new(SecurityId::new("TSLA"));
        assert_eq!(msg.header.length, 192);
        assert_eq!(msg.header.msg_type, MSG_TYPE_L2);
        assert_eq!(msg.num_bid_levels, 0);
        assert_eq!(msg.num_ask_levels, 0);
        assert_eq!(msg.security_id.as_str(), "TSLA");
    }
}
