use basalt_events::{Price, PriceLevel, SecurityId, DEPTH};

/// Point-in-time copy of one security's observable state.
///
/// The copy is consistent enough for monitoring: every field is no older
/// than the update that produced the observed `last_update_ns`, but fields
/// written by a concurrent update may tear across the struct. Readers that
/// need a stable view re-read until `last_update_ns` stops changing.
#[derive(Clone, Copy, Debug, Default)]
pub struct SecuritySnapshot {
    pub security_id: SecurityId,
    pub best_bid: Price,
    pub best_ask: Price,
    /// Reserved for a trade message type; currently always zero.
    pub last_trade_price: Price,
    pub last_update_ns: u64,
    pub num_bid_levels: u8,
    pub num_ask_levels: u8,
    pub bids: [PriceLevel; DEPTH],
    pub asks: [PriceLevel; DEPTH],
    pub update_count: u64,
    /// Reserved for a trade message type; currently always zero.
    pub total_volume: u64,
}

impl SecuritySnapshot {
    /// Arithmetic mean of best bid and ask. Falls back to the last trade
    /// price when either side of the book is empty.
    pub fn mid_price(&self) -> Price {
        if self.best_bid.is_zero() || self.best_ask.is_zero() {
            return self.last_trade_price;
        }
        (self.best_bid + self.best_ask) / 2
    }

    /// Bid/ask spread as basis points of mid. Zero when the book is one-sided
    /// or empty.
    pub fn spread_bps(&self) -> f64 {
        if self.best_bid.is_zero() || self.best_ask.is_zero() {
            return 0.0;
        }
        let mid = self.mid_price();
        if mid.is_zero() {
            return 0.0;
        }
        (self.best_ask - self.best_bid).dollars() / mid.dollars() * 10_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mid_price_of_two_sided_book() {
        let snap = SecuritySnapshot {
            best_bid: Price::from_raw(1_000_000),
            best_ask: Price::from_raw(1_001_000),
            ..SecuritySnapshot::default()
        };
        assert_eq!(snap.mid_price(), Price::from_raw(1_000_500));
    }

    #[test]
    fn empty_book_falls_back_to_last_trade() {
        let snap = SecuritySnapshot {
            last_trade_price: Price::from_raw(42),
            ..SecuritySnapshot::default()
        };
        assert_eq!(snap.mid_price(), Price::from_raw(42));
        assert_eq!(snap.spread_bps(), 0.0);

        // Fully zero snapshot: mid is zero, spread stays zero.
        let zero = SecuritySnapshot::default();
        assert_eq!(zero.mid_price(), Price::ZERO);
        assert_eq!(zero.spread_bps(), 0.0);
    }

    #[test]
    fn spread_in_basis_points() {
        // $100.00 bid, $100.10 ask: 10 bps of the $100.05 mid.
        let snap = SecuritySnapshot {
            best_bid: Price::from_raw(1_000_000),
            best_ask: Price::from_raw(1_001_000),
            ..SecuritySnapshot::default()
        };
        assert!((snap.spread_bps() - 10.0).abs() < 0.1);
    }
}
