//! Shared fixtures for the benchmark suite.

use basalt_events::{L2Update, Price, PriceLevel, SecurityId, DEPTH};

/// A well-formed 5+5 level record centered on `mid_raw` with a 5-tick
/// half-spread and 10-tick level gaps.
pub fn sample_l2(security_id: SecurityId, mid_raw: u64) -> L2Update {
    let mut msg = L2Update::new(security_id);
    msg.timestamp_ns = basalt_util::mono_now_ns();
    msg.num_bid_levels = DEPTH as u8;
    msg.num_ask_levels = DEPTH as u8;
    for i in 0..DEPTH {
        let offset = 5 + 10 * i as u64;
        msg.bids[i] = PriceLevel {
            price: Price::from_raw(mid_raw - offset),
            quantity: 100 + i as u64,
        };
        msg.asks[i] = PriceLevel {
            price: Price::from_raw(mid_raw + offset),
            quantity: 100 + i as u64,
        };
    }
    msg
}
