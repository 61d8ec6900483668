//! Nanosecond clocks for the hot path.
//!
//! `now_ns` is wall time since the Unix epoch, used to date records.
//! `mono_now_ns` is the clock for latency stamps: it counts nanoseconds from
//! a fixed per-process anchor and never goes backwards, where a wall clock
//! can be stepped by NTP mid-measurement and produce negative deltas. Only
//! differences between two `mono_now_ns` readings are meaningful; the
//! absolute values do not relate to any epoch.

use std::sync::OnceLock;
use std::time::Instant;

#[inline(always)]
pub fn now_ns() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// The shared anchor instant, pinned on the first reading. Every thread
/// measures against the same anchor, so stamps taken on the producer thread
/// compare directly with readings on the consumer thread.
fn anchor() -> Instant {
    static ANCHOR: OnceLock<Instant> = OnceLock::new();
    *ANCHOR.get_or_init(Instant::now)
}

#[inline(always)]
pub fn mono_now_ns() -> u64 {
    anchor().elapsed().as_nanos() as u64
}
