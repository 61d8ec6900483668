//! Bounded wait-free SPSC ring buffer.

pub mod spsc;

pub use spsc::{RingConsumer, RingMonitor, RingProducer, SpscRing};
