//! Fixed-capacity lock-free security store.
//!
//! One writer thread applies L2 updates; any number of reader threads take
//! snapshots. Slots are claimed and released by subscribe/unsubscribe, which
//! may come from other threads.
//!
//! # Synchronization
//!
//! Every slot field is an atomic, so readers never race a plain write. Two
//! edges carry the ordering:
//!
//! - `active` (Acquire/Release) publishes slot initialization. A reader that
//!   observes `active == true` sees the initialized identifier.
//! - `last_update_ns` (Release on write, Acquire on read) is the edge between
//!   the apply thread and snapshot readers: fields read after acquiring the
//!   timestamp are no older than the update that produced it. Individual
//!   fields may still tear across a concurrent update; that trade is by
//!   contract and bounded by the level-count publication below.
//!
//! Level arrays are written before their side's `num_levels` is released, so
//! a reader that acquires a count sees at least that update's levels at the
//! populated indices.
//!
//! Lookup is a linear scan over all slots: at 256 cache-line-sized entries
//! the scan is branch-predictable and constant-bounded, which beats hashing
//! for tail latency.

use crate::snapshot::SecuritySnapshot;
use basalt_events::{L2Update, Price, PriceLevel, SecurityId, DEPTH};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};

/// Slot table capacity. Fixed at build time; the store never grows.
pub const MAX_SECURITIES: usize = 256;

struct LevelCell {
    price: AtomicU64,
    quantity: AtomicU64,
}

impl LevelCell {
    const fn new() -> Self {
        LevelCell {
            price: AtomicU64::new(0),
            quantity: AtomicU64::new(0),
        }
    }
}

struct BookSide {
    num_levels: AtomicU8,
    levels: [LevelCell; DEPTH],
}

impl BookSide {
    const fn new() -> Self {
        BookSide {
            num_levels: AtomicU8::new(0),
            levels: [
                LevelCell::new(),
                LevelCell::new(),
                LevelCell::new(),
                LevelCell::new(),
                LevelCell::new(),
            ],
        }
    }

    /// Copies up to `DEPTH` levels in, zeroes the remainder, then publishes
    /// the count with Release.
    fn store_levels(&self, levels: &[PriceLevel; DEPTH], count: u8) {
        let count = count.min(DEPTH as u8);
        for (i, cell) in self.levels.iter().enumerate() {
            if i < count as usize {
                cell.price.store(levels[i].price.raw(), Ordering::Relaxed);
                cell.quantity.store(levels[i].quantity, Ordering::Relaxed);
            } else {
                cell.price.store(0, Ordering::Relaxed);
                cell.quantity.store(0, Ordering::Relaxed);
            }
        }
        self.num_levels.store(count, Ordering::Release);
    }

    fn load_levels(&self, out: &mut [PriceLevel; DEPTH]) -> u8 {
        let count = self.num_levels.load(Ordering::Acquire);
        for (i, cell) in self.levels.iter().enumerate() {
            out[i] = PriceLevel {
                price: Price::from_raw(cell.price.load(Ordering::Relaxed)),
                quantity: cell.quantity.load(Ordering::Relaxed),
            };
        }
        count
    }
}

/// One security's storage, alone on its cache lines so unrelated symbols
/// never false-share.
#[repr(align(64))]
struct SecuritySlot {
    active: AtomicBool,
    /// The 8-byte identifier as one atomic word. Zero means vacant; a claim
    /// CASes zero to the new id, which is what makes concurrent subscribes
    /// race-free per slot.
    id_bits: AtomicU64,
    best_bid: AtomicU64,
    best_ask: AtomicU64,
    last_trade_price: AtomicU64,
    last_update_ns: AtomicU64,
    bids: BookSide,
    asks: BookSide,
    update_count: AtomicU64,
    total_volume: AtomicU64,
}

impl SecuritySlot {
    const fn new() -> Self {
        SecuritySlot {
            active: AtomicBool::new(false),
            id_bits: AtomicU64::new(0),
            best_bid: AtomicU64::new(0),
            best_ask: AtomicU64::new(0),
            last_trade_price: AtomicU64::new(0),
            last_update_ns: AtomicU64::new(0),
            bids: BookSide::new(),
            asks: BookSide::new(),
            update_count: AtomicU64::new(0),
            total_volume: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    fn matches(&self, bits: u64) -> bool {
        self.active.load(Ordering::Acquire) && self.id_bits.load(Ordering::Relaxed) == bits
    }

    /// Attempts to claim this slot for `bits`. The id CAS is the exclusive
    /// claim; fields are initialized before `active` is released so readers
    /// that observe `active == true` see a fully initialized slot.
    fn try_claim(&self, bits: u64) -> bool {
        if self.active.load(Ordering::Acquire) {
            return false;
        }
        if self
            .id_bits
            .compare_exchange(0, bits, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }

        self.best_bid.store(0, Ordering::Relaxed);
        self.best_ask.store(0, Ordering::Relaxed);
        self.last_trade_price.store(0, Ordering::Relaxed);
        self.last_update_ns.store(0, Ordering::Relaxed);
        self.update_count.store(0, Ordering::Relaxed);
        self.total_volume.store(0, Ordering::Relaxed);
        self.bids.num_levels.store(0, Ordering::Relaxed);
        self.asks.num_levels.store(0, Ordering::Relaxed);

        self.active.store(true, Ordering::Release);
        true
    }

    /// Deactivates and vacates the slot. In-flight readers of this slot may
    /// observe either state; they never see a half-claimed one because the
    /// id is only cleared after `active` is released false.
    fn release(&self) {
        self.active.store(false, Ordering::Release);
        self.id_bits.store(0, Ordering::Release);
    }
}

/// Fixed table of [`MAX_SECURITIES`] slots with lock-free add/remove/apply/
/// snapshot. See the module docs for the synchronization contract.
pub struct SecurityStore {
    slots: Box<[SecuritySlot]>,
    /// Maintained on add/remove for O(1) `len`.
    active_count: AtomicUsize,
}

impl Default for SecurityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityStore {
    pub fn new() -> Self {
        let slots = (0..MAX_SECURITIES)
            .map(|_| SecuritySlot::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        SecurityStore {
            slots,
            active_count: AtomicUsize::new(0),
        }
    }

    fn find(&self, bits: u64) -> Option<&SecuritySlot> {
        self.slots.iter().find(|slot| slot.matches(bits))
    }

    /// Activates a slot for `id`. Returns false on duplicate or full table.
    /// First inactive slot wins.
    pub fn add(&self, id: SecurityId) -> bool {
        let bits = id.to_bits();
        if self.find(bits).is_some() {
            return false;
        }

        for slot in self.slots.iter() {
            if slot.try_claim(bits) {
                self.active_count.fetch_add(1, Ordering::Relaxed);
                return true;
            }
        }
        false
    }

    /// Deactivates the slot holding `id`. Returns false if absent.
    pub fn remove(&self, id: SecurityId) -> bool {
        match self.find(id.to_bits()) {
            Some(slot) => {
                slot.release();
                self.active_count.fetch_sub(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Applies an L2 update to the matching slot. Single-writer: exactly one
    /// thread calls this. Returns false if the security is not subscribed.
    pub fn apply_l2(&self, msg: &L2Update) -> bool {
        let Some(slot) = self.find(msg.security_id.to_bits()) else {
            return false;
        };

        // Timestamp first, with Release: it is the edge snapshot readers
        // acquire, so everything below is "no older than" this stamp.
        slot.last_update_ns.store(msg.timestamp_ns, Ordering::Release);

        if msg.num_bid_levels > 0 {
            slot.best_bid.store(msg.bids[0].price.raw(), Ordering::Relaxed);
        }
        if msg.num_ask_levels > 0 {
            slot.best_ask.store(msg.asks[0].price.raw(), Ordering::Relaxed);
        }

        slot.bids.store_levels(&msg.bids, msg.num_bid_levels);
        slot.asks.store_levels(&msg.asks, msg.num_ask_levels);

        slot.update_count.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Copies the current state of `id`. `None` if not subscribed.
    pub fn snapshot(&self, id: SecurityId) -> Option<SecuritySnapshot> {
        let slot = self.find(id.to_bits())?;

        let mut snap = SecuritySnapshot {
            security_id: id,
            last_update_ns: slot.last_update_ns.load(Ordering::Acquire),
            best_bid: Price::from_raw(slot.best_bid.load(Ordering::Relaxed)),
            best_ask: Price::from_raw(slot.best_ask.load(Ordering::Relaxed)),
            last_trade_price: Price::from_raw(slot.last_trade_price.load(Ordering::Relaxed)),
            update_count: slot.update_count.load(Ordering::Relaxed),
            total_volume: slot.total_volume.load(Ordering::Relaxed),
            ..SecuritySnapshot::default()
        };
        snap.num_bid_levels = slot.bids.load_levels(&mut snap.bids);
        snap.num_ask_levels = slot.asks.load_levels(&mut snap.asks);
        Some(snap)
    }

    pub fn contains(&self, id: SecurityId) -> bool {
        self.find(id.to_bits()).is_some()
    }

    pub fn len(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifiers of all active slots, in table order.
    pub fn list_active(&self) -> Vec<SecurityId> {
        let mut out = Vec::with_capacity(self.len());
        for slot in self.slots.iter() {
            if slot.active.load(Ordering::Acquire) {
                out.push(SecurityId::from_bits(slot.id_bits.load(Ordering::Relaxed)));
            }
        }
        out
    }

    /// Deactivates every slot.
    pub fn clear(&self) {
        for slot in self.slots.iter() {
            if slot.active.load(Ordering::Acquire) {
                slot.release();
            }
        }
        self.active_count.store(0, Ordering::Relaxed);
    }
}
