//! Deterministic random L2 market-data provider.
//!
//! One producer thread walks every subscribed security's price each loop
//! iteration and emits a burst of L2 records through the bound callback.
//! Each security carries its own LCG seeded from the symbol bytes, so walks
//! are reproducible per symbol and the hot path never touches shared RNG
//! state.
//!
//! The slot table mirrors the store's layout and claim protocol: identifiers
//! live in an atomic word, the id CAS is the exclusive claim, and `active`
//! publishes initialization with Release.

use crate::provider::{MarketDataCallback, MarketDataProvider};
use crate::rng::Lcg64;
use crate::seeder;
use basalt_events::{L2Update, Price, PriceLevel, SecurityId, DEPTH};
use basalt_util::timestamp;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Generator slot table capacity; matches the store's.
pub const MAX_SECURITIES: usize = 256;

/// Simulated prices never walk below one dollar.
const PRICE_FLOOR_DOLLARS: f64 = 1.0;

/// Seed for the spike decision RNG. Spikes are intentionally not
/// per-security deterministic; they model market-wide activity.
const SPIKE_SEED: u64 = 12_345;

#[derive(Clone, Copy, Debug)]
pub struct GeneratorConfig {
    /// Fallback reference price for symbols the seeder does not know.
    pub base_price: f64,
    /// Scales per-tick return magnitude. The default reproduces a +/-0.05%
    /// step per message.
    pub volatility: f64,
    /// Half-spread around mid, in basis points.
    pub spread_bps: f64,
    /// Producer loop period in microseconds.
    pub update_interval_us: u32,
    pub min_quantity: u64,
    pub max_quantity: u64,
    /// Records per active security per loop iteration.
    pub messages_per_burst: u32,
    pub enable_activity_spikes: bool,
    /// Percent chance per iteration to enter a spike (0-100).
    pub spike_probability: u32,
    /// Burst-size multiplier while a spike is live.
    pub spike_multiplier: u32,
    pub spike_duration_us: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            base_price: 150.0,
            volatility: 0.02,
            spread_bps: 2.0,
            update_interval_us: 10,
            min_quantity: 100,
            max_quantity: 1_000,
            messages_per_burst: 5,
            enable_activity_spikes: false,
            spike_probability: 5,
            spike_multiplier: 10,
            spike_duration_us: 1_000,
        }
    }
}

#[repr(align(64))]
struct GeneratorSlot {
    active: AtomicBool,
    /// Zero means vacant; claimed by CAS from zero to the id bits.
    id_bits: AtomicU64,
    /// Current walk price as f64 bits. Written by subscribe once and by the
    /// producer thread thereafter.
    price_bits: AtomicU64,
    /// Per-security LCG state, seeded from the symbol bytes.
    rng_state: AtomicU64,
}

impl GeneratorSlot {
    const fn new() -> Self {
        GeneratorSlot {
            active: AtomicBool::new(false),
            id_bits: AtomicU64::new(0),
            price_bits: AtomicU64::new(0),
            rng_state: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    fn matches(&self, bits: u64) -> bool {
        self.active.load(Ordering::Acquire) && self.id_bits.load(Ordering::Relaxed) == bits
    }

    fn try_claim(&self, bits: u64, base_price: f64) -> bool {
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

        self.price_bits.store(base_price.to_bits(), Ordering::Relaxed);
        self.rng_state.store(Lcg64::new(bits).state(), Ordering::Relaxed);
        self.active.store(true, Ordering::Release);
        true
    }

    fn release(&self) {
        self.active.store(false, Ordering::Release);
        self.id_bits.store(0, Ordering::Release);
    }
}

struct GeneratorShared {
    config: GeneratorConfig,
    running: AtomicBool,
    seq_no: AtomicU32,
    slots: Box<[GeneratorSlot]>,
    active_count: AtomicUsize,
    /// Parked here while stopped; the producer thread takes it at startup
    /// and returns it on exit. Locked only at lifecycle edges.
    callback: Mutex<Option<MarketDataCallback>>,
}

/// Lock-free simulated market-data source. See the module docs.
pub struct RandomMarketDataProvider {
    shared: Arc<GeneratorShared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl RandomMarketDataProvider {
    pub fn new(config: GeneratorConfig) -> Self {
        let slots = (0..MAX_SECURITIES)
            .map(|_| GeneratorSlot::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        RandomMarketDataProvider {
            shared: Arc::new(GeneratorShared {
                config,
                running: AtomicBool::new(false),
                seq_no: AtomicU32::new(0),
                slots,
                active_count: AtomicUsize::new(0),
                callback: Mutex::new(None),
            }),
            thread: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.shared.config
    }

    fn find(&self, bits: u64) -> Option<&GeneratorSlot> {
        self.shared.slots.iter().find(|slot| slot.matches(bits))
    }
}

impl Drop for RandomMarketDataProvider {
    fn drop(&mut self) {
        self.stop();
    }
}

impl MarketDataProvider for RandomMarketDataProvider {
    fn start(&self) -> bool {
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let shared = Arc::clone(&self.shared);
        match std::thread::Builder::new()
            .name("jasper-gen".into())
            .spawn(move || producer_loop(&shared))
        {
            Ok(handle) => {
                *self.thread.lock() = Some(handle);
                true
            }
            Err(_) => {
                self.shared.running.store(false, Ordering::Release);
                false
            }
        }
    }

    fn stop(&self) {
        if !self.shared.running.load(Ordering::Acquire) {
            return;
        }
        self.shared.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }
    }

    fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    fn subscribe(&self, id: SecurityId) -> bool {
        let bits = id.to_bits();
        if self.find(bits).is_some() {
            return false;
        }

        let base = seeder::base_price(id.as_str(), self.shared.config.base_price);
        for slot in self.shared.slots.iter() {
            if slot.try_claim(bits, base) {
                self.shared.active_count.fetch_add(1, Ordering::Relaxed);
                return true;
            }
        }
        false
    }

    fn unsubscribe(&self, id: SecurityId) -> bool {
        match self.find(id.to_bits()) {
            Some(slot) => {
                slot.release();
                self.shared.active_count.fetch_sub(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    fn set_callback(&self, callback: MarketDataCallback) {
        *self.shared.callback.lock() = Some(callback);
    }

    fn subscribed(&self) -> Vec<SecurityId> {
        let mut out = Vec::with_capacity(self.shared.active_count.load(Ordering::Relaxed));
        for slot in self.shared.slots.iter() {
            if slot.active.load(Ordering::Acquire) {
                out.push(SecurityId::from_bits(slot.id_bits.load(Ordering::Relaxed)));
            }
        }
        out
    }
}

fn producer_loop(shared: &GeneratorShared) {
    let mut callback = shared.callback.lock().take();
    let cfg = &shared.config;

    let mut spike_rng = Lcg64::new(SPIKE_SEED);
    let mut in_spike = false;
    let mut spike_deadline = Instant::now();

    while shared.running.load(Ordering::Acquire) {
        let iter_start = Instant::now();

        let mut burst_multiplier = 1u32;
        if cfg.enable_activity_spikes {
            if in_spike {
                if iter_start >= spike_deadline {
                    in_spike = false;
                } else {
                    burst_multiplier = cfg.spike_multiplier;
                }
            } else if spike_rng.next_percent(cfg.spike_probability) {
                in_spike = true;
                burst_multiplier = cfg.spike_multiplier;
                spike_deadline = iter_start + Duration::from_micros(cfg.spike_duration_us.into());
            }
        }

        if let Some(cb) = callback.as_mut() {
            for slot in shared.slots.iter() {
                if !slot.active.load(Ordering::Acquire) {
                    continue;
                }
                let bursts = cfg.messages_per_burst * burst_multiplier;
                for _ in 0..bursts {
                    cb(next_update(cfg, &shared.seq_no, slot));
                }
            }
        }

        // Sleep off the remainder of the period; spikes run at double rate.
        let interval_us = if in_spike {
            cfg.update_interval_us / 2
        } else {
            cfg.update_interval_us
        };
        let period = Duration::from_micros(interval_us.into());
        if let Some(rest) = period.checked_sub(iter_start.elapsed()) {
            if !rest.is_zero() {
                std::thread::sleep(rest);
            }
        }
    }

    *shared.callback.lock() = callback;
}

/// Advances one security's walk and builds its next L2 record.
fn next_update(cfg: &GeneratorConfig, seq_no: &AtomicU32, slot: &GeneratorSlot) -> L2Update {
    let mut rng = Lcg64::from_state(slot.rng_state.load(Ordering::Relaxed));
    let mut price = f64::from_bits(slot.price_bits.load(Ordering::Relaxed));

    // Bounded multiplicative step. volatility 0.02 gives +/-0.05% per tick.
    let step = (rng.next_unit() - 0.5) * cfg.volatility * 0.05;
    price *= 1.0 + step;
    if price < PRICE_FLOOR_DOLLARS {
        price = PRICE_FLOOR_DOLLARS;
    }

    let spread = price * (cfg.spread_bps / 10_000.0);
    let best_bid = price - spread / 2.0;
    let best_ask = price + spread / 2.0;

    let mut msg = L2Update::new(SecurityId::from_bits(slot.id_bits.load(Ordering::Relaxed)));
    msg.header.seq_no = seq_no.fetch_add(1, Ordering::Relaxed);
    msg.timestamp_ns = timestamp::now_ns();
    msg.num_bid_levels = DEPTH as u8;
    msg.num_ask_levels = DEPTH as u8;

    let mut bid = best_bid;
    let mut ask = best_ask;
    for i in 0..DEPTH {
        msg.bids[i] = PriceLevel {
            price: Price::from_dollars(bid),
            quantity: rng.next_range(cfg.min_quantity, cfg.max_quantity),
        };
        // Level spacing is strictly positive, so bids descend and asks
        // ascend strictly.
        bid -= level_spacing(&mut rng) * price;

        msg.asks[i] = PriceLevel {
            price: Price::from_dollars(ask),
            quantity: rng.next_range(cfg.min_quantity, cfg.max_quantity),
        };
        ask += level_spacing(&mut rng) * price;
    }

    slot.price_bits.store(price.to_bits(), Ordering::Relaxed);
    slot.rng_state.store(rng.state(), Ordering::Relaxed);
    msg
}

/// Per-level gap as a fraction of the current price: 1 to 5 basis points.
#[inline(always)]
fn level_spacing(rng: &mut Lcg64) -> f64 {
    0.0001 + rng.next_unit() * 0.0004
}
