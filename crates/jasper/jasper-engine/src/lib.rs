//! Market-data feed orchestrator.
//!
//! Wires a provider to the security store through the SPSC ring:
//!
//! ```text
//! provider thread ──callback──> ring ──consumer thread──> store <── readers
//! ```
//!
//! The producer side is the provider's own thread invoking the bound
//! callback; the consumer thread is owned here. Backpressure policy is
//! latency over durability: a full ring drops the record and bumps a
//! counter, nothing ever blocks on the hot path.

pub mod stats;

use basalt_events::L2Update;
use basalt_ring::{RingConsumer, RingMonitor, SpscRing};
use basalt_util::timestamp;
use jasper_core::SecurityStore;
use jasper_gen::MarketDataProvider;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

pub use stats::{FeedStatistics, StatsView};
pub use basalt_events::SecurityId;

/// Ring capacity between producer and consumer. Power of two.
pub const DEFAULT_RING_SIZE: usize = 1024;

type Consumer = RingConsumer<L2Update, DEFAULT_RING_SIZE>;

#[derive(Clone, Copy, Debug)]
pub struct FeedConfig {
    /// Consumer sleep when the ring is empty, in microseconds. Zero means
    /// yield to the scheduler instead of sleeping.
    pub consumer_yield_us: u32,
    /// Toggles counter updates and latency stamping.
    pub enable_statistics: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            consumer_yield_us: 1,
            enable_statistics: true,
        }
    }
}

struct FeedShared {
    config: FeedConfig,
    running: AtomicBool,
    stats: FeedStatistics,
}

/// Owns the pipeline lifecycle. See the module docs for the thread roles.
pub struct MarketDataFeed {
    provider: Arc<dyn MarketDataProvider>,
    store: Arc<SecurityStore>,
    shared: Arc<FeedShared>,
    monitor: RingMonitor<L2Update, DEFAULT_RING_SIZE>,
    /// The consumer endpoint parks here while stopped; the consumer thread
    /// takes it at startup and returns it on exit, so the feed survives
    /// start/stop cycles. Locked only at lifecycle edges.
    consumer_slot: Arc<Mutex<Option<Consumer>>>,
    consumer_thread: Mutex<Option<JoinHandle<()>>>,
}

impl MarketDataFeed {
    /// Builds the feed and binds the provider callback. The provider must
    /// not be started by the caller; `start` manages it.
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        store: Arc<SecurityStore>,
        config: FeedConfig,
    ) -> Self {
        let (mut producer, consumer) = SpscRing::<L2Update, DEFAULT_RING_SIZE>::new();
        let monitor = consumer.monitor();

        let shared = Arc::new(FeedShared {
            config,
            running: AtomicBool::new(false),
            stats: FeedStatistics::default(),
        });

        // Producer side: runs on the provider's thread. Stamp, push, count.
        let cb_shared = Arc::clone(&shared);
        provider.set_callback(Box::new(move |mut msg: L2Update| {
            if !cb_shared.running.load(Ordering::Acquire) {
                return;
            }
            let stats_on = cb_shared.config.enable_statistics;
            if stats_on {
                msg.timestamp_ns = timestamp::mono_now_ns();
            }
            match producer.try_push(msg) {
                Ok(()) => {
                    if stats_on {
                        cb_shared
                            .stats
                            .messages_produced
                            .fetch_add(1, Ordering::Relaxed);
                    }
                }
                Err(_dropped) => {
                    // Deliberate backpressure policy: drop and count.
                    if stats_on {
                        cb_shared
                            .stats
                            .ring_full_events
                            .fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        }));

        MarketDataFeed {
            provider,
            store,
            shared,
            monitor,
            consumer_slot: Arc::new(Mutex::new(Some(consumer))),
            consumer_thread: Mutex::new(None),
        }
    }

    /// Starts the provider and the consumer thread. False if already running
    /// or the provider fails to start.
    pub fn start(&self) -> bool {
        if self.shared.running.load(Ordering::Acquire) {
            return false;
        }

        if self.shared.config.enable_statistics {
            self.shared.stats.reset();
        }

        if !self.provider.start() {
            return false;
        }
        self.shared.running.store(true, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let store = Arc::clone(&self.store);
        let park = Arc::clone(&self.consumer_slot);
        match std::thread::Builder::new()
            .name("jasper-feed".into())
            .spawn(move || consumer_loop(&shared, &store, &park))
        {
            Ok(handle) => {
                *self.consumer_thread.lock() = Some(handle);
                true
            }
            Err(_) => {
                self.shared.running.store(false, Ordering::Release);
                self.provider.stop();
                false
            }
        }
    }

    /// Signals shutdown, stops the provider, joins the consumer. Idempotent.
    pub fn stop(&self) {
        if !self.shared.running.load(Ordering::Acquire) {
            return;
        }
        self.shared.running.store(false, Ordering::Release);
        self.provider.stop();
        if let Some(handle) = self.consumer_thread.lock().take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Subscribes in the store first, then the provider; a provider failure
    /// rolls the store back so the two never disagree.
    pub fn subscribe(&self, id: SecurityId) -> bool {
        if !self.store.add(id) {
            return false;
        }
        if !self.provider.subscribe(id) {
            self.store.remove(id);
            return false;
        }
        true
    }

    /// True iff both the provider and the store dropped the security.
    pub fn unsubscribe(&self, id: SecurityId) -> bool {
        let provider_ok = self.provider.unsubscribe(id);
        let store_ok = self.store.remove(id);
        provider_ok && store_ok
    }

    pub fn subscribed(&self) -> Vec<SecurityId> {
        self.provider.subscribed()
    }

    pub fn statistics(&self) -> StatsView {
        self.shared.stats.view()
    }

    /// Ring occupancy as a fraction of capacity, in `[0, 1]`.
    pub fn ring_utilization(&self) -> f64 {
        self.monitor.utilization()
    }

    pub fn store(&self) -> &Arc<SecurityStore> {
        &self.store
    }
}

impl Drop for MarketDataFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

fn consumer_loop(
    shared: &FeedShared,
    store: &SecurityStore,
    park: &Mutex<Option<Consumer>>,
) {
    let Some(mut consumer) = park.lock().take() else {
        return;
    };

    let stats_on = shared.config.enable_statistics;
    let yield_us = shared.config.consumer_yield_us;

    while shared.running.load(Ordering::Acquire) {
        match consumer.try_pop() {
            Some(msg) => {
                let applied = store.apply_l2(&msg);
                // Count only messages the store accepted; records for
                // just-unsubscribed securities fall through here.
                if stats_on && applied {
                    shared
                        .stats
                        .messages_consumed
                        .fetch_add(1, Ordering::Relaxed);
                    let latency = timestamp::mono_now_ns().saturating_sub(msg.timestamp_ns);
                    shared.stats.record_latency(latency);
                }
            }
            None => {
                if stats_on {
                    shared
                        .stats
                        .ring_empty_events
                        .fetch_add(1, Ordering::Relaxed);
                }
                if yield_us > 0 {
                    std::thread::sleep(Duration::from_micros(yield_us.into()));
                    if stats_on {
                        shared.stats.consumer_yields.fetch_add(1, Ordering::Relaxed);
                    }
                } else {
                    std::thread::yield_now();
                }
            }
        }
    }

    *park.lock() = Some(consumer);
}
