//! End-to-end pipeline tests: generator thread, ring, consumer thread, and
//! concurrent snapshot readers running against real time.

use jasper_core::SecurityStore;
use jasper_engine::{FeedConfig, MarketDataFeed, SecurityId};
use jasper_gen::{GeneratorConfig, MarketDataProvider, RandomMarketDataProvider};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn id(symbol: &str) -> SecurityId {
    SecurityId::new(symbol)
}

fn make_feed(
    gen_config: GeneratorConfig,
    feed_config: FeedConfig,
) -> (MarketDataFeed, Arc<SecurityStore>, Arc<RandomMarketDataProvider>) {
    let provider = Arc::new(RandomMarketDataProvider::new(gen_config));
    let store = Arc::new(SecurityStore::new());
    let feed = MarketDataFeed::new(
        Arc::clone(&provider) as Arc<dyn MarketDataProvider>,
        Arc::clone(&store),
        feed_config,
    );
    (feed, store, provider)
}

#[test]
fn initial_state() {
    let (feed, _store, _provider) = make_feed(GeneratorConfig::default(), FeedConfig::default());

    assert!(!feed.is_running());
    assert!(feed.subscribed().is_empty());
    assert_eq!(feed.ring_utilization(), 0.0);

    let stats = feed.statistics();
    assert_eq!(stats.messages_produced, 0);
    assert_eq!(stats.messages_consumed, 0);
    assert_eq!(stats.average_latency_ns(), 0.0);
}

#[test]
fn start_stop_lifecycle() {
    let (feed, _store, _provider) = make_feed(GeneratorConfig::default(), FeedConfig::default());

    assert!(feed.start());
    assert!(feed.is_running());
    assert!(!feed.start(), "double start must be rejected");

    feed.stop();
    assert!(!feed.is_running());
    feed.stop(); // repeated stop is a no-op

    // The feed is restartable after a clean stop.
    assert!(feed.start());
    assert!(feed.is_running());
    feed.stop();
}

#[test]
fn subscribe_unsubscribe() {
    let (feed, store, _provider) = make_feed(GeneratorConfig::default(), FeedConfig::default());
    assert!(feed.start());

    assert!(feed.subscribe(id("AAPL")));
    assert!(feed.subscribe(id("MSFT")));
    assert!(!feed.subscribe(id("AAPL")), "duplicate subscribe");
    assert_eq!(feed.subscribed().len(), 2);
    assert!(store.contains(id("AAPL")));

    assert!(feed.unsubscribe(id("AAPL")));
    assert!(!feed.unsubscribe(id("AAPL")), "already unsubscribed");
    assert_eq!(feed.subscribed().len(), 1);
    assert!(!store.contains(id("AAPL")));

    // Slot reuse round-trips.
    assert!(feed.subscribe(id("AAPL")));

    feed.stop();
}

#[test]
fn subscribe_rolls_back_store_on_provider_failure() {
    let (feed, store, provider) = make_feed(GeneratorConfig::default(), FeedConfig::default());

    // Exhaust the provider directly so the feed's store-add succeeds but the
    // provider-subscribe cannot.
    for i in 0..jasper_gen::MAX_SECURITIES {
        assert!(provider.subscribe(id(&format!("F{i}"))));
    }

    assert!(!feed.subscribe(id("AAPL")));
    assert!(!store.contains(id("AAPL")), "store addition must be rolled back");
}

#[test]
fn basic_flow() {
    let gen_config = GeneratorConfig {
        update_interval_us: 50,
        ..GeneratorConfig::default()
    };
    let (feed, store, _provider) = make_feed(gen_config, FeedConfig::default());

    assert!(feed.start());
    assert!(feed.subscribe(id("AAPL")));
    thread::sleep(Duration::from_millis(500));
    feed.stop();

    let stats = feed.statistics();
    assert!(stats.messages_produced > 0);
    assert!(stats.messages_consumed > 0);

    let snap = store.snapshot(id("AAPL")).expect("AAPL must be snapshotable");
    assert!(snap.update_count > 0);
    assert!(snap.last_update_ns > 0);
}

#[test]
fn multi_security_flow() {
    let (feed, store, _provider) =
        make_feed(GeneratorConfig::default(), FeedConfig::default());

    assert!(feed.start());
    for symbol in ["AAPL", "MSFT", "GOOGL"] {
        assert!(feed.subscribe(id(symbol)));
    }
    thread::sleep(Duration::from_millis(800));
    feed.stop();

    for symbol in ["AAPL", "MSFT", "GOOGL"] {
        let snap = store.snapshot(id(symbol)).unwrap();
        assert!(snap.update_count > 0, "{symbol} saw no updates");
    }

    let stats = feed.statistics();
    assert!(stats.messages_produced > 10);
    assert!(stats.messages_consumed > 10);
}

#[test]
fn spread_tracks_configuration() {
    let gen_config = GeneratorConfig {
        spread_bps: 5.0,
        ..GeneratorConfig::default()
    };
    let (feed, store, _provider) = make_feed(gen_config, FeedConfig::default());

    assert!(feed.start());
    assert!(feed.subscribe(id("AAPL")));
    thread::sleep(Duration::from_millis(100));
    feed.stop();

    let snap = store.snapshot(id("AAPL")).unwrap();
    assert!(snap.update_count > 0);
    let spread = snap.spread_bps();
    assert!(
        (4.0..=6.0).contains(&spread),
        "spread {spread} bps out of the configured band"
    );
}

#[test]
fn prices_stay_in_symbol_ranges() {
    let (feed, store, _provider) =
        make_feed(GeneratorConfig::default(), FeedConfig::default());

    assert!(feed.start());
    assert!(feed.subscribe(id("AAPL")));
    assert!(feed.subscribe(id("GOOGL")));
    thread::sleep(Duration::from_millis(300));
    feed.stop();

    let aapl = store.snapshot(id("AAPL")).unwrap().best_bid.dollars();
    let googl = store.snapshot(id("GOOGL")).unwrap().best_bid.dollars();

    assert!(aapl > 100.0 && aapl < 300.0, "AAPL at {aapl}");
    assert!(googl > 2_000.0 && googl < 4_000.0, "GOOGL at {googl}");
    assert!(googl > 5.0 * aapl);
}

#[test]
fn backpressure_under_load() {
    let feed_config = FeedConfig {
        consumer_yield_us: 0,
        ..FeedConfig::default()
    };
    let (feed, _store, _provider) = make_feed(GeneratorConfig::default(), feed_config);

    assert!(feed.start());
    for i in 0..20 {
        assert!(feed.subscribe(id(&format!("TEST{i}"))));
    }
    thread::sleep(Duration::from_millis(1_000));
    feed.stop();

    let stats = feed.statistics();
    assert!(stats.messages_produced > 100);
    assert!(stats.messages_consumed > 100);

    // Dropped records are allowed, a mostly-dropping pipeline is not.
    let full_ratio = stats.ring_full_events as f64 / stats.messages_produced as f64;
    assert!(full_ratio < 0.95, "ring_full ratio {full_ratio}");
}

#[test]
fn latency_stays_in_process_bounds() {
    let gen_config = GeneratorConfig {
        update_interval_us: 200,
        messages_per_burst: 2,
        ..GeneratorConfig::default()
    };
    let (feed, _store, _provider) = make_feed(gen_config, FeedConfig::default());

    assert!(feed.start());
    assert!(feed.subscribe(id("AAPL")));
    thread::sleep(Duration::from_millis(300));
    feed.stop();

    let stats = feed.statistics();
    assert!(stats.messages_consumed > 0);

    let avg = stats.average_latency_ns();
    assert!(avg > 0.0);
    assert!(avg < 1_000_000.0, "average latency {avg} ns");
    assert!(stats.max_latency_ns < 5_000_000, "max latency {} ns", stats.max_latency_ns);
}

#[test]
fn ring_utilization_is_a_fraction() {
    let (feed, _store, _provider) =
        make_feed(GeneratorConfig::default(), FeedConfig::default());

    assert!(feed.start());
    assert!(feed.subscribe(id("AAPL")));
    assert!(feed.subscribe(id("MSFT")));

    for _ in 0..10 {
        let u = feed.ring_utilization();
        assert!((0.0..=1.0).contains(&u), "utilization {u}");
        thread::sleep(Duration::from_millis(5));
    }
    feed.stop();
}

#[test]
fn statistics_can_be_disabled() {
    let feed_config = FeedConfig {
        enable_statistics: false,
        ..FeedConfig::default()
    };
    let (feed, store, _provider) = make_feed(GeneratorConfig::default(), feed_config);

    assert!(feed.start());
    assert!(feed.subscribe(id("AAPL")));
    thread::sleep(Duration::from_millis(200));
    feed.stop();

    // Data still flows to the store; only the counters stay silent.
    assert!(store.snapshot(id("AAPL")).unwrap().update_count > 0);
    let stats = feed.statistics();
    assert_eq!(stats.messages_produced, 0);
    assert_eq!(stats.messages_consumed, 0);
}

/// One thread churns subscriptions while another reads snapshots and gauges.
/// Nothing may crash and no snapshot may violate the book invariants.
#[test]
fn subscription_churn_with_concurrent_readers() {
    let (feed, store, _provider) =
        make_feed(GeneratorConfig::default(), FeedConfig::default());
    let feed = Arc::new(feed);
    assert!(feed.start());
    assert!(feed.subscribe(id("PINNED")));

    let stop_flag = Arc::new(AtomicBool::new(false));
    let subscribes = Arc::new(AtomicU32::new(0));
    let unsubscribes = Arc::new(AtomicU32::new(0));

    let churn = {
        let feed = Arc::clone(&feed);
        let stop_flag = Arc::clone(&stop_flag);
        let subscribes = Arc::clone(&subscribes);
        let unsubscribes = Arc::clone(&unsubscribes);
        thread::spawn(move || {
            let symbols: Vec<SecurityId> =
                (0..10).map(|i| id(&format!("CHURN{i}"))).collect();
            while !stop_flag.load(Ordering::Acquire) {
                for sec in &symbols {
                    if feed.subscribe(*sec) {
                        subscribes.fetch_add(1, Ordering::Relaxed);
                    }
                    thread::sleep(Duration::from_millis(2));
                    if feed.unsubscribe(*sec) {
                        unsubscribes.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        })
    };

    let watch = {
        let feed = Arc::clone(&feed);
        let store = Arc::clone(&store);
        let stop_flag = Arc::clone(&stop_flag);
        thread::spawn(move || {
            while !stop_flag.load(Ordering::Acquire) {
                let u = feed.ring_utilization();
                assert!((0.0..=1.0).contains(&u));
                let _ = feed.statistics();
                let _ = feed.subscribed();

                if let Some(snap) = store.snapshot(id("PINNED")) {
                    assert!(snap.num_bid_levels <= 5);
                    assert!(snap.num_ask_levels <= 5);
                    if !snap.best_bid.is_zero() && !snap.best_ask.is_zero() {
                        assert!(snap.best_bid < snap.best_ask);
                    }
                }
                thread::sleep(Duration::from_millis(1));
            }
        })
    };

    thread::sleep(Duration::from_millis(500));
    stop_flag.store(true, Ordering::Release);
    churn.join().unwrap();
    watch.join().unwrap();

    assert!(subscribes.load(Ordering::Relaxed) > 0);
    assert!(unsubscribes.load(Ordering::Relaxed) > 0);
    feed.stop();
}
