use basalt_events::SecurityId;
use jasper_config::JasperConfig;
use jasper_core::SecurityStore;
use jasper_engine::MarketDataFeed;
use jasper_gen::{MarketDataProvider, RandomMarketDataProvider};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Flipped by the signal handler; the main loop polls it. The only global in
/// the binary, none exists in the core.
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(_sig: libc::c_int) {
    SHUTDOWN.store(true, Ordering::Release);
}

fn install_signal_handlers() {
    let handler = on_signal as extern "C" fn(libc::c_int);
    unsafe {
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handler as libc::sighandler_t);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path =
        std::env::var("JASPER_CONFIG").unwrap_or_else(|_| "config/jasper.toml".into());
    let config = if Path::new(&config_path).exists() {
        JasperConfig::load(config_path.as_str())?
    } else {
        JasperConfig::default()
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!(path = %config_path, "jasper starting");

    let provider = Arc::new(RandomMarketDataProvider::new(config.generator.to_config()));
    let store = Arc::new(SecurityStore::new());
    let feed = MarketDataFeed::new(
        provider as Arc<dyn MarketDataProvider>,
        Arc::clone(&store),
        config.feed.to_config(),
    );

    install_signal_handlers();

    if !feed.start() {
        error!("failed to start market data feed");
        std::process::exit(1);
    }

    for symbol in &config.symbols {
        let id = SecurityId::new(symbol);
        if feed.subscribe(id) {
            info!(%symbol, "subscribed");
        } else {
            warn!(%symbol, "subscribe failed");
        }
    }

    while feed.is_running() && !SHUTDOWN.load(Ordering::Acquire) {
        std::thread::sleep(Duration::from_secs(1));

        let stats = feed.statistics();
        info!(
            produced = stats.messages_produced,
            consumed = stats.messages_consumed,
            ring_full = stats.ring_full_events,
            ring_empty = stats.ring_empty_events,
            yields = stats.consumer_yields,
            avg_latency_ns = stats.average_latency_ns() as u64,
            max_latency_ns = stats.max_latency_ns,
            utilization = feed.ring_utilization(),
            "feed stats"
        );
    }

    info!("shutting down");
    feed.stop();
    Ok(())
}
