use basalt_events::{L2Update, SecurityId};

/// Update sink bound to a provider. Invoked on the provider's producer
/// thread for every generated record; it must not block.
pub type MarketDataCallback = Box<dyn FnMut(L2Update) + Send>;

/// Contract for market-data sources: simulators today, exchange feeds later.
///
/// The provider owns its producer thread. `start`/`stop` manage it;
/// lifecycle misuse (double start, stop when stopped) is reported through
/// the return value or is a no-op, never a panic.
pub trait MarketDataProvider: Send + Sync {
    /// Starts the producer thread. False if already running or the thread
    /// could not be spawned.
    fn start(&self) -> bool;

    /// Signals the producer to stop and joins it. No-op when not running.
    fn stop(&self);

    fn is_running(&self) -> bool;

    /// Begins generating data for `id`. False on duplicate or capacity.
    fn subscribe(&self, id: SecurityId) -> bool;

    /// Stops generating data for `id`. False if not subscribed.
    fn unsubscribe(&self, id: SecurityId) -> bool;

    /// Binds the update sink. Must be called before `start`; the callback is
    /// handed to the producer thread for the lifetime of each run.
    fn set_callback(&self, callback: MarketDataCallback);

    fn subscribed(&self) -> Vec<SecurityId>;
}
