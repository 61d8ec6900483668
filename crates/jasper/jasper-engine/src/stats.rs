use std::sync::atomic::{AtomicU64, Ordering};

/// Pipeline counters. Written by the producer callback and the consumer
/// thread with relaxed ordering; read from anywhere. Monitoring data, not a
/// synchronization mechanism.
#[derive(Debug, Default)]
pub struct FeedStatistics {
    pub messages_produced: AtomicU64,
    pub messages_consumed: AtomicU64,
    pub ring_full_events: AtomicU64,
    pub ring_empty_events: AtomicU64,
    pub consumer_yields: AtomicU64,
    pub total_latency_ns: AtomicU64,
    pub max_latency_ns: AtomicU64,
}

impl FeedStatistics {
    pub fn reset(&self) {
        self.messages_produced.store(0, Ordering::Relaxed);
        self.messages_consumed.store(0, Ordering::Relaxed);
        self.ring_full_events.store(0, Ordering::Relaxed);
        self.ring_empty_events.store(0, Ordering::Relaxed);
        self.consumer_yields.store(0, Ordering::Relaxed);
        self.total_latency_ns.store(0, Ordering::Relaxed);
        self.max_latency_ns.store(0, Ordering::Relaxed);
    }

    /// Accumulates one end-to-end latency sample and raises the running
    /// maximum. The CAS loop tolerates racing observers; the consumer is the
    /// only writer so it converges immediately in practice.
    pub fn record_latency(&self, latency_ns: u64) {
        self.total_latency_ns.fetch_add(latency_ns, Ordering::Relaxed);

        let mut current = self.max_latency_ns.load(Ordering::Relaxed);
        while latency_ns > current {
            match self.max_latency_ns.compare_exchange_weak(
                current,
                latency_ns,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }

    pub fn view(&self) -> StatsView {
        StatsView {
            messages_produced: self.messages_produced.load(Ordering::Relaxed),
            messages_consumed: self.messages_consumed.load(Ordering::Relaxed),
            ring_full_events: self.ring_full_events.load(Ordering::Relaxed),
            ring_empty_events: self.ring_empty_events.load(Ordering::Relaxed),
            consumer_yields: self.consumer_yields.load(Ordering::Relaxed),
            total_latency_ns: self.total_latency_ns.load(Ordering::Relaxed),
            max_latency_ns: self.max_latency_ns.load(Ordering::Relaxed),
        }
    }
}

/// Relaxed point-in-time copy of the counters.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatsView {
    pub messages_produced: u64,
    pub messages_consumed: u64,
    pub ring_full_events: u64,
    pub ring_empty_events: u64,
    pub consumer_yields: u64,
    pub total_latency_ns: u64,
    pub max_latency_ns: u64,
}

impl StatsView {
    /// Mean end-to-end latency over consumed messages, zero when nothing has
    /// been consumed yet.
    pub fn average_latency_ns(&self) -> f64 {
        if self.messages_consumed == 0 {
            return 0.0;
        }
        self.total_latency_ns as f64 / self.messages_consumed as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_accumulation() {
        let stats = FeedStatistics::default();
        stats.record_latency(100);
        stats.record_latency(300);
        stats.record_latency(200);
        stats.messages_consumed.store(3, Ordering::Relaxed);

        let view = stats.view();
        assert_eq!(view.total_latency_ns, 600);
        assert_eq!(view.max_latency_ns, 300);
        assert_eq!(view.average_latency_ns(), 200.0);
    }

    #[test]
    fn average_with_no_samples_is_zero() {
        assert_eq!(StatsView::default().average_latency_ns(), 0.0);
    }

    #[test]
    fn reset_clears_everything() {
        let stats = FeedStatistics::default();
        stats.messages_produced.store(5, Ordering::Relaxed);
        stats.record_latency(1_000);
        stats.reset();

        let view = stats.view();
        assert_eq!(view.messages_produced, 0);
        assert_eq!(view.total_latency_ns, 0);
        assert_eq!(view.max_latency_ns, 0);
    }

    #[test]
    fn max_is_monotone() {
        let stats = FeedStatistics::default();
        stats.record_latency(500);
        stats.record_latency(100);
        assert_eq!(stats.view().max_latency_ns, 500);
    }
}
