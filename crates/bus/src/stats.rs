// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! Per-subscription and per-channel statistics trackers (spec §4.5).
//!
//! Counters are plain atomics (grounded in `berberis_core::time::AtomicTime`'s
//! own CAS-loop style); the moving-percentile estimator is a small
//! alpha/delta-bounded stochastic approximation, since `GetStats` only needs
//! an approximate running percentile, not an exact order statistic.

use std::sync::{
    Mutex,
    atomic::{AtomicU64, Ordering},
};

use serde::{Deserialize, Serialize};

/// Percentile-estimator configuration (spec §4.4 `statsOptions`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsOptions {
    /// Step size applied when the new sample is above the current estimate.
    pub alpha: f64,
    /// Step size applied when the new sample is below the current estimate.
    pub delta: f64,
    /// The target percentile, e.g. `0.99`.
    pub percentile: f64,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            delta: 0.1,
            percentile: 0.99,
        }
    }
}

/// A bounded-step moving-percentile estimator.
///
/// On each sample `x`, the estimate moves a fraction of the way toward `x`:
/// `alpha` governs the step when `x` is above the current estimate, `delta`
/// governs the step when `x` is below it. Biasing `alpha` below `delta` (or
/// vice versa) skews the estimate toward higher or lower percentiles without
/// needing to retain the full sample population.
#[derive(Debug)]
pub struct MovingPercentile {
    options: StatsOptions,
    estimate: Mutex<f64>,
}

impl MovingPercentile {
    /// Creates a new estimator with the given configuration.
    #[must_use]
    pub fn new(options: StatsOptions) -> Self {
        Self {
            options,
            estimate: Mutex::new(0.0),
        }
    }

    /// Feeds one observation into the estimator.
    pub fn observe(&self, sample: f64) {
        let mut estimate = self.estimate.lock().unwrap_or_else(|p| p.into_inner());
        if sample > *estimate {
            *estimate += self.options.alpha * (sample - *estimate);
        } else {
            *estimate -= self.options.delta * (*estimate - sample);
        }
    }

    /// Returns the current estimate.
    #[must_use]
    pub fn value(&self) -> f64 {
        *self.estimate.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// A single latency/service-time accumulator: running sum, count, min, max.
#[derive(Debug, Default)]
struct TickAccumulator {
    sum_ticks: AtomicU64,
    count: AtomicU64,
    min_ticks: AtomicU64,
    max_ticks: AtomicU64,
}

impl TickAccumulator {
    fn record(&self, ticks: u64) {
        self.sum_ticks.fetch_add(ticks, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.min_ticks
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| {
                Some(if cur == 0 { ticks } else { cur.min(ticks) })
            })
            .ok();
        self.max_ticks.fetch_max(ticks, Ordering::Relaxed);
    }

    fn avg_ms(&self) -> f64 {
        let count = self.count.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        let sum = self.sum_ticks.load(Ordering::Relaxed) as f64;
        (sum / count as f64) / 1_000_000.0
    }

    fn min_ms(&self) -> f64 {
        self.min_ticks.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }

    fn max_ms(&self) -> f64 {
        self.max_ticks.load(Ordering::Relaxed) as f64 / 1_000_000.0
    }
}

/// A point-in-time snapshot of a subscription's statistics (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubscriptionStatsSnapshot {
    /// Length of the interval (ms) since the previous snapshot (or creation).
    pub interval_ms: f64,
    /// Total envelopes enqueued onto this subscription's queue.
    pub total_enqueued: u64,
    /// Total envelopes dequeued from the queue.
    pub total_dequeued: u64,
    /// Total envelopes whose handler invocation completed.
    pub total_processed: u64,
    /// Total handler-timeout events.
    pub total_timeouts: u64,
    /// Dequeue events per second over `interval_ms`.
    pub dequeue_rate: f64,
    /// Process (handler-completion) events per second over `interval_ms`.
    pub process_rate: f64,
    /// Average/min/max latency (enqueue → dequeue), in milliseconds.
    pub avg_latency_ms: f64,
    /// Minimum observed latency, milliseconds.
    pub min_latency_ms: f64,
    /// Maximum observed latency, milliseconds.
    pub max_latency_ms: f64,
    /// Estimated latency percentile, milliseconds.
    pub pct_latency_ms: f64,
    /// Average/min/max service time (handler duration), milliseconds.
    pub avg_service_ms: f64,
    /// Minimum observed service time, milliseconds.
    pub min_service_ms: f64,
    /// Maximum observed service time, milliseconds.
    pub max_service_ms: f64,
    /// Estimated service-time percentile, milliseconds.
    pub pct_service_ms: f64,
    /// Derived: `avg_latency_ms + avg_service_ms`.
    pub avg_response_ms: f64,
    /// Derived: `avg_latency_ms / avg_response_ms` (0 if response is 0).
    pub latency_to_response_ratio: f64,
    /// Derived: `process_rate / dequeue_rate` (0 if dequeue_rate is 0).
    pub conflation_ratio: f64,
    /// Derived: `max(0, total_enqueued - total_dequeued)`.
    pub queue_length: u64,
    /// Derived, Little's Law estimate: `process_rate * avg_response_ms / 1000`.
    pub estimated_avg_active_messages: f64,
}

/// Atomic statistics tracker owned by one subscription pipeline.
#[derive(Debug)]
pub struct SubscriptionStatsTracker {
    enqueued: AtomicU64,
    dequeued: AtomicU64,
    processed: AtomicU64,
    timeouts: AtomicU64,
    latency: TickAccumulator,
    service: TickAccumulator,
    last_dequeue_ticks: AtomicU64,
    last_process_ticks: AtomicU64,
    inter_dequeue: TickAccumulator,
    inter_process: TickAccumulator,
    latency_pct: MovingPercentile,
    service_pct: MovingPercentile,
    last_snapshot_ticks: AtomicU64,
    snapshot_enqueued: AtomicU64,
    snapshot_dequeued: AtomicU64,
    snapshot_processed: AtomicU64,
}

impl SubscriptionStatsTracker {
    /// Creates a tracker started at clock reading `now_ticks`.
    #[must_use]
    pub fn new(options: StatsOptions, now_ticks: u64) -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            dequeued: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            latency: TickAccumulator::default(),
            service: TickAccumulator::default(),
            last_dequeue_ticks: AtomicU64::new(0),
            last_process_ticks: AtomicU64::new(0),
            inter_dequeue: TickAccumulator::default(),
            inter_process: TickAccumulator::default(),
            latency_pct: MovingPercentile::new(options),
            service_pct: MovingPercentile::new(options),
            last_snapshot_ticks: AtomicU64::new(now_ticks),
            snapshot_enqueued: AtomicU64::new(0),
            snapshot_dequeued: AtomicU64::new(0),
            snapshot_processed: AtomicU64::new(0),
        }
    }

    /// Records one successful enqueue.
    pub fn record_enqueue(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one dequeue with the given latency (`now - inception`) in ticks.
    pub fn record_dequeue(&self, latency_ticks: u64, now_ticks: u64) {
        self.dequeued.fetch_add(1, Ordering::Relaxed);
        self.latency.record(latency_ticks);
        self.latency_pct.observe(latency_ticks as f64 / 1_000_000.0);
        let last = self.last_dequeue_ticks.swap(now_ticks, Ordering::Relaxed);
        if last != 0 && now_ticks > last {
            self.inter_dequeue.record(now_ticks - last);
        }
    }

    /// Records one completed handler invocation with the given service
    /// duration in ticks.
    pub fn record_processed(&self, service_ticks: u64, now_ticks: u64) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.service.record(service_ticks);
        self.service_pct.observe(service_ticks as f64 / 1_000_000.0);
        let last = self.last_process_ticks.swap(now_ticks, Ordering::Relaxed);
        if last != 0 && now_ticks > last {
            self.inter_process.record(now_ticks - last);
        }
    }

    /// Records one handler-timeout event.
    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the total enqueued/dequeued/processed/timeouts counters (statistics
    /// self-consistency property, spec §8 property 12).
    #[must_use]
    pub fn totals(&self) -> (u64, u64, u64, u64) {
        (
            self.enqueued.load(Ordering::Relaxed),
            self.dequeued.load(Ordering::Relaxed),
            self.processed.load(Ordering::Relaxed),
            self.timeouts.load(Ordering::Relaxed),
        )
    }

    /// Returns a snapshot of current statistics, optionally resetting the
    /// interval counters used to compute rates.
    pub fn snapshot(&self, now_ticks: u64, reset: bool) -> SubscriptionStatsSnapshot {
        let (total_enqueued, total_dequeued, total_processed, total_timeouts) = self.totals();

        let last_ticks = self.last_snapshot_ticks.load(Ordering::Relaxed);
        let interval_ms = (now_ticks.saturating_sub(last_ticks)) as f64 / 1_000_000.0;

        let prev_enqueued = self.snapshot_enqueued.load(Ordering::Relaxed);
        let prev_dequeued = self.snapshot_dequeued.load(Ordering::Relaxed);
        let prev_processed = self.snapshot_processed.load(Ordering::Relaxed);

        let interval_dequeued = total_dequeued.saturating_sub(prev_dequeued);
        let interval_processed = total_processed.saturating_sub(prev_processed);

        let interval_s = (interval_ms / 1000.0).max(f64::MIN_POSITIVE);
        let dequeue_rate = interval_dequeued as f64 / interval_s;
        let process_rate = interval_processed as f64 / interval_s;

        let avg_latency_ms = self.latency.avg_ms();
        let avg_service_ms = self.service.avg_ms();
        let avg_response_ms = avg_latency_ms + avg_service_ms;
        let latency_to_response_ratio = if avg_response_ms > 0.0 {
            avg_latency_ms / avg_response_ms
        } else {
            0.0
        };
        let conflation_ratio = if dequeue_rate > 0.0 {
            process_rate / dequeue_rate
        } else {
            0.0
        };
        let queue_length = total_enqueued.saturating_sub(total_dequeued);
        let estimated_avg_active_messages = process_rate * avg_response_ms / 1000.0;

        if reset {
            self.last_snapshot_ticks.store(now_ticks, Ordering::Relaxed);
            self.snapshot_enqueued.store(total_enqueued, Ordering::Relaxed);
            self.snapshot_dequeued.store(total_dequeued, Ordering::Relaxed);
            self.snapshot_processed.store(total_processed, Ordering::Relaxed);
        }

        SubscriptionStatsSnapshot {
            interval_ms,
            total_enqueued,
            total_dequeued,
            total_processed,
            total_timeouts,
            dequeue_rate,
            process_rate,
            avg_latency_ms,
            min_latency_ms: self.latency.min_ms(),
            max_latency_ms: self.latency.max_ms(),
            pct_latency_ms: self.latency_pct.value(),
            avg_service_ms,
            min_service_ms: self.service.min_ms(),
            max_service_ms: self.service.max_ms(),
            pct_service_ms: self.service_pct.value(),
            avg_response_ms,
            latency_to_response_ratio,
            conflation_ratio,
            queue_length,
            estimated_avg_active_messages,
        }
    }
}

/// Per-channel tracker mirroring enqueue-only totals (spec §4.5).
#[derive(Debug, Default)]
pub struct ChannelStatsTracker {
    publishes: AtomicU64,
    last_publish_ticks: AtomicU64,
    inter_publish: TickAccumulator,
}

impl ChannelStatsTracker {
    /// Creates a new, zeroed tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one publish at clock reading `now_ticks`.
    pub fn record_publish(&self, now_ticks: u64) {
        self.publishes.fetch_add(1, Ordering::Relaxed);
        let last = self.last_publish_ticks.swap(now_ticks, Ordering::Relaxed);
        if last != 0 && now_ticks > last {
            self.inter_publish.record(now_ticks - last);
        }
    }

    /// Returns the total publish count.
    #[must_use]
    pub fn total_publishes(&self) -> u64 {
        self.publishes.load(Ordering::Relaxed)
    }

    /// Returns the average inter-publish gap, in milliseconds.
    #[must_use]
    pub fn avg_inter_publish_ms(&self) -> f64 {
        self.inter_publish.avg_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_are_self_consistent() {
        let tracker = SubscriptionStatsTracker::new(StatsOptions::default(), 0);
        tracker.record_enqueue();
        tracker.record_enqueue();
        tracker.record_dequeue(10, 10);
        let (enq, deq, proc_, _) = tracker.totals();
        assert!(enq >= deq);
        assert!(deq >= proc_);
        let snap = tracker.snapshot(20, false);
        assert_eq!(snap.queue_length, enq - deq);
    }

    #[test]
    fn moving_percentile_tracks_upward_bursts() {
        let estimator = MovingPercentile::new(StatsOptions {
            alpha: 0.5,
            delta: 0.5,
            percentile: 0.99,
        });
        for _ in 0..20 {
            estimator.observe(100.0);
        }
        assert!(estimator.value() > 50.0);
    }

    #[test]
    fn channel_tracker_counts_publishes() {
        let tracker = ChannelStatsTracker::new();
        tracker.record_publish(10);
        tracker.record_publish(20);
        assert_eq!(tracker.total_publishes(), 2);
    }
}
