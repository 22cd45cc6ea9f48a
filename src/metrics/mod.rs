use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::info;

use crate::orderbook::{OrderBookError, OrderBookStats, Submission};

pub mod collectors;

/// Metrics collector for order book operations
#[derive(Debug)]
pub struct OrderBookMetrics {
    // Latency tracking
    submit_latency: LatencyTracker,
    cancel_latency: LatencyTracker,
    reduce_latency: LatencyTracker,
    query_latency: LatencyTracker,

    // Throughput counters
    orders_accepted: AtomicU64,
    orders_rejected: AtomicU64,
    orders_cancelled: AtomicU64,
    orders_reduced: AtomicU64,
    trades_executed: AtomicU64,

    // Volume tracking
    total_volume: AtomicU64,
}

impl OrderBookMetrics {
    pub fn new() -> Self {
        // Register metric descriptions
        describe_counter!("orderbook_orders_total", "Total number of order operations processed");
        describe_counter!("orderbook_trades_total", "Total number of trades executed");
        describe_counter!("orderbook_volume_total", "Total quantity traded");
        describe_histogram!(
            "orderbook_operation_duration_seconds",
            "Duration of order book operations"
        );
        describe_gauge!(
            "orderbook_levels_total",
            "Number of price levels in the book"
        );
        describe_gauge!(
            "orderbook_orders_current",
            "Current number of resting orders in the book"
        );
        describe_gauge!("orderbook_spread", "Current bid-ask spread");
        describe_gauge!(
            "orderbook_aggregate_position",
            "Signed resting quantity (bids minus asks)"
        );

        Self {
            submit_latency: LatencyTracker::new("submit"),
            cancel_latency: LatencyTracker::new("cancel"),
            reduce_latency: LatencyTracker::new("reduce"),
            query_latency: LatencyTracker::new("query"),
            orders_accepted: AtomicU64::new(0),
            orders_rejected: AtomicU64::new(0),
            orders_cancelled: AtomicU64::new(0),
            orders_reduced: AtomicU64::new(0),
            trades_executed: AtomicU64::new(0),
            total_volume: AtomicU64::new(0),
        }
    }

    // Latency measurement methods
    pub fn time_submit<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.submit_latency.time(f)
    }

    pub fn time_cancel<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.cancel_latency.time(f)
    }

    pub fn time_reduce<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.reduce_latency.time(f)
    }

    pub fn time_query<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.query_latency.time(f)
    }

    /// Count a submission outcome and the trades it produced
    pub fn record_submission(&self, outcome: &Result<Submission, OrderBookError>) {
        match outcome {
            Ok(submission) => {
                self.orders_accepted.fetch_add(1, Ordering::Relaxed);
                counter!("orderbook_orders_total", "operation" => "accept").increment(1);

                for trade in &submission.trades {
                    self.increment_trades_executed(trade.quantity);
                }
            }
            Err(_) => {
                self.orders_rejected.fetch_add(1, Ordering::Relaxed);
                counter!("orderbook_orders_total", "operation" => "reject").increment(1);
            }
        }
    }

    pub fn increment_orders_cancelled(&self) {
        self.orders_cancelled.fetch_add(1, Ordering::Relaxed);
        counter!("orderbook_orders_total", "operation" => "cancel").increment(1);
    }

    pub fn increment_orders_reduced(&self) {
        self.orders_reduced.fetch_add(1, Ordering::Relaxed);
        counter!("orderbook_orders_total", "operation" => "reduce").increment(1);
    }

    pub fn increment_trades_executed(&self, quantity: u64) {
        self.trades_executed.fetch_add(1, Ordering::Relaxed);
        self.total_volume.fetch_add(quantity, Ordering::Relaxed);

        counter!("orderbook_trades_total").increment(1);
        counter!("orderbook_volume_total").increment(quantity);
    }

    /// Publish book-state gauges
    pub fn record_book_state(&self, stats: &OrderBookStats) {
        gauge!("orderbook_orders_current").set(stats.total_orders as f64);
        gauge!("orderbook_levels_total", "side" => "bid").set(stats.bid_levels as f64);
        gauge!("orderbook_levels_total", "side" => "ask").set(stats.ask_levels as f64);
        gauge!("orderbook_aggregate_position").set(stats.aggregate_position as f64);

        if let Some(spread) = stats.spread {
            gauge!("orderbook_spread").set(spread);
        }
        if let Some(bid) = stats.best_bid {
            gauge!("orderbook_best_bid").set(bid);
        }
        if let Some(ask) = stats.best_ask {
            gauge!("orderbook_best_ask").set(ask);
        }
    }

    // Getters for current values
    pub fn get_orders_accepted(&self) -> u64 {
        self.orders_accepted.load(Ordering::Relaxed)
    }

    pub fn get_orders_rejected(&self) -> u64 {
        self.orders_rejected.load(Ordering::Relaxed)
    }

    pub fn get_orders_cancelled(&self) -> u64 {
        self.orders_cancelled.load(Ordering::Relaxed)
    }

    pub fn get_orders_reduced(&self) -> u64 {
        self.orders_reduced.load(Ordering::Relaxed)
    }

    pub fn get_trades_executed(&self) -> u64 {
        self.trades_executed.load(Ordering::Relaxed)
    }

    pub fn get_total_volume(&self) -> u64 {
        self.total_volume.load(Ordering::Relaxed)
    }

    pub fn get_latency_stats(&self) -> LatencyStats {
        LatencyStats {
            submit: self.submit_latency.get_stats(),
            cancel: self.cancel_latency.get_stats(),
            reduce: self.reduce_latency.get_stats(),
            query: self.query_latency.get_stats(),
        }
    }
}

impl Default for OrderBookMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency tracker for individual operations
#[derive(Debug)]
struct LatencyTracker {
    operation: &'static str,
    samples: AtomicU64,
    total_nanos: AtomicU64,
    min_nanos: AtomicU64,
    max_nanos: AtomicU64,
}

impl LatencyTracker {
    fn new(operation: &'static str) -> Self {
        Self {
            operation,
            samples: AtomicU64::new(0),
            total_nanos: AtomicU64::new(0),
            min_nanos: AtomicU64::new(u64::MAX),
            max_nanos: AtomicU64::new(0),
        }
    }

    fn time<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let duration = start.elapsed();

        self.record_latency(duration);
        result
    }

    fn record_latency(&self, duration: Duration) {
        let nanos = duration.as_nanos() as u64;

        self.samples.fetch_add(1, Ordering::Relaxed);
        self.total_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.min_nanos.fetch_min(nanos, Ordering::Relaxed);
        self.max_nanos.fetch_max(nanos, Ordering::Relaxed);

        // Record in metrics system
        histogram!("orderbook_operation_duration_seconds", "operation" => self.operation)
            .record(duration.as_secs_f64());
    }

    fn get_stats(&self) -> OperationLatencyStats {
        let samples = self.samples.load(Ordering::Relaxed);
        let total = self.total_nanos.load(Ordering::Relaxed);
        let min = self.min_nanos.load(Ordering::Relaxed);
        let max = self.max_nanos.load(Ordering::Relaxed);

        let avg = if samples > 0 { total / samples } else { 0 };

        OperationLatencyStats {
            operation: self.operation,
            samples,
            avg_nanos: avg,
            min_nanos: if min == u64::MAX { 0 } else { min },
            max_nanos: max,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LatencyStats {
    pub submit: OperationLatencyStats,
    pub cancel: OperationLatencyStats,
    pub reduce: OperationLatencyStats,
    pub query: OperationLatencyStats,
}

#[derive(Debug, Clone)]
pub struct OperationLatencyStats {
    pub operation: &'static str,
    pub samples: u64,
    pub avg_nanos: u64,
    pub min_nanos: u64,
    pub max_nanos: u64,
}

impl OperationLatencyStats {
    pub fn avg_micros(&self) -> f64 {
        self.avg_nanos as f64 / 1_000.0
    }

    pub fn min_micros(&self) -> f64 {
        self.min_nanos as f64 / 1_000.0
    }

    pub fn max_micros(&self) -> f64 {
        self.max_nanos as f64 / 1_000.0
    }
}

/// Background metrics reporter
pub struct MetricsReporter {
    metrics: Arc<OrderBookMetrics>,
    interval: Duration,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<OrderBookMetrics>, interval: Duration) -> Self {
        Self { metrics, interval }
    }

    pub fn summary(&self) -> String {
        let stats = self.metrics.get_latency_stats();

        format!(
            "OrderBook Metrics - Orders: +{} x{} -{} ~{} | Trades: {} (vol {}) | Latency (μs): submit={:.2} cancel={:.2} reduce={:.2} query={:.2}",
            self.metrics.get_orders_accepted(),
            self.metrics.get_orders_rejected(),
            self.metrics.get_orders_cancelled(),
            self.metrics.get_orders_reduced(),
            self.metrics.get_trades_executed(),
            self.metrics.get_total_volume(),
            stats.submit.avg_micros(),
            stats.cancel.avg_micros(),
            stats.reduce.avg_micros(),
            stats.query.avg_micros(),
        )
    }

    pub async fn run(&self) {
        let mut interval = interval(self.interval);

        loop {
            interval.tick().await;
            info!("{}", self.summary());
        }
    }
}
