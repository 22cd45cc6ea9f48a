//! Market Simulator
//!
//! Drives synthetic order flow from several concurrent participants into one
//! shared book, with periodic metrics reports and an optional Prometheus endpoint.
//!
//! Usage: `market_simulator [config.toml]`

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::interval;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use limit_order_engine::metrics::collectors::{LatencyCollector, ThroughputCollector};
use limit_order_engine::metrics::MetricsReporter;
use limit_order_engine::{
    EngineConfig, OrderBook, OrderBookMetrics, OrderId, Price, Quantity, SharedOrderBook, Side,
};

const PARTICIPANTS: u64 = 4;
const TICK: Price = 0.01;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(Path::new(&path))?,
        None => EngineConfig {
            symbol: "SIM".to_string(),
            max_position: 10_000,
            ..EngineConfig::default()
        },
    };

    info!("Starting market simulator for {}...", config.symbol);

    if let Some(listen) = &config.metrics.prometheus_listen {
        start_metrics_server(listen)?;
    }

    let book = SharedOrderBook::new(OrderBook::with_config(&config));
    let metrics = Arc::new(OrderBookMetrics::new());
    let latencies = Arc::new(Mutex::new(LatencyCollector::new(Duration::from_secs(
        config.metrics.report_interval_secs,
    ))));

    // Start metrics reporting
    let reporter = MetricsReporter::new(
        Arc::clone(&metrics),
        Duration::from_secs(config.metrics.report_interval_secs),
    );
    tokio::spawn(async move {
        reporter.run().await;
    });

    for participant in 0..PARTICIPANTS {
        let book = book.clone();
        let metrics = Arc::clone(&metrics);
        let latencies = Arc::clone(&latencies);

        tokio::spawn(async move {
            simulate_participant(participant, book, metrics, latencies).await;
        });
    }

    // Book statistics reporting
    let stats_book = book.clone();
    let stats_metrics = Arc::clone(&metrics);
    let stats_latencies = Arc::clone(&latencies);
    let report_every = Duration::from_secs(config.metrics.report_interval_secs);
    tokio::spawn(async move {
        let mut interval = interval(report_every);
        let mut throughput = ThroughputCollector::new(report_every);

        loop {
            interval.tick().await;

            let stats = stats_book.get_stats();
            stats_metrics.record_book_state(&stats);
            let submitted = stats_metrics.get_orders_accepted() + stats_metrics.get_orders_rejected();
            throughput.add(submitted.saturating_sub(throughput.total()));

            info!(
                "{} | Orders: {} | Bid: {:?} | Ask: {:?} | Spread: {:?} | Position: {} | Trades: {}",
                stats.symbol,
                stats.total_orders,
                stats.best_bid,
                stats.best_ask,
                stats.spread,
                stats.aggregate_position,
                stats.total_trades
            );

            if let Some(rate) = throughput.collect() {
                info!("Submission rate: {:.1}/s ({} total)", rate.rate, rate.total);
            }
            if let Some(latency) = stats_latencies.lock().await.collect() {
                let us = latency.to_micros();
                info!(
                    "Submit latency (μs): p50={:.2} p95={:.2} p99={:.2} max={:.2} over {} samples",
                    us.p50, us.p95, us.p99, us.max, us.count
                );
            }
        }
    });

    info!("Simulator is running. Press Ctrl+C to stop.");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutting down market simulator...");

    let stats = book.get_stats();
    info!(
        "Final stats for {}: {} resting orders, {} trades, volume {}",
        stats.symbol, stats.total_orders, stats.total_trades, stats.total_volume
    );

    Ok(())
}

/// One participant: quotes around a drifting mid, crosses occasionally,
/// and cancels or trims its own resting orders
async fn simulate_participant(
    participant: u64,
    book: SharedOrderBook,
    metrics: Arc<OrderBookMetrics>,
    latencies: Arc<Mutex<LatencyCollector>>,
) {
    let mut interval = interval(Duration::from_millis(10));
    let mut mid: i64 = 10_000; // in ticks
    let mut counter: u64 = participant * 7919;
    let mut live_orders: Vec<OrderId> = Vec::new();

    loop {
        interval.tick().await;
        counter = counter.wrapping_add(1);
        let side = if (counter + participant) % 2 == 0 {
            Side::Buy
        } else {
            Side::Sell
        };

        match counter % 10 {
            // Passive quotes (60% of activity)
            0..=5 => {
                let offset = 1 + (counter % 20) as i64;
                let ticks = match side {
                    Side::Buy => mid - offset,
                    Side::Sell => mid + offset,
                };
                let quantity = 1 + (counter % 25);
                submit(&book, &metrics, &latencies, side, ticks, quantity, &mut live_orders).await;
            }

            // Aggressive orders crossing the spread (20% of activity)
            6 | 7 => {
                let ticks = match side {
                    Side::Buy => mid + 25,
                    Side::Sell => mid - 25,
                };
                let quantity = 5 + (counter % 40);
                submit(&book, &metrics, &latencies, side, ticks, quantity, &mut live_orders).await;
            }

            // Cancel the oldest tracked order (10% of activity)
            8 => {
                if !live_orders.is_empty() {
                    let order_id = live_orders.remove(0);
                    if metrics.time_cancel(|| book.cancel_order(order_id)).is_ok() {
                        metrics.increment_orders_cancelled();
                    }
                }
            }

            // Trim the newest tracked order, then drift the mid (10% of activity)
            9 => {
                if let Some(&order_id) = live_orders.last() {
                    match metrics.time_reduce(|| book.reduce_order(order_id, 1)) {
                        Ok(0) => {
                            live_orders.pop();
                            metrics.increment_orders_reduced();
                        }
                        Ok(_) => metrics.increment_orders_reduced(),
                        Err(_) => {
                            live_orders.pop();
                        }
                    }
                }

                if let Some(top) = metrics.time_query(|| book.top_of_book(side)) {
                    debug!("Participant {} sees {} top {:?}", participant, side, top);
                }
                mid = (mid + if counter % 4 == 0 { 1 } else { -1 }).max(5_000);
            }

            _ => unreachable!(),
        }

        if live_orders.len() > 200 {
            live_orders.drain(..100);
        }
    }
}

async fn submit(
    book: &SharedOrderBook,
    metrics: &OrderBookMetrics,
    latencies: &Mutex<LatencyCollector>,
    side: Side,
    ticks: i64,
    quantity: Quantity,
    live_orders: &mut Vec<OrderId>,
) {
    let price = ticks as Price * TICK;

    let started = std::time::Instant::now();
    let outcome = metrics.time_submit(|| book.submit(side, price, quantity));
    latencies.lock().await.record(started.elapsed());

    metrics.record_submission(&outcome);
    match outcome {
        Ok(submission) if submission.is_resting() => live_orders.push(submission.order_id),
        Ok(_) => {}
        Err(e) => debug!("{} {} @ {:.2} rejected: {}", side, quantity, price, e),
    }
}

/// Install the Prometheus recorder with its HTTP listener
fn start_metrics_server(listen: &str) -> Result<(), Box<dyn std::error::Error>> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr: SocketAddr = listen.parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| {
            error!("Failed to start metrics server: {}", e);
            e
        })?;

    info!("Prometheus metrics available at http://{}/metrics", addr);
    Ok(())
}
