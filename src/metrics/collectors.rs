use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Buffers raw latency samples and summarizes them into percentiles once per
/// collection interval
#[derive(Debug)]
pub struct LatencyCollector {
    samples: Vec<Duration>,
    last_collection: Instant,
    collection_interval: Duration,
}

impl LatencyCollector {
    pub fn new(collection_interval: Duration) -> Self {
        Self {
            samples: Vec::new(),
            last_collection: Instant::now(),
            collection_interval,
        }
    }

    pub fn record(&mut self, latency: Duration) {
        self.samples.push(latency);
    }

    pub fn pending(&self) -> usize {
        self.samples.len()
    }

    /// Summarize and reset if the interval has elapsed
    pub fn collect(&mut self) -> Option<LatencyStatistics> {
        if self.last_collection.elapsed() < self.collection_interval {
            return None;
        }
        Some(self.drain())
    }

    /// Summarize and reset regardless of the interval
    pub fn drain(&mut self) -> LatencyStatistics {
        let mut samples = std::mem::take(&mut self.samples);
        self.last_collection = Instant::now();

        if samples.is_empty() {
            return LatencyStatistics::default();
        }
        samples.sort_unstable();

        let total: Duration = samples.iter().sum();
        LatencyStatistics {
            count: samples.len() as u64,
            min: samples[0],
            max: samples[samples.len() - 1],
            mean: total / samples.len() as u32,
            p50: percentile(&samples, 0.50),
            p95: percentile(&samples, 0.95),
            p99: percentile(&samples, 0.99),
            p999: percentile(&samples, 0.999),
        }
    }
}

/// Nearest-rank percentile over sorted, non-empty samples
fn percentile(sorted: &[Duration], q: f64) -> Duration {
    let rank = (q * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Counts operations and reports the rate since the previous collection
#[derive(Debug)]
pub struct ThroughputCollector {
    counter: AtomicU64,
    last_collection: Instant,
    collection_interval: Duration,
    last_count: u64,
}

impl ThroughputCollector {
    pub fn new(collection_interval: Duration) -> Self {
        Self {
            counter: AtomicU64::new(0),
            last_collection: Instant::now(),
            collection_interval,
            last_count: 0,
        }
    }

    pub fn increment(&self) {
        self.add(1);
    }

    pub fn add(&self, value: u64) {
        self.counter.fetch_add(value, Ordering::Relaxed);
    }

    pub fn collect(&mut self) -> Option<ThroughputStatistics> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_collection);
        if elapsed < self.collection_interval {
            return None;
        }

        let total = self.counter.load(Ordering::Relaxed);
        let operations = total - self.last_count;
        self.last_collection = now;
        self.last_count = total;

        Some(ThroughputStatistics {
            operations,
            rate: operations as f64 / elapsed.as_secs_f64(),
            total,
            interval: elapsed,
        })
    }

    pub fn total(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatencyStatistics {
    pub count: u64,
    pub min: Duration,
    pub max: Duration,
    pub mean: Duration,
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
    pub p999: Duration,
}

impl LatencyStatistics {
    pub fn to_micros(&self) -> LatencyMicros {
        let us = |d: Duration| d.as_secs_f64() * 1_000_000.0;
        LatencyMicros {
            count: self.count,
            min: us(self.min),
            max: us(self.max),
            mean: us(self.mean),
            p50: us(self.p50),
            p95: us(self.p95),
            p99: us(self.p99),
            p999: us(self.p999),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LatencyMicros {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub p999: f64,
}

#[derive(Debug, Clone)]
pub struct ThroughputStatistics {
    pub operations: u64,
    pub rate: f64,
    pub total: u64,
    pub interval: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_latency_collector() {
        let mut collector = LatencyCollector::new(Duration::from_millis(100));

        collector.record(Duration::from_micros(300));
        collector.record(Duration::from_micros(100));
        collector.record(Duration::from_micros(200));

        // Should not collect yet
        assert!(collector.collect().is_none());

        thread::sleep(Duration::from_millis(101));

        let stats = collector.collect().unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min, Duration::from_micros(100));
        assert_eq!(stats.max, Duration::from_micros(300));
        assert_eq!(stats.p50, Duration::from_micros(200));
        assert_eq!(stats.p99, Duration::from_micros(300));
        assert_eq!(collector.pending(), 0);
    }

    #[test]
    fn test_drain_empty() {
        let mut collector = LatencyCollector::new(Duration::from_secs(60));
        assert_eq!(collector.drain(), LatencyStatistics::default());
    }

    #[test]
    fn test_percentile_nearest_rank() {
        let samples: Vec<Duration> = (1..=100).map(Duration::from_micros).collect();
        assert_eq!(percentile(&samples, 0.50), Duration::from_micros(50));
        assert_eq!(percentile(&samples, 0.95), Duration::from_micros(95));
        assert_eq!(percentile(&samples, 0.999), Duration::from_micros(100));
        assert_eq!(percentile(&samples, 0.0), Duration::from_micros(1));
    }

    #[test]
    fn test_throughput_collector() {
        let mut collector = ThroughputCollector::new(Duration::from_millis(100));

        collector.increment();
        collector.add(5);
        assert_eq!(collector.total(), 6);

        // Should not collect yet
        assert!(collector.collect().is_none());

        thread::sleep(Duration::from_millis(101));

        let stats = collector.collect().unwrap();
        assert_eq!(stats.operations, 6);
        assert!(stats.rate > 0.0);
    }
}
