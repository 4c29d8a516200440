//! Training metrics collection.
//!
//! Provides structured logging and counters for monitoring gradient-descent
//! and evolutionary training runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Metrics collector shared across a training run.
pub struct TrainingMetrics {
    epoch_count: AtomicU64,
    generation_count: AtomicU64,
    // f64 gauges stored as raw bits.
    last_loss_bits: AtomicU64,
    best_fitness_bits: AtomicU64,
    pub counters: Mutex<HashMap<String, AtomicU64>>,
    start_time: Instant,
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainingMetrics {
    /// Creates a new metrics collector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch_count: AtomicU64::new(0),
            generation_count: AtomicU64::new(0),
            last_loss_bits: AtomicU64::new(f64::NAN.to_bits()),
            best_fitness_bits: AtomicU64::new(f64::NAN.to_bits()),
            counters: Mutex::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Records a completed SGD epoch with its duration and mean loss.
    pub fn record_epoch(&self, duration: Duration, batches: usize, loss: f64) {
        let epoch = self.epoch_count.fetch_add(1, Ordering::Relaxed) + 1;
        self.last_loss_bits.store(loss.to_bits(), Ordering::Relaxed);

        tracing::info!(
            epoch = epoch,
            batches = batches,
            loss = loss,
            duration_ms = duration.as_millis() as u64,
            "Training epoch"
        );
    }

    /// Records a completed generation with the best fitness seen so far.
    pub fn record_generation(&self, duration: Duration, best_fitness: f64) {
        let generation = self.generation_count.fetch_add(1, Ordering::Relaxed) + 1;
        self.best_fitness_bits
            .store(best_fitness.to_bits(), Ordering::Relaxed);

        tracing::info!(
            generation = generation,
            best_fitness = best_fitness,
            duration_ms = duration.as_millis() as u64,
            "Evolution generation"
        );
    }

    /// Increments a named counter.
    pub fn increment_counter(&self, name: &str) {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn epoch_count(&self) -> u64 {
        self.epoch_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn generation_count(&self) -> u64 {
        self.generation_count.load(Ordering::Relaxed)
    }

    /// Loss from the most recent epoch; NaN before the first record.
    #[must_use]
    pub fn last_loss(&self) -> f64 {
        f64::from_bits(self.last_loss_bits.load(Ordering::Relaxed))
    }

    /// Best fitness from the most recent generation; NaN before the first
    /// record.
    #[must_use]
    pub fn best_fitness(&self) -> f64 {
        f64::from_bits(self.best_fitness_bits.load(Ordering::Relaxed))
    }

    /// Gets elapsed time since metrics creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Initialize tracing subscriber for logging.
pub fn init_logging() {
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(tracing::Level::INFO)
            .finish(),
    )
    .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = TrainingMetrics::new();
        assert_eq!(metrics.epoch_count(), 0);
        assert!(metrics.last_loss().is_nan());
    }

    #[test]
    fn test_record_epoch() {
        let metrics = TrainingMetrics::new();
        metrics.record_epoch(Duration::from_millis(16), 8, 0.25);
        assert_eq!(metrics.epoch_count(), 1);
        assert_eq!(metrics.last_loss(), 0.25);
    }

    #[test]
    fn test_record_generation() {
        let metrics = TrainingMetrics::new();
        metrics.record_generation(Duration::from_millis(4), 0.9);
        metrics.record_generation(Duration::from_millis(4), 0.95);
        assert_eq!(metrics.generation_count(), 2);
        assert_eq!(metrics.best_fitness(), 0.95);
    }

    #[test]
    fn test_increment_counter() {
        let metrics = TrainingMetrics::new();
        metrics.increment_counter("batches");
        metrics.increment_counter("batches");
    }
}
