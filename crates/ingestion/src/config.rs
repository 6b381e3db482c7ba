//! Stream configuration and metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Frame stream configuration
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Channel capacity
    pub channel_capacity: usize,

    /// Pacing rate; `None` emits frames as fast as the consumer takes them
    pub tick_hz: Option<f64>,

    /// Stop after this many frames
    pub max_frames: Option<u64>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            tick_hz: None,
            max_frames: None,
        }
    }
}

impl StreamConfig {
    pub fn new(channel_capacity: usize, tick_hz: Option<f64>) -> Self {
        Self {
            channel_capacity,
            tick_hz,
            ..Default::default()
        }
    }

    /// Pacing interval, if pacing is enabled and the rate is usable
    pub fn interval(&self) -> Option<std::time::Duration> {
        self.tick_hz
            .filter(|hz| hz.is_finite() && *hz > 0.0)
            .map(|hz| std::time::Duration::from_secs_f64(1.0 / hz))
    }
}

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    pub frames_emitted: AtomicU64,

    /// Malformed trace lines skipped
    pub decode_errors: AtomicU64,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_emitted(&self) {
        self.frames_emitted.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("sa_ingestion_frames_total").increment(1);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("sa_ingestion_decode_errors_total").increment(1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_emitted: self.frames_emitted.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`IngestionMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_emitted: u64,
    pub decode_errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval() {
        assert_eq!(StreamConfig::default().interval(), None);
        let config = StreamConfig::new(8, Some(50.0));
        assert_eq!(config.interval(), Some(std::time::Duration::from_millis(20)));
        assert_eq!(StreamConfig::new(8, Some(0.0)).interval(), None);
    }

    #[test]
    fn test_metrics_snapshot() {
        let metrics = IngestionMetrics::new();
        metrics.record_emitted();
        metrics.record_emitted();
        metrics.record_decode_error();
        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                frames_emitted: 2,
                decode_errors: 1
            }
        );
    }
}
