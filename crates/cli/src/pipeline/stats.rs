//! Pipeline statistics.

use std::time::Duration;

use ingestion::MetricsSnapshot;
use observability::SaMetricsAggregator;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Frames fed through the engine
    pub frames_processed: u64,

    /// Ticks that produced valid outputs
    pub valid_ticks: u64,

    /// Source-side counters
    pub ingestion: MetricsSnapshot,

    /// Total duration of the run
    pub duration: Duration,

    /// Cars in the roster (0 when replaying without one)
    pub roster_size: usize,

    /// Engine output aggregator
    pub sa_metrics: SaMetricsAggregator,
}

impl PipelineStats {
    /// Engine ticks per wall-clock second
    pub fn tps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.frames_processed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Percent of ticks with valid outputs
    pub fn valid_rate(&self) -> f64 {
        if self.frames_processed > 0 {
            (self.valid_ticks as f64 / self.frames_processed as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Run Statistics ===\n");
        println!("Overview");
        println!("  Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  Ticks processed: {}", self.frames_processed);
        println!("  Valid ticks: {} ({:.2}%)", self.valid_ticks, self.valid_rate());
        println!("  Ticks/s: {:.2}", self.tps());
        println!("  Roster: {} cars", self.roster_size);
        println!("  Frames emitted by source: {}", self.ingestion.frames_emitted);
        if self.ingestion.decode_errors > 0 {
            println!("  Skipped trace lines: {}", self.ingestion.decode_errors);
        }
        println!();
        print!("{}", self.sa_metrics.summary());
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let stats = PipelineStats {
            frames_processed: 120,
            valid_ticks: 90,
            duration: Duration::from_secs(2),
            ..Default::default()
        };
        assert!((stats.tps() - 60.0).abs() < 1e-9);
        assert!((stats.valid_rate() - 75.0).abs() < 1e-9);
        assert_eq!(PipelineStats::default().tps(), 0.0);
    }
}
