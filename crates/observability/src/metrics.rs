//! SA engine metrics collection
//!
//! Collects and aggregates engine metrics from `SaOutputs` snapshots.

use std::collections::HashMap;

use contracts::{GapSource, SaOutputs, StatusE};
use metrics::{counter, gauge, histogram};

fn source_label(source: GapSource) -> &'static str {
    match source {
        GapSource::Filtered => "filtered",
        GapSource::Truth => "truth",
        GapSource::Track => "track",
        GapSource::StickyHold => "sticky_hold",
        GapSource::Invalid => "invalid",
    }
}

/// Record metrics from one output snapshot
///
/// Call once per tick after `refresh_status`.
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_sa_metrics;
///
/// engine.update(&frame);
/// engine.refresh_status(frame.not_relevant_gap_sec, None, "");
/// record_sa_metrics(engine.outputs());
/// ```
pub fn record_sa_metrics(outputs: &SaOutputs) {
    counter!("sa_output_snapshots_total").increment(1);
    gauge!("sa_outputs_valid").set(if outputs.valid { 1.0 } else { 0.0 });

    let bound_ahead = outputs.ahead.iter().filter(|s| s.is_bound()).count();
    let bound_behind = outputs.behind.iter().filter(|s| s.is_bound()).count();
    gauge!("sa_slots_bound", "dir" => "ahead").set(bound_ahead as f64);
    gauge!("sa_slots_bound", "dir" => "behind").set(bound_behind as f64);
    gauge!("sa_valid_cars").set(outputs.debug.valid_cars as f64);

    for slot in outputs.slots().filter(|s| s.is_bound()) {
        counter!("sa_slot_gap_source_total", "source" => source_label(slot.gap_source))
            .increment(1);
        if slot.gap_rel_sec.is_finite() {
            histogram!("sa_slot_gap_abs_sec").record(slot.gap_rel_sec.abs());
        }
    }

    if let Some(nearest) = outputs.ahead.first().filter(|s| s.gap_rel_sec.is_finite()) {
        gauge!("sa_nearest_gap_sec", "dir" => "ahead").set(nearest.gap_rel_sec);
    }
    if let Some(nearest) = outputs.behind.first().filter(|s| s.gap_rel_sec.is_finite()) {
        gauge!("sa_nearest_gap_sec", "dir" => "behind").set(nearest.gap_rel_sec);
    }

    if let Some(sof) = outputs.irating_sof {
        gauge!("sa_irating_sof").set(sof);
    }
}

/// SA metrics aggregator
///
/// Aggregates metrics in memory for a run summary.
#[derive(Debug, Clone, Default)]
pub struct SaMetricsAggregator {
    pub total_ticks: u64,

    /// Ticks with a valid player
    pub valid_ticks: u64,

    pub total_rebinds: u64,

    pub total_mismatch_fallbacks: u64,

    pub total_truth_updates: u64,

    /// Session resets reported by the last snapshot
    pub session_resets: u64,

    /// Bound-slot ticks per status
    pub status_counts: HashMap<StatusE, u64>,

    /// Bound-slot ticks per gap source
    pub source_counts: HashMap<GapSource, u64>,

    /// Nearest ahead gap (seconds)
    pub ahead_gap_stats: RunningStats,

    /// Nearest behind gap (seconds, absolute)
    pub behind_gap_stats: RunningStats,

    /// Smoothed closing rate over bound slots
    pub closing_rate_stats: RunningStats,
}

impl SaMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one output snapshot into the aggregate
    pub fn update(&mut self, outputs: &SaOutputs) {
        self.total_ticks += 1;
        if outputs.valid {
            self.valid_ticks += 1;
        }
        self.total_rebinds += u64::from(outputs.debug.rebinds);
        self.total_mismatch_fallbacks += u64::from(outputs.debug.mismatch_fallbacks);
        self.total_truth_updates += u64::from(outputs.debug.gate_truth_updates);
        self.session_resets = outputs.debug.session_resets;

        for slot in outputs.slots().filter(|s| s.is_bound()) {
            *self.status_counts.entry(slot.status).or_insert(0) += 1;
            *self.source_counts.entry(slot.gap_source).or_insert(0) += 1;
            if slot.closing_rate_smoothed.is_finite() {
                self.closing_rate_stats.push(slot.closing_rate_smoothed);
            }
        }

        if let Some(gap) = outputs.ahead.first().map(|s| s.gap_rel_sec).filter(|g| g.is_finite()) {
            self.ahead_gap_stats.push(gap);
        }
        if let Some(gap) = outputs.behind.first().map(|s| s.gap_rel_sec).filter(|g| g.is_finite()) {
            self.behind_gap_stats.push(gap.abs());
        }
    }

    /// Share of bound-slot ticks whose gap came from gate timing, in percent
    pub fn gate_share(&self) -> f64 {
        let total: u64 = self.source_counts.values().sum();
        if total == 0 {
            return 0.0;
        }
        let gate = [GapSource::Filtered, GapSource::Truth]
            .iter()
            .filter_map(|s| self.source_counts.get(s))
            .sum::<u64>();
        gate as f64 / total as f64 * 100.0
    }

    pub fn summary(&self) -> MetricsSummary {
        let mut status_counts: Vec<_> = self
            .status_counts
            .iter()
            .map(|(status, count)| (format!("{status:?}"), *count))
            .collect();
        status_counts.sort();
        let mut source_counts: Vec<_> = self
            .source_counts
            .iter()
            .map(|(source, count)| (source_label(*source).to_string(), *count))
            .collect();
        source_counts.sort();

        MetricsSummary {
            total_ticks: self.total_ticks,
            valid_ticks: self.valid_ticks,
            valid_rate: if self.total_ticks > 0 {
                self.valid_ticks as f64 / self.total_ticks as f64 * 100.0
            } else {
                0.0
            },
            total_rebinds: self.total_rebinds,
            total_mismatch_fallbacks: self.total_mismatch_fallbacks,
            total_truth_updates: self.total_truth_updates,
            session_resets: self.session_resets,
            gate_share: self.gate_share(),
            ahead_gap_sec: StatsSummary::from(&self.ahead_gap_stats),
            behind_gap_sec: StatsSummary::from(&self.behind_gap_stats),
            closing_rate: StatsSummary::from(&self.closing_rate_stats),
            status_counts,
            source_counts,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_ticks: u64,
    pub valid_ticks: u64,
    pub valid_rate: f64,
    pub total_rebinds: u64,
    pub total_mismatch_fallbacks: u64,
    pub total_truth_updates: u64,
    pub session_resets: u64,
    /// Percent of bound-slot ticks served by gate timing
    pub gate_share: f64,
    pub ahead_gap_sec: StatsSummary,
    pub behind_gap_sec: StatsSummary,
    pub closing_rate: StatsSummary,
    /// Sorted by status name
    pub status_counts: Vec<(String, u64)>,
    /// Sorted by source name
    pub source_counts: Vec<(String, u64)>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== SA Metrics Summary ===")?;
        writeln!(f, "Total ticks: {}", self.total_ticks)?;
        writeln!(
            f,
            "Valid ticks: {} ({:.2}%)",
            self.valid_ticks, self.valid_rate
        )?;
        writeln!(f, "Slot rebinds: {}", self.total_rebinds)?;
        writeln!(f, "Gate truth updates: {}", self.total_truth_updates)?;
        writeln!(f, "Mismatch fallbacks: {}", self.total_mismatch_fallbacks)?;
        writeln!(f, "Session resets: {}", self.session_resets)?;
        writeln!(f, "Gate-timed gaps: {:.2}%", self.gate_share)?;
        writeln!(f, "Nearest ahead gap (s): {}", self.ahead_gap_sec)?;
        writeln!(f, "Nearest behind gap (s): {}", self.behind_gap_sec)?;
        writeln!(f, "Closing rate (s/s): {}", self.closing_rate)?;

        if !self.source_counts.is_empty() {
            writeln!(f, "Gap sources:")?;
            for (source, count) in &self.source_counts {
                writeln!(f, "  {}: {}", source, count)?;
            }
        }
        if !self.status_counts.is_empty() {
            writeln!(f, "Statuses:")?;
            for (status, count) in &self.status_counts {
                writeln!(f, "  {}: {}", status, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
