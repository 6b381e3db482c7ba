//! Gap fusion filter.
//!
//! Between gate crossings the truth gap is forward-predicted with the gate
//! rate and pulled toward fresh truth with a first-order exponential
//! correction `alpha = 1 - exp(-dt / tau)`. Each slot then picks one gap
//! from the source hierarchy
//! `Filtered -> Truth -> Track -> StickyHold -> Invalid`.

use contracts::{Direction, FilterConfig, GapSource};
use tracing::debug;

use crate::gate::GateGapCache;
use crate::wrap::{directional, lap_time_valid, wrap_gap};

/// Result of fusing one slot's gap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedGap {
    /// Directional gap (ahead >= 0, behind <= 0), NaN when invalid
    pub gap: f64,
    pub source: GapSource,
    /// Gate caches were discarded in favor of the track estimate
    pub mismatch: bool,
}

impl FusedGap {
    pub const INVALID: Self = Self {
        gap: f64::NAN,
        source: GapSource::Invalid,
        mismatch: false,
    };
}

/// Per-slot inputs to [`GapFilter::fuse`]
#[derive(Debug, Clone, Copy)]
pub struct FuseInput {
    pub direction: Direction,
    /// Directional track-position estimate (seconds)
    pub track_gap: f64,
    pub lap_delta: i32,
    pub now: f64,
    pub lap_time: f64,
}

/// Predict/correct filter plus source selection
#[derive(Debug, Clone)]
pub struct GapFilter {
    config: FilterConfig,
    truth_max_age: f64,
}

impl GapFilter {
    pub fn new(config: FilterConfig, truth_max_age: f64) -> Self {
        Self {
            config,
            truth_max_age,
        }
    }

    /// Advance one car's filtered gap by `dt` seconds
    pub fn step(&self, cache: &mut GateGapCache, now: f64, dt: f64, lap_time: f64) {
        if !lap_time_valid(lap_time) {
            return;
        }
        let truth_fresh = cache.truth_fresh(now, self.truth_max_age);
        let rate_fresh = cache.rate_fresh(now, self.truth_max_age);
        if !truth_fresh && !rate_fresh {
            cache.filtered_valid = false;
            return;
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if cache.filtered_valid && rate_fresh {
            let step = dt.min(self.config.dt_cap_sec);
            cache.filtered_gap = wrap_gap(cache.filtered_gap + cache.rate * step, lap_time);
        }

        if truth_fresh {
            if cache.filtered_valid && cache.filtered_gap.is_finite() {
                let alpha = 1.0 - (-dt / self.config.tau_sec).exp();
                let innovation = wrap_gap(cache.truth_gap - cache.filtered_gap, lap_time);
                cache.filtered_gap = wrap_gap(cache.filtered_gap + alpha * innovation, lap_time);
            } else {
                cache.filtered_gap = cache.truth_gap;
            }
            cache.filtered_valid = true;
        }
    }

    /// Select the slot's gap source and apply the mismatch guard
    pub fn fuse(&self, cache: &mut GateGapCache, input: FuseInput) -> FusedGap {
        let FuseInput {
            direction,
            track_gap,
            lap_delta,
            now,
            lap_time,
        } = input;
        let truth_fresh = cache.truth_fresh(now, self.truth_max_age);
        let rate_fresh = cache.rate_fresh(now, self.truth_max_age);

        // (gate-space value, source)
        let picked = if cache.filtered_valid && (truth_fresh || rate_fresh) {
            Some((cache.filtered_gap, GapSource::Filtered))
        } else if truth_fresh {
            Some((cache.truth_gap, GapSource::Truth))
        } else if track_gap.is_finite() {
            None
        } else {
            cache
                .sticky(now, self.config.sticky_hold_sec)
                .map(|gap| (gap, GapSource::StickyHold))
        };

        let Some((gate_gap, source)) = picked else {
            return if track_gap.is_finite() {
                FusedGap {
                    gap: track_gap,
                    source: GapSource::Track,
                    mismatch: false,
                }
            } else {
                FusedGap::INVALID
            };
        };

        let gap = directional(gate_gap, direction, lap_time);
        if !gap.is_finite() {
            return FusedGap::INVALID;
        }

        let track_plausible =
            track_gap.is_finite() && track_gap.abs() <= self.config.mismatch_track_plausible_sec;
        if lap_delta == 0
            && track_plausible
            && (gap - track_gap).abs() > self.config.mismatch_threshold_sec
        {
            debug!(
                fused = gap,
                track = track_gap,
                source = ?source,
                "gate gap disagrees with track estimate, discarding gate cache"
            );
            cache.reset();
            return FusedGap {
                gap: track_gap,
                source: GapSource::Track,
                mismatch: true,
            };
        }

        if matches!(source, GapSource::Filtered | GapSource::Truth) {
            cache.published_gap = gate_gap;
            cache.published_time = now;
        }

        FusedGap {
            gap,
            source,
            mismatch: false,
        }
    }
}
