//! Checkpoint gate timing.
//!
//! Each lap is cut into [`CHECKPOINT_COUNT`] arc-length gates. The session
//! time and lap of every car's most recent crossing of every gate is kept
//! in fixed tables; comparing a car's crossing with the player's crossing
//! of the same gate yields the "truth" gap.
//!
//! Gate-space convention: a positive gap means the car passes a gate after
//! the player (car is behind), negative means before (car is ahead).

use contracts::{GateConfig, CHECKPOINT_COUNT, MAX_CARS};
use tracing::trace;

use crate::wrap::{lap_time_valid, wrap_gap};

/// Per-car gap cache shared by gate timing and the fusion filter
#[derive(Debug, Clone, Copy)]
pub struct GateGapCache {
    /// Last raw crossing difference before normalization
    pub raw_gap: f64,

    pub truth_gap: f64,
    pub truth_valid: bool,
    pub truth_time: f64,

    pub filtered_gap: f64,
    pub filtered_valid: bool,

    /// EMA of d(truth)/dt (s/s)
    pub rate: f64,
    pub rate_valid: bool,
    pub rate_time: f64,

    /// Last gap handed out from a gate source (sticky hold)
    pub published_gap: f64,
    pub published_time: f64,
}

impl Default for GateGapCache {
    fn default() -> Self {
        Self {
            raw_gap: f64::NAN,
            truth_gap: f64::NAN,
            truth_valid: false,
            truth_time: f64::NAN,
            filtered_gap: f64::NAN,
            filtered_valid: false,
            rate: 0.0,
            rate_valid: false,
            rate_time: f64::NAN,
            published_gap: f64::NAN,
            published_time: f64::NAN,
        }
    }
}

impl GateGapCache {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn truth_fresh(&self, now: f64, max_age: f64) -> bool {
        self.truth_valid && now - self.truth_time <= max_age
    }

    pub fn rate_fresh(&self, now: f64, max_age: f64) -> bool {
        self.rate_valid && now - self.rate_time <= max_age
    }

    /// Last published value if still within the hold window
    pub fn sticky(&self, now: f64, hold: f64) -> Option<f64> {
        let age = now - self.published_time;
        (self.published_gap.is_finite() && age.is_finite() && age <= hold)
            .then_some(self.published_gap)
    }
}

/// Last crossing of one gate
#[derive(Debug, Clone, Copy)]
struct GateStamp {
    time: f64,
    lap: i32,
}

const NO_STAMP: GateStamp = GateStamp {
    time: f64::NAN,
    lap: 0,
};

/// Gate crossing tables for every car plus their gap caches
#[derive(Debug)]
pub struct GateTimer {
    stamps: Box<[[GateStamp; CHECKPOINT_COUNT]; MAX_CARS]>,
    caches: Box<[GateGapCache; MAX_CARS]>,
    config: GateConfig,
}

impl GateTimer {
    pub fn new(config: GateConfig) -> Self {
        Self {
            stamps: Box::new([[NO_STAMP; CHECKPOINT_COUNT]; MAX_CARS]),
            caches: Box::new([GateGapCache::default(); MAX_CARS]),
            config,
        }
    }

    pub fn cache(&self, idx: usize) -> Option<&GateGapCache> {
        self.caches.get(idx)
    }

    pub fn cache_mut(&mut self, idx: usize) -> Option<&mut GateGapCache> {
        self.caches.get_mut(idx)
    }

    /// Discard every crossing stamp and gap cache
    pub fn reset(&mut self) {
        for row in self.stamps.iter_mut() {
            row.fill(NO_STAMP);
        }
        self.caches.fill(GateGapCache::default());
    }

    /// Time at which `idx` last crossed `gate`
    pub fn crossing_time(&self, idx: usize, gate: usize) -> Option<f64> {
        self.stamps
            .get(idx)
            .and_then(|row| row.get(gate))
            .map(|s| s.time)
            .filter(|t| t.is_finite())
    }

    /// Record that `idx` crossed `gate` at `now` on `lap`
    pub fn record(&mut self, idx: usize, gate: usize, now: f64, lap: i32) {
        if let Some(stamp) = self.stamps.get_mut(idx).and_then(|row| row.get_mut(gate)) {
            *stamp = GateStamp { time: now, lap };
        }
    }

    /// Derive a truth sample for `car` from its crossing of `gate`.
    ///
    /// Returns true when the car's cache received a new truth gap.
    pub fn update_truth(
        &mut self,
        car: usize,
        player: usize,
        gate: usize,
        lap_time: f64,
    ) -> bool {
        if car == player || car >= MAX_CARS || player >= MAX_CARS || gate >= CHECKPOINT_COUNT {
            return false;
        }
        if !lap_time_valid(lap_time) {
            return false;
        }
        let car_stamp = self.stamps[car][gate];
        let player_stamp = self.stamps[player][gate];
        if !car_stamp.time.is_finite() || !player_stamp.time.is_finite() {
            return false;
        }
        let lap_delta = car_stamp.lap - player_stamp.lap;
        if lap_delta.abs() > self.config.max_lap_delta {
            return false;
        }

        let raw = car_stamp.time - player_stamp.time;
        let truth = wrap_gap(raw - lap_delta as f64 * lap_time, lap_time);
        let now = car_stamp.time;

        let max_age = self.config.truth_max_age_sec;
        let alpha = self.config.rate_ema_alpha;
        let clamp = self.config.rate_clamp;
        let cache = &mut self.caches[car];

        if cache.truth_valid {
            let dt = now - cache.truth_time;
            if dt > 0.0 && dt <= max_age {
                let inst = (wrap_gap(truth - cache.truth_gap, lap_time) / dt).clamp(-clamp, clamp);
                cache.rate = if cache.rate_valid {
                    cache.rate + alpha * (inst - cache.rate)
                } else {
                    inst
                };
                cache.rate_valid = true;
                cache.rate_time = now;
            }
        }

        cache.raw_gap = raw;
        cache.truth_gap = truth;
        cache.truth_valid = true;
        cache.truth_time = now;
        trace!(car_idx = car, gate, raw, truth, lap_delta, "gate truth");
        true
    }
}
