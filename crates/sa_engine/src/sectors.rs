//! Per-car sector splits used for hot/cool lap intent.
//!
//! Sector boundaries sit on every [`CHECKPOINTS_PER_SECTOR`]-th gate. At
//! each boundary the elapsed lap time is compared with the car's best
//! clean lap split at the same boundary.

use contracts::{CHECKPOINT_COUNT, CHECKPOINTS_PER_SECTOR, MAX_CARS, SECTOR_COUNT};

use crate::car_state::Crossing;

/// Sector timing state of one car
#[derive(Debug, Clone, Copy)]
pub struct SectorTiming {
    lap_start: f64,
    clean: bool,
    splits: [f64; SECTOR_COUNT],
    best_lap: f64,
    best_splits: [f64; SECTOR_COUNT],
    delta: f64,
    delta_time: f64,
}

impl Default for SectorTiming {
    fn default() -> Self {
        Self {
            lap_start: f64::NAN,
            clean: false,
            splits: [f64::NAN; SECTOR_COUNT],
            best_lap: f64::NAN,
            best_splits: [f64::NAN; SECTOR_COUNT],
            delta: f64::NAN,
            delta_time: f64::NAN,
        }
    }
}

impl SectorTiming {
    pub fn best_lap(&self) -> Option<f64> {
        self.best_lap.is_finite().then_some(self.best_lap)
    }

    /// Delta to best recorded during the current lap
    pub fn delta_to_best(&self) -> Option<f64> {
        (self.delta.is_finite() && self.delta_time >= self.lap_start).then_some(self.delta)
    }

    /// Best-lap time remaining from the given lap fraction
    pub fn remaining_lap_time(&self, lap_pct: f64) -> Option<f64> {
        let best = self.best_lap()?;
        lap_pct
            .is_finite()
            .then(|| best * (1.0 - lap_pct.clamp(0.0, 1.0)))
    }

    fn boundary_crossed(&mut self, sector: usize, now: f64) {
        if !self.lap_start.is_finite() {
            return;
        }
        let elapsed = now - self.lap_start;
        if let Some(split) = self.splits.get_mut(sector) {
            *split = elapsed;
        }
        if let Some(best) = self.best_splits.get(sector).filter(|b| b.is_finite()) {
            self.delta = elapsed - best;
            self.delta_time = now;
        }
    }

    fn lap_completed(&mut self, now: f64) {
        if self.lap_start.is_finite() && self.clean {
            let lap_time = now - self.lap_start;
            let complete = self.splits[1..].iter().all(|s| s.is_finite());
            if complete && lap_time > 0.0 && (self.best_lap.is_nan() || lap_time < self.best_lap) {
                self.best_lap = lap_time;
                self.best_splits = self.splits;
                self.best_splits[0] = 0.0;
            }
        }
        self.lap_start = now;
        self.clean = true;
        self.splits = [f64::NAN; SECTOR_COUNT];
    }
}

/// Sector timing arena indexed by car
#[derive(Debug)]
pub struct SectorTracker {
    cars: [SectorTiming; MAX_CARS],
}

impl Default for SectorTracker {
    fn default() -> Self {
        Self {
            cars: [SectorTiming::default(); MAX_CARS],
        }
    }
}

impl SectorTracker {
    pub fn get(&self, idx: usize) -> Option<&SectorTiming> {
        self.cars.get(idx)
    }

    pub fn reset(&mut self) {
        self.cars = [SectorTiming::default(); MAX_CARS];
    }

    /// A pit visit or off-track excursion spoils the current lap
    pub fn mark_dirty(&mut self, idx: usize) {
        if let Some(car) = self.cars.get_mut(idx) {
            car.clean = false;
        }
    }

    /// Feed one checkpoint crossing
    pub fn on_crossing(&mut self, idx: usize, crossing: Crossing, now: f64) {
        let Some(car) = self.cars.get_mut(idx) else {
            return;
        };
        let Crossing { from, to } = crossing;

        if to < from && from - to > CHECKPOINT_COUNT / 2 {
            car.lap_completed(now);
            // A jump straight past the first boundary of the new lap
            if to >= CHECKPOINTS_PER_SECTOR {
                car.boundary_crossed(to / CHECKPOINTS_PER_SECTOR, now);
            }
            return;
        }

        if to > from && to / CHECKPOINTS_PER_SECTOR > from / CHECKPOINTS_PER_SECTOR {
            car.boundary_crossed(to / CHECKPOINTS_PER_SECTOR, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAR: usize = 2;

    /// Drive one lap of `lap_time` seconds through every gate starting at `t0`
    fn run_lap(tracker: &mut SectorTracker, t0: f64, lap_time: f64, dirty: bool) -> f64 {
        let step = lap_time / CHECKPOINT_COUNT as f64;
        for gate in 1..CHECKPOINT_COUNT {
            tracker.on_crossing(CAR, Crossing { from: gate - 1, to: gate }, t0 + step * gate as f64);
            if dirty && gate == 25 {
                tracker.mark_dirty(CAR);
            }
        }
        let end = t0 + lap_time;
        tracker.on_crossing(
            CAR,
            Crossing {
                from: CHECKPOINT_COUNT - 1,
                to: 0,
            },
            end,
        );
        end
    }

    fn start(tracker: &mut SectorTracker) {
        tracker.on_crossing(CAR, Crossing { from: 59, to: 0 }, 0.0);
    }

    #[test]
    fn test_clean_lap_sets_best() {
        let mut tracker = SectorTracker::default();
        start(&mut tracker);
        run_lap(&mut tracker, 0.0, 90.0, false);
        let best = tracker.get(CAR).unwrap().best_lap().unwrap();
        assert!((best - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_lap_without_start_is_ignored() {
        let mut tracker = SectorTracker::default();
        run_lap(&mut tracker, 0.0, 90.0, false);
        assert!(tracker.get(CAR).unwrap().best_lap().is_none());
    }

    #[test]
    fn test_dirty_lap_never_sets_best() {
        let mut tracker = SectorTracker::default();
        start(&mut tracker);
        let t = run_lap(&mut tracker, 0.0, 90.0, false);
        run_lap(&mut tracker, t, 80.0, true);
        let best = tracker.get(CAR).unwrap().best_lap().unwrap();
        assert!((best - 90.0).abs() < 1e-9, "dirty 80s lap leaked: {best}");
    }

    #[test]
    fn test_delta_to_best_at_sector_boundary() {
        let mut tracker = SectorTracker::default();
        start(&mut tracker);
        let t = run_lap(&mut tracker, 0.0, 90.0, false);
        assert!(tracker.get(CAR).unwrap().delta_to_best().is_none());

        // First sector at 87s pace
        let step = 87.0 / CHECKPOINT_COUNT as f64;
        for gate in 1..=CHECKPOINTS_PER_SECTOR {
            tracker.on_crossing(CAR, Crossing { from: gate - 1, to: gate }, t + step * gate as f64);
        }
        let delta = tracker.get(CAR).unwrap().delta_to_best().unwrap();
        // Best split at S1 was 15.0s, now 14.5s
        assert!((delta - -0.5).abs() < 1e-9, "got {delta}");
    }

    #[test]
    fn test_remaining_lap_time() {
        let mut tracker = SectorTracker::default();
        start(&mut tracker);
        run_lap(&mut tracker, 0.0, 90.0, false);
        let timing = tracker.get(CAR).unwrap();
        assert!((timing.remaining_lap_time(0.25).unwrap() - 67.5).abs() < 1e-9);
        assert!(timing.remaining_lap_time(f64::NAN).is_none());
    }
}
