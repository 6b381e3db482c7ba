//! Per-car shadow state with debounced latches.
//!
//! One [`CarState`] per car index, updated in place every tick from the raw
//! telemetry arrays. Entries are reset, never destroyed.

use contracts::{
    session_flags, LatchConfig, MaterialClass, TelemetryFrame, TrackSurface, CHECKPOINT_COUNT,
    MAX_CARS,
};
use tracing::{debug, instrument};

use crate::latch::{Debounce, LatchState};
use crate::wrap::wrap_pct;

/// A checkpoint index change observed this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub from: usize,
    pub to: usize,
}

impl Crossing {
    /// Moved forward around the lap (including across the line)
    pub fn is_forward(self) -> bool {
        let steps = (self.to + CHECKPOINT_COUNT - self.from) % CHECKPOINT_COUNT;
        steps > 0 && steps < CHECKPOINT_COUNT / 2
    }
}

/// Shadow state of one car
#[derive(Debug, Clone, Copy)]
pub struct CarState {
    /// In world with a usable (or recently usable) relative position
    pub valid: bool,
    pub lap: Option<i32>,
    /// NaN when unavailable this tick
    pub lap_pct: f64,
    pub surface: TrackSurface,
    pub material: i32,
    pub on_pit_road: bool,
    pub session_flags: u32,
    pub pace_flags: i32,

    /// Signed lap-fraction delta to the player, wrapped into [-0.5, 0.5)
    pub delta_pct: f64,
    pub forward_dist_pct: f64,
    pub backward_dist_pct: f64,
    /// EMA of d(delta_pct)/dt (lap fractions per second)
    pub closing_rate_pct: f64,
    /// Whole laps ahead (+) or behind (-) the player
    pub lap_delta: i32,

    /// Off-track latch (`CompromisedUntilLap`)
    pub off_track: LatchState,
    /// Suspect-surface latch (`SuspectUntilLap`)
    pub suspect: LatchState,
    /// Out-lap latch (`OutLapUntilLap`)
    pub out_lap: LatchState,
    pub penalty_active: bool,
    /// Laps since last pit exit (-1 = unknown)
    pub laps_since_pit: i32,
    pub in_pit_area: bool,

    pub checkpoint: Option<usize>,
    pub crossed: Option<Crossing>,

    not_in_world_since: f64,
    last_relative_time: f64,
    prev_delta_pct: f64,
    prev_delta_time: f64,
}

impl Default for CarState {
    fn default() -> Self {
        Self {
            valid: false,
            lap: None,
            lap_pct: f64::NAN,
            surface: TrackSurface::NotInWorld,
            material: 0,
            on_pit_road: false,
            session_flags: 0,
            pace_flags: 0,
            delta_pct: f64::NAN,
            forward_dist_pct: f64::NAN,
            backward_dist_pct: f64::NAN,
            closing_rate_pct: f64::NAN,
            lap_delta: 0,
            off_track: LatchState::Inactive,
            suspect: LatchState::Inactive,
            out_lap: LatchState::Inactive,
            penalty_active: false,
            laps_since_pit: -1,
            in_pit_area: false,
            checkpoint: None,
            crossed: None,
            not_in_world_since: f64::NAN,
            last_relative_time: f64::NAN,
            prev_delta_pct: f64::NAN,
            prev_delta_time: f64::NAN,
        }
    }
}

impl CarState {
    pub fn current_lap(&self) -> i32 {
        self.lap.unwrap_or(0)
    }

    pub fn compromised_until_lap(&self) -> Option<i32> {
        self.off_track.until_lap()
    }

    pub fn suspect_until_lap(&self) -> Option<i32> {
        self.suspect.until_lap()
    }

    pub fn out_lap_until_lap(&self) -> Option<i32> {
        self.out_lap.until_lap()
    }

    pub fn off_track_latched(&self) -> bool {
        self.off_track.is_active(self.current_lap())
    }

    pub fn suspect_latched(&self) -> bool {
        self.suspect.is_active(self.current_lap())
    }

    pub fn out_lap_latched(&self) -> bool {
        self.out_lap.is_active(self.current_lap())
    }

    /// In pits by flag or by surface
    pub fn in_pits(&self) -> bool {
        self.on_pit_road || self.surface.is_pit_area()
    }

    pub fn clear_latches(&mut self) {
        self.off_track = LatchState::Inactive;
        self.suspect = LatchState::Inactive;
        self.out_lap = LatchState::Inactive;
        self.penalty_active = false;
    }

    fn invalidate_relative(&mut self) {
        self.delta_pct = f64::NAN;
        self.forward_dist_pct = f64::NAN;
        self.backward_dist_pct = f64::NAN;
        self.closing_rate_pct = f64::NAN;
        self.prev_delta_pct = f64::NAN;
        self.prev_delta_time = f64::NAN;
    }

    fn on_lap_advance(&mut self, new_lap: i32, laps: i32) {
        self.off_track = self.off_track.on_lap(new_lap);
        self.suspect = self.suspect.on_lap(new_lap);
        self.out_lap = self.out_lap.on_lap(new_lap);
        if self.laps_since_pit >= 0 {
            self.laps_since_pit = self.laps_since_pit.saturating_add(laps);
        }
    }
}

/// Checkpoint index for a lap fraction
pub fn checkpoint_index(lap_pct: f64) -> Option<usize> {
    if !lap_pct.is_finite() || lap_pct < 0.0 {
        return None;
    }
    let idx = (lap_pct * CHECKPOINT_COUNT as f64).floor() as usize;
    Some(idx.min(CHECKPOINT_COUNT - 1))
}

/// Arena of car states indexed by car index
#[derive(Debug)]
pub struct CarStateTracker {
    cars: [CarState; MAX_CARS],
    config: LatchConfig,
}

impl CarStateTracker {
    pub fn new(config: LatchConfig) -> Self {
        Self {
            cars: [CarState::default(); MAX_CARS],
            config,
        }
    }

    pub fn get(&self, idx: usize) -> Option<&CarState> {
        self.cars.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &CarState)> {
        self.cars.iter().enumerate()
    }

    pub fn reset(&mut self) {
        self.cars = [CarState::default(); MAX_CARS];
    }

    /// Clear every latch while keeping the ingested telemetry
    pub fn clear_latches(&mut self) {
        for car in self.cars.iter_mut() {
            car.clear_latches();
        }
    }

    fn debounce(&self) -> Debounce {
        Debounce {
            ticks: self.config.off_track_debounce_ticks,
            seconds: self.config.off_track_debounce_sec,
        }
    }

    /// Ingest one tick for every car.
    ///
    /// The player is processed first so relative fields of the other cars
    /// see the player's position from the same tick. With `latching` off,
    /// telemetry is still ingested but no latch is armed.
    #[instrument(
        level = "trace",
        name = "car_state_update",
        skip(self, frame),
        fields(t = frame.session_time_sec)
    )]
    pub fn update(&mut self, frame: &TelemetryFrame, player: Option<usize>, latching: bool) {
        let now = frame.session_time_sec;

        if let Some(p) = player {
            self.ingest(p, frame, now, latching);
        }
        for idx in 0..MAX_CARS {
            if Some(idx) != player {
                self.ingest(idx, frame, now, latching);
            }
        }

        let player_pos = player
            .map(|p| self.cars[p])
            .filter(|car| car.lap_pct.is_finite() && car.surface.in_world());

        for idx in 0..MAX_CARS {
            if Some(idx) == player {
                let car = &mut self.cars[idx];
                car.valid = player_pos.is_some();
                car.delta_pct = if car.valid { 0.0 } else { f64::NAN };
                car.forward_dist_pct = car.delta_pct;
                car.backward_dist_pct = car.delta_pct;
                car.lap_delta = 0;
                continue;
            }
            self.update_relative(idx, player_pos.as_ref(), now);
        }
    }

    fn ingest(&mut self, idx: usize, frame: &TelemetryFrame, now: f64, latching: bool) {
        let grace = self.config.not_in_world_grace_sec;
        let debounce = self.debounce();
        let car = &mut self.cars[idx];
        let surface = frame.surface(idx);
        car.crossed = None;

        if !surface.in_world() {
            if car.not_in_world_since.is_nan() {
                car.not_in_world_since = now;
            }
            if now - car.not_in_world_since > grace {
                if car.off_track.until_lap().is_some() || car.suspect.until_lap().is_some() {
                    debug!(car_idx = idx, "not in world past grace, clearing latches");
                }
                car.clear_latches();
                car.surface = TrackSurface::NotInWorld;
                car.lap_pct = f64::NAN;
                car.checkpoint = None;
                car.in_pit_area = false;
                car.valid = false;
                car.invalidate_relative();
                return;
            }
        } else {
            car.not_in_world_since = f64::NAN;
        }

        car.surface = surface;
        car.material = frame.material(idx);
        car.on_pit_road = frame.pit_road(idx);
        car.session_flags = frame.flags(idx);
        car.pace_flags = frame.pace(idx);

        if let Some(lap) = frame.lap_of(idx) {
            if let Some(prev) = car.lap {
                if lap > prev {
                    car.on_lap_advance(lap, lap - prev);
                }
            }
            car.lap = Some(lap);
        }

        match frame.lap_pct(idx) {
            Some(pct) => {
                car.lap_pct = pct;
                if let Some(cp) = checkpoint_index(pct) {
                    if let Some(prev) = car.checkpoint {
                        if prev != cp {
                            car.crossed = Some(Crossing { from: prev, to: cp });
                        }
                    }
                    car.checkpoint = Some(cp);
                }
            }
            None => car.lap_pct = f64::NAN,
        }

        let lap = car.current_lap();
        let pit_area = car.in_pits();

        if latching {
            car.penalty_active = car.session_flags & session_flags::PENALTY_MASK != 0;

            let in_world = surface.in_world();
            let material = MaterialClass::classify(car.material);
            let off_observed = in_world && !pit_area && material == MaterialClass::OffTrack;
            let suspect_observed =
                in_world && !pit_area && !off_observed && material == MaterialClass::Suspect;

            car.off_track = car.off_track.step(off_observed, now, lap, debounce);
            car.suspect = car.suspect.step(suspect_observed, now, lap, debounce);

            if car.in_pit_area && !pit_area && surface.is_on_track() {
                car.out_lap = LatchState::armed(lap);
                car.laps_since_pit = 0;
                debug!(car_idx = idx, lap, "pit exit, out lap armed");
            }
        } else {
            car.penalty_active = false;
            car.off_track = car.off_track.disarm_streak();
            car.suspect = car.suspect.disarm_streak();
        }

        car.in_pit_area = pit_area;
    }

    fn update_relative(&mut self, idx: usize, player: Option<&CarState>, now: f64) {
        let grace = self.config.lap_pct_grace_sec;
        let alpha = self.config.closing_rate_alpha;
        let car = &mut self.cars[idx];

        if !car.surface.in_world() {
            car.valid = false;
            car.invalidate_relative();
            return;
        }

        let player = match player {
            Some(p) if car.lap_pct.is_finite() => p,
            _ => {
                // Keep the last derived fields for a short grace window
                let age = now - car.last_relative_time;
                if !(age.is_finite() && age <= grace) {
                    car.invalidate_relative();
                }
                car.valid = car.delta_pct.is_finite();
                return;
            }
        };

        let raw = car.lap_pct - player.lap_pct;
        let delta = wrap_pct(raw);
        car.delta_pct = delta;
        car.forward_dist_pct = raw.rem_euclid(1.0);
        car.backward_dist_pct = (-raw).rem_euclid(1.0);

        car.lap_delta = match (car.lap, player.lap) {
            (Some(car_lap), Some(player_lap)) => {
                let progress = (car_lap as f64 + car.lap_pct) - (player_lap as f64 + player.lap_pct);
                (progress - delta).round() as i32
            }
            _ => 0,
        };

        let dt = now - car.prev_delta_time;
        if dt.is_finite() && dt > 0.0 && car.prev_delta_pct.is_finite() {
            let inst = wrap_pct(delta - car.prev_delta_pct) / dt;
            car.closing_rate_pct = if car.closing_rate_pct.is_finite() {
                car.closing_rate_pct + alpha * (inst - car.closing_rate_pct)
            } else {
                inst
            };
        }
        car.prev_delta_pct = delta;
        car.prev_delta_time = now;
        car.last_relative_time = now;
        car.valid = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::material;

    const PLAYER: usize = 0;
    const CAR: usize = 1;

    /// Two-car frame: player at `player_pct`, car 1 at `car_pct`
    fn frame(t: f64, player_pct: f32, car_pct: f32, car_material: i32) -> TelemetryFrame {
        TelemetryFrame {
            session_time_sec: t,
            player_car_idx: PLAYER as i32,
            lap_dist_pct: vec![player_pct, car_pct],
            lap: vec![5, 5],
            track_surface: vec![3, 3],
            track_surface_material: vec![1, car_material],
            on_pit_road: vec![false, false],
            session_flags: vec![0, 0],
            ..Default::default()
        }
    }

    fn tracker() -> CarStateTracker {
        CarStateTracker::new(LatchConfig::default())
    }

    #[test]
    fn test_off_track_two_ticks_no_latch_three_ticks_latch() {
        let mut t = tracker();
        let f = frame(10.0, 0.5, 0.6, material::GRASS_FIRST);

        t.update(&f, Some(PLAYER), true);
        t.update(&f, Some(PLAYER), true);
        assert!(!t.get(CAR).unwrap().off_track_latched());

        t.update(&f, Some(PLAYER), true);
        let car = t.get(CAR).unwrap();
        assert!(car.off_track_latched());
        assert_eq!(car.compromised_until_lap(), Some(6));
    }

    #[test]
    fn test_suspect_material_latches_separately() {
        let mut t = tracker();
        let f = frame(10.0, 0.5, 0.6, material::ASTROTURF);
        for _ in 0..3 {
            t.update(&f, Some(PLAYER), true);
        }
        let car = t.get(CAR).unwrap();
        assert!(car.suspect_latched());
        assert!(!car.off_track_latched());
    }

    #[test]
    fn test_off_track_surface_alone_does_not_latch() {
        let mut t = tracker();
        let mut f = frame(10.0, 0.5, 0.6, 1);
        f.track_surface = vec![3, 0];
        for _ in 0..3 {
            t.update(&f, Some(PLAYER), true);
            f.session_time_sec += 1.0 / 60.0;
        }
        let car = t.get(CAR).unwrap();
        assert!(!car.suspect_latched());
        assert!(!car.off_track_latched());
    }

    #[test]
    fn test_latch_clears_on_lap_advance() {
        let mut t = tracker();
        let mut f = frame(10.0, 0.5, 0.6, material::GRASS_FIRST);
        for _ in 0..3 {
            t.update(&f, Some(PLAYER), true);
        }
        f.track_surface_material = vec![1, 1];
        f.lap = vec![5, 6];
        f.lap_dist_pct = vec![0.5, 0.01];
        f.session_time_sec = 40.0;
        t.update(&f, Some(PLAYER), true);
        assert!(!t.get(CAR).unwrap().off_track_latched());
    }

    #[test]
    fn test_penalty_flag_is_immediate() {
        let mut t = tracker();
        let mut f = frame(10.0, 0.5, 0.6, 1);
        f.session_flags = vec![0, session_flags::BLACK];
        t.update(&f, Some(PLAYER), true);
        assert!(t.get(CAR).unwrap().penalty_active);
    }

    #[test]
    fn test_no_latching_while_gated() {
        let mut t = tracker();
        let mut f = frame(10.0, 0.5, 0.6, material::GRASS_FIRST);
        f.session_flags = vec![0, session_flags::REPAIR];
        for _ in 0..5 {
            t.update(&f, Some(PLAYER), false);
        }
        let car = t.get(CAR).unwrap();
        assert!(!car.off_track_latched());
        assert!(!car.penalty_active);
        assert!((car.lap_pct - 0.6).abs() < 1e-6, "ingestion continues");
    }

    #[test]
    fn test_pit_exit_arms_out_lap() {
        let mut t = tracker();
        let mut f = frame(10.0, 0.5, 0.1, 1);
        f.track_surface = vec![3, 2];
        f.on_pit_road = vec![false, true];
        t.update(&f, Some(PLAYER), true);
        assert!(t.get(CAR).unwrap().in_pits());

        f.track_surface = vec![3, 3];
        f.on_pit_road = vec![false, false];
        f.session_time_sec = 10.1;
        t.update(&f, Some(PLAYER), true);
        let car = t.get(CAR).unwrap();
        assert!(car.out_lap_latched());
        assert_eq!(car.laps_since_pit, 0);

        f.lap = vec![5, 6];
        f.lap_dist_pct = vec![0.5, 0.02];
        f.session_time_sec = 80.0;
        t.update(&f, Some(PLAYER), true);
        let car = t.get(CAR).unwrap();
        assert!(!car.out_lap_latched());
        assert_eq!(car.laps_since_pit, 1);
    }

    #[test]
    fn test_not_in_world_grace_clears_latches() {
        let mut t = tracker();
        let mut f = frame(10.0, 0.5, 0.6, material::GRASS_FIRST);
        for _ in 0..3 {
            t.update(&f, Some(PLAYER), true);
        }
        assert!(t.get(CAR).unwrap().off_track_latched());

        f.track_surface = vec![3, -1];
        f.session_time_sec = 11.0;
        t.update(&f, Some(PLAYER), true);
        assert!(t.get(CAR).unwrap().off_track_latched(), "inside grace");

        f.session_time_sec = 14.5;
        t.update(&f, Some(PLAYER), true);
        let car = t.get(CAR).unwrap();
        assert!(!car.off_track_latched());
        assert!(!car.valid);
    }

    #[test]
    fn test_relative_fields_and_lap_delta() {
        let mut t = tracker();
        let mut f = frame(10.0, 0.50, 0.55, 1);
        f.lap = vec![10, 11];
        t.update(&f, Some(PLAYER), true);
        let car = t.get(CAR).unwrap();
        assert!((car.delta_pct - 0.05).abs() < 1e-6);
        assert!((car.forward_dist_pct - 0.05).abs() < 1e-6);
        assert!((car.backward_dist_pct - 0.95).abs() < 1e-6);
        assert_eq!(car.lap_delta, 1);

        // Car just across the line behind the player is not a lap up
        let mut f = frame(10.0, 0.02, 0.98, 1);
        f.lap = vec![6, 5];
        t.update(&f, Some(PLAYER), true);
        let car = t.get(CAR).unwrap();
        assert!((car.delta_pct - -0.04).abs() < 1e-6);
        assert_eq!(car.lap_delta, 0);
    }

    #[test]
    fn test_pace_flags_stored() {
        let mut t = tracker();
        let mut f = frame(10.0, 0.50, 0.55, 1);
        f.pace_flags = vec![0, contracts::pace_flags::WAVED_AROUND];
        t.update(&f, Some(PLAYER), true);
        assert_eq!(t.get(CAR).unwrap().pace_flags, contracts::pace_flags::WAVED_AROUND);
    }

    #[test]
    fn test_missing_pct_grace_window() {
        let mut t = tracker();
        let mut f = frame(10.0, 0.5, 0.6, 1);
        t.update(&f, Some(PLAYER), true);

        f.lap_dist_pct = vec![0.5, -1.0];
        f.session_time_sec = 10.3;
        t.update(&f, Some(PLAYER), true);
        let car = t.get(CAR).unwrap();
        assert!(car.delta_pct.is_finite(), "retained inside grace");
        assert!(car.valid);

        f.session_time_sec = 10.7;
        t.update(&f, Some(PLAYER), true);
        let car = t.get(CAR).unwrap();
        assert!(car.delta_pct.is_nan());
        assert!(!car.valid);
    }

    #[test]
    fn test_checkpoint_crossing_detected() {
        let mut t = tracker();
        t.update(&frame(10.0, 0.5, 0.100, 1), Some(PLAYER), true);
        assert_eq!(t.get(CAR).unwrap().crossed, None);
        t.update(&frame(10.1, 0.5, 0.120, 1), Some(PLAYER), true);
        assert_eq!(
            t.get(CAR).unwrap().crossed,
            Some(Crossing { from: 6, to: 7 })
        );
        assert!(Crossing { from: 6, to: 7 }.is_forward());
        assert!(Crossing { from: 59, to: 0 }.is_forward());
        assert!(!Crossing { from: 7, to: 6 }.is_forward());
        assert_eq!(checkpoint_index(1.0), Some(CHECKPOINT_COUNT - 1));
        assert_eq!(checkpoint_index(f64::NAN), None);
    }
}
