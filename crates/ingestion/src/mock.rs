//! Synthetic multi-car session
//!
//! Deterministic for a given seed, for tests and demos without a recorded
//! trace. Cars lap at slightly different paces; some of them take an
//! occasional off-track excursion or a pit stop.

use contracts::{
    material, CarIdentity, TelemetryFrame, TelemetrySource, MAX_CARS,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, trace};

use crate::error::{IngestionError, Result};

/// Synthetic field parameters
#[derive(Debug, Clone)]
pub struct MockFieldConfig {
    /// Number of cars including the player (car 0)
    pub cars: usize,

    pub seed: u64,

    pub tick_hz: f64,

    /// Reference lap time (seconds)
    pub lap_time_sec: f64,

    /// Relative pace spread around the reference lap time
    pub pace_spread: f64,

    pub session_type: String,

    /// Session clock of the first frame
    pub start_time_sec: f64,

    /// Chance per car and lap of an off-track excursion
    pub off_track_chance: f64,

    /// Chance per car and lap of a pit stop
    pub pit_chance: f64,

    /// Split the field into two classes
    pub multi_class: bool,
}

impl Default for MockFieldConfig {
    fn default() -> Self {
        Self {
            cars: 12,
            seed: 7,
            tick_hz: 60.0,
            lap_time_sec: 90.0,
            pace_spread: 0.02,
            session_type: "Race".to_string(),
            start_time_sec: 60.0,
            off_track_chance: 0.1,
            pit_chance: 0.05,
            multi_class: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Excursion {
    None,
    /// Off the circuit until the given lap fraction
    OffTrack { until_pct: f64 },
    /// On pit road until the given session time
    Pit { until: f64 },
}

#[derive(Debug, Clone)]
struct MockCar {
    /// Lap fractions per second
    speed: f64,
    pct: f64,
    lap: i32,
    excursion: Excursion,
    /// Lap fraction where this lap's event starts, if any
    event_at: Option<(f64, bool)>,
}

/// Deterministic synthetic telemetry source
#[derive(Debug)]
pub struct MockField {
    config: MockFieldConfig,
    rng: StdRng,
    cars: Vec<MockCar>,
    time: f64,
    dt: f64,
    best_lap: f64,
}

impl MockField {
    pub fn new(config: MockFieldConfig) -> Result<Self> {
        if config.cars == 0 || config.cars > MAX_CARS {
            return Err(IngestionError::InvalidMock {
                message: format!("cars must be in 1..={MAX_CARS}, got {}", config.cars),
            });
        }
        if !(config.tick_hz > 0.0 && config.tick_hz.is_finite()) {
            return Err(IngestionError::InvalidMock {
                message: format!("tick_hz must be > 0, got {}", config.tick_hz),
            });
        }
        if !(config.lap_time_sec > 1.0 && config.lap_time_sec.is_finite()) {
            return Err(IngestionError::InvalidMock {
                message: format!("lap_time_sec must be > 1, got {}", config.lap_time_sec),
            });
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        let spread = config.pace_spread.abs();
        let cars = (0..config.cars)
            .map(|i| {
                let factor = 1.0 + rng.random_range(-spread..=spread);
                MockCar {
                    speed: 1.0 / (config.lap_time_sec * factor),
                    // Spread the field around the lap, player first
                    pct: (i as f64 / config.cars as f64 + 0.5).fract(),
                    lap: 1,
                    excursion: Excursion::None,
                    event_at: None,
                }
            })
            .collect();

        debug!(cars = config.cars, seed = config.seed, "mock field created");
        Ok(Self {
            dt: 1.0 / config.tick_hz,
            time: config.start_time_sec,
            best_lap: -1.0,
            rng,
            cars,
            config,
        })
    }

    /// Identity of every car in the field
    pub fn roster(&self) -> Vec<CarIdentity> {
        (0..self.cars.len())
            .map(|idx| {
                let (class_name, class_color) = if self.config.multi_class && idx % 3 == 2 {
                    ("GT4", "0x53ff77")
                } else {
                    ("GT3", "0xffda59")
                };
                CarIdentity {
                    car_idx: idx,
                    car_number: (idx + 1).to_string(),
                    driver_name: format!("Driver {}", idx + 1),
                    class_name: class_name.to_string(),
                    class_color: class_color.to_string(),
                    irating: 1500 + (idx as i32 * 137) % 1800,
                }
            })
            .collect()
    }

    fn plan_lap(&mut self, idx: usize) {
        let roll: f64 = self.rng.random();
        let (off, pit) = (self.config.off_track_chance, self.config.pit_chance);
        let event = if idx != 0 && roll < pit {
            // Pit stops happen around the start/finish line
            Some((0.93, true))
        } else if roll < pit + off {
            Some((self.rng.random_range(0.1..0.8), false))
        } else {
            None
        };
        if let Some(car) = self.cars.get_mut(idx) {
            car.event_at = event;
        }
    }

    fn advance(&mut self) {
        let now = self.time;
        for idx in 0..self.cars.len() {
            let dt = self.dt;
            let car = &mut self.cars[idx];
            let slow = match car.excursion {
                Excursion::None => 1.0,
                Excursion::OffTrack { .. } => 0.6,
                Excursion::Pit { .. } => 0.25,
            };
            let prev = car.pct;
            car.pct += car.speed * slow * dt;
            let wrapped = car.pct >= 1.0;
            if wrapped {
                car.pct -= 1.0;
                car.lap += 1;
            }

            car.excursion = match car.excursion {
                Excursion::OffTrack { until_pct } if car.pct >= until_pct || wrapped => {
                    Excursion::None
                }
                Excursion::Pit { until } if now >= until => Excursion::None,
                other => other,
            };
            if let (Excursion::None, Some((at, pit))) = (car.excursion, car.event_at) {
                if prev < at && car.pct >= at {
                    car.event_at = None;
                    car.excursion = if pit {
                        Excursion::Pit { until: now + 25.0 }
                    } else {
                        Excursion::OffTrack {
                            until_pct: (at + 0.01).min(0.999),
                        }
                    };
                    trace!(car_idx = idx, pit, "mock excursion");
                }
            }

            if wrapped {
                if idx == 0 && self.best_lap < 0.0 {
                    self.best_lap = 1.0 / self.cars[0].speed;
                }
                self.plan_lap(idx);
            }
        }
        self.time += self.dt;
    }

    fn frame(&self) -> TelemetryFrame {
        let n = self.cars.len();
        let mut frame = TelemetryFrame {
            session_time_sec: self.time,
            session_state: 4,
            session_type_name: self.config.session_type.clone(),
            session_num: 0,
            player_car_idx: 0,
            has_multi_class_opponents: self.config.multi_class,
            lap_dist_pct: Vec::with_capacity(n),
            lap: Vec::with_capacity(n),
            track_surface: Vec::with_capacity(n),
            track_surface_material: Vec::with_capacity(n),
            on_pit_road: Vec::with_capacity(n),
            session_flags: vec![0; n],
            pace_flags: vec![0; n],
            player_best_lap_sec: self.best_lap,
            lap_time_estimate_sec: self.config.lap_time_sec,
            class_est_lap_time_sec: self.config.lap_time_sec,
            ..Default::default()
        };
        for car in &self.cars {
            let (surface, mat, pit) = match car.excursion {
                Excursion::None => (3, 1, false),
                Excursion::OffTrack { .. } => (0, material::GRASS_FIRST, false),
                Excursion::Pit { .. } => (2, 1, true),
            };
            frame.lap_dist_pct.push(car.pct as f32);
            frame.lap.push(car.lap);
            frame.track_surface.push(surface);
            frame.track_surface_material.push(mat);
            frame.on_pit_road.push(pit);
        }
        frame
    }
}

impl TelemetrySource for MockField {
    fn name(&self) -> &str {
        "mock"
    }

    fn next_frame(&mut self) -> Option<TelemetryFrame> {
        let frame = self.frame();
        self.advance();
        Some(frame)
    }

    fn tick_hz(&self) -> Option<f64> {
        Some(self.config.tick_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_frames() {
        let config = MockFieldConfig {
            off_track_chance: 0.5,
            ..Default::default()
        };
        let mut a = MockField::new(config.clone()).unwrap();
        let mut b = MockField::new(config).unwrap();
        for _ in 0..600 {
            let (fa, fb) = (a.next_frame().unwrap(), b.next_frame().unwrap());
            assert_eq!(fa.lap_dist_pct, fb.lap_dist_pct);
            assert_eq!(fa.track_surface, fb.track_surface);
        }
    }

    #[test]
    fn test_frames_shape_and_clock() {
        let mut field = MockField::new(MockFieldConfig {
            cars: 5,
            tick_hz: 10.0,
            ..Default::default()
        })
        .unwrap();
        let first = field.next_frame().unwrap();
        let second = field.next_frame().unwrap();
        assert_eq!(first.lap_dist_pct.len(), 5);
        assert_eq!(first.player_index(), Some(0));
        assert!((second.session_time_sec - first.session_time_sec - 0.1).abs() < 1e-9);
        assert!(first.lap_dist_pct.iter().all(|p| (0.0..1.0).contains(p)));
        assert_eq!(field.tick_hz(), Some(10.0));
    }

    #[test]
    fn test_laps_advance() {
        let mut field = MockField::new(MockFieldConfig {
            cars: 2,
            tick_hz: 10.0,
            lap_time_sec: 20.0,
            ..Default::default()
        })
        .unwrap();
        let last = (0..500).filter_map(|_| field.next_frame()).last().unwrap();
        assert!(last.lap[0] >= 2, "lap {}", last.lap[0]);
        assert!(last.player_best_lap_sec > 0.0);
    }

    #[test]
    fn test_roster_classes() {
        let field = MockField::new(MockFieldConfig {
            cars: 6,
            multi_class: true,
            ..Default::default()
        })
        .unwrap();
        let roster = field.roster();
        assert_eq!(roster.len(), 6);
        assert_eq!(roster[2].class_name, "GT4");
        assert_eq!(roster[0].class_name, "GT3");
        assert_eq!(roster[5].car_number, "6");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = MockField::new(MockFieldConfig {
            cars: 0,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, IngestionError::InvalidMock { .. }));
        assert!(MockField::new(MockFieldConfig {
            cars: MAX_CARS + 1,
            ..Default::default()
        })
        .is_err());
    }
}
