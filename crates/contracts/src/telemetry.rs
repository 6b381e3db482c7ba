//! TelemetryFrame - per-tick input snapshot
//!
//! Raw per-car arrays as delivered by the host simulator each telemetry
//! frame, plus the raw code tables needed to interpret them.
//!
//! ## Time Model
//! - `session_time_sec` is the simulator's session clock (seconds since
//!   session start, f64) and is the only clock the engine uses

use serde::{Deserialize, Serialize};

/// Fixed car-index capacity of every per-car array.
pub const MAX_CARS: usize = 64;

/// Number of ranked slots ahead of the player.
pub const SLOTS_AHEAD: usize = 5;

/// Number of ranked slots behind the player.
pub const SLOTS_BEHIND: usize = 5;

/// Arc-length checkpoints ("gates") per lap.
pub const CHECKPOINT_COUNT: usize = 60;

/// Coarse track sectors used for hot/cool lap intent.
pub const SECTOR_COUNT: usize = 6;

/// Checkpoints per coarse sector.
pub const CHECKPOINTS_PER_SECTOR: usize = CHECKPOINT_COUNT / SECTOR_COUNT;

/// One telemetry tick for the whole field
///
/// Array fields are indexed by car index. Arrays shorter than
/// [`MAX_CARS`] (or empty) mean "not available" for the missing indices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Session clock (seconds)
    pub session_time_sec: f64,

    /// Raw session state code (see [`SessionState`])
    #[serde(default)]
    pub session_state: i32,

    /// Session type name as reported by the host ("Practice", "Race", ...)
    #[serde(default)]
    pub session_type_name: String,

    /// Session number within the event (-1 = unknown)
    #[serde(default = "default_session_num")]
    pub session_num: i32,

    /// Player car index (-1 = not in a car)
    pub player_car_idx: i32,

    /// Whether any opponent belongs to another class
    #[serde(default)]
    pub has_multi_class_opponents: bool,

    /// Lap distance fraction per car (0..1, negative = unavailable)
    #[serde(default)]
    pub lap_dist_pct: Vec<f32>,

    /// Current lap per car
    #[serde(default)]
    pub lap: Vec<i32>,

    /// Raw track surface category per car
    #[serde(default)]
    pub track_surface: Vec<i32>,

    /// Raw surface material id per car
    #[serde(default)]
    pub track_surface_material: Vec<i32>,

    /// Pit road flag per car
    #[serde(default)]
    pub on_pit_road: Vec<bool>,

    /// Per-car session flag bitmask
    #[serde(default)]
    pub session_flags: Vec<u32>,

    /// Per-car pace flag bitmask
    #[serde(default)]
    pub pace_flags: Vec<i32>,

    /// Player best lap (seconds, <= 0 = none)
    #[serde(default)]
    pub player_best_lap_sec: f64,

    /// Player last lap (seconds, <= 0 = none)
    #[serde(default)]
    pub player_last_lap_sec: f64,

    /// Session best-lap estimate (seconds)
    #[serde(default)]
    pub lap_time_estimate_sec: f64,

    /// Class-estimated lap time (seconds)
    #[serde(default)]
    pub class_est_lap_time_sec: f64,

    /// Gap beyond which a slot is flagged not relevant (<= 0 disables)
    #[serde(default)]
    pub not_relevant_gap_sec: f64,

    /// Host debug toggle
    #[serde(default)]
    pub debug_enabled: bool,
}

fn default_session_num() -> i32 {
    -1
}

impl TelemetryFrame {
    /// Player car index if it addresses a valid array slot
    pub fn player_index(&self) -> Option<usize> {
        usize::try_from(self.player_car_idx)
            .ok()
            .filter(|&idx| idx < MAX_CARS)
    }

    /// Lap distance fraction for `idx`, `None` if missing or out of range
    pub fn lap_pct(&self, idx: usize) -> Option<f64> {
        self.lap_dist_pct
            .get(idx)
            .map(|&p| p as f64)
            .filter(|p| p.is_finite() && (0.0..=1.0).contains(p))
    }

    /// Lap counter for `idx`
    pub fn lap_of(&self, idx: usize) -> Option<i32> {
        self.lap.get(idx).copied()
    }

    /// Normalized surface for `idx` (missing = not in world)
    pub fn surface(&self, idx: usize) -> TrackSurface {
        self.track_surface
            .get(idx)
            .map(|&raw| TrackSurface::from_raw(raw))
            .unwrap_or(TrackSurface::NotInWorld)
    }

    /// Raw material for `idx` (missing = undefined)
    pub fn material(&self, idx: usize) -> i32 {
        self.track_surface_material
            .get(idx)
            .copied()
            .unwrap_or(material::UNDEFINED)
    }

    /// Pit road flag for `idx`
    pub fn pit_road(&self, idx: usize) -> bool {
        self.on_pit_road.get(idx).copied().unwrap_or(false)
    }

    /// Session flags for `idx`
    pub fn flags(&self, idx: usize) -> u32 {
        self.session_flags.get(idx).copied().unwrap_or(0)
    }

    /// Pace flags for `idx`
    pub fn pace(&self, idx: usize) -> i32 {
        self.pace_flags.get(idx).copied().unwrap_or(0)
    }
}

/// Normalized track surface category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackSurface {
    /// Not in world, or the host's "unknown" sentinel
    #[default]
    NotInWorld,
    /// Off the racing surface
    OffTrack,
    /// In pit stall (or being towed)
    InPitStall,
    /// Pit lane / approaching pits
    PitLane,
    /// On the racing surface
    OnTrack,
}

impl TrackSurface {
    /// Map a raw surface code. Anything unrecognized is treated as not-in-world.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::OffTrack,
            1 => Self::InPitStall,
            2 => Self::PitLane,
            3 => Self::OnTrack,
            _ => Self::NotInWorld,
        }
    }

    pub fn in_world(self) -> bool {
        self != Self::NotInWorld
    }

    pub fn is_pit_area(self) -> bool {
        matches!(self, Self::InPitStall | Self::PitLane)
    }

    pub fn is_on_track(self) -> bool {
        self == Self::OnTrack
    }
}

/// Raw session state code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Invalid,
    GetInCar,
    Warmup,
    ParadeLaps,
    /// Green
    Racing,
    Checkered,
    CoolDown,
}

impl SessionState {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::GetInCar,
            2 => Self::Warmup,
            3 => Self::ParadeLaps,
            4 => Self::Racing,
            5 => Self::Checkered,
            6 => Self::CoolDown,
            _ => Self::Invalid,
        }
    }

    pub fn is_green(self) -> bool {
        self == Self::Racing
    }

    /// States before the green flag
    pub fn is_pre_green(self) -> bool {
        self < Self::Racing
    }
}

/// Per-car session flag bits
pub mod session_flags {
    pub const CHECKERED: u32 = 0x0000_0001;
    pub const GREEN: u32 = 0x0000_0004;
    pub const BLACK: u32 = 0x0001_0000;
    pub const DISQUALIFY: u32 = 0x0002_0000;
    pub const FURLED: u32 = 0x0008_0000;
    pub const REPAIR: u32 = 0x0010_0000;

    /// Flags that mark a car as compromised by penalty
    pub const PENALTY_MASK: u32 = BLACK | DISQUALIFY | FURLED | REPAIR;
}

/// Per-car pace flag bits
pub mod pace_flags {
    pub const END_OF_LINE: i32 = 0x01;
    pub const FREE_PASS: i32 = 0x02;
    pub const WAVED_AROUND: i32 = 0x04;
}

/// Raw surface material codes
pub mod material {
    pub const NOT_IN_WORLD: i32 = -1;
    pub const UNDEFINED: i32 = 0;
    pub const RUMBLE_FIRST: i32 = 11;
    pub const RUMBLE_LAST: i32 = 14;
    pub const GRASS_FIRST: i32 = 15;
    pub const GRASS_LAST: i32 = 18;
    pub const DIRT_FIRST: i32 = 19;
    pub const DIRT_LAST: i32 = 22;
    pub const SAND: i32 = 23;
    pub const GRAVEL_FIRST: i32 = 24;
    pub const GRAVEL_LAST: i32 = 25;
    pub const GRASSCRETE: i32 = 26;
    pub const ASTROTURF: i32 = 27;
}

/// Classification of a surface material for latch purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialClass {
    /// Paved racing surface, kerbs, paint
    Track,
    /// Loose surfaces that may or may not be track limits
    Suspect,
    /// Definitively off the circuit
    OffTrack,
    /// No material information
    Unknown,
}

impl MaterialClass {
    pub fn classify(raw: i32) -> Self {
        use material::*;
        match raw {
            GRASS_FIRST..=GRASS_LAST | DIRT_FIRST..=DIRT_LAST | SAND | GRAVEL_FIRST..=GRAVEL_LAST => {
                Self::OffTrack
            }
            GRASSCRETE | ASTROTURF => Self::Suspect,
            1..=RUMBLE_LAST => Self::Track,
            _ => Self::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_unknown_maps_to_not_in_world() {
        assert_eq!(TrackSurface::from_raw(-1), TrackSurface::NotInWorld);
        assert_eq!(TrackSurface::from_raw(42), TrackSurface::NotInWorld);
        assert!(TrackSurface::from_raw(1).is_pit_area());
        assert!(TrackSurface::from_raw(2).is_pit_area());
        assert!(TrackSurface::from_raw(3).is_on_track());
    }

    #[test]
    fn test_material_classes() {
        assert_eq!(MaterialClass::classify(1), MaterialClass::Track);
        assert_eq!(MaterialClass::classify(12), MaterialClass::Track);
        assert_eq!(MaterialClass::classify(16), MaterialClass::OffTrack);
        assert_eq!(MaterialClass::classify(23), MaterialClass::OffTrack);
        assert_eq!(MaterialClass::classify(26), MaterialClass::Suspect);
        assert_eq!(MaterialClass::classify(-1), MaterialClass::Unknown);
    }

    #[test]
    fn test_frame_accessors_bounds_checked() {
        let frame = TelemetryFrame {
            player_car_idx: 70,
            lap_dist_pct: vec![0.5, -1.0, f32::NAN],
            ..Default::default()
        };
        assert_eq!(frame.player_index(), None);
        assert_eq!(frame.lap_pct(0), Some(0.5));
        assert_eq!(frame.lap_pct(1), None);
        assert_eq!(frame.lap_pct(2), None);
        assert_eq!(frame.lap_pct(40), None);
        assert_eq!(frame.surface(40), TrackSurface::NotInWorld);
    }

    #[test]
    fn test_frame_json_defaults() {
        let frame: TelemetryFrame =
            serde_json::from_str(r#"{"session_time_sec": 1.5, "player_car_idx": 0}"#).unwrap();
        assert_eq!(frame.session_num, -1);
        assert!(frame.lap.is_empty());
    }

    #[test]
    fn test_session_state_green() {
        assert!(SessionState::from_raw(3).is_pre_green());
        assert!(SessionState::from_raw(4).is_green());
        assert!(!SessionState::from_raw(5).is_pre_green());
    }
}
