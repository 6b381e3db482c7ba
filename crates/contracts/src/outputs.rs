//! SaOutputs - engine output snapshot
//!
//! Ranked ahead/behind slots annotated with fused gaps and a classified
//! race-relevance status.

use serde::{Deserialize, Serialize};

use crate::{SLOTS_AHEAD, SLOTS_BEHIND};

/// Race-relevance status (closed set)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusE {
    #[default]
    Unknown,
    InPits,
    CompromisedPenalty,
    CompromisedOffTrack,
    SuspectInvalid,
    OutLap,
    LappingYou,
    BeingLapped,
    Racing,
    FasterClass,
    SlowerClass,
    HotlapWarning,
    HotlapCaution,
    CoolLapWarning,
    CoolLapCaution,
}

impl StatusE {
    /// Statuses from the latch/validity tier that hot/cool never overrides
    pub fn is_hard(self) -> bool {
        matches!(
            self,
            Self::Unknown
                | Self::InPits
                | Self::CompromisedPenalty
                | Self::CompromisedOffTrack
                | Self::SuspectInvalid
                | Self::OutLap
        )
    }

    pub fn is_lapping(self) -> bool {
        matches!(self, Self::LappingYou | Self::BeingLapped)
    }
}

/// Which source produced a slot's fused gap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapSource {
    /// Forward-predicted gate gap
    Filtered,
    /// Fresh gate-crossing gap
    Truth,
    /// Track-position estimate
    Track,
    /// Last published value held briefly
    StickyHold,
    #[default]
    Invalid,
}

/// Relative position of a slot to the player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Ahead,
    Behind,
    /// The player's own slot
    Player,
}

/// Hotlap intent of a car
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotCoolIntent {
    #[default]
    None,
    Neutral,
    Hot,
    Cool,
}

/// One ranked position bound to at most one car
#[derive(Debug, Clone, Serialize)]
pub struct Slot {
    /// Bound car index (None = empty)
    pub car_idx: Option<usize>,

    pub direction: Direction,

    /// Forward distance fraction from the player (0..1)
    pub forward_dist_pct: f64,

    /// Backward distance fraction from the player (0..1)
    pub backward_dist_pct: f64,

    /// Track-position gap estimate (seconds, directional)
    pub gap_track_sec: f64,

    /// Fused relative gap (seconds): ahead >= 0, behind <= 0
    pub gap_rel_sec: f64,

    pub gap_source: GapSource,

    /// Closing rate (s/s, positive = gap shrinking)
    pub closing_rate_raw: f64,
    pub closing_rate_smoothed: f64,

    /// Whole laps the car is ahead (+) or behind (-) the player
    pub lap_delta: i32,

    /// Laps since last pit exit (-1 = unknown)
    pub laps_since_pit: i32,

    pub pace_flags: i32,

    // Identity
    pub car_number: String,
    pub driver_name: String,
    pub class_name: String,
    pub class_color: String,
    pub irating: i32,

    // Classification
    pub status: StatusE,
    pub status_reason: &'static str,
    pub status_short: String,
    pub status_long: String,
    pub hot_cool: HotCoolIntent,
    pub hot_cool_conflict: bool,
    pub relevant: bool,

    /// External fight context text
    pub fight_text: String,

    /// Session time until which an info burst is shown
    pub info_burst_until: f64,

    /// Session time until which a message burst is shown
    pub message_burst_until: f64,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            car_idx: None,
            direction: Direction::Ahead,
            forward_dist_pct: f64::NAN,
            backward_dist_pct: f64::NAN,
            gap_track_sec: f64::NAN,
            gap_rel_sec: f64::NAN,
            gap_source: GapSource::Invalid,
            closing_rate_raw: f64::NAN,
            closing_rate_smoothed: f64::NAN,
            lap_delta: 0,
            laps_since_pit: -1,
            pace_flags: 0,
            car_number: String::new(),
            driver_name: String::new(),
            class_name: String::new(),
            class_color: String::new(),
            irating: 0,
            status: StatusE::Unknown,
            status_reason: "unknown",
            status_short: String::new(),
            status_long: String::new(),
            hot_cool: HotCoolIntent::None,
            hot_cool_conflict: false,
            relevant: true,
            fight_text: String::new(),
            info_burst_until: f64::NAN,
            message_burst_until: f64::NAN,
        }
    }
}

impl Slot {
    /// Empty slot facing `direction`
    pub fn empty(direction: Direction) -> Self {
        Self {
            direction,
            ..Default::default()
        }
    }

    pub fn is_bound(&self) -> bool {
        self.car_idx.is_some()
    }

    /// Reset every cached field, keeping only the slot's direction
    pub fn clear(&mut self) {
        *self = Self::empty(self.direction);
    }
}

/// Per-tick diagnostics
#[derive(Debug, Clone, Default, Serialize)]
pub struct SaDebug {
    pub session_time_sec: f64,
    pub tick: u64,
    pub lap_time_used_sec: f64,
    pub valid_cars: usize,
    pub ahead_candidates: usize,
    pub behind_candidates: usize,
    pub gate_truth_updates: u32,
    pub mismatch_fallbacks: u32,
    pub rebinds: u32,
    pub session_resets: u64,
    /// Session gate decision ("open", "suppressed", "off")
    pub session_gate: &'static str,
}

/// Read-only engine output
#[derive(Debug, Clone, Serialize)]
pub struct SaOutputs {
    pub ahead: [Slot; SLOTS_AHEAD],
    pub behind: [Slot; SLOTS_BEHIND],
    pub player: Slot,
    pub valid: bool,
    pub irating_sof: Option<f64>,
    pub debug: SaDebug,
}

impl Default for SaOutputs {
    fn default() -> Self {
        Self {
            ahead: std::array::from_fn(|_| Slot::empty(Direction::Ahead)),
            behind: std::array::from_fn(|_| Slot::empty(Direction::Behind)),
            player: Slot::empty(Direction::Player),
            valid: false,
            irating_sof: None,
            debug: SaDebug::default(),
        }
    }
}

impl SaOutputs {
    /// All ahead then behind slots
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.ahead.iter().chain(self.behind.iter())
    }
}
