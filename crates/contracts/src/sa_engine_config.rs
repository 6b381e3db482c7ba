//! SA engine tuning contracts that can be shared across crates.
//!
//! Every debounce threshold, filter constant, hysteresis factor and grace
//! window the engine uses lives here so tests and tuning profiles can run
//! with non-default values.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Complete engine tuning
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct SaEngineConfig {
    /// Car state latch/debounce configuration
    #[serde(default)]
    #[validate(nested)]
    pub latch: LatchConfig,

    /// Checkpoint gate timing configuration
    #[serde(default)]
    #[validate(nested)]
    pub gate: GateConfig,

    /// Gap fusion filter configuration
    #[serde(default)]
    #[validate(nested)]
    pub filter: FilterConfig,

    /// Slot assignment configuration
    #[serde(default)]
    #[validate(nested)]
    pub slots: SlotConfig,

    /// Status classification configuration
    #[serde(default)]
    #[validate(nested)]
    pub status: StatusConfig,

    /// Session policy configuration
    #[serde(default)]
    #[validate(nested)]
    pub session: SessionConfig,
}

/// Car state tracker latches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LatchConfig {
    /// Consecutive ticks of off-track material before latching
    #[validate(range(min = 1, max = 1000))]
    pub off_track_debounce_ticks: u32,

    /// Seconds since first observation before latching
    #[validate(range(min = 0.0, max = 10.0))]
    pub off_track_debounce_sec: f64,

    /// Not-in-world time after which a car's latches are cleared
    #[validate(range(min = 0.0, max = 60.0))]
    pub not_in_world_grace_sec: f64,

    /// How long derived fields survive a missing lap fraction
    #[validate(range(min = 0.0, max = 10.0))]
    pub lap_pct_grace_sec: f64,

    /// EMA factor for the per-car track-position closing rate
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub closing_rate_alpha: f64,
}

impl Default for LatchConfig {
    fn default() -> Self {
        Self {
            off_track_debounce_ticks: 3,
            off_track_debounce_sec: 0.25,
            not_in_world_grace_sec: 3.0,
            lap_pct_grace_sec: 0.5,
            closing_rate_alpha: 0.35,
        }
    }
}

/// Checkpoint gate timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GateConfig {
    /// Maximum age of a truth sample to count as fresh
    #[validate(range(exclusive_min = 0.0, max = 60.0))]
    pub truth_max_age_sec: f64,

    /// EMA factor for the truth-to-truth rate
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub rate_ema_alpha: f64,

    /// Clamp for the instantaneous rate (s/s)
    #[validate(range(exclusive_min = 0.0, max = 100.0))]
    pub rate_clamp: f64,

    /// Largest lap difference between two crossings still compared
    #[validate(range(min = 0, max = 100))]
    pub max_lap_delta: i32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            truth_max_age_sec: 2.5,
            rate_ema_alpha: 0.35,
            rate_clamp: 8.0,
            max_lap_delta: 3,
        }
    }
}

/// Gap fusion filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FilterConfig {
    /// Correction time constant
    #[validate(range(exclusive_min = 0.0, max = 60.0))]
    pub tau_sec: f64,

    /// Prediction step cap
    #[validate(range(exclusive_min = 0.0, max = 5.0))]
    pub dt_cap_sec: f64,

    /// How long the last published gap may be reused
    #[validate(range(min = 0.0, max = 10.0))]
    pub sticky_hold_sec: f64,

    /// Disagreement with the track estimate that discards gate caches
    #[validate(range(exclusive_min = 0.0, max = 60.0))]
    pub mismatch_threshold_sec: f64,

    /// Track estimates beyond this are not trusted for the mismatch check
    #[validate(range(exclusive_min = 0.0, max = 600.0))]
    pub mismatch_track_plausible_sec: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            tau_sec: 0.80,
            dt_cap_sec: 0.10,
            sticky_hold_sec: 0.25,
            mismatch_threshold_sec: 2.0,
            mismatch_track_plausible_sec: 20.0,
        }
    }
}

/// Slot assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SlotConfig {
    /// A challenger must be closer than `current * factor` to displace
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub hysteresis_factor: f64,

    /// Exclusion band around exactly half a lap
    #[validate(range(min = 0.0, exclusive_max = 0.5))]
    pub half_lap_deadband: f64,

    /// Skip cars on pit road when building candidates
    pub exclude_pit_road: bool,

    /// EMA factor for the displayed closing rate
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub closing_rate_smoothing_alpha: f64,

    /// Info burst length after fight context changes
    #[validate(range(min = 0.0, max = 60.0))]
    pub info_burst_sec: f64,

    /// Message burst length after an alerting status change
    #[validate(range(min = 0.0, max = 60.0))]
    pub message_burst_sec: f64,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            hysteresis_factor: 0.90,
            half_lap_deadband: 0.05,
            exclude_pit_road: false,
            closing_rate_smoothing_alpha: 0.30,
            info_burst_sec: 3.0,
            message_burst_sec: 5.0,
        }
    }
}

/// Status classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StatusConfig {
    /// Delta to best at or below which a lap is "hot"
    #[validate(range(min = -10.0, max = 10.0))]
    pub hot_delta_sec: f64,

    /// Delta to best above which a lap is "cool"
    #[validate(range(min = -10.0, max = 30.0))]
    pub cool_delta_sec: f64,

    /// Closing rate considered "closing fast" (s/s)
    #[validate(range(min = 0.0, max = 10.0))]
    pub closing_rate_threshold: f64,

    /// Hot/cool overrides only apply within this gap
    #[validate(range(min = 0.0, max = 120.0))]
    pub hotlap_max_gap_sec: f64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            hot_delta_sec: 0.20,
            cool_delta_sec: 0.50,
            closing_rate_threshold: 0.10,
            hotlap_max_gap_sec: 10.0,
        }
    }
}

/// Session policy gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SessionConfig {
    /// Practice/qualify session age below which classification is suppressed
    #[validate(range(min = 0.0, max = 600.0))]
    pub practice_suppress_sec: f64,

    /// Backward session-time steps smaller than this are ignored
    #[validate(range(min = 0.0, max = 60.0))]
    pub backward_jump_tolerance_sec: f64,

    /// Session types for which SA is switched off entirely
    pub hard_off_session_types: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            practice_suppress_sec: 5.0,
            backward_jump_tolerance_sec: 0.5,
            hard_off_session_types: vec!["Lone Qualify".to_string(), "Time Trial".to_string()],
        }
    }
}
