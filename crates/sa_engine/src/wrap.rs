//! Lap-wrapping helpers for gaps and lap fractions.

use contracts::Direction;

/// Whether `lap_time` can be used as a wrapping scale
#[inline]
pub fn lap_time_valid(lap_time: f64) -> bool {
    lap_time.is_finite() && lap_time > 0.0
}

/// Wrap a gap into `[-lap_time / 2, lap_time / 2)`.
///
/// Returns the input unchanged when `lap_time` is unusable.
#[inline]
pub fn wrap_gap(gap: f64, lap_time: f64) -> f64 {
    if !gap.is_finite() || !lap_time_valid(lap_time) {
        return gap;
    }
    let half = 0.5 * lap_time;
    (gap + half).rem_euclid(lap_time) - half
}

/// Wrap a lap-fraction difference into `[-0.5, 0.5)`
#[inline]
pub fn wrap_pct(delta: f64) -> f64 {
    if !delta.is_finite() {
        return delta;
    }
    (delta + 0.5).rem_euclid(1.0) - 0.5
}

/// Map a gate-space gap to the slot's directional convention.
///
/// Ahead gaps are non-negative, behind gaps non-positive; the player's own
/// slot is always zero.
#[inline]
pub fn directional(gap: f64, direction: Direction, lap_time: f64) -> f64 {
    if !gap.is_finite() {
        return f64::NAN;
    }
    let wrapped = wrap_gap(gap, lap_time);
    match direction {
        Direction::Ahead => wrapped.abs(),
        Direction::Behind => -wrapped.abs(),
        Direction::Player => 0.0,
    }
}

/// Select the lap-time scale: player best, then session estimate, then
/// class estimate. NaN when none is usable.
pub fn select_lap_time(player_best: f64, session_estimate: f64, class_estimate: f64) -> f64 {
    [player_best, session_estimate, class_estimate]
        .into_iter()
        .find(|&t| lap_time_valid(t))
        .unwrap_or(f64::NAN)
}
