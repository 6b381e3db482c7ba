//! Race-relevance status classification.
//!
//! [`classify`] is a pure, priority-ordered function of one car's latch,
//! lap and class facts; [`describe`] is the total mapping from a status to
//! its display text.

use contracts::{Direction, HotCoolIntent, StatusConfig, StatusE};

/// Class relationship of a car to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassRelation {
    Same,
    Faster,
    Slower,
    /// Different class without rank data
    Unranked,
}

impl ClassRelation {
    /// Compare two class ranks (lower is faster)
    pub fn from_ranks(car: Option<i32>, player: Option<i32>) -> Self {
        match (car, player) {
            (Some(c), Some(p)) if c < p => Self::Faster,
            (Some(c), Some(p)) if c > p => Self::Slower,
            (Some(_), Some(_)) => Self::Same,
            _ => Self::Unranked,
        }
    }
}

/// Inputs of the hot/cool override, present only when the override is allowed
#[derive(Debug, Clone, Copy)]
pub struct HotCoolInputs {
    /// Car's delta to its best lap at the last sector boundary this lap
    pub delta_to_best: Option<f64>,
    /// Closing rate (s/s, positive = gap shrinking)
    pub closing_rate: f64,
    /// Directional fused gap (seconds)
    pub gap_sec: f64,
    /// Remaining lap time of the car being caught
    pub target_remaining_sec: Option<f64>,
}

/// Facts the classifier needs about one car
#[derive(Debug, Clone, Copy)]
pub struct StatusInputs {
    pub valid: bool,
    pub on_track: bool,
    pub in_pits: bool,
    pub penalty: bool,
    pub off_track: bool,
    pub suspect: bool,
    pub out_lap: bool,
    pub lap_delta: i32,
    pub class: ClassRelation,
    pub direction: Direction,
    pub hot_cool: Option<HotCoolInputs>,
}

/// Classifier output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub status: StatusE,
    pub reason: &'static str,
    pub hot_cool: HotCoolIntent,
    pub conflict: bool,
}

impl Classification {
    const fn plain(status: StatusE, reason: &'static str) -> Self {
        Self {
            status,
            reason,
            hot_cool: HotCoolIntent::None,
            conflict: false,
        }
    }

    /// Forced output while the session gate is closed
    pub const fn gated(reason: &'static str) -> Self {
        Self::plain(StatusE::Unknown, reason)
    }
}

/// Priority-ordered classification, first match wins
pub fn classify(input: &StatusInputs, config: &StatusConfig) -> Classification {
    let base = base_status(input);
    if base.status.is_hard() {
        return base;
    }
    match input.hot_cool {
        Some(hc) => apply_hot_cool(base, input.direction, &hc, config),
        None => base,
    }
}

fn base_status(input: &StatusInputs) -> Classification {
    use Classification as C;

    if input.in_pits {
        return C::plain(StatusE::InPits, "pit");
    }
    if input.penalty {
        return C::plain(StatusE::CompromisedPenalty, "penalty");
    }
    if input.off_track {
        return C::plain(StatusE::CompromisedOffTrack, "off_track");
    }
    if input.suspect {
        return C::plain(StatusE::SuspectInvalid, "suspect");
    }
    if !input.valid || !input.on_track {
        return C::plain(StatusE::Unknown, "invalid");
    }
    if input.out_lap {
        return C::plain(StatusE::OutLap, "out_lap");
    }
    if input.lap_delta > 0 {
        return C::plain(StatusE::LappingYou, "lapping_you");
    }
    if input.lap_delta < 0 {
        return C::plain(StatusE::BeingLapped, "being_lapped");
    }
    match input.class {
        ClassRelation::Same => C::plain(StatusE::Racing, "same_class"),
        ClassRelation::Faster => C::plain(StatusE::FasterClass, "class_rank"),
        ClassRelation::Slower => C::plain(StatusE::SlowerClass, "class_rank"),
        ClassRelation::Unranked => match input.direction {
            Direction::Behind => C::plain(StatusE::FasterClass, "class_pos_fallback"),
            _ => C::plain(StatusE::SlowerClass, "class_pos_fallback"),
        },
    }
}

/// Lap intent from the delta to best and the closing rate
pub fn hot_cool_intent(
    delta_to_best: Option<f64>,
    closing_rate: f64,
    direction: Direction,
    config: &StatusConfig,
) -> HotCoolIntent {
    let Some(delta) = delta_to_best.filter(|d| d.is_finite()) else {
        return HotCoolIntent::None;
    };
    if delta <= config.hot_delta_sec {
        HotCoolIntent::Hot
    } else if delta > config.cool_delta_sec {
        HotCoolIntent::Cool
    } else if direction == Direction::Behind && closing_rate >= config.closing_rate_threshold {
        HotCoolIntent::Hot
    } else {
        HotCoolIntent::Neutral
    }
}

/// Whether the catch happens before the target finishes its lap
pub fn hot_cool_conflict(inputs: &HotCoolInputs, config: &StatusConfig) -> bool {
    let gap = inputs.gap_sec.abs();
    let closing_fast = inputs.closing_rate >= config.closing_rate_threshold;
    if !closing_fast || gap.is_nan() || gap == 0.0 {
        return false;
    }
    let Some(remaining) = inputs.target_remaining_sec else {
        return false;
    };
    gap / inputs.closing_rate <= remaining
}

fn apply_hot_cool(
    base: Classification,
    direction: Direction,
    inputs: &HotCoolInputs,
    config: &StatusConfig,
) -> Classification {
    let intent = hot_cool_intent(inputs.delta_to_best, inputs.closing_rate, direction, config);
    let conflict = hot_cool_conflict(inputs, config);

    let (status, reason) = match intent {
        HotCoolIntent::Hot if conflict && direction == Direction::Behind => {
            (StatusE::HotlapWarning, "hot_conflict")
        }
        HotCoolIntent::Hot => (StatusE::HotlapCaution, "hot"),
        HotCoolIntent::Cool if conflict && direction == Direction::Ahead => {
            (StatusE::CoolLapWarning, "cool_conflict")
        }
        HotCoolIntent::Cool => (StatusE::CoolLapCaution, "cool"),
        HotCoolIntent::Neutral | HotCoolIntent::None => (base.status, base.reason),
    };

    Classification {
        status,
        reason,
        hot_cool: intent,
        conflict,
    }
}

/// Display text for a status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusText {
    pub short: String,
    pub long: String,
}

/// What the display text depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextKey {
    status: StatusE,
    lap_delta: i32,
    direction: Direction,
}

impl TextKey {
    pub fn new(status: StatusE, lap_delta: i32, direction: Direction) -> Self {
        // Lap delta only shows up in the lapping texts
        let lap_delta = if status.is_lapping() { lap_delta } else { 0 };
        Self {
            status,
            lap_delta,
            direction,
        }
    }
}

/// Total mapping from status to display text
pub fn describe(status: StatusE, lap_delta: i32, direction: Direction) -> StatusText {
    let side = match direction {
        Direction::Ahead => "ahead",
        Direction::Behind => "behind",
        Direction::Player => "you",
    };
    let laps = lap_delta.unsigned_abs();
    let plural = if laps == 1 { "" } else { "s" };

    let (short, long) = match status {
        StatusE::Unknown => (String::new(), String::new()),
        StatusE::InPits => ("PIT".into(), "In pits".into()),
        StatusE::CompromisedPenalty => ("PEN".into(), "Penalty / repair".into()),
        StatusE::CompromisedOffTrack => ("OFF".into(), "Off track this lap".into()),
        StatusE::SuspectInvalid => ("SUS".into(), "Lap may be invalid".into()),
        StatusE::OutLap => ("OUT".into(), "Out lap".into()),
        StatusE::LappingYou => (
            format!("+{laps}L"),
            format!("Lapping you, {laps} lap{plural} up ({side})"),
        ),
        StatusE::BeingLapped => (
            format!("-{laps}L"),
            format!("Being lapped, {laps} lap{plural} down ({side})"),
        ),
        StatusE::Racing => ("RACE".into(), format!("Racing ({side})")),
        StatusE::FasterClass => ("FAST".into(), format!("Faster class ({side})")),
        StatusE::SlowerClass => ("SLOW".into(), format!("Slower class ({side})")),
        StatusE::HotlapWarning => ("HOT!".into(), "Hot lap closing, let by".into()),
        StatusE::HotlapCaution => ("HOT".into(), format!("Hot lap ({side})")),
        StatusE::CoolLapWarning => ("COOL!".into(), "Cool lap ahead, safe to pass".into()),
        StatusE::CoolLapCaution => ("COOL".into(), format!("Cool lap ({side})")),
    };
    StatusText { short, long }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn racing(direction: Direction) -> StatusInputs {
        StatusInputs {
            valid: true,
            on_track: true,
            in_pits: false,
            penalty: false,
            off_track: false,
            suspect: false,
            out_lap: false,
            lap_delta: 0,
            class: ClassRelation::Same,
            direction,
            hot_cool: None,
        }
    }

    fn status_of(input: &StatusInputs) -> StatusE {
        classify(input, &StatusConfig::default()).status
    }

    #[test]
    fn test_pit_beats_off_track() {
        let input = StatusInputs {
            in_pits: true,
            off_track: true,
            ..racing(Direction::Ahead)
        };
        let c = classify(&input, &StatusConfig::default());
        assert_eq!(c.status, StatusE::InPits);
        assert_eq!(c.reason, "pit");
    }

    #[test]
    fn test_priority_chain() {
        let mut input = StatusInputs {
            penalty: true,
            off_track: true,
            suspect: true,
            valid: false,
            out_lap: true,
            lap_delta: 1,
            ..racing(Direction::Ahead)
        };
        assert_eq!(status_of(&input), StatusE::CompromisedPenalty);
        input.penalty = false;
        assert_eq!(status_of(&input), StatusE::CompromisedOffTrack);
        input.off_track = false;
        assert_eq!(status_of(&input), StatusE::SuspectInvalid);
        input.suspect = false;
        assert_eq!(status_of(&input), StatusE::Unknown);
        input.valid = true;
        assert_eq!(status_of(&input), StatusE::OutLap);
        input.out_lap = false;
        assert_eq!(status_of(&input), StatusE::LappingYou);
        input.lap_delta = 0;
        assert_eq!(status_of(&input), StatusE::Racing);
    }

    #[test]
    fn test_lap_delta_statuses() {
        let lapping = StatusInputs {
            lap_delta: 1,
            ..racing(Direction::Behind)
        };
        assert_eq!(status_of(&lapping), StatusE::LappingYou);
        let lapped = StatusInputs {
            lap_delta: -1,
            ..racing(Direction::Ahead)
        };
        assert_eq!(status_of(&lapped), StatusE::BeingLapped);
    }

    #[test]
    fn test_class_rank_and_fallback() {
        assert_eq!(ClassRelation::from_ranks(Some(1), Some(2)), ClassRelation::Faster);
        assert_eq!(ClassRelation::from_ranks(Some(3), Some(2)), ClassRelation::Slower);
        assert_eq!(ClassRelation::from_ranks(None, Some(2)), ClassRelation::Unranked);

        let ahead = StatusInputs {
            class: ClassRelation::Unranked,
            ..racing(Direction::Ahead)
        };
        let c = classify(&ahead, &StatusConfig::default());
        assert_eq!(c.status, StatusE::SlowerClass);
        assert_eq!(c.reason, "class_pos_fallback");

        let behind = StatusInputs {
            class: ClassRelation::Unranked,
            ..racing(Direction::Behind)
        };
        assert_eq!(status_of(&behind), StatusE::FasterClass);
    }

    #[test]
    fn test_intent_thresholds() {
        let cfg = StatusConfig::default();
        assert_eq!(hot_cool_intent(Some(0.1), 0.0, Direction::Ahead, &cfg), HotCoolIntent::Hot);
        assert_eq!(hot_cool_intent(Some(0.8), 0.0, Direction::Ahead, &cfg), HotCoolIntent::Cool);
        assert_eq!(
            hot_cool_intent(Some(0.3), 0.0, Direction::Behind, &cfg),
            HotCoolIntent::Neutral
        );
        assert_eq!(hot_cool_intent(Some(0.3), 0.2, Direction::Behind, &cfg), HotCoolIntent::Hot);
        assert_eq!(hot_cool_intent(None, 0.2, Direction::Behind, &cfg), HotCoolIntent::None);
    }

    #[test]
    fn test_hot_conflict_behind_warns() {
        let input = StatusInputs {
            hot_cool: Some(HotCoolInputs {
                delta_to_best: Some(-0.1),
                closing_rate: 0.5,
                gap_sec: -2.0,
                target_remaining_sec: Some(30.0),
            }),
            ..racing(Direction::Behind)
        };
        let c = classify(&input, &StatusConfig::default());
        assert_eq!(c.status, StatusE::HotlapWarning);
        assert!(c.conflict);
        assert_eq!(c.hot_cool, HotCoolIntent::Hot);

        // Catch needs 40s but only 30s remain
        let mut slow = input;
        slow.hot_cool = Some(HotCoolInputs {
            closing_rate: 0.05,
            ..input.hot_cool.unwrap()
        });
        assert_eq!(status_of(&slow), StatusE::HotlapCaution);
    }

    #[test]
    fn test_cool_conflict_ahead_warns() {
        let input = StatusInputs {
            hot_cool: Some(HotCoolInputs {
                delta_to_best: Some(2.0),
                closing_rate: 1.0,
                gap_sec: 3.0,
                target_remaining_sec: Some(50.0),
            }),
            ..racing(Direction::Ahead)
        };
        assert_eq!(status_of(&input), StatusE::CoolLapWarning);
    }

    #[test]
    fn test_hard_status_not_overridden() {
        let input = StatusInputs {
            out_lap: true,
            hot_cool: Some(HotCoolInputs {
                delta_to_best: Some(-1.0),
                closing_rate: 1.0,
                gap_sec: -1.0,
                target_remaining_sec: Some(50.0),
            }),
            ..racing(Direction::Behind)
        };
        assert_eq!(status_of(&input), StatusE::OutLap);
    }

    #[test]
    fn test_describe_is_total() {
        let all = [
            StatusE::Unknown,
            StatusE::InPits,
            StatusE::CompromisedPenalty,
            StatusE::CompromisedOffTrack,
            StatusE::SuspectInvalid,
            StatusE::OutLap,
            StatusE::LappingYou,
            StatusE::BeingLapped,
            StatusE::Racing,
            StatusE::FasterClass,
            StatusE::SlowerClass,
            StatusE::HotlapWarning,
            StatusE::HotlapCaution,
            StatusE::CoolLapWarning,
            StatusE::CoolLapCaution,
        ];
        for status in all {
            let text = describe(status, 1, Direction::Ahead);
            if status != StatusE::Unknown {
                assert!(!text.short.is_empty(), "{status:?} has no short text");
            }
        }
        assert_eq!(describe(StatusE::LappingYou, 2, Direction::Behind).short, "+2L");
        assert_eq!(describe(StatusE::BeingLapped, -1, Direction::Ahead).short, "-1L");
    }

    #[test]
    fn test_text_key_ignores_lap_delta_outside_lapping() {
        assert_eq!(
            TextKey::new(StatusE::Racing, 0, Direction::Ahead),
            TextKey::new(StatusE::Racing, 3, Direction::Ahead)
        );
        assert_ne!(
            TextKey::new(StatusE::LappingYou, 1, Direction::Ahead),
            TextKey::new(StatusE::LappingYou, 2, Direction::Ahead)
        );
    }
}
