//! Debounced latch state machine.
//!
//! `Inactive -> Arming(streak, first_seen) -> Active(until_lap)`. A latch
//! is active while the car's lap is below `until_lap`; it is cleared on the
//! lap advance that reaches it.

/// Debounce thresholds: whichever is reached first arms the latch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Debounce {
    pub ticks: u32,
    pub seconds: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum LatchState {
    #[default]
    Inactive,
    Arming {
        streak: u32,
        first_seen: f64,
    },
    Active {
        until_lap: i32,
    },
}

impl LatchState {
    /// Armed immediately, without debounce
    pub fn armed(lap: i32) -> Self {
        Self::Active { until_lap: lap + 1 }
    }

    /// Transition for one observation.
    ///
    /// While active and still observed, `until_lap` only moves forward.
    pub fn step(self, observed: bool, now: f64, lap: i32, debounce: Debounce) -> Self {
        match (self, observed) {
            (Self::Active { until_lap }, true) => Self::Active {
                until_lap: until_lap.max(lap + 1),
            },
            (Self::Active { .. }, false) => self,
            (_, false) => Self::Inactive,
            (Self::Inactive, true) => Self::arm(1, now, now, lap, debounce),
            (Self::Arming { streak, first_seen }, true) => {
                Self::arm(streak.saturating_add(1), first_seen, now, lap, debounce)
            }
        }
    }

    fn arm(streak: u32, first_seen: f64, now: f64, lap: i32, debounce: Debounce) -> Self {
        if streak >= debounce.ticks || now - first_seen >= debounce.seconds {
            Self::armed(lap)
        } else {
            Self::Arming { streak, first_seen }
        }
    }

    /// Drop the latch once `lap` reaches `until_lap`
    pub fn on_lap(self, lap: i32) -> Self {
        match self {
            Self::Active { until_lap } if until_lap <= lap => Self::Inactive,
            other => other,
        }
    }

    /// Abandon any streak in progress, keeping an armed latch
    pub fn disarm_streak(self) -> Self {
        match self {
            Self::Arming { .. } => Self::Inactive,
            other => other,
        }
    }

    pub fn is_active(self, lap: i32) -> bool {
        matches!(self, Self::Active { until_lap } if lap < until_lap)
    }

    pub fn until_lap(self) -> Option<i32> {
        match self {
            Self::Active { until_lap } => Some(until_lap),
            _ => None,
        }
    }

    pub fn streak(self) -> u32 {
        match self {
            Self::Arming { streak, .. } => streak,
            _ => 0,
        }
    }
}
