//! Session policy gate.
//!
//! Decides each tick whether latching and classification run, and detects
//! session-identity changes that require a full reset.

use contracts::{SessionConfig, SessionState, TelemetryFrame};
use tracing::{debug, info};

/// Session type family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Practice,
    Qualify,
    Race,
    /// Configured as switched off
    HardOff,
    Unrecognized,
}

impl SessionKind {
    pub fn from_name(name: &str, hard_off: &[String]) -> Self {
        let trimmed = name.trim();
        if hard_off.iter().any(|t| t.eq_ignore_ascii_case(trimmed)) {
            return Self::HardOff;
        }
        let lower = trimmed.to_ascii_lowercase();
        if lower.contains("race") {
            Self::Race
        } else if lower.contains("qualif") {
            Self::Qualify
        } else if lower.contains("practice") || lower.contains("warmup") || lower.contains("testing")
        {
            Self::Practice
        } else {
            Self::Unrecognized
        }
    }

    /// Practice-like sessions where hot/cool lap intent matters
    pub fn is_lapping_session(self) -> bool {
        matches!(self, Self::Practice | Self::Qualify)
    }
}

/// Per-tick gate decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Open,
    /// Temporarily suppressed (session start or race before green)
    Suppressed,
    /// Switched off for this session type
    Off,
}

impl GateDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Suppressed => "suppressed",
            Self::Off => "off",
        }
    }

    /// Status reason forced onto every slot while not open
    pub fn reason(self) -> &'static str {
        match self {
            Self::Open => "",
            Self::Suppressed => "sess_suppress",
            Self::Off => "gated",
        }
    }

    pub fn is_open(self) -> bool {
        self == Self::Open
    }
}

/// Why the engine state was reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetCause {
    TypeChange,
    BackwardTime,
    SessionNum,
}

impl ResetCause {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TypeChange => "type_change",
            Self::BackwardTime => "backward_time",
            Self::SessionNum => "session_num",
        }
    }
}

/// Outcome of one policy evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTick {
    pub kind: SessionKind,
    pub state: SessionState,
    pub decision: GateDecision,
    pub reset: Option<ResetCause>,
    /// Race went from pre-green to green this tick
    pub entered_green: bool,
    /// Decision differs from the previous tick
    pub transition: bool,
}

impl SessionTick {
    pub fn hot_cool_allowed(&self) -> bool {
        self.decision.is_open() && self.kind.is_lapping_session() && self.state.is_green()
    }
}

/// Session policy state carried between ticks
#[derive(Debug)]
pub struct SessionPolicy {
    config: SessionConfig,
    last_type: Option<String>,
    last_time: f64,
    last_num: i32,
    last_state: Option<SessionState>,
    last_decision: Option<GateDecision>,
}

impl SessionPolicy {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            last_type: None,
            last_time: f64::NAN,
            last_num: -1,
            last_state: None,
            last_decision: None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.config));
    }

    pub fn evaluate(&mut self, frame: &TelemetryFrame) -> SessionTick {
        let now = frame.session_time_sec;
        let state = SessionState::from_raw(frame.session_state);
        let kind = SessionKind::from_name(&frame.session_type_name, &self.config.hard_off_session_types);

        let reset = self.detect_reset(frame);
        if let Some(cause) = reset {
            info!(
                cause = cause.as_str(),
                session_type = %frame.session_type_name,
                session_num = frame.session_num,
                t = now,
                "session reset"
            );
            self.last_state = None;
        }

        let decision = match kind {
            SessionKind::HardOff | SessionKind::Unrecognized => GateDecision::Off,
            SessionKind::Practice | SessionKind::Qualify
                if now < self.config.practice_suppress_sec =>
            {
                GateDecision::Suppressed
            }
            SessionKind::Race if state.is_pre_green() => GateDecision::Suppressed,
            _ => GateDecision::Open,
        };

        let entered_green = kind == SessionKind::Race
            && state.is_green()
            && self.last_state.is_some_and(|s| s.is_pre_green());

        let transition = self.last_decision.is_some_and(|d| d != decision);
        if transition {
            debug!(
                from = self.last_decision.map(GateDecision::as_str),
                to = decision.as_str(),
                "session gate transition"
            );
        }

        if self.last_type.as_deref() != Some(frame.session_type_name.as_str()) {
            self.last_type = Some(frame.session_type_name.clone());
        }
        self.last_time = now;
        if frame.session_num >= 0 {
            self.last_num = frame.session_num;
        }
        self.last_state = Some(state);
        self.last_decision = Some(decision);

        SessionTick {
            kind,
            state,
            decision,
            reset,
            entered_green,
            transition,
        }
    }

    fn detect_reset(&self, frame: &TelemetryFrame) -> Option<ResetCause> {
        let last_type = self.last_type.as_deref()?;
        if last_type != frame.session_type_name {
            return Some(ResetCause::TypeChange);
        }
        if frame.session_time_sec < self.last_time - self.config.backward_jump_tolerance_sec {
            return Some(ResetCause::BackwardTime);
        }
        if self.last_num >= 0 && frame.session_num >= 0 && frame.session_num != self.last_num {
            return Some(ResetCause::SessionNum);
        }
        None
    }
}
