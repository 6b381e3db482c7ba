//! Identity and externally-owned opponent context
//!
//! Both are produced outside the engine and only read by it.

use serde::{Deserialize, Serialize};

/// Per-car identity from the session roster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarIdentity {
    /// Car index this entry describes
    pub car_idx: usize,
    pub car_number: String,
    pub driver_name: String,
    #[serde(default)]
    pub class_name: String,
    /// Class color as reported by the host (e.g. "0xffda59")
    #[serde(default)]
    pub class_color: String,
    #[serde(default)]
    pub irating: i32,
}

/// One opponent entry of the external opponents module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpponentEntry {
    pub car_number: String,
    #[serde(default)]
    pub class_color: String,
    #[serde(default)]
    pub name: String,
    /// Informational "fight" summary (e.g. "+0.3s/lap, catch in 4L")
    #[serde(default)]
    pub fight_summary: String,
}

/// Read-only opponents snapshot owned by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpponentOutputs {
    #[serde(default)]
    pub ahead: Vec<OpponentEntry>,
    #[serde(default)]
    pub behind: Vec<OpponentEntry>,
}

impl OpponentOutputs {
    /// Find the entry describing a car.
    ///
    /// Matches by car number first, then by class color + name.
    pub fn find(&self, car_number: &str, class_color: &str, name: &str) -> Option<&OpponentEntry> {
        let all = || self.ahead.iter().chain(self.behind.iter());
        if !car_number.is_empty() {
            if let Some(entry) = all().find(|e| e.car_number == car_number) {
                return Some(entry);
            }
        }
        if name.is_empty() {
            return None;
        }
        all().find(|e| e.name == name && e.class_color.eq_ignore_ascii_case(class_color))
    }
}
