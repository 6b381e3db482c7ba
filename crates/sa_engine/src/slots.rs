//! Slot assignment with hysteresis.
//!
//! Candidates are kept in insertion-sorted fixed-size arrays so a tick
//! never allocates. Assignment is a pure function of the current
//! occupants, the candidate lists and an occupant distance lookup.

use contracts::{SlotConfig, MAX_CARS, SLOTS_AHEAD, SLOTS_BEHIND};

use crate::car_state::CarStateTracker;

/// A car eligible for a slot list with its distance in lap fractions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub car_idx: usize,
    pub dist: f64,
}

const NO_CANDIDATE: Candidate = Candidate {
    car_idx: usize::MAX,
    dist: f64::INFINITY,
};

/// Nearest-N list, sorted ascending by distance
#[derive(Debug, Clone, Copy)]
pub struct TopN<const N: usize> {
    items: [Candidate; N],
    len: usize,
}

impl<const N: usize> Default for TopN<N> {
    fn default() -> Self {
        Self {
            items: [NO_CANDIDATE; N],
            len: 0,
        }
    }
}

impl<const N: usize> TopN<N> {
    /// Insert keeping order; the farthest entry falls off when full
    pub fn push(&mut self, candidate: Candidate) {
        if !candidate.dist.is_finite() || N == 0 {
            return;
        }
        let pos = self.items[..self.len].partition_point(|c| c.dist <= candidate.dist);
        if pos >= N {
            return;
        }
        let end = self.len.min(N - 1);
        self.items.copy_within(pos..end, pos + 1);
        self.items[pos] = candidate;
        self.len = (self.len + 1).min(N);
    }

    pub fn as_slice(&self) -> &[Candidate] {
        &self.items[..self.len]
    }
}

/// Bitset over car indices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CarMask(u64);

impl CarMask {
    pub fn insert(&mut self, idx: usize) {
        if idx < MAX_CARS {
            self.0 |= 1 << idx;
        }
    }

    pub fn contains(self, idx: usize) -> bool {
        idx < MAX_CARS && self.0 & (1 << idx) != 0
    }

    pub fn count(self) -> usize {
        self.0.count_ones() as usize
    }
}

/// Candidate lists for both directions
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    pub ahead: TopN<SLOTS_AHEAD>,
    pub behind: TopN<SLOTS_BEHIND>,
    /// Every car eligible ahead, not only the nearest N
    pub ahead_eligible: CarMask,
    pub behind_eligible: CarMask,
}

impl CandidateSet {
    /// Rebuild from the car state arena
    pub fn rebuild(&mut self, cars: &CarStateTracker, player: Option<usize>, config: &SlotConfig) {
        *self = Self::default();
        let Some(player) = player else {
            return;
        };
        let limit = 0.5 - config.half_lap_deadband;

        for (idx, car) in cars.iter() {
            if idx == player || !car.valid || !car.surface.in_world() {
                continue;
            }
            if config.exclude_pit_road && car.in_pits() {
                continue;
            }
            let delta = car.delta_pct;
            if !delta.is_finite() || delta.abs() >= limit {
                continue;
            }
            if delta >= 0.0 {
                self.ahead_eligible.insert(idx);
                self.ahead.push(Candidate {
                    car_idx: idx,
                    dist: car.forward_dist_pct,
                });
            } else {
                self.behind_eligible.insert(idx);
                self.behind.push(Candidate {
                    car_idx: idx,
                    dist: car.backward_dist_pct,
                });
            }
        }
    }
}

/// Per-slot assignment outcome
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotDecision {
    /// Empty before and after
    Vacant,
    /// Same car, refreshed distance
    Keep { car_idx: usize, dist: f64 },
    /// A different car now occupies the slot
    Rebind {
        car_idx: usize,
        dist: f64,
        previous: Option<usize>,
    },
    /// Occupant dropped with no replacement
    Release { previous: usize },
}

impl SlotDecision {
    pub fn car_idx(self) -> Option<usize> {
        match self {
            Self::Keep { car_idx, .. } | Self::Rebind { car_idx, .. } => Some(car_idx),
            Self::Vacant | Self::Release { .. } => None,
        }
    }

    /// Whether the slot's cached state must be reset
    pub fn is_rebind(self) -> bool {
        matches!(self, Self::Rebind { .. } | Self::Release { .. })
    }
}

/// Assign one slot list.
///
/// An occupant that is still an unused candidate is kept. Any other
/// occupant is displaced only by a free candidate closer than
/// `dist * hysteresis`; failing that it stays bound while its distance is
/// known and is released otherwise.
pub fn assign_slots<const N: usize>(
    current: &[Option<usize>; N],
    candidates: &[Candidate],
    dist_of: impl Fn(usize) -> f64,
    hysteresis: f64,
) -> [SlotDecision; N] {
    let is_candidate = |idx: usize| candidates.iter().any(|c| c.car_idx == idx);

    let mut reserved = CarMask::default();
    for &idx in current.iter().flatten() {
        if is_candidate(idx) {
            reserved.insert(idx);
        }
    }

    let mut used = CarMask::default();
    let mut decisions = [SlotDecision::Vacant; N];

    for (slot, occupant) in current.iter().enumerate() {
        let challenger = candidates
            .iter()
            .find(|c| !reserved.contains(c.car_idx) && !used.contains(c.car_idx))
            .copied();

        decisions[slot] = match *occupant {
            None => challenger.map_or(SlotDecision::Vacant, |c| SlotDecision::Rebind {
                car_idx: c.car_idx,
                dist: c.dist,
                previous: None,
            }),
            Some(idx) if used.contains(idx) => match challenger {
                Some(c) => SlotDecision::Rebind {
                    car_idx: c.car_idx,
                    dist: c.dist,
                    previous: Some(idx),
                },
                None => SlotDecision::Release { previous: idx },
            },
            Some(idx) => {
                let dist = dist_of(idx);
                if is_candidate(idx) && dist.is_finite() {
                    SlotDecision::Keep { car_idx: idx, dist }
                } else {
                    match challenger {
                        // NaN never passes, so an unknown distance falls through
                        Some(c) if c.dist < dist * hysteresis => SlotDecision::Rebind {
                            car_idx: c.car_idx,
                            dist: c.dist,
                            previous: Some(idx),
                        },
                        _ if dist.is_finite() => SlotDecision::Keep { car_idx: idx, dist },
                        _ => SlotDecision::Release { previous: idx },
                    }
                }
            }
        };

        if let Some(idx) = decisions[slot].car_idx() {
            used.insert(idx);
        }
    }

    decisions
}
