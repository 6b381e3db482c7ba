//! SA engine orchestration.
//!
//! One [`SaEngine::update`] per telemetry frame runs, in order: session
//! policy, car state ingestion, gate timing, gap filtering, slot
//! assignment and gap fusion. [`SaEngine::refresh_status`] classifies the
//! bound slots from the state left by the last update.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use contracts::{
    CarIdentity, ContractError, Direction, OpponentOutputs, SaEngineConfig, SaLogSink, SaOutputs,
    SinkLevel, Slot, StatusE, TelemetryFrame, MAX_CARS, SLOTS_AHEAD, SLOTS_BEHIND,
};
use metrics::{counter, gauge};
use ringbuf::{traits::*, StaticRb};
use tracing::{debug, info, instrument};
use validator::Validate;

use crate::car_state::{CarState, CarStateTracker};
use crate::gap_filter::{FuseInput, GapFilter};
use crate::gate::{GateGapCache, GateTimer};
use crate::sectors::SectorTracker;
use crate::session::{GateDecision, ResetCause, SessionPolicy, SessionTick};
use crate::slots::{assign_slots, CandidateSet, SlotDecision};
use crate::sof::strength_of_field;
use crate::status::{
    classify, describe, ClassRelation, Classification, HotCoolInputs, StatusInputs, TextKey,
};
use crate::wrap::{lap_time_valid, select_lap_time};

/// Gap samples kept per slot for the closing-rate fallback
const GAP_HISTORY: usize = 16;

/// Per-slot state that lives outside the published [`Slot`]
#[derive(Default)]
struct SlotTrack {
    /// (session time, directional gap)
    history: StaticRb<(f64, f64), GAP_HISTORY>,
    text_key: Option<TextKey>,
}

impl fmt::Debug for SlotTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotTrack")
            .field("history_len", &self.history.occupied_len())
            .field("text_key", &self.text_key)
            .finish()
    }
}

impl SlotTrack {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn push_gap(&mut self, now: f64, gap: f64) {
        if !gap.is_finite() {
            return;
        }
        if self.history.is_full() {
            let _ = self.history.try_pop();
        }
        let _ = self.history.try_push((now, gap));
    }

    /// Closing rate over the history window (positive = gap shrinking)
    fn closing_rate(&self) -> Option<f64> {
        let (t0, g0) = *self.history.iter().next()?;
        let (t1, g1) = *self.history.iter().last()?;
        let dt = t1 - t0;
        (dt > 0.0).then(|| (g0.abs() - g1.abs()) / dt)
    }
}

/// Facts from the last update that classification depends on
#[derive(Debug, Clone, Copy)]
struct TickContext {
    now: f64,
    lap_time: f64,
    player: Option<usize>,
    decision: GateDecision,
    hot_cool_allowed: bool,
    multi_class: bool,
}

/// Read-only view used while classifying slots
struct ClassifyCtx<'a> {
    tick: TickContext,
    config: &'a SaEngineConfig,
    cars: &'a CarStateTracker,
    sectors: &'a SectorTracker,
    class_ranks: &'a HashMap<String, i32>,
    opponents: Option<&'a OpponentOutputs>,
    player_class: (&'a str, &'a str),
    not_relevant_gap_sec: f64,
}

impl ClassifyCtx<'_> {
    fn rank_of(&self, class_name: &str, class_color: &str) -> Option<i32> {
        self.class_ranks
            .get(class_name)
            .or_else(|| self.class_ranks.get(class_color))
            .copied()
    }

    fn class_relation(&self, slot: &Slot) -> ClassRelation {
        if !self.tick.multi_class {
            return ClassRelation::Same;
        }
        let (player_name, player_color) = self.player_class;
        let same = if !slot.class_color.is_empty() && !player_color.is_empty() {
            slot.class_color.eq_ignore_ascii_case(player_color)
        } else {
            slot.class_name == player_name
        };
        if same {
            return ClassRelation::Same;
        }
        ClassRelation::from_ranks(
            self.rank_of(&slot.class_name, &slot.class_color),
            self.rank_of(player_name, player_color),
        )
    }

    fn remaining_lap_time(&self, car_idx: usize) -> Option<f64> {
        let pct = self.cars.get(car_idx)?.lap_pct;
        self.sectors
            .get(car_idx)
            .and_then(|s| s.remaining_lap_time(pct))
            .or_else(|| {
                (lap_time_valid(self.tick.lap_time) && pct.is_finite())
                    .then(|| self.tick.lap_time * (1.0 - pct))
            })
    }

    fn hot_cool_inputs(&self, slot: &Slot, car_idx: usize) -> Option<HotCoolInputs> {
        if !self.tick.hot_cool_allowed || slot.direction == Direction::Player {
            return None;
        }
        let gap = slot.gap_rel_sec;
        if !gap.is_finite() || gap.abs() > self.config.status.hotlap_max_gap_sec {
            return None;
        }
        let closing_rate = if slot.closing_rate_smoothed.is_finite() {
            slot.closing_rate_smoothed
        } else {
            slot.closing_rate_raw
        };
        // The car being caught: the player when the car is behind
        let target = match slot.direction {
            Direction::Behind => self.tick.player?,
            _ => car_idx,
        };
        Some(HotCoolInputs {
            delta_to_best: self.sectors.get(car_idx).and_then(|s| s.delta_to_best()),
            closing_rate,
            gap_sec: gap,
            target_remaining_sec: self.remaining_lap_time(target),
        })
    }

    fn status_inputs(&self, slot: &Slot, car: &CarState, car_idx: usize) -> StatusInputs {
        let is_player = slot.direction == Direction::Player;
        StatusInputs {
            valid: car.valid,
            on_track: car.surface.is_on_track(),
            in_pits: car.in_pits(),
            penalty: car.penalty_active,
            off_track: car.off_track_latched(),
            suspect: car.suspect_latched(),
            out_lap: car.out_lap_latched(),
            lap_delta: if is_player { 0 } else { car.lap_delta },
            class: if is_player {
                ClassRelation::Same
            } else {
                self.class_relation(slot)
            },
            direction: slot.direction,
            hot_cool: self.hot_cool_inputs(slot, car_idx),
        }
    }

    fn classify_slot(&self, slot: &mut Slot, track: &mut SlotTrack) {
        let Some(car_idx) = slot.car_idx else {
            return;
        };
        let now = self.tick.now;

        let result = match (self.tick.decision, self.cars.get(car_idx)) {
            (GateDecision::Open, Some(car)) => {
                classify(&self.status_inputs(slot, car, car_idx), &self.config.status)
            }
            (GateDecision::Open, None) => Classification::gated("invalid"),
            (decision, _) => Classification::gated(decision.reason()),
        };

        let previous = slot.status;
        slot.status = result.status;
        slot.status_reason = result.reason;
        slot.hot_cool = result.hot_cool;
        slot.hot_cool_conflict = result.conflict;

        let alerting = matches!(
            result.status,
            StatusE::LappingYou | StatusE::HotlapWarning | StatusE::CoolLapWarning
        );
        if alerting && previous != result.status {
            slot.message_burst_until = now + self.config.slots.message_burst_sec;
        }

        let key = TextKey::new(slot.status, slot.lap_delta, slot.direction);
        if track.text_key != Some(key) {
            let text = describe(slot.status, slot.lap_delta, slot.direction);
            slot.status_short = text.short;
            slot.status_long = text.long;
            track.text_key = Some(key);
        }

        if let Some(opponents) = self.opponents {
            let summary = opponents
                .find(&slot.car_number, &slot.class_color, &slot.driver_name)
                .map(|e| e.fight_summary.as_str())
                .unwrap_or("");
            if summary != slot.fight_text {
                if !summary.is_empty() {
                    slot.info_burst_until = now + self.config.slots.info_burst_sec;
                }
                slot.fight_text = summary.to_string();
            }
        }

        slot.relevant = is_relevant(slot.gap_rel_sec, self.not_relevant_gap_sec);
    }
}

fn is_relevant(gap: f64, limit: f64) -> bool {
    !(limit > 0.0 && gap.is_finite() && gap.abs() > limit)
}

fn apply_identity(slot: &mut Slot, identity: Option<&CarIdentity>) {
    match identity {
        Some(id) => {
            slot.car_number.clone_from(&id.car_number);
            slot.driver_name.clone_from(&id.driver_name);
            slot.class_name.clone_from(&id.class_name);
            slot.class_color.clone_from(&id.class_color);
            slot.irating = id.irating;
        }
        None => {
            slot.car_number.clear();
            slot.driver_name.clear();
            slot.class_name.clear();
            slot.class_color.clear();
            slot.irating = 0;
        }
    }
}

/// Apply one list's decisions, resetting per-slot state on every rebind
fn apply_decisions(
    decisions: &[SlotDecision],
    slots: &mut [Slot],
    tracks: &mut [SlotTrack],
    roster: &[Option<CarIdentity>],
    label: &'static str,
) -> u32 {
    let mut rebinds = 0;
    for ((pos, decision), (slot, track)) in decisions
        .iter()
        .enumerate()
        .zip(slots.iter_mut().zip(tracks.iter_mut()))
    {
        if decision.is_rebind() {
            debug!(
                slot = pos,
                dir = label,
                from = ?slot.car_idx,
                to = ?decision.car_idx(),
                "slot rebind"
            );
            slot.clear();
            track.reset();
            rebinds += 1;
            counter!("sa_slot_rebinds_total", "dir" => label).increment(1);
        }
        match *decision {
            SlotDecision::Rebind { car_idx, .. } => {
                slot.car_idx = Some(car_idx);
                apply_identity(slot, roster.get(car_idx).and_then(Option::as_ref));
            }
            SlotDecision::Keep { car_idx, .. } => slot.car_idx = Some(car_idx),
            SlotDecision::Vacant | SlotDecision::Release { .. } => {}
        }
    }
    rebinds
}

/// Per-tick counters that end up in [`contracts::SaDebug`]
#[derive(Debug, Default, Clone, Copy)]
struct TickCounters {
    truth_updates: u32,
    mismatches: u32,
    rebinds: u32,
}

/// Situational-awareness engine
pub struct SaEngine {
    config: SaEngineConfig,
    cars: CarStateTracker,
    gates: GateTimer,
    filter: GapFilter,
    sectors: SectorTracker,
    session: SessionPolicy,
    candidates: CandidateSet,
    ahead_tracks: [SlotTrack; SLOTS_AHEAD],
    behind_tracks: [SlotTrack; SLOTS_BEHIND],
    player_track: SlotTrack,
    outputs: SaOutputs,
    roster: Vec<Option<CarIdentity>>,
    class_ranks: HashMap<String, i32>,
    sink: Option<Arc<dyn SaLogSink>>,
    debug_announced: bool,
    last_tick: Option<TickContext>,
    last_time: f64,
    tick: u64,
    session_resets: u64,
}

impl fmt::Debug for SaEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaEngine")
            .field("tick", &self.tick)
            .field("session_resets", &self.session_resets)
            .field("sink", &self.sink.as_ref().map(|s| s.name().to_string()))
            .field("last_tick", &self.last_tick)
            .finish_non_exhaustive()
    }
}

impl Default for SaEngine {
    fn default() -> Self {
        Self::new(SaEngineConfig::default())
    }
}

impl SaEngine {
    /// Create an engine without validating the configuration
    pub fn new(config: SaEngineConfig) -> Self {
        Self {
            cars: CarStateTracker::new(config.latch.clone()),
            gates: GateTimer::new(config.gate.clone()),
            filter: GapFilter::new(config.filter.clone(), config.gate.truth_max_age_sec),
            sectors: SectorTracker::default(),
            session: SessionPolicy::new(config.session.clone()),
            candidates: CandidateSet::default(),
            ahead_tracks: Default::default(),
            behind_tracks: Default::default(),
            player_track: SlotTrack::default(),
            outputs: SaOutputs::default(),
            roster: vec![None; MAX_CARS],
            class_ranks: HashMap::new(),
            sink: None,
            debug_announced: false,
            last_tick: None,
            last_time: f64::NAN,
            tick: 0,
            session_resets: 0,
            config,
        }
    }

    /// Create an engine after validating the configuration
    pub fn try_new(config: SaEngineConfig) -> Result<Self, ContractError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Attach a host-facing log sink
    pub fn with_sink(mut self, sink: Arc<dyn SaLogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn set_log_sink(&mut self, sink: Option<Arc<dyn SaLogSink>>) {
        self.sink = sink;
    }

    pub fn config(&self) -> &SaEngineConfig {
        &self.config
    }

    /// Latest output snapshot
    pub fn outputs(&self) -> &SaOutputs {
        &self.outputs
    }

    pub fn car_state(&self, idx: usize) -> Option<&CarState> {
        self.cars.get(idx)
    }

    pub fn gate_cache(&self, idx: usize) -> Option<&GateGapCache> {
        self.gates.cache(idx)
    }

    /// Clear all tracking state. Roster, class ranks and sink are kept.
    pub fn reset(&mut self) {
        self.clear_tracking();
        self.session.reset();
        self.debug_announced = false;
        self.last_tick = None;
        self.tick = 0;
        self.session_resets = 0;
        info!("SA engine reset");
    }

    /// Class rank lookup keyed by class name or class color (lower is faster)
    pub fn set_class_rank_map(&mut self, ranks: HashMap<String, i32>) {
        self.class_ranks = ranks;
    }

    /// Recompute the strength of field from driver ratings
    pub fn update_irating_sof(&mut self, ratings: &[i32]) {
        self.outputs.irating_sof = strength_of_field(ratings);
    }

    /// Replace the driver roster; bound slots pick up the new identity
    pub fn set_driver_roster(&mut self, roster: &[CarIdentity]) {
        self.roster.iter_mut().for_each(|entry| *entry = None);
        for identity in roster {
            if let Some(entry) = self.roster.get_mut(identity.car_idx) {
                *entry = Some(identity.clone());
            }
        }
        let roster = &self.roster;
        let outputs = &mut self.outputs;
        for slot in outputs
            .ahead
            .iter_mut()
            .chain(outputs.behind.iter_mut())
            .chain(std::iter::once(&mut outputs.player))
        {
            if let Some(idx) = slot.car_idx {
                apply_identity(slot, roster.get(idx).and_then(Option::as_ref));
            }
        }
    }

    fn log_sink(&self, level: SinkLevel, message: impl FnOnce() -> String) {
        if let Some(sink) = &self.sink {
            sink.log(level, &message());
        }
    }

    fn clear_tracking(&mut self) {
        self.cars.reset();
        self.gates.reset();
        self.sectors.reset();
        self.candidates = CandidateSet::default();
        self.ahead_tracks.iter_mut().for_each(SlotTrack::reset);
        self.behind_tracks.iter_mut().for_each(SlotTrack::reset);
        self.player_track.reset();
        let sof = self.outputs.irating_sof;
        self.outputs = SaOutputs {
            irating_sof: sof,
            ..SaOutputs::default()
        };
        self.last_time = f64::NAN;
    }

    fn on_session_reset(&mut self, cause: ResetCause, frame: &TelemetryFrame) {
        self.clear_tracking();
        self.session_resets += 1;
        counter!("sa_session_resets_total", "cause" => cause.as_str()).increment(1);
        self.log_sink(SinkLevel::Info, || {
            format!(
                "SA reset ({}): session '{}' #{} at {:.1}s",
                cause.as_str(),
                frame.session_type_name,
                frame.session_num,
                frame.session_time_sec
            )
        });
    }

    fn apply_session(&mut self, frame: &TelemetryFrame) -> SessionTick {
        let session = self.session.evaluate(frame);
        if let Some(cause) = session.reset {
            self.on_session_reset(cause, frame);
        }
        if session.entered_green {
            debug!("race went green, clearing latches");
            self.cars.clear_latches();
        }
        if session.transition {
            self.log_sink(SinkLevel::Info, || {
                format!("SA gate {} ({})", session.decision.as_str(), frame.session_type_name)
            });
        }
        session
    }

    /// Run one telemetry tick (everything except classification)
    #[instrument(level = "trace", skip(self, frame), fields(t = frame.session_time_sec))]
    pub fn update(&mut self, frame: &TelemetryFrame) {
        self.tick += 1;
        counter!("sa_ticks_total").increment(1);

        if frame.debug_enabled && !self.debug_announced {
            self.debug_announced = true;
            self.log_sink(SinkLevel::Info, || {
                format!("SA engine debug enabled: {:?}", self.config)
            });
        }

        let session = self.apply_session(frame);
        let now = frame.session_time_sec;
        let lap_time = select_lap_time(
            frame.player_best_lap_sec,
            frame.lap_time_estimate_sec,
            frame.class_est_lap_time_sec,
        );
        if lap_time_valid(lap_time) {
            gauge!("sa_lap_time_used_sec").set(lap_time);
        }

        let player = frame.player_index();
        self.cars.update(frame, player, session.decision.is_open());
        let player = player.filter(|&p| self.cars.get(p).is_some_and(|c| c.valid));

        let dt = now - self.last_time;
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.last_time = now;

        let mut counters = TickCounters {
            truth_updates: self.record_crossings(player, now, lap_time),
            ..Default::default()
        };

        for idx in 0..MAX_CARS {
            if Some(idx) == player {
                continue;
            }
            if let Some(cache) = self.gates.cache_mut(idx) {
                self.filter.step(cache, now, dt, lap_time);
            }
        }

        self.candidates.rebuild(&self.cars, player, &self.config.slots);
        counters.rebinds += self.assign(Direction::Ahead);
        counters.rebinds += self.assign(Direction::Behind);
        counters.mismatches += self.fuse_slots(Direction::Ahead, now, lap_time);
        counters.mismatches += self.fuse_slots(Direction::Behind, now, lap_time);
        for slot in self.outputs.ahead.iter_mut().chain(self.outputs.behind.iter_mut()) {
            slot.relevant = is_relevant(slot.gap_rel_sec, frame.not_relevant_gap_sec);
        }

        self.update_player_slot(frame.player_index(), player.is_some());

        self.last_tick = Some(TickContext {
            now,
            lap_time,
            player,
            decision: session.decision,
            hot_cool_allowed: session.hot_cool_allowed(),
            multi_class: frame.has_multi_class_opponents,
        });

        let valid_cars = self.cars.iter().filter(|(_, c)| c.valid).count();
        let debug = &mut self.outputs.debug;
        debug.session_time_sec = now;
        debug.tick = self.tick;
        debug.lap_time_used_sec = lap_time;
        debug.valid_cars = valid_cars;
        debug.ahead_candidates = self.candidates.ahead_eligible.count();
        debug.behind_candidates = self.candidates.behind_eligible.count();
        debug.gate_truth_updates = counters.truth_updates;
        debug.mismatch_fallbacks = counters.mismatches;
        debug.rebinds = counters.rebinds;
        debug.session_resets = self.session_resets;
        debug.session_gate = session.decision.as_str();
        self.outputs.valid = player.is_some();
    }

    /// Record gate crossings (player first) and derive truth gaps
    fn record_crossings(&mut self, player: Option<usize>, now: f64, lap_time: f64) -> u32 {
        let mut truth_updates = 0;
        let order = player.into_iter().chain((0..MAX_CARS).filter(|&i| Some(i) != player));
        for idx in order {
            let Some(car) = self.cars.get(idx).copied() else {
                continue;
            };
            let dirty = car.in_pits() || car.off_track_latched();
            if dirty {
                self.sectors.mark_dirty(idx);
            }
            let Some(crossing) = car.crossed.filter(|c| c.is_forward()) else {
                continue;
            };
            self.sectors.on_crossing(idx, crossing, now);
            if dirty {
                self.sectors.mark_dirty(idx);
            }
            self.gates.record(idx, crossing.to, now, car.current_lap());
            if let Some(p) = player.filter(|&p| p != idx) {
                if self.gates.update_truth(idx, p, crossing.to, lap_time) {
                    truth_updates += 1;
                }
            }
        }
        if truth_updates > 0 {
            counter!("sa_gate_truth_updates_total").increment(u64::from(truth_updates));
        }
        truth_updates
    }

    fn assign(&mut self, direction: Direction) -> u32 {
        let hysteresis = self.config.slots.hysteresis_factor;
        let cars = &self.cars;
        let roster = &self.roster;
        match direction {
            Direction::Behind => {
                let decisions = assign_slots(
                    &self.outputs.behind.each_ref().map(|s| s.car_idx),
                    self.candidates.behind.as_slice(),
                    |i| cars.get(i).map_or(f64::NAN, |c| c.backward_dist_pct),
                    hysteresis,
                );
                apply_decisions(
                    &decisions,
                    &mut self.outputs.behind,
                    &mut self.behind_tracks,
                    roster,
                    "behind",
                )
            }
            _ => {
                let decisions = assign_slots(
                    &self.outputs.ahead.each_ref().map(|s| s.car_idx),
                    self.candidates.ahead.as_slice(),
                    |i| cars.get(i).map_or(f64::NAN, |c| c.forward_dist_pct),
                    hysteresis,
                );
                apply_decisions(
                    &decisions,
                    &mut self.outputs.ahead,
                    &mut self.ahead_tracks,
                    roster,
                    "ahead",
                )
            }
        }
    }

    fn fuse_slots(&mut self, direction: Direction, now: f64, lap_time: f64) -> u32 {
        let alpha = self.config.slots.closing_rate_smoothing_alpha;
        let max_age = self.config.gate.truth_max_age_sec;
        let (slots, tracks) = match direction {
            Direction::Behind => (
                self.outputs.behind.as_mut_slice(),
                self.behind_tracks.as_mut_slice(),
            ),
            _ => (
                self.outputs.ahead.as_mut_slice(),
                self.ahead_tracks.as_mut_slice(),
            ),
        };

        let mut mismatches = 0;
        for (slot, track) in slots.iter_mut().zip(tracks.iter_mut()) {
            let Some(idx) = slot.car_idx else {
                continue;
            };
            let Some(car) = self.cars.get(idx) else {
                continue;
            };
            slot.forward_dist_pct = car.forward_dist_pct;
            slot.backward_dist_pct = car.backward_dist_pct;
            slot.lap_delta = car.lap_delta;
            slot.laps_since_pit = car.laps_since_pit;
            slot.pace_flags = car.pace_flags;

            let track_gap = if lap_time_valid(lap_time) {
                match direction {
                    Direction::Behind => -car.backward_dist_pct * lap_time,
                    _ => car.forward_dist_pct * lap_time,
                }
            } else {
                f64::NAN
            };
            slot.gap_track_sec = track_gap;

            let Some(cache) = self.gates.cache_mut(idx) else {
                continue;
            };
            let fused = self.filter.fuse(
                cache,
                FuseInput {
                    direction,
                    track_gap,
                    lap_delta: car.lap_delta,
                    now,
                    lap_time,
                },
            );
            if fused.mismatch {
                mismatches += 1;
                counter!("sa_gap_mismatch_fallbacks_total").increment(1);
            }
            slot.gap_rel_sec = fused.gap;
            slot.gap_source = fused.source;

            // Gate rate is d(gate gap)/dt; ahead gaps are negative in gate space
            let gate_rate = cache.rate_fresh(now, max_age).then(|| match direction {
                Direction::Behind => -cache.rate,
                _ => cache.rate,
            });
            track.push_gap(now, fused.gap);
            let pct_rate = (car.closing_rate_pct.is_finite() && lap_time_valid(lap_time)).then(
                || match direction {
                    Direction::Behind => car.closing_rate_pct * lap_time,
                    _ => -car.closing_rate_pct * lap_time,
                },
            );
            let raw = gate_rate
                .or_else(|| track.closing_rate())
                .or(pct_rate)
                .unwrap_or(f64::NAN);
            slot.closing_rate_raw = raw;
            if raw.is_finite() {
                slot.closing_rate_smoothed = if slot.closing_rate_smoothed.is_finite() {
                    slot.closing_rate_smoothed + alpha * (raw - slot.closing_rate_smoothed)
                } else {
                    raw
                };
            }
        }
        mismatches
    }

    fn update_player_slot(&mut self, player_raw: Option<usize>, valid: bool) {
        let slot = &mut self.outputs.player;
        if slot.car_idx != player_raw {
            slot.clear();
            self.player_track.reset();
            slot.car_idx = player_raw;
            if let Some(idx) = player_raw {
                apply_identity(slot, self.roster.get(idx).and_then(Option::as_ref));
            }
        }
        let Some(car) = player_raw.and_then(|idx| self.cars.get(idx)) else {
            return;
        };
        slot.forward_dist_pct = 0.0;
        slot.backward_dist_pct = 0.0;
        slot.gap_track_sec = if valid { 0.0 } else { f64::NAN };
        slot.gap_rel_sec = slot.gap_track_sec;
        slot.lap_delta = 0;
        slot.laps_since_pit = car.laps_since_pit;
        slot.pace_flags = car.pace_flags;
    }

    /// Classify every bound slot and the player from the last update
    #[instrument(level = "trace", skip(self, opponents))]
    pub fn refresh_status(
        &mut self,
        not_relevant_gap_sec: f64,
        opponents: Option<&OpponentOutputs>,
        player_class_color: &str,
    ) {
        let Some(tick) = self.last_tick else {
            return;
        };

        let player_identity = tick
            .player
            .and_then(|p| self.roster.get(p))
            .and_then(Option::as_ref);
        let player_name = player_identity.map_or("", |id| id.class_name.as_str());
        let player_color = if player_class_color.is_empty() {
            player_identity.map_or("", |id| id.class_color.as_str())
        } else {
            player_class_color
        };

        let ctx = ClassifyCtx {
            tick,
            config: &self.config,
            cars: &self.cars,
            sectors: &self.sectors,
            class_ranks: &self.class_ranks,
            opponents,
            player_class: (player_name, player_color),
            not_relevant_gap_sec,
        };

        let outputs = &mut self.outputs;
        for (slot, track) in outputs.ahead.iter_mut().zip(self.ahead_tracks.iter_mut()) {
            ctx.classify_slot(slot, track);
        }
        for (slot, track) in outputs.behind.iter_mut().zip(self.behind_tracks.iter_mut()) {
            ctx.classify_slot(slot, track);
        }
        ctx.classify_slot(&mut outputs.player, &mut self.player_track);
    }
}
