//! Encounter scheduler: when and where hostile units appear.
//!
//! Spawning is switched on by the field phases (`Expedition`, `RunBack`,
//! `FinalStand`) and off by every other phase. While active, a local timer
//! accumulates frame time; once it reaches the current interval one unit is
//! spawned and the timer restarts. The interval shrinks as live threat
//! grows:
//!
//! ```text
//! interval = max(base_interval / (1 + threat / 100) / rate_multiplier, min_interval)
//! ```
//!
//! The run back spawns faster, closer, and with faster units. The final
//! stand spawns slower but closer to the ship.
//!
//! The scheduler does not create units itself. It emits [`SpawnOrder`]s to
//! an [`EncounterSink`] supplied by the caller.

use core::f64::consts::TAU;

use dropship_events::PhaseHooks;
use dropship_types::{Phase, Position, UnitId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EncounterConfig;

/// Scaling applied to live threat in the interval formula.
const THREAT_SCALE: f64 = 100.0;

/// Which escalation profile the scheduler is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnMode {
    /// Not spawning.
    #[default]
    Dormant,
    /// Expedition cadence, no multipliers.
    Normal,
    /// Chase escalation: faster, closer, faster units.
    RunBack,
    /// Defense pressure: slower, closer.
    FinalStand,
}

impl SpawnMode {
    /// Whether units are spawned in this mode.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Dormant)
    }

    /// Spawn rate multiplier for this mode (1 outside escalation).
    pub const fn rate_multiplier(self, config: &EncounterConfig) -> f64 {
        match self {
            Self::RunBack => config.run_back_rate_multiplier,
            Self::FinalStand => config.final_stand_rate_multiplier,
            Self::Dormant | Self::Normal => 1.0,
        }
    }

    /// Spawn radius multiplier for this mode (1 outside escalation).
    pub const fn radius_multiplier(self, config: &EncounterConfig) -> f64 {
        match self {
            Self::RunBack => config.run_back_radius_multiplier,
            Self::FinalStand => config.final_stand_radius_multiplier,
            Self::Dormant | Self::Normal => 1.0,
        }
    }

    /// Movement speed multiplier for units spawned in this mode.
    pub const fn speed_multiplier(self, config: &EncounterConfig) -> f64 {
        match self {
            Self::RunBack => config.run_back_speed_multiplier,
            Self::Dormant | Self::Normal | Self::FinalStand => 1.0,
        }
    }
}

/// Seconds between spawns for a given live threat and mode.
///
/// Non-increasing in `live_threat` and never below `min_interval`.
pub fn spawn_interval(config: &EncounterConfig, live_threat: f64, mode: SpawnMode) -> f64 {
    let threat = live_threat.max(0.0);
    let interval = config.base_interval / (1.0 + threat / THREAT_SCALE) / mode.rate_multiplier(config);
    if interval.is_nan() {
        return config.min_interval;
    }
    interval.max(config.min_interval)
}

/// A request for the game loop to create one hostile unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnOrder {
    /// Identifier assigned to the new unit.
    pub unit_id: UnitId,
    /// 1-based count of units spawned by this scheduler.
    pub sequence: u64,
    /// Where the unit appears.
    pub position: Position,
    /// Where the unit should head, if a target is configured.
    pub target: Option<Position>,
    /// Multiplier for the unit's base movement speed.
    pub speed_multiplier: f64,
    /// Mode the scheduler was in when the unit spawned.
    pub mode: SpawnMode,
    /// Live threat at spawn time.
    pub threat: f64,
}

/// Receives spawn orders. Implemented by whatever owns unit creation.
pub trait EncounterSink {
    /// Create the unit described by `order`.
    fn spawn(&mut self, order: &SpawnOrder);
}

/// Sink that keeps every order, for tests and headless drivers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingSink {
    /// Orders received, oldest first.
    pub orders: Vec<SpawnOrder>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub const fn new() -> Self {
        Self { orders: Vec::new() }
    }

    /// Remove and return every recorded order.
    pub fn drain(&mut self) -> Vec<SpawnOrder> {
        core::mem::take(&mut self.orders)
    }
}

impl EncounterSink for RecordingSink {
    fn spawn(&mut self, order: &SpawnOrder) {
        self.orders.push(*order);
    }
}

/// Sink that drops every order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl EncounterSink for DiscardSink {
    fn spawn(&mut self, _order: &SpawnOrder) {}
}

/// Phase-gated, threat-scaled spawn timer.
#[derive(Debug, Clone)]
pub struct EncounterScheduler {
    config: EncounterConfig,
    mode: SpawnMode,
    timer: f64,
    current_interval: f64,
    total_spawned: u64,
    rng: StdRng,
}

impl EncounterScheduler {
    /// Create a dormant scheduler whose placement draws come from `seed`.
    pub fn new(config: EncounterConfig, seed: u64) -> Self {
        if config.target.is_none() {
            warn!("No encounter target configured, spawned units will have no destination");
        }
        let current_interval = spawn_interval(&config, 0.0, SpawnMode::Normal);
        Self {
            config,
            mode: SpawnMode::Dormant,
            timer: 0.0,
            current_interval,
            total_spawned: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Advance the spawn timer by `dt` at the given live threat.
    ///
    /// Returns the order that was emitted to `sink`, if any.
    pub fn tick(
        &mut self,
        dt: f64,
        live_threat: f64,
        sink: &mut dyn EncounterSink,
    ) -> Option<SpawnOrder> {
        if !self.mode.is_active() {
            return None;
        }

        self.current_interval = spawn_interval(&self.config, live_threat, self.mode);
        self.timer += dt;
        if self.timer < self.current_interval {
            return None;
        }

        self.timer = 0.0;
        Some(self.spawn(live_threat, sink))
    }

    /// Spawn one unit immediately, ignoring the timer and the phase gate.
    pub fn force_spawn(&mut self, live_threat: f64, sink: &mut dyn EncounterSink) -> SpawnOrder {
        self.spawn(live_threat, sink)
    }

    fn spawn(&mut self, live_threat: f64, sink: &mut dyn EncounterSink) -> SpawnOrder {
        self.total_spawned = self.total_spawned.saturating_add(1);
        let order = SpawnOrder {
            unit_id: UnitId::new(),
            sequence: self.total_spawned,
            position: self.spawn_position(),
            target: self.config.target,
            speed_multiplier: self.mode.speed_multiplier(&self.config),
            mode: self.mode,
            threat: live_threat,
        };

        info!(
            unit = %order.unit_id,
            sequence = order.sequence,
            mode = ?order.mode,
            threat = live_threat,
            interval = self.current_interval,
            x = order.position.x,
            z = order.position.z,
            "Encounter spawned"
        );
        sink.spawn(&order);
        order
    }

    /// A point on the ring of the mode-adjusted radius around the anchor.
    fn spawn_position(&mut self) -> Position {
        let radius = self.effective_radius();
        let angle = self.rng.random_range(0.0..TAU);
        self.config
            .anchor
            .offset_planar(angle.cos() * radius, angle.sin() * radius)
    }

    fn start(&mut self, mode: SpawnMode) {
        self.mode = mode;
        self.timer = 0.0;
        debug!(mode = ?mode, "Encounter spawning active");
    }

    fn stop(&mut self) {
        if self.mode.is_active() {
            debug!(mode = ?self.mode, "Encounter spawning stopped");
        }
        self.mode = SpawnMode::Dormant;
    }

    /// Spawn radius after the current mode's multiplier.
    pub fn effective_radius(&self) -> f64 {
        self.config.spawn_radius * self.mode.radius_multiplier(&self.config)
    }

    /// Current mode.
    pub const fn mode(&self) -> SpawnMode {
        self.mode
    }

    /// Whether the scheduler is spawning.
    pub const fn is_active(&self) -> bool {
        self.mode.is_active()
    }

    /// Interval computed on the last active tick.
    pub const fn current_interval(&self) -> f64 {
        self.current_interval
    }

    /// Seconds until the next timed spawn at the last computed interval.
    pub fn time_until_next(&self) -> f64 {
        (self.current_interval - self.timer).max(0.0)
    }

    /// Units spawned since creation.
    pub const fn total_spawned(&self) -> u64 {
        self.total_spawned
    }

    /// The scheduler's configuration.
    pub const fn config(&self) -> &EncounterConfig {
        &self.config
    }
}

impl PhaseHooks for EncounterScheduler {
    fn on_exit(&mut self, phase: Phase) {
        match phase {
            Phase::RunBack if self.mode == SpawnMode::RunBack => {
                self.mode = SpawnMode::Normal;
                debug!("Run back escalation removed");
            }
            Phase::FinalStand => self.stop(),
            _ => {}
        }
    }

    fn on_enter(&mut self, phase: Phase) {
        match phase {
            Phase::Expedition => self.start(SpawnMode::Normal),
            Phase::RunBack => self.start(SpawnMode::RunBack),
            Phase::FinalStand => self.start(SpawnMode::FinalStand),
            Phase::Landing | Phase::Prep | Phase::EndSuccess | Phase::EndFail => self.stop(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn make_config() -> EncounterConfig {
        EncounterConfig {
            target: Some(Position::new(0.0, 0.0, 0.0)),
            anchor: Position::new(10.0, 2.0, -5.0),
            ..EncounterConfig::default()
        }
    }

    fn make_scheduler() -> EncounterScheduler {
        EncounterScheduler::new(make_config(), 7)
    }

    #[test]
    fn interval_at_reference_threats() {
        let config = EncounterConfig::default();
        let at = |t| spawn_interval(&config, t, SpawnMode::Normal);
        assert!((at(0.0) - 2.0).abs() < EPSILON);
        assert!((at(100.0) - 1.0).abs() < EPSILON);
        assert!((at(300.0) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn interval_is_non_increasing_and_floored() {
        let config = EncounterConfig::default();
        for mode in [SpawnMode::Normal, SpawnMode::RunBack, SpawnMode::FinalStand] {
            let mut last = f64::INFINITY;
            for step in 0..200_u32 {
                let threat = f64::from(step) * 50.0;
                let interval = spawn_interval(&config, threat, mode);
                assert!(interval <= last + EPSILON);
                assert!(interval >= config.min_interval - EPSILON);
                last = interval;
            }
        }
        assert!((spawn_interval(&config, 1.0e12, SpawnMode::RunBack) - 0.2).abs() < EPSILON);
    }

    #[test]
    fn phase_multipliers_change_interval() {
        let config = EncounterConfig::default();
        let run_back = spawn_interval(&config, 0.0, SpawnMode::RunBack);
        let final_stand = spawn_interval(&config, 0.0, SpawnMode::FinalStand);
        assert!((run_back - 2.0 / 1.5).abs() < EPSILON);
        assert!((final_stand - 2.0 / 0.7).abs() < EPSILON);
    }

    #[test]
    fn dormant_scheduler_never_spawns() {
        let mut scheduler = make_scheduler();
        let mut sink = RecordingSink::new();
        for _ in 0..100 {
            assert!(scheduler.tick(1.0, 0.0, &mut sink).is_none());
        }
        assert!(sink.orders.is_empty());
    }

    #[test]
    fn expedition_spawns_on_interval() {
        let mut scheduler = make_scheduler();
        let mut sink = RecordingSink::new();
        scheduler.on_enter(Phase::Expedition);

        assert!(scheduler.tick(1.5, 0.0, &mut sink).is_none());
        let order = scheduler.tick(0.5, 0.0, &mut sink).unwrap();
        assert_eq!(order.sequence, 1);
        assert_eq!(order.mode, SpawnMode::Normal);
        assert!((order.speed_multiplier - 1.0).abs() < EPSILON);
        assert_eq!(sink.orders.len(), 1);

        // Timer restarted after the spawn.
        assert!(scheduler.tick(1.0, 0.0, &mut sink).is_none());
    }

    #[test]
    fn spawn_lands_on_ring_at_anchor_height() {
        let mut scheduler = make_scheduler();
        let mut sink = DiscardSink;
        let anchor = scheduler.config().anchor;
        for _ in 0..20 {
            let order = scheduler.force_spawn(0.0, &mut sink);
            assert!((order.position.planar_distance(anchor) - 15.0).abs() < 1e-6);
            assert!((order.position.y - anchor.y).abs() < EPSILON);
        }
    }

    #[test]
    fn run_back_spawns_closer_and_faster() {
        let mut scheduler = make_scheduler();
        let mut sink = RecordingSink::new();
        scheduler.on_enter(Phase::RunBack);
        let order = scheduler.force_spawn(0.0, &mut sink);
        let anchor = scheduler.config().anchor;
        assert!((order.position.planar_distance(anchor) - 9.0).abs() < 1e-6);
        assert!((order.speed_multiplier - 1.2).abs() < EPSILON);
        assert_eq!(order.target, Some(Position::ORIGIN));
    }

    #[test]
    fn run_back_exit_drops_escalation() {
        let mut scheduler = make_scheduler();
        scheduler.on_enter(Phase::RunBack);
        scheduler.on_exit(Phase::RunBack);
        assert_eq!(scheduler.mode(), SpawnMode::Normal);
        scheduler.on_enter(Phase::Prep);
        assert!(!scheduler.is_active());
    }

    #[test]
    fn final_stand_exit_stops_spawning() {
        let mut scheduler = make_scheduler();
        scheduler.on_enter(Phase::FinalStand);
        assert!((scheduler.effective_radius() - 7.5).abs() < EPSILON);
        scheduler.on_exit(Phase::FinalStand);
        assert!(!scheduler.is_active());
    }

    #[test]
    fn same_seed_same_positions() {
        let mut a = make_scheduler();
        let mut b = make_scheduler();
        let mut sink = DiscardSink;
        for _ in 0..5 {
            let pa = a.force_spawn(0.0, &mut sink).position;
            let pb = b.force_spawn(0.0, &mut sink).position;
            assert!((pa.x - pb.x).abs() < EPSILON);
            assert!((pa.z - pb.z).abs() < EPSILON);
        }
    }

    #[test]
    fn missing_target_still_spawns() {
        let mut scheduler = EncounterScheduler::new(EncounterConfig::default(), 1);
        let mut sink = RecordingSink::new();
        let order = scheduler.force_spawn(0.0, &mut sink);
        assert!(order.target.is_none());
        assert_eq!(scheduler.total_spawned(), 1);
        assert_eq!(sink.drain().len(), 1);
    }
}
