//! The run session: one context object owning every subsystem.
//!
//! `RunSession` is the only writer of orchestrator state. External callers
//! (the game loop, the engine autopilot, tests) go through its methods;
//! subsystems never reach each other directly. When a subsystem wants a
//! phase change it hands back a [`PhaseRequest`], and the session applies
//! it before the call that produced it returns.
//!
//! Every transition is fanned out in order: the exit notification of the
//! old phase, the enter notification of the new phase, then the generic
//! change. Each notification reaches every subsystem first and then every
//! external listener on the [`PhaseBus`].
//!
//! # Tick order
//!
//! 1. Phase clock
//! 2. Threat engine
//! 3. Encounter scheduler (spawns go to the caller's [`EncounterSink`])
//! 4. Repair bay (completed repairs resolve their issues)
//! 5. Completion monitor (a victory request is applied immediately)

use chrono::{DateTime, Utc};
use dropship_events::{ListenerId, PhaseBus, PhaseEvent, PhaseHooks, PhaseListener};
use dropship_types::{IssueKind, ItemKind, Phase, RunSnapshot, SessionId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::cargo::{CargoError, SharedCargo};
use crate::completion::CompletionMonitor;
use crate::config::{MissionConfig, RunConfig};
use crate::defense::{DefenseError, DefensePoints};
use crate::encounter::{EncounterScheduler, EncounterSink, SpawnOrder};
use crate::flow::MissionFlowTrigger;
use crate::issues::IssueTracker;
use crate::mission::{MissionPlan, MissionSession};
use crate::phase::{PhaseMachine, PhaseRequest, PhaseTransition};
use crate::repair::RepairBay;
use crate::threat::ThreatEngine;

/// What happened during one [`RunSession::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// The frame delta was rejected and nothing advanced.
    pub skipped: bool,
    /// The unit spawned on this tick, if any.
    pub spawned: Option<SpawnOrder>,
    /// Issues repaired on this tick.
    pub repaired: Vec<IssueKind>,
    /// The transition applied on this tick, if any.
    pub transition: Option<PhaseTransition>,
}

/// One orchestrator context: phase machine, subsystems and phase bus.
pub struct RunSession {
    id: SessionId,
    config: RunConfig,
    started_at: DateTime<Utc>,
    run_number: u32,
    machine: PhaseMachine,
    threat: ThreatEngine,
    encounters: EncounterScheduler,
    issues: IssueTracker,
    flow: MissionFlowTrigger,
    completion: CompletionMonitor,
    cargo: SharedCargo,
    defense: DefensePoints,
    repairs: RepairBay,
    mission: MissionSession,
    bus: PhaseBus,
}

impl RunSession {
    /// Build a session in `Landing`.
    ///
    /// The initial phase is not a transition, so no enter notification is
    /// published for it. Every random draw in the session derives from
    /// `config.simulation.seed`.
    pub fn new(config: RunConfig) -> Self {
        let mut seeds = StdRng::seed_from_u64(config.simulation.seed);
        let encounter_seed: u64 = seeds.random();
        let issue_seed: u64 = seeds.random();

        let id = SessionId::new();
        info!(
            session = %id,
            seed = config.simulation.seed,
            "Run session created"
        );

        Self {
            id,
            started_at: Utc::now(),
            run_number: 1,
            machine: PhaseMachine::new(),
            threat: ThreatEngine::new(config.threat.clone()),
            encounters: EncounterScheduler::new(config.encounters.clone(), encounter_seed),
            issues: IssueTracker::new(config.issues.clone(), issue_seed),
            flow: MissionFlowTrigger::new(),
            completion: CompletionMonitor::new(),
            cargo: SharedCargo::new(&config.cargo),
            defense: DefensePoints::new(&config.defense),
            repairs: RepairBay::new(&config.repair),
            mission: MissionSession::new(),
            bus: PhaseBus::new(),
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Phase control
    // -----------------------------------------------------------------------

    /// Move to `phase`. Returns the transition, or `None` when `phase` is
    /// already current.
    pub fn transition_to(&mut self, phase: Phase) -> Option<PhaseTransition> {
        let transition = self.machine.transition_to(phase)?;
        self.publish(transition);
        Some(transition)
    }

    /// Move to the fixed successor of the current phase.
    pub fn transition_to_next(&mut self) -> Option<PhaseTransition> {
        let transition = self.machine.transition_to_next()?;
        self.publish(transition);
        Some(transition)
    }

    /// Move to [`Phase::EndSuccess`].
    pub fn trigger_victory(&mut self) -> Option<PhaseTransition> {
        self.transition_to(Phase::EndSuccess)
    }

    /// Move to [`Phase::EndFail`] (the crew wiped or the ship fell).
    pub fn trigger_defeat(&mut self) -> Option<PhaseTransition> {
        self.transition_to(Phase::EndFail)
    }

    fn apply(&mut self, request: Option<PhaseRequest>) -> Option<PhaseTransition> {
        let transition = self.machine.apply(request?)?;
        self.publish(transition);
        Some(transition)
    }

    fn publish(&mut self, transition: PhaseTransition) {
        for event in transition.events() {
            self.dispatch(&event);
        }
    }

    fn dispatch(&mut self, event: &PhaseEvent) {
        if *event == PhaseEvent::Entered(Phase::Landing) {
            self.run_number = self.run_number.saturating_add(1);
            info!(session = %self.id, run = self.run_number, "New run landing");
        }

        let subsystems: [&mut dyn PhaseHooks; 8] = [
            &mut self.cargo,
            &mut self.threat,
            &mut self.encounters,
            &mut self.issues,
            &mut self.repairs,
            &mut self.flow,
            &mut self.completion,
            &mut self.mission,
        ];
        for hooks in subsystems {
            event.dispatch(hooks);
        }
        self.bus.publish(event);
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance the session by `dt` seconds.
    ///
    /// A negative or non-finite delta is logged and the tick is skipped.
    pub fn tick(&mut self, dt: f64, sink: &mut dyn EncounterSink) -> TickReport {
        if let Err(err) = self.machine.tick(dt) {
            warn!(error = %err, "Skipping tick");
            return TickReport {
                skipped: true,
                ..TickReport::default()
            };
        }

        self.threat.tick(dt);
        let spawned = self
            .encounters
            .tick(dt, self.threat.live_threat(), sink);

        let phase = self.machine.current();
        let repaired = self.repairs.tick(dt, phase, &self.issues);
        for kind in &repaired {
            self.issues.resolve(*kind);
        }

        let request = self.completion.tick(&self.issues);
        let transition = self.apply(request);

        TickReport {
            skipped: false,
            spawned,
            repaired,
            transition,
        }
    }

    /// Spawn one unit now, regardless of timer and phase.
    pub fn force_spawn(&mut self, sink: &mut dyn EncounterSink) -> SpawnOrder {
        self.encounters.force_spawn(self.threat.live_threat(), sink)
    }

    // -----------------------------------------------------------------------
    // Threat inputs
    // -----------------------------------------------------------------------

    /// A hostile unit died.
    pub fn register_kill(&mut self) {
        self.threat.register_kill();
    }

    /// Something was picked up.
    pub fn register_pickup(&mut self) {
        self.threat.register_pickup();
    }

    /// Add live threat for a scripted spike.
    pub fn add_live_threat(&mut self, amount: f64) {
        self.threat.add_live_threat(amount);
    }

    /// Add debt for a scripted penalty.
    pub fn add_debt(&mut self, amount: f64) {
        self.threat.add_debt(amount);
    }

    /// Override live threat (mission configuration).
    pub fn set_starting_threat(&mut self, value: f64) {
        self.threat.set_starting_threat(value);
    }

    /// Override the growth multiplier (mission configuration).
    pub fn set_growth_multiplier(&mut self, multiplier: f64) {
        self.threat.set_growth_multiplier(multiplier);
    }

    // -----------------------------------------------------------------------
    // Zone and cargo
    // -----------------------------------------------------------------------

    /// The crew left the landing zone.
    pub fn zone_exit(&mut self) -> Option<PhaseTransition> {
        let request = self.flow.on_zone_exit(self.machine.current());
        self.apply(request)
    }

    /// The crew entered the landing zone.
    pub fn zone_enter(&mut self) -> Option<PhaseTransition> {
        let request = self.flow.on_zone_enter(self.machine.current());
        self.apply(request)
    }

    /// The crew is still inside the landing zone.
    pub fn zone_stay(&mut self) -> Option<PhaseTransition> {
        let request = self.flow.on_zone_stay(self.machine.current());
        self.apply(request)
    }

    /// Put an item in the shared hold and let the flow trigger react.
    ///
    /// A successful salvage pickup also registers pickup debt; objective
    /// parts do not. Returns the slot used.
    ///
    /// # Errors
    ///
    /// Returns [`CargoError::Full`] when the hold has no free slot.
    pub fn pickup_item(&mut self, kind: ItemKind) -> Result<usize, CargoError> {
        let slot = self.cargo.try_add(kind)?;
        if kind.is_salvage() {
            self.threat.register_pickup();
        }

        let request = self.flow.on_item_added(self.machine.current(), &self.cargo);
        if self.apply(request).is_some() {
            // Completing the objective while already home goes straight on.
            let follow_up = self.flow.check_return(self.machine.current());
            self.apply(follow_up);
        }
        Ok(slot)
    }

    /// Take an item out of the shared hold.
    ///
    /// # Errors
    ///
    /// Returns [`CargoError::NotFound`] when no slot holds `kind`.
    pub fn remove_item(&mut self, kind: ItemKind) -> Result<usize, CargoError> {
        self.cargo.remove(kind)
    }

    /// Replace the objective thresholds.
    pub fn configure_requirements(&mut self, power_cores: u32, fuel_gels: u32) {
        self.flow.configure_requirements(power_cores, fuel_gels);
    }

    // -----------------------------------------------------------------------
    // Issues and repairs
    // -----------------------------------------------------------------------

    /// Resolve an issue directly. Returns `true` if the issue changed.
    pub fn resolve_issue(&mut self, kind: IssueKind) -> bool {
        self.issues.resolve(kind)
    }

    /// Hold the repair interaction at `kind`'s station.
    pub fn hold_repair(&mut self, kind: IssueKind) -> bool {
        self.repairs.hold(kind)
    }

    /// Release the repair interaction at `kind`'s station.
    pub fn release_repair(&mut self, kind: IssueKind) -> bool {
        self.repairs.release(kind)
    }

    /// The crew took damage; interrupt any repair in progress.
    pub fn notify_damage(&mut self) {
        self.repairs.notify_damage();
    }

    // -----------------------------------------------------------------------
    // Defense points
    // -----------------------------------------------------------------------

    /// Turn every salvage item in the hold into defense points.
    pub fn convert_salvage(&mut self) -> u32 {
        self.defense.convert_salvage(&mut self.cargo)
    }

    /// Spend defense points on a deployable.
    ///
    /// # Errors
    ///
    /// See [`DefensePoints::spend`].
    pub fn spend_defense(&mut self, amount: i64) -> Result<u32, DefenseError> {
        self.defense.spend(amount)
    }

    // -----------------------------------------------------------------------
    // Missions
    // -----------------------------------------------------------------------

    /// Start `config` as a fresh run.
    ///
    /// Returns to `Landing` if needed, applies the mission's threat
    /// settings, empties the hold, zeroes defense points, configures the
    /// objective, and marks the mission in progress.
    pub fn begin_mission(&mut self, config: MissionConfig) {
        if self.machine.current() != Phase::Landing {
            self.transition_to(Phase::Landing);
        }

        let plan = MissionPlan::from_config(&config);
        self.threat.set_starting_threat(plan.starting_threat);
        self.threat.set_growth_multiplier(plan.growth_multiplier);
        self.cargo.clear();
        self.defense.reset();
        self.flow
            .configure_requirements(plan.power_cores, plan.fuel_gels);
        self.mission.start(config);
        debug!(session = %self.id, run = self.run_number, "Mission bootstrap complete");
    }

    /// Start the mission from this session's configuration.
    pub fn begin_configured_mission(&mut self) {
        let config = self.config.mission.clone();
        self.begin_mission(config);
    }

    // -----------------------------------------------------------------------
    // Listeners and views
    // -----------------------------------------------------------------------

    /// Register an external phase listener.
    pub fn subscribe(&mut self, listener: Box<dyn PhaseListener>) -> ListenerId {
        self.bus.subscribe(listener)
    }

    /// Remove an external phase listener.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Point-in-time view of the whole session.
    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            session_id: self.id,
            run_number: self.run_number,
            phase: self.machine.current(),
            phase_elapsed: self.machine.phase_elapsed(),
            threat: self.threat.snapshot(),
            issues: self.issues.issues().to_vec(),
            cargo: self.cargo.items(),
            defense_points: self.defense.balance(),
            mission_state: self.mission.state(),
            units_spawned: self.encounters.total_spawned(),
        }
    }

    /// Session identifier.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// When the session was created.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Run counter (1 for the first run).
    pub const fn run_number(&self) -> u32 {
        self.run_number
    }

    /// Current phase.
    pub const fn phase(&self) -> Phase {
        self.machine.current()
    }

    /// Seconds since the current phase began.
    pub const fn phase_elapsed(&self) -> f64 {
        self.machine.phase_elapsed()
    }

    /// The configuration the session was built from.
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Phase machine.
    pub const fn machine(&self) -> &PhaseMachine {
        &self.machine
    }

    /// Threat engine.
    pub const fn threat(&self) -> &ThreatEngine {
        &self.threat
    }

    /// Encounter scheduler.
    pub const fn encounters(&self) -> &EncounterScheduler {
        &self.encounters
    }

    /// Issue tracker.
    pub const fn issues(&self) -> &IssueTracker {
        &self.issues
    }

    /// Mission flow trigger.
    pub const fn flow(&self) -> &MissionFlowTrigger {
        &self.flow
    }

    /// Completion monitor.
    pub const fn completion(&self) -> &CompletionMonitor {
        &self.completion
    }

    /// Shared cargo hold.
    pub const fn cargo(&self) -> &SharedCargo {
        &self.cargo
    }

    /// Defense point balance.
    pub const fn defense(&self) -> &DefensePoints {
        &self.defense
    }

    /// Repair stations.
    pub const fn repairs(&self) -> &RepairBay {
        &self.repairs
    }

    /// Mission progress.
    pub const fn mission(&self) -> &MissionSession {
        &self.mission
    }

    /// External listener bus and its journal.
    pub const fn bus(&self) -> &PhaseBus {
        &self.bus
    }

    /// Mutable access to the bus, e.g. to clear its journal.
    pub const fn bus_mut(&mut self) -> &mut PhaseBus {
        &mut self.bus
    }
}

impl core::fmt::Debug for RunSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RunSession")
            .field("id", &self.id)
            .field("run_number", &self.run_number)
            .field("phase", &self.machine.current())
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}
