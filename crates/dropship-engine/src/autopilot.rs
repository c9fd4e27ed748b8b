//! Scripted crew that plays a run through the tick callback.
//!
//! Without a game client nobody leaves the landing zone, picks things up,
//! or holds a repair station. The [`Autopilot`] stands in for the crew:
//! after every tick it looks at the phase and feeds the matching input
//! back into the session, the same way a client would.
//!
//! | Phase        | Crew behavior                                          |
//! |--------------|--------------------------------------------------------|
//! | `Landing`    | Leave the zone after `landing_delay_secs`              |
//! | `Expedition` | Pick up some salvage, then the required parts          |
//! | `RunBack`    | Re-enter the zone after `return_delay_secs`            |
//! | `Prep`       | Convert salvage, buy turrets, move on after `prep_secs`|
//! | `FinalStand` | Convert salvage, then repair issues one by one         |
//!
//! Every spawned hostile is killed after a random delay, shortened by each
//! turret. If too many hostiles are alive at once the crew is overwhelmed
//! and the run is lost.

use dropship_core::encounter::SpawnOrder;
use dropship_core::runner::{TickCallback, TickControl, TickSummary};
use dropship_core::session::RunSession;
use dropship_types::{IssueKind, ItemKind, Phase};
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{debug, info, warn};

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Autopilot tunables, loaded from the `autopilot` section of
/// `dropship-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AutopilotConfig {
    /// Seconds spent in `Landing` before leaving the zone.
    #[serde(default = "default_landing_delay")]
    pub landing_delay_secs: f64,

    /// Seconds between pickups during `Expedition`.
    #[serde(default = "default_pickup_interval")]
    pub pickup_interval_secs: f64,

    /// Salvage items to grab on top of the required parts.
    #[serde(default = "default_salvage_pickups")]
    pub salvage_pickups: u32,

    /// Seconds of `RunBack` before the crew reaches the zone.
    #[serde(default = "default_return_delay")]
    pub return_delay_secs: f64,

    /// Seconds spent in `Prep` before starting the final stand.
    #[serde(default = "default_prep_secs")]
    pub prep_secs: f64,

    /// Shortest time a hostile survives.
    #[serde(default = "default_kill_delay_min")]
    pub kill_delay_min_secs: f64,

    /// Longest time a hostile survives.
    #[serde(default = "default_kill_delay_max")]
    pub kill_delay_max_secs: f64,

    /// Chance per tick that the repairing crew member takes damage.
    #[serde(default = "default_damage_chance")]
    pub damage_chance: f64,

    /// Live hostiles that overwhelm the crew (0 = never).
    #[serde(default = "default_overwhelm_threshold")]
    pub overwhelm_threshold: u32,

    /// Defense points per turret.
    #[serde(default = "default_turret_cost")]
    pub turret_cost: u32,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            landing_delay_secs: default_landing_delay(),
            pickup_interval_secs: default_pickup_interval(),
            salvage_pickups: default_salvage_pickups(),
            return_delay_secs: default_return_delay(),
            prep_secs: default_prep_secs(),
            kill_delay_min_secs: default_kill_delay_min(),
            kill_delay_max_secs: default_kill_delay_max(),
            damage_chance: default_damage_chance(),
            overwhelm_threshold: default_overwhelm_threshold(),
            turret_cost: default_turret_cost(),
        }
    }
}

impl AutopilotConfig {
    /// Pull bad values back into range so the random draws cannot panic.
    fn sanitized(mut self) -> Self {
        let non_negative = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        self.kill_delay_min_secs = non_negative(self.kill_delay_min_secs);
        self.kill_delay_max_secs = non_negative(self.kill_delay_max_secs);
        if self.kill_delay_min_secs > self.kill_delay_max_secs {
            warn!(
                min = self.kill_delay_min_secs,
                max = self.kill_delay_max_secs,
                "Kill delay bounds inverted, swapping"
            );
            std::mem::swap(&mut self.kill_delay_min_secs, &mut self.kill_delay_max_secs);
        }
        self.damage_chance = if self.damage_chance.is_finite() {
            self.damage_chance.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }
}

const fn default_landing_delay() -> f64 {
    2.0
}

const fn default_pickup_interval() -> f64 {
    1.5
}

const fn default_salvage_pickups() -> u32 {
    2
}

const fn default_return_delay() -> f64 {
    3.0
}

const fn default_prep_secs() -> f64 {
    5.0
}

const fn default_kill_delay_min() -> f64 {
    0.5
}

const fn default_kill_delay_max() -> f64 {
    4.0
}

const fn default_damage_chance() -> f64 {
    0.002
}

const fn default_overwhelm_threshold() -> u32 {
    40
}

const fn default_turret_cost() -> u32 {
    10
}

// -----------------------------------------------------------------------
// Autopilot
// -----------------------------------------------------------------------

/// Scripted crew for one run.
#[derive(Debug)]
pub struct Autopilot {
    config: AutopilotConfig,
    rng: StdRng,
    /// Seconds of simulated time per tick.
    dt: f64,
    /// Phase seen on the previous tick.
    last_phase: Option<Phase>,
    /// Remaining lifetime of each live hostile.
    hostiles: Vec<f64>,
    pickup_plan: Vec<ItemKind>,
    last_pickup_at: f64,
    fortified: bool,
    turrets: u32,
    repairing: Option<IssueKind>,
}

impl Autopilot {
    /// Create a crew seeded for reproducible play.
    pub fn new(config: AutopilotConfig, seed: u64, dt: f64) -> Self {
        Self {
            config: config.sanitized(),
            rng: StdRng::seed_from_u64(seed),
            dt,
            last_phase: None,
            hostiles: Vec::new(),
            pickup_plan: Vec::new(),
            last_pickup_at: 0.0,
            fortified: false,
            turrets: 0,
            repairing: None,
        }
    }

    /// Hostiles currently alive.
    pub fn live_hostiles(&self) -> usize {
        self.hostiles.len()
    }

    /// Turrets bought this run.
    pub const fn turrets(&self) -> u32 {
        self.turrets
    }

    fn on_phase_entered(&mut self, phase: Phase, session: &RunSession) {
        match phase {
            Phase::Landing => {
                self.hostiles.clear();
                self.pickup_plan.clear();
                self.fortified = false;
                self.turrets = 0;
                self.repairing = None;
            }
            Phase::Expedition => {
                self.pickup_plan = self.plan_pickups(session);
                self.last_pickup_at = 0.0;
                debug!(items = self.pickup_plan.len(), "Expedition pickup plan ready");
            }
            Phase::RunBack | Phase::Prep | Phase::FinalStand | Phase::EndSuccess | Phase::EndFail => {}
        }
    }

    /// Pickup order, consumed from the back: salvage first, then the
    /// required parts in random order.
    fn plan_pickups(&mut self, session: &RunSession) -> Vec<ItemKind> {
        let mut plan: Vec<ItemKind> = session
            .flow()
            .requirements()
            .iter()
            .flat_map(|req| std::iter::repeat_n(req.kind, usize::try_from(req.count).unwrap_or(0)))
            .collect();
        plan.shuffle(&mut self.rng);

        let room = session.cargo().free_slots().saturating_sub(plan.len());
        let wanted = usize::try_from(self.config.salvage_pickups).unwrap_or(usize::MAX);
        for _ in 0..wanted.min(room) {
            if let Some(kind) = ItemKind::SALVAGE.choose(&mut self.rng) {
                plan.push(*kind);
            }
        }
        plan
    }

    fn track(&mut self, order: &SpawnOrder) {
        let lifetime = self
            .rng
            .random_range(self.config.kill_delay_min_secs..=self.config.kill_delay_max_secs);
        let speedup = f64::from(self.turrets) + 1.0;
        self.hostiles.push(lifetime / speedup);
        debug!(unit = %order.unit_id, lifetime, "Hostile engaged");
    }

    fn resolve_hostiles(&mut self, session: &mut RunSession) {
        let dt = self.dt;
        let before = self.hostiles.len();
        self.hostiles.retain_mut(|remaining| {
            *remaining -= dt;
            *remaining > 0.0
        });
        for _ in self.hostiles.len()..before {
            session.register_kill();
        }
    }

    fn overwhelmed(&self) -> bool {
        let threshold = usize::try_from(self.config.overwhelm_threshold).unwrap_or(usize::MAX);
        threshold > 0 && self.hostiles.len() >= threshold
    }

    fn scavenge(&mut self, phase_elapsed: f64, session: &mut RunSession) {
        if phase_elapsed - self.last_pickup_at < self.config.pickup_interval_secs {
            return;
        }
        let Some(kind) = self.pickup_plan.pop() else {
            return;
        };
        self.last_pickup_at = phase_elapsed;
        match session.pickup_item(kind) {
            Ok(slot) => debug!(item = ?kind, slot, "Crew picked up item"),
            Err(e) => warn!(item = ?kind, error = %e, "Crew could not stow item"),
        }
    }

    /// Convert salvage and spend the points on turrets, once per run.
    fn fortify(&mut self, session: &mut RunSession) {
        if self.fortified {
            return;
        }
        self.fortified = true;

        let converted = session.convert_salvage();
        let cost = self.config.turret_cost;
        if cost > 0 {
            while session.defense().can_afford(cost) {
                if session.spend_defense(i64::from(cost)).is_err() {
                    break;
                }
                self.turrets = self.turrets.saturating_add(1);
            }
        }
        info!(
            converted,
            turrets = self.turrets,
            remaining = session.defense().balance(),
            "Crew fortified the ship"
        );
    }

    fn repair(&mut self, summary: &TickSummary, session: &mut RunSession) {
        if let Some(kind) = self.repairing {
            if summary.repaired.contains(&kind) || !session.issues().has_unresolved(kind) {
                session.release_repair(kind);
                self.repairing = None;
            } else if self.config.damage_chance > 0.0
                && self.rng.random_bool(self.config.damage_chance)
            {
                debug!(issue = ?kind, "Repairing crew member hit");
                session.notify_damage();
            }
        }

        if self.repairing.is_none() {
            let next = session
                .issues()
                .issues()
                .iter()
                .find(|issue| !issue.resolved)
                .map(|issue| issue.kind);
            if let Some(kind) = next {
                if session.hold_repair(kind) {
                    debug!(issue = ?kind, "Crew started repair");
                    self.repairing = Some(kind);
                }
            }
        }
    }
}

impl TickCallback for Autopilot {
    fn on_tick(&mut self, summary: &TickSummary, session: &mut RunSession) -> TickControl {
        if self.last_phase != Some(summary.phase) {
            self.last_phase = Some(summary.phase);
            self.on_phase_entered(summary.phase, session);
        }

        if let Some(order) = &summary.spawned {
            self.track(order);
        }
        self.resolve_hostiles(session);

        if !summary.phase.is_terminal() && self.overwhelmed() {
            warn!(
                hostiles = self.hostiles.len(),
                phase = %summary.phase,
                "Crew overwhelmed"
            );
            session.trigger_defeat();
            return TickControl::Continue;
        }

        match summary.phase {
            Phase::Landing => {
                if summary.phase_elapsed >= self.config.landing_delay_secs {
                    session.zone_exit();
                }
            }
            Phase::Expedition => self.scavenge(summary.phase_elapsed, session),
            Phase::RunBack => {
                if summary.phase_elapsed >= self.config.return_delay_secs {
                    session.zone_enter();
                }
            }
            Phase::Prep => {
                self.fortify(session);
                if summary.phase_elapsed >= self.config.prep_secs {
                    session.transition_to_next();
                }
            }
            Phase::FinalStand => {
                self.fortify(session);
                self.repair(summary, session);
            }
            Phase::EndSuccess | Phase::EndFail => {}
        }
        TickControl::Continue
    }
}
