//! Threat engine: live threat and accumulated debt.
//!
//! Two scalars escalate over a run. **Live threat** is moment-to-moment
//! danger and drives the encounter cadence; it grows with time while the
//! crew is out in the field and is zeroed when a new run lands. **Debt** is
//! pressure that never decays: it grows with time alongside live threat and
//! jumps on every kill and salvage pickup. Landing leaves debt untouched, so it
//! carries from one run of a session to the next.
//!
//! Kills and pickups add debt regardless of phase. Time-based growth only
//! happens while the engine is accumulating (`Expedition` and `RunBack`).

use dropship_events::PhaseHooks;
use dropship_types::{Phase, ThreatLevel, ThreatSnapshot};
use tracing::{debug, info, warn};

use crate::config::ThreatConfig;

/// Owns the live threat and debt scalars for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreatEngine {
    config: ThreatConfig,
    live_threat: f64,
    debt: f64,
    kill_count: u32,
    accumulating: bool,
    growth_multiplier: f64,
}

impl ThreatEngine {
    /// Create an engine with both scalars at zero, not accumulating.
    pub fn new(config: ThreatConfig) -> Self {
        let growth_multiplier = config.growth_multiplier.max(0.0);
        Self {
            config,
            live_threat: 0.0,
            debt: 0.0,
            kill_count: 0,
            accumulating: false,
            growth_multiplier,
        }
    }

    /// Advance time-based growth by `dt` seconds.
    ///
    /// Does nothing unless the engine is accumulating.
    pub fn tick(&mut self, dt: f64) {
        if !self.accumulating {
            return;
        }
        self.live_threat += self.config.base_rate * self.growth_multiplier * dt;
        self.debt += self.config.debt_rate * dt;
    }

    /// Register a kill: debt grows by `debt_per_kill` and the kill count by
    /// one.
    pub fn register_kill(&mut self) {
        self.debt += self.config.debt_per_kill;
        self.kill_count = self.kill_count.saturating_add(1);
        debug!(
            debt = self.debt,
            kills = self.kill_count,
            "Kill registered"
        );
    }

    /// Register a pickup: debt grows by `debt_per_pickup`.
    pub fn register_pickup(&mut self) {
        self.debt += self.config.debt_per_pickup;
        debug!(debt = self.debt, "Pickup registered");
    }

    /// Set live threat for the start of a mission. Negative values clamp
    /// to zero.
    pub fn set_starting_threat(&mut self, value: f64) {
        if !value.is_finite() {
            warn!(value, "Ignoring non-finite starting threat");
            return;
        }
        self.live_threat = value.max(0.0);
        info!(threat = self.live_threat, "Starting threat set");
    }

    /// Set the live threat growth multiplier. Negative values clamp to
    /// zero.
    pub fn set_growth_multiplier(&mut self, multiplier: f64) {
        if !multiplier.is_finite() {
            warn!(multiplier, "Ignoring non-finite growth multiplier");
            return;
        }
        self.growth_multiplier = multiplier.max(0.0);
        info!(multiplier = self.growth_multiplier, "Threat growth multiplier set");
    }

    /// Add live threat directly, for scripted spikes.
    pub fn add_live_threat(&mut self, amount: f64) {
        if !amount.is_finite() || amount < 0.0 {
            warn!(amount, "Ignoring invalid live threat increment");
            return;
        }
        self.live_threat += amount;
    }

    /// Add debt directly, for scripted penalties.
    pub fn add_debt(&mut self, amount: f64) {
        if !amount.is_finite() || amount < 0.0 {
            warn!(amount, "Ignoring invalid debt increment");
            return;
        }
        self.debt += amount;
    }

    /// Current live threat.
    pub const fn live_threat(&self) -> f64 {
        self.live_threat
    }

    /// Current debt.
    pub const fn debt(&self) -> f64 {
        self.debt
    }

    /// Kills since the last landing.
    pub const fn kill_count(&self) -> u32 {
        self.kill_count
    }

    /// Whether time-based growth is active.
    pub const fn is_accumulating(&self) -> bool {
        self.accumulating
    }

    /// Current growth multiplier.
    pub const fn growth_multiplier(&self) -> f64 {
        self.growth_multiplier
    }

    /// Coarse label for the current live threat.
    pub fn level(&self) -> ThreatLevel {
        ThreatLevel::from_threat(self.live_threat)
    }

    /// Point-in-time view for UI and logging.
    pub fn snapshot(&self) -> ThreatSnapshot {
        ThreatSnapshot {
            live_threat: self.live_threat,
            debt: self.debt,
            kill_count: self.kill_count,
            accumulating: self.accumulating,
            level: self.level(),
        }
    }
}

impl PhaseHooks for ThreatEngine {
    fn on_enter(&mut self, phase: Phase) {
        match phase {
            Phase::Landing => {
                self.live_threat = 0.0;
                self.kill_count = 0;
                self.accumulating = false;
                debug!(debt = self.debt, "Threat reset for landing, debt carried");
            }
            Phase::Expedition | Phase::RunBack => {
                self.accumulating = true;
            }
            Phase::Prep | Phase::FinalStand => {
                self.accumulating = false;
            }
            Phase::EndSuccess | Phase::EndFail => {}
        }
    }
}
