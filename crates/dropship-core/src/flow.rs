//! Mission flow trigger: forward transitions driven by the crew.
//!
//! Three signals move a run forward:
//!
//! - leaving the landing zone during `Landing` starts the `Expedition`;
//! - the cargo hold reaching every objective threshold during
//!   `Expedition` starts the `RunBack`;
//! - being inside the landing zone during `RunBack` with the objective
//!   complete starts the `FinalStand`.
//!
//! The trigger never touches the phase machine. Every handler returns the
//! [`PhaseRequest`] it wants applied, if any.

use dropship_events::PhaseHooks;
use dropship_types::{ItemKind, Phase};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cargo::CargoLedger;
use crate::phase::PhaseRequest;

/// How many of one item kind the hold must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartRequirement {
    /// The objective item.
    pub kind: ItemKind,
    /// Count needed, always at least one.
    pub count: u32,
}

/// Watches cargo and zone occupancy and requests forward transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissionFlowTrigger {
    requirements: Vec<PartRequirement>,
    objective_complete: bool,
    crew_in_zone: bool,
}

impl MissionFlowTrigger {
    /// Create a trigger with no requirements.
    ///
    /// With no requirements the objective can never complete, so a
    /// mission must call [`configure_requirements`] before its run.
    ///
    /// [`configure_requirements`]: Self::configure_requirements
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the objective thresholds. Zero counts are dropped. Clears
    /// the completion and occupancy flags.
    pub fn configure_requirements(&mut self, power_cores: u32, fuel_gels: u32) {
        self.requirements = [
            (ItemKind::PowerCore, power_cores),
            (ItemKind::FuelGel, fuel_gels),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(kind, count)| PartRequirement { kind, count })
        .collect();
        self.objective_complete = false;
        self.crew_in_zone = false;
        info!(requirements = ?self.requirements, "Mission requirements configured");
    }

    /// The crew left the landing zone.
    pub fn on_zone_exit(&mut self, current: Phase) -> Option<PhaseRequest> {
        self.crew_in_zone = false;
        (current == Phase::Landing).then(|| {
            debug!("Crew left the landing zone");
            PhaseRequest::To(Phase::Expedition)
        })
    }

    /// The crew entered the landing zone.
    pub fn on_zone_enter(&mut self, current: Phase) -> Option<PhaseRequest> {
        self.crew_in_zone = true;
        self.check_return(current)
    }

    /// The crew is still inside the landing zone.
    pub fn on_zone_stay(&mut self, current: Phase) -> Option<PhaseRequest> {
        self.on_zone_enter(current)
    }

    /// An item was added to the shared hold.
    ///
    /// Only the first call that finds every threshold met can request a
    /// transition; later additions are ignored until the next landing or
    /// reconfiguration.
    pub fn on_item_added(
        &mut self,
        current: Phase,
        cargo: &dyn CargoLedger,
    ) -> Option<PhaseRequest> {
        if self.objective_complete || !self.requirements_met(cargo) {
            return None;
        }

        self.objective_complete = true;
        info!(phase = %current, "All objective parts collected");
        match current {
            Phase::Expedition => Some(PhaseRequest::To(Phase::RunBack)),
            _ => self.check_return(current),
        }
    }

    /// Request the final stand if the crew is home with the objective.
    pub fn check_return(&self, current: Phase) -> Option<PhaseRequest> {
        (current == Phase::RunBack && self.objective_complete && self.crew_in_zone).then(|| {
            info!("Crew returned with every objective part");
            PhaseRequest::To(Phase::FinalStand)
        })
    }

    /// Whether `cargo` holds at least every required count.
    ///
    /// Always `false` when no requirement is configured.
    pub fn requirements_met(&self, cargo: &dyn CargoLedger) -> bool {
        !self.requirements.is_empty()
            && self.requirements.iter().all(|req| {
                u32::try_from(cargo.count_of(req.kind)).unwrap_or(u32::MAX) >= req.count
            })
    }

    /// Configured thresholds.
    pub fn requirements(&self) -> &[PartRequirement] {
        &self.requirements
    }

    /// Whether the objective has been completed this run.
    pub const fn objective_complete(&self) -> bool {
        self.objective_complete
    }

    /// Whether the crew is inside the landing zone.
    pub const fn crew_in_zone(&self) -> bool {
        self.crew_in_zone
    }
}

impl PhaseHooks for MissionFlowTrigger {
    fn on_enter(&mut self, phase: Phase) {
        if phase == Phase::Landing {
            self.objective_complete = false;
            // The crew has to re-enter the zone before a return counts.
            self.crew_in_zone = false;
        }
    }
}
