//! Enumeration types for the Dropship run orchestrator.
//!
//! Phases of a run, ship issue kinds, cargo item kinds, coarse threat
//! levels, and mission progress states.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Run phases
// ---------------------------------------------------------------------------

/// A named stage of a run.
///
/// A run proceeds `Landing -> Expedition -> RunBack -> Prep -> FinalStand`
/// and ends in either [`Phase::EndSuccess`] or [`Phase::EndFail`]. Exactly
/// one phase is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Safe bubble around the ship; the crew readies up.
    Landing,
    /// Exploration away from the ship, gathering objective parts.
    Expedition,
    /// Chase back to the ship once every objective part is aboard.
    RunBack,
    /// Short window to place deployables before the final defense.
    Prep,
    /// Defend the ship while repairing its systems.
    FinalStand,
    /// Victory: the ship launched.
    EndSuccess,
    /// Defeat: the ship was destroyed or the crew wiped.
    EndFail,
}

impl Phase {
    /// Every phase in run order (terminal phases last).
    pub const ALL: [Self; 7] = [
        Self::Landing,
        Self::Expedition,
        Self::RunBack,
        Self::Prep,
        Self::FinalStand,
        Self::EndSuccess,
        Self::EndFail,
    ];

    /// Whether this phase ends the run.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::EndSuccess | Self::EndFail)
    }

    /// Whether leaving this phase publishes an exit notification.
    ///
    /// Terminal phases only publish an enter notification.
    pub const fn publishes_exit(self) -> bool {
        !self.is_terminal()
    }

    /// Stable lowercase name used in logs and config files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Landing => "landing",
            Self::Expedition => "expedition",
            Self::RunBack => "run_back",
            Self::Prep => "prep",
            Self::FinalStand => "final_stand",
            Self::EndSuccess => "end_success",
            Self::EndFail => "end_fail",
        }
    }
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Ship issues
// ---------------------------------------------------------------------------

/// A ship malfunction that must be repaired before launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    /// Power systems offline.
    PowerFailure,
    /// Hull damaged.
    HullBreach,
    /// Navigation computer malfunctioning.
    NavigationError,
    /// Life support failing. Never generated: no repair station exists.
    LifeSupport,
    /// Communications down. Never generated: no repair station exists.
    CommunicationLoss,
}

impl IssueKind {
    /// The kinds that have a repair station and can therefore be generated.
    pub const REPAIRABLE: [Self; 3] = [Self::PowerFailure, Self::HullBreach, Self::NavigationError];

    /// Whether a repair station exists for this kind.
    pub const fn is_repairable(self) -> bool {
        matches!(
            self,
            Self::PowerFailure | Self::HullBreach | Self::NavigationError
        )
    }
}

// ---------------------------------------------------------------------------
// Cargo items
// ---------------------------------------------------------------------------

/// A kind of item that can occupy a shared cargo slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    // --- Objective parts ---
    /// Power core; required to trigger the run back.
    PowerCore,
    /// Fuel gel; required to trigger the run back.
    FuelGel,

    // --- Salvage ---
    /// Scrap metal; converts to defense points.
    ScrapMetal,
    /// Alien technology; converts to defense points.
    AlienTech,
    /// Rare components; converts to defense points.
    RareComponents,

    // --- Reserved ---
    /// Medical supplies (reserved).
    MedicalSupplies,
    /// Energy cell (reserved).
    EnergyCell,
}

impl ItemKind {
    /// Salvage kinds, in the order they are consumed by conversion.
    pub const SALVAGE: [Self; 3] = [Self::ScrapMetal, Self::AlienTech, Self::RareComponents];

    /// Whether this item counts toward mission objectives.
    pub const fn is_objective_part(self) -> bool {
        matches!(self, Self::PowerCore | Self::FuelGel)
    }

    /// Whether this item converts into defense points.
    pub const fn is_salvage(self) -> bool {
        matches!(
            self,
            Self::ScrapMetal | Self::AlienTech | Self::RareComponents
        )
    }
}

// ---------------------------------------------------------------------------
// Threat
// ---------------------------------------------------------------------------

/// Coarse label for the live threat scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ThreatLevel {
    /// Below 50.
    Low,
    /// 50 up to (not including) 150.
    Medium,
    /// 150 up to (not including) 300.
    High,
    /// 300 and above.
    Critical,
}

impl ThreatLevel {
    /// Upper bound (exclusive) of [`ThreatLevel::Low`].
    pub const LOW_CEILING: f64 = 50.0;
    /// Upper bound (exclusive) of [`ThreatLevel::Medium`].
    pub const MEDIUM_CEILING: f64 = 150.0;
    /// Upper bound (exclusive) of [`ThreatLevel::High`].
    pub const HIGH_CEILING: f64 = 300.0;

    /// Map a live threat value onto its coarse label.
    pub fn from_threat(threat: f64) -> Self {
        if threat < Self::LOW_CEILING {
            Self::Low
        } else if threat < Self::MEDIUM_CEILING {
            Self::Medium
        } else if threat < Self::HIGH_CEILING {
            Self::High
        } else {
            Self::Critical
        }
    }
}

// ---------------------------------------------------------------------------
// Mission progress
// ---------------------------------------------------------------------------

/// Progress of the currently selected mission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissionState {
    /// No mission has been started in this session.
    #[default]
    NotStarted,
    /// A mission is being played.
    InProgress,
    /// The last run ended in victory.
    Success,
    /// The last run ended in defeat.
    Fail,
}
