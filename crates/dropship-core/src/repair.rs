//! Repair bay: hold-to-repair stations, one per repairable issue kind.
//!
//! A station only makes progress during the final stand, while the crew
//! holds its interaction and while its issue is still broken. Letting go
//! or taking damage throws away the progress. On completion the station
//! reports its kind once so the session can resolve the issue.

use dropship_events::PhaseHooks;
use dropship_types::{IssueKind, Phase};
use tracing::{debug, error, info};

use crate::config::RepairConfig;
use crate::issues::IssueTracker;

/// One hold-to-repair interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairStation {
    kind: IssueKind,
    duration: f64,
    held: bool,
    repairing: bool,
    repaired: bool,
    progress: f64,
}

impl RepairStation {
    /// Create an idle station for `kind`.
    pub const fn new(kind: IssueKind, duration: f64) -> Self {
        Self {
            kind,
            duration,
            held: false,
            repairing: false,
            repaired: false,
            progress: 0.0,
        }
    }

    /// The crew starts (or keeps) holding the interaction.
    pub const fn hold(&mut self) {
        self.held = true;
    }

    /// The crew lets go. Any progress is lost.
    pub fn release(&mut self) {
        self.held = false;
        if self.repairing && !self.repaired {
            self.cancel("released");
        }
    }

    /// The crew member at the station took damage.
    pub fn interrupt(&mut self) {
        if self.repairing {
            self.cancel("damaged");
        }
    }

    fn cancel(&mut self, reason: &'static str) {
        debug!(kind = ?self.kind, progress = self.progress, reason, "Repair interrupted");
        self.repairing = false;
        self.progress = 0.0;
    }

    /// Advance the interaction by `dt`.
    ///
    /// `broken` tells the station whether its issue is still unresolved in
    /// the tracker. Returns the station's kind on the tick the repair
    /// completes.
    pub fn tick(&mut self, dt: f64, phase: Phase, broken: bool) -> Option<IssueKind> {
        if self.repaired || phase != Phase::FinalStand || !broken {
            return None;
        }

        if !self.held {
            if self.repairing {
                self.cancel("released");
            }
            return None;
        }

        if !self.repairing {
            self.repairing = true;
            self.progress = 0.0;
            debug!(kind = ?self.kind, "Repair started");
        }
        self.progress += dt;
        if self.progress < self.duration {
            return None;
        }

        self.repairing = false;
        self.repaired = true;
        self.progress = self.duration;
        info!(kind = ?self.kind, "Repair complete");
        Some(self.kind)
    }

    /// Return to the unrepaired, idle state.
    pub const fn reset(&mut self) {
        self.held = false;
        self.repairing = false;
        self.repaired = false;
        self.progress = 0.0;
    }

    /// The issue kind this station fixes.
    pub const fn kind(&self) -> IssueKind {
        self.kind
    }

    /// Seconds of uninterrupted hold so far.
    pub const fn progress(&self) -> f64 {
        self.progress
    }

    /// Progress as a fraction of the duration.
    pub fn progress_ratio(&self) -> f64 {
        (self.progress / self.duration).clamp(0.0, 1.0)
    }

    /// Whether the hold is in progress.
    pub const fn is_repairing(&self) -> bool {
        self.repairing
    }

    /// Whether this station has completed its repair.
    pub const fn is_repaired(&self) -> bool {
        self.repaired
    }

    /// Whether the crew is holding the interaction.
    pub const fn is_held(&self) -> bool {
        self.held
    }
}

/// The ship's set of repair stations.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairBay {
    stations: Vec<RepairStation>,
}

impl RepairBay {
    /// One station for every repairable kind.
    pub fn new(config: &RepairConfig) -> Self {
        Self {
            stations: IssueKind::REPAIRABLE
                .into_iter()
                .map(|kind| RepairStation::new(kind, config.duration_secs))
                .collect(),
        }
    }

    /// The station for `kind`, if one exists.
    pub fn station(&self, kind: IssueKind) -> Option<&RepairStation> {
        self.stations.iter().find(|s| s.kind == kind)
    }

    fn station_mut(&mut self, kind: IssueKind) -> Option<&mut RepairStation> {
        let station = self.stations.iter_mut().find(|s| s.kind == kind);
        if station.is_none() {
            error!(kind = ?kind, "No repair station for issue kind");
        }
        station
    }

    /// Hold the interaction at `kind`'s station. Returns `false` if no
    /// station exists for that kind.
    pub fn hold(&mut self, kind: IssueKind) -> bool {
        let Some(station) = self.station_mut(kind) else {
            return false;
        };
        station.hold();
        true
    }

    /// Release the interaction at `kind`'s station.
    pub fn release(&mut self, kind: IssueKind) -> bool {
        let Some(station) = self.station_mut(kind) else {
            return false;
        };
        station.release();
        true
    }

    /// Interrupt every station currently repairing.
    pub fn notify_damage(&mut self) {
        for station in &mut self.stations {
            station.interrupt();
        }
    }

    /// Advance every station. Returns the kinds completed on this tick.
    pub fn tick(&mut self, dt: f64, phase: Phase, issues: &IssueTracker) -> Vec<IssueKind> {
        self.stations
            .iter_mut()
            .filter_map(|station| {
                let broken = issues.is_active() && issues.has_unresolved(station.kind);
                station.tick(dt, phase, broken)
            })
            .collect()
    }

    /// All stations.
    pub fn stations(&self) -> &[RepairStation] {
        &self.stations
    }

    /// Reset every station.
    pub fn reset(&mut self) {
        for station in &mut self.stations {
            station.reset();
        }
    }
}

impl PhaseHooks for RepairBay {
    fn on_enter(&mut self, phase: Phase) {
        if phase == Phase::Landing {
            self.reset();
        }
    }
}
