//! Completion monitor: victory once every issue is repaired during the
//! final stand.

use dropship_events::PhaseHooks;
use dropship_types::Phase;
use tracing::info;

use crate::issues::IssueTracker;
use crate::phase::PhaseRequest;

/// Requests victory exactly once per final stand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionMonitor {
    active: bool,
    victories: u32,
}

impl CompletionMonitor {
    /// Create an inactive monitor.
    pub const fn new() -> Self {
        Self {
            active: false,
            victories: 0,
        }
    }

    /// Check the tracker. Returns [`PhaseRequest::Victory`] the first time
    /// every issue reads resolved while active.
    ///
    /// The monitor deactivates itself before returning the request, so a
    /// second tick can never request victory again.
    pub fn tick(&mut self, issues: &IssueTracker) -> Option<PhaseRequest> {
        if !self.active || !issues.all_resolved() {
            return None;
        }
        self.active = false;
        self.victories = self.victories.saturating_add(1);
        info!("Ship repaired, requesting victory");
        Some(PhaseRequest::Victory)
    }

    /// Whether the monitor is watching.
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Victories requested since creation.
    pub const fn victories(&self) -> u32 {
        self.victories
    }
}

impl PhaseHooks for CompletionMonitor {
    fn on_exit(&mut self, phase: Phase) {
        if phase == Phase::FinalStand {
            self.active = false;
        }
    }

    fn on_enter(&mut self, phase: Phase) {
        if phase == Phase::FinalStand {
            self.active = true;
        }
    }
}
