//! Phase state machine: the hub every other subsystem listens to.
//!
//! The machine holds the current [`Phase`] and the [`PhaseClock`], and
//! exposes the only mutator for phase change. A successful transition
//! returns a [`PhaseTransition`] record whose [`events`] the run session
//! fans out to its subsystems and to the external [`PhaseBus`]:
//! exit of the old phase, enter of the new phase, then the generic change.
//!
//! Subsystems never hold the machine. When they want a transition they
//! return a [`PhaseRequest`], which the session applies before the call
//! that produced it returns.
//!
//! [`events`]: PhaseTransition::events
//! [`PhaseBus`]: dropship_events::PhaseBus

use dropship_events::PhaseEvent;
use dropship_types::Phase;
use tracing::{debug, info, warn};

use crate::clock::{ClockError, PhaseClock};

/// The fixed successor of every phase.
///
/// `Landing -> Expedition -> RunBack -> Prep -> FinalStand -> EndSuccess`,
/// and both terminal phases loop back to `Landing`.
pub const fn successor(phase: Phase) -> Phase {
    match phase {
        Phase::Landing => Phase::Expedition,
        Phase::Expedition => Phase::RunBack,
        Phase::RunBack => Phase::Prep,
        Phase::Prep => Phase::FinalStand,
        Phase::FinalStand => Phase::EndSuccess,
        Phase::EndSuccess | Phase::EndFail => Phase::Landing,
    }
}

/// A transition a subsystem wants the session to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseRequest {
    /// Go to a specific phase.
    To(Phase),
    /// Go to the fixed successor of the current phase.
    Next,
    /// Go to [`Phase::EndSuccess`].
    Victory,
    /// Go to [`Phase::EndFail`].
    Defeat,
}

impl PhaseRequest {
    /// The concrete phase this request targets when `current` is current.
    pub const fn target(self, current: Phase) -> Phase {
        match self {
            Self::To(phase) => phase,
            Self::Next => successor(current),
            Self::Victory => Phase::EndSuccess,
            Self::Defeat => Phase::EndFail,
        }
    }
}

/// Record of one completed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhaseTransition {
    /// The phase that was current before.
    pub from: Phase,
    /// The phase that is current now.
    pub to: Phase,
}

impl PhaseTransition {
    /// The ordered notifications for this transition.
    pub fn events(&self) -> Vec<PhaseEvent> {
        PhaseEvent::for_transition(self.from, self.to)
    }
}

/// The phase state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseMachine {
    current: Phase,
    clock: PhaseClock,
    transitions: u64,
}

impl PhaseMachine {
    /// Create a machine in [`Phase::Landing`] with the clock at zero.
    pub const fn new() -> Self {
        Self {
            current: Phase::Landing,
            clock: PhaseClock::new(),
            transitions: 0,
        }
    }

    /// The current phase.
    pub const fn current(&self) -> Phase {
        self.current
    }

    /// Seconds since the current phase began.
    pub const fn phase_elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    /// The phase clock.
    pub const fn clock(&self) -> &PhaseClock {
        &self.clock
    }

    /// Number of transitions performed since creation.
    pub const fn transition_count(&self) -> u64 {
        self.transitions
    }

    /// Move to `phase`.
    ///
    /// Returns `None` (with a warning) when `phase` is already current.
    /// Otherwise the phase and clock are updated and the transition record
    /// is returned; the caller is responsible for publishing its events.
    pub fn transition_to(&mut self, phase: Phase) -> Option<PhaseTransition> {
        if self.current == phase {
            warn!(phase = %phase, "Already in requested phase, ignoring transition");
            return None;
        }

        let from = self.current;
        self.current = phase;
        self.clock.reset();
        self.transitions = self.transitions.saturating_add(1);

        info!(from = %from, to = %phase, "Phase transition");
        Some(PhaseTransition { from, to: phase })
    }

    /// Move to the fixed successor of the current phase.
    pub fn transition_to_next(&mut self) -> Option<PhaseTransition> {
        self.transition_to(successor(self.current))
    }

    /// Move to [`Phase::EndSuccess`].
    pub fn trigger_victory(&mut self) -> Option<PhaseTransition> {
        self.transition_to(Phase::EndSuccess)
    }

    /// Move to [`Phase::EndFail`].
    pub fn trigger_defeat(&mut self) -> Option<PhaseTransition> {
        self.transition_to(Phase::EndFail)
    }

    /// Apply a subsystem request.
    pub fn apply(&mut self, request: PhaseRequest) -> Option<PhaseTransition> {
        debug!(?request, current = %self.current, "Applying phase request");
        self.transition_to(request.target(self.current))
    }

    /// Advance the phase clock by `dt`. Nothing else changes on tick.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidDelta`] for a negative or non-finite
    /// delta.
    pub fn tick(&mut self, dt: f64) -> Result<f64, ClockError> {
        self.clock.advance(dt)
    }
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn starts_in_landing() {
        let machine = PhaseMachine::new();
        assert_eq!(machine.current(), Phase::Landing);
        assert_eq!(machine.transition_count(), 0);
    }

    #[test]
    fn successor_table_is_total() {
        assert_eq!(successor(Phase::Landing), Phase::Expedition);
        assert_eq!(successor(Phase::Expedition), Phase::RunBack);
        assert_eq!(successor(Phase::RunBack), Phase::Prep);
        assert_eq!(successor(Phase::Prep), Phase::FinalStand);
        assert_eq!(successor(Phase::FinalStand), Phase::EndSuccess);
        assert_eq!(successor(Phase::EndSuccess), Phase::Landing);
        assert_eq!(successor(Phase::EndFail), Phase::Landing);
        for phase in Phase::ALL {
            assert_ne!(successor(phase), phase);
        }
    }

    #[test]
    fn repeated_next_visits_phases_in_order() {
        let mut machine = PhaseMachine::new();
        let mut visited = vec![machine.current()];
        for _ in 0..7 {
            machine.transition_to_next().unwrap();
            visited.push(machine.current());
        }
        assert_eq!(
            visited,
            vec![
                Phase::Landing,
                Phase::Expedition,
                Phase::RunBack,
                Phase::Prep,
                Phase::FinalStand,
                Phase::EndSuccess,
                Phase::Landing,
                Phase::Expedition,
            ]
        );
    }

    #[test]
    fn same_phase_transition_is_ignored() {
        let mut machine = PhaseMachine::new();
        machine.tick(1.5).unwrap();
        assert!(machine.transition_to(Phase::Landing).is_none());
        assert_eq!(machine.transition_count(), 0);
        assert!((machine.phase_elapsed() - 1.5).abs() < EPSILON);
    }

    #[test]
    fn transition_resets_clock() {
        let mut machine = PhaseMachine::new();
        machine.tick(2.0).unwrap();
        let t = machine.transition_to(Phase::Expedition).unwrap();
        assert_eq!(t.from, Phase::Landing);
        assert_eq!(t.to, Phase::Expedition);
        assert!(machine.phase_elapsed().abs() < EPSILON);
    }

    #[test]
    fn victory_and_defeat_shortcuts() {
        let mut machine = PhaseMachine::new();
        let t = machine.trigger_defeat().unwrap();
        assert_eq!(t.to, Phase::EndFail);
        assert!(machine.trigger_defeat().is_none());
        let t = machine.trigger_victory().unwrap();
        assert_eq!((t.from, t.to), (Phase::EndFail, Phase::EndSuccess));
    }

    #[test]
    fn request_targets() {
        assert_eq!(PhaseRequest::Next.target(Phase::Prep), Phase::FinalStand);
        assert_eq!(PhaseRequest::Victory.target(Phase::Prep), Phase::EndSuccess);
        assert_eq!(PhaseRequest::Defeat.target(Phase::Prep), Phase::EndFail);
        assert_eq!(
            PhaseRequest::To(Phase::RunBack).target(Phase::Landing),
            Phase::RunBack
        );
    }

    #[test]
    fn transition_events_are_ordered() {
        let t = PhaseTransition {
            from: Phase::FinalStand,
            to: Phase::EndSuccess,
        };
        let events = t.events();
        assert_eq!(events.first(), Some(&PhaseEvent::Exited(Phase::FinalStand)));
        assert_eq!(
            events.last(),
            Some(&PhaseEvent::Changed {
                from: Phase::FinalStand,
                to: Phase::EndSuccess
            })
        );
    }

    #[test]
    fn invalid_tick_leaves_clock() {
        let mut machine = PhaseMachine::new();
        assert!(machine.tick(-1.0).is_err());
        assert!(machine.phase_elapsed().abs() < EPSILON);
    }
}
