//! Typed phase notifications for the Dropship run orchestrator.
//!
//! Every phase transition produces a fixed, ordered sequence of
//! [`PhaseEvent`]s: the exit of the old phase, the entry of the new phase,
//! and a generic change notification carrying both. Subsystems owned by the
//! run session react through the [`PhaseHooks`] trait; out-of-process style
//! collaborators (UI, spawner adapters, tests) subscribe to a [`PhaseBus`].
//!
//! Dispatch is synchronous. All exit hooks run before any enter hook, and
//! the change notification always runs last. The order in which different
//! subscribers see the *same* event is registration order today, but
//! callers must not rely on it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use dropship_types::Phase;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Number of events retained in the bus journal.
pub const JOURNAL_CAPACITY: usize = 128;

/// A single phase notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseEvent {
    /// The given phase has been left.
    Exited(Phase),
    /// The given phase has been entered.
    Entered(Phase),
    /// The current phase changed from `from` to `to`.
    Changed {
        /// The phase that was current before the transition.
        from: Phase,
        /// The phase that is current after the transition.
        to: Phase,
    },
}

impl PhaseEvent {
    /// The ordered notifications for a transition from `from` to `to`.
    ///
    /// Terminal phases publish no exit notification.
    pub fn for_transition(from: Phase, to: Phase) -> Vec<Self> {
        let mut events = Vec::with_capacity(3);
        if from.publishes_exit() {
            events.push(Self::Exited(from));
        }
        events.push(Self::Entered(to));
        events.push(Self::Changed { from, to });
        events
    }

    /// Deliver this event to the matching hook on `hooks`.
    pub fn dispatch(&self, hooks: &mut dyn PhaseHooks) {
        match *self {
            Self::Exited(phase) => hooks.on_exit(phase),
            Self::Entered(phase) => hooks.on_enter(phase),
            Self::Changed { from, to } => hooks.on_changed(from, to),
        }
    }
}

/// Per-phase reactions implemented by the subsystems of a run session.
///
/// Every method defaults to a no-op so a subsystem only overrides the hooks
/// it cares about.
pub trait PhaseHooks {
    /// Called when `phase` is left.
    fn on_exit(&mut self, _phase: Phase) {}

    /// Called when `phase` is entered.
    fn on_enter(&mut self, _phase: Phase) {}

    /// Called last, once per transition.
    fn on_changed(&mut self, _from: Phase, _to: Phase) {}
}

/// An external subscriber to phase notifications.
pub trait PhaseListener {
    /// Receive one notification.
    fn on_phase_event(&mut self, event: &PhaseEvent);
}

impl<F> PhaseListener for F
where
    F: FnMut(&PhaseEvent),
{
    fn on_phase_event(&mut self, event: &PhaseEvent) {
        self(event);
    }
}

/// Handle returned by [`PhaseBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Observer list for phase notifications, with a bounded journal of the
/// most recent events.
pub struct PhaseBus {
    listeners: Vec<(ListenerId, Box<dyn PhaseListener>)>,
    next_id: u64,
    journal: VecDeque<PhaseEvent>,
}

impl PhaseBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 0,
            journal: VecDeque::with_capacity(JOURNAL_CAPACITY),
        }
    }

    /// Register a listener. It receives every event published afterwards.
    pub fn subscribe(&mut self, listener: Box<dyn PhaseListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.listeners.push((id, listener));
        debug!(listener = id.0, total = self.listeners.len(), "Phase listener subscribed");
        id
    }

    /// Remove a listener. Returns `false` (with a warning) if it was not
    /// registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        let removed = self.listeners.len() < before;
        if !removed {
            warn!(listener = id.0, "Unsubscribe requested for unknown phase listener");
        }
        removed
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver `event` to every listener and append it to the journal.
    pub fn publish(&mut self, event: &PhaseEvent) {
        for (_, listener) in &mut self.listeners {
            listener.on_phase_event(event);
        }
        if self.journal.len() >= JOURNAL_CAPACITY {
            self.journal.pop_front();
        }
        self.journal.push_back(*event);
    }

    /// The most recent events, oldest first.
    pub const fn journal(&self) -> &VecDeque<PhaseEvent> {
        &self.journal
    }

    /// Only the change notifications from the journal, oldest first.
    pub fn changes(&self) -> Vec<(Phase, Phase)> {
        self.journal
            .iter()
            .filter_map(|e| match *e {
                PhaseEvent::Changed { from, to } => Some((from, to)),
                PhaseEvent::Exited(_) | PhaseEvent::Entered(_) => None,
            })
            .collect()
    }

    /// Forget journaled events.
    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }
}

impl Default for PhaseBus {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for PhaseBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PhaseBus")
            .field("listeners", &self.listeners.len())
            .field("journal", &self.journal.len())
            .finish_non_exhaustive()
    }
}

/// A listener that keeps every event it receives.
///
/// Clones share the same buffer, so a recorder can be handed to a bus via
/// [`EventRecorder::listener`] and inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Rc<RefCell<Vec<PhaseEvent>>>,
}

impl EventRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A boxed listener that appends to this recorder.
    pub fn listener(&self) -> Box<dyn PhaseListener> {
        Box::new(self.clone())
    }

    /// Every recorded event, oldest first.
    pub fn events(&self) -> Vec<PhaseEvent> {
        self.events.borrow().clone()
    }

    /// Only the recorded change notifications, oldest first.
    pub fn changes(&self) -> Vec<(Phase, Phase)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match *e {
                PhaseEvent::Changed { from, to } => Some((from, to)),
                PhaseEvent::Exited(_) | PhaseEvent::Entered(_) => None,
            })
            .collect()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Forget every recorded event.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl PhaseListener for EventRecorder {
    fn on_phase_event(&mut self, event: &PhaseEvent) {
        self.events.borrow_mut().push(*event);
    }
}
