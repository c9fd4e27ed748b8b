//! Phase machine behavior observed through a whole `RunSession`.
//!
//! These tests subscribe an `EventRecorder` to the session bus and check
//! what external listeners see.

#![allow(clippy::unwrap_used)]

use dropship_core::config::RunConfig;
use dropship_core::encounter::DiscardSink;
use dropship_core::session::RunSession;
use dropship_events::{EventRecorder, PhaseEvent};
use dropship_types::Phase;

fn make_session() -> (RunSession, EventRecorder) {
    let mut session = RunSession::new(RunConfig::default());
    let recorder = EventRecorder::new();
    session.subscribe(recorder.listener());
    (session, recorder)
}

#[test]
fn changed_events_match_requested_phases() {
    let (mut session, recorder) = make_session();
    let requests = [
        Phase::Expedition,
        Phase::Expedition,
        Phase::Prep,
        Phase::FinalStand,
        Phase::FinalStand,
        Phase::EndFail,
        Phase::Landing,
        Phase::Landing,
    ];

    let mut expected = Vec::new();
    let mut current = session.phase();
    for phase in requests {
        let transition = session.transition_to(phase);
        if phase == current {
            assert!(transition.is_none());
        } else {
            expected.push((current, phase));
            current = phase;
        }
    }

    assert_eq!(recorder.changes(), expected);
}

#[test]
fn next_visits_phases_in_run_order() {
    let (mut session, recorder) = make_session();
    for _ in 0..7 {
        session.transition_to_next().unwrap();
    }
    let visited: Vec<Phase> = recorder.changes().into_iter().map(|(_, to)| to).collect();
    assert_eq!(
        visited,
        vec![
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
fn exit_precedes_enter_precedes_changed() {
    let (mut session, recorder) = make_session();
    session.transition_to(Phase::Expedition).unwrap();
    assert_eq!(
        recorder.events(),
        vec![
            PhaseEvent::Exited(Phase::Landing),
            PhaseEvent::Entered(Phase::Expedition),
            PhaseEvent::Changed {
                from: Phase::Landing,
                to: Phase::Expedition
            },
        ]
    );
}

#[test]
fn terminal_phases_publish_no_exit() {
    let (mut session, recorder) = make_session();
    session.trigger_victory().unwrap();
    recorder.clear();
    session.transition_to_next().unwrap();
    assert!(
        !recorder
            .events()
            .iter()
            .any(|e| matches!(e, PhaseEvent::Exited(_)))
    );
    assert_eq!(session.phase(), Phase::Landing);
}

#[test]
fn clock_resets_on_transition_and_only_grows_within_phase() {
    let (mut session, _recorder) = make_session();
    let mut sink = DiscardSink;
    let mut last = session.phase_elapsed();
    for _ in 0..10 {
        session.tick(0.1, &mut sink);
        assert!(session.phase_elapsed() >= last);
        last = session.phase_elapsed();
    }
    session.transition_to(Phase::Prep).unwrap();
    assert!(session.phase_elapsed().abs() < 1e-12);
}

#[test]
fn unsubscribed_listener_stops_receiving() {
    let mut session = RunSession::new(RunConfig::default());
    let recorder = EventRecorder::new();
    let id = session.subscribe(recorder.listener());
    session.transition_to(Phase::Expedition).unwrap();
    assert!(session.unsubscribe(id));
    session.transition_to(Phase::RunBack).unwrap();
    assert_eq!(recorder.changes(), vec![(Phase::Landing, Phase::Expedition)]);
}
