//! End-to-end run scenarios driven through `RunSession`.
//!
//! Each test plays part of a run the way the game loop would: zone
//! events, pickups, kills, repairs, and ticks.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;

use dropship_core::cargo::CargoError;
use dropship_core::config::{IssueConfig, MissionConfig, RunConfig};
use dropship_core::encounter::{RecordingSink, SpawnMode};
use dropship_core::session::RunSession;
use dropship_events::EventRecorder;
use dropship_types::{IssueKind, ItemKind, MissionState, Phase};

const EPSILON: f64 = 1e-9;

fn make_config(seed: u64) -> RunConfig {
    let mut config = RunConfig::default();
    config.simulation.seed = seed;
    config.mission = MissionConfig {
        required_power_cores: 1,
        required_fuel_gels: 1,
        ..MissionConfig::default()
    };
    config
}

fn make_session(seed: u64) -> RunSession {
    let mut session = RunSession::new(make_config(seed));
    session.begin_configured_mission();
    session
}

/// Play from landing to the start of the final stand.
fn play_to_final_stand(session: &mut RunSession, sink: &mut RecordingSink) {
    session.zone_exit().unwrap();
    for _ in 0..100 {
        session.tick(0.1, sink);
    }
    session.pickup_item(ItemKind::PowerCore).unwrap();
    session.pickup_item(ItemKind::ScrapMetal).unwrap();
    session.pickup_item(ItemKind::FuelGel).unwrap();
    assert_eq!(session.phase(), Phase::RunBack);

    for _ in 0..30 {
        session.tick(0.1, sink);
    }
    session.zone_enter().unwrap();
    assert_eq!(session.phase(), Phase::FinalStand);
}

#[test]
fn prep_generates_three_distinct_repairable_issues() {
    for seed in 0..20 {
        let mut session = make_session(seed);
        session.transition_to(Phase::Prep).unwrap();
        let kinds: HashSet<IssueKind> = session.issues().issues().iter().map(|i| i.kind).collect();
        assert_eq!(kinds.len(), 3);
        assert!(kinds.iter().all(|k| IssueKind::REPAIRABLE.contains(k)));
    }
}

#[test]
fn issue_bounds_follow_config() {
    let mut config = make_config(5);
    config.issues = IssueConfig {
        min_count: 1,
        max_count: 2,
    };
    let mut session = RunSession::new(config);
    for _ in 0..10 {
        session.transition_to(Phase::Prep).unwrap();
        let count = session.issues().total_count();
        assert!((1..=2).contains(&count));
        session.transition_to(Phase::Landing).unwrap();
        assert_eq!(session.issues().total_count(), 0);
    }
}

#[test]
fn full_run_ends_in_a_single_victory() {
    let mut session = make_session(11);
    let recorder = EventRecorder::new();
    session.subscribe(recorder.listener());
    let mut sink = RecordingSink::new();

    play_to_final_stand(&mut session, &mut sink);
    assert_eq!(session.convert_salvage(), 10);

    let kinds: Vec<IssueKind> = session.issues().issues().iter().map(|i| i.kind).collect();
    for kind in kinds {
        assert!(session.hold_repair(kind));
        while session.issues().has_unresolved(kind) {
            session.tick(0.5, &mut sink);
        }
        session.release_repair(kind);
    }

    // Keep ticking after the win; nothing else may fire.
    for _ in 0..20 {
        session.tick(0.5, &mut sink);
    }

    let victories = recorder
        .changes()
        .into_iter()
        .filter(|change| *change == (Phase::FinalStand, Phase::EndSuccess))
        .count();
    assert_eq!(victories, 1);
    assert_eq!(session.phase(), Phase::EndSuccess);
    assert_eq!(session.mission().state(), MissionState::Success);
    assert!(!session.encounters().is_active());
}

#[test]
fn resolving_issues_directly_wins_once() {
    let mut session = make_session(6);
    let recorder = EventRecorder::new();
    session.subscribe(recorder.listener());
    let mut sink = RecordingSink::new();
    play_to_final_stand(&mut session, &mut sink);

    let kinds: Vec<IssueKind> = session.issues().issues().iter().map(|i| i.kind).collect();
    assert!(!kinds.is_empty());
    for kind in &kinds {
        assert!(session.resolve_issue(*kind));
        assert!(!session.resolve_issue(*kind));
    }
    for _ in 0..10 {
        session.tick(0.1, &mut sink);
    }

    let victories = recorder
        .changes()
        .into_iter()
        .filter(|change| *change == (Phase::FinalStand, Phase::EndSuccess))
        .count();
    assert_eq!(victories, 1);
    assert_eq!(session.phase(), Phase::EndSuccess);
}

#[test]
fn only_salvage_pickups_add_debt() {
    let mut session = make_session(12);
    session.zone_exit().unwrap();
    let debt = session.threat().debt();

    session.pickup_item(ItemKind::PowerCore).unwrap();
    assert!((session.threat().debt() - debt).abs() < EPSILON);

    session.pickup_item(ItemKind::ScrapMetal).unwrap();
    let per_pickup = session.config().threat.debt_per_pickup;
    assert!((session.threat().debt() - debt - per_pickup).abs() < EPSILON);
}

#[test]
fn removed_items_leave_the_hold() {
    let mut session = make_session(10);
    session.zone_exit().unwrap();
    let slot = session.pickup_item(ItemKind::AlienTech).unwrap();
    assert_eq!(session.remove_item(ItemKind::AlienTech), Ok(slot));
    assert_eq!(
        session.remove_item(ItemKind::AlienTech),
        Err(CargoError::NotFound {
            kind: ItemKind::AlienTech
        })
    );
    assert_eq!(session.cargo().occupied(), 0);
}

#[test]
fn damage_delays_a_repair() {
    let mut session = make_session(3);
    let mut sink = RecordingSink::new();
    play_to_final_stand(&mut session, &mut sink);

    let kind = session.issues().issues().first().map(|i| i.kind).unwrap();
    session.hold_repair(kind);
    session.tick(2.5, &mut sink);
    session.notify_damage();
    session.tick(2.5, &mut sink);
    assert!(session.issues().has_unresolved(kind));
    session.tick(0.5, &mut sink);
    assert!(!session.issues().has_unresolved(kind));
}

#[test]
fn run_back_spawns_are_escalated() {
    let mut session = make_session(21);
    let mut sink = RecordingSink::new();
    session.zone_exit().unwrap();
    session.pickup_item(ItemKind::PowerCore).unwrap();
    session.pickup_item(ItemKind::FuelGel).unwrap();
    sink.drain();

    for _ in 0..100 {
        session.tick(0.1, &mut sink);
    }

    let orders = sink.drain();
    assert!(!orders.is_empty());
    let anchor = session.config().encounters.anchor;
    for order in &orders {
        assert_eq!(order.mode, SpawnMode::RunBack);
        assert!((order.speed_multiplier - 1.2).abs() < EPSILON);
        assert!((order.position.planar_distance(anchor) - 9.0).abs() < 1e-6);
    }
}

#[test]
fn new_landing_resets_threat_but_keeps_debt() {
    let mut session = make_session(8);
    let mut sink = RecordingSink::new();
    session.zone_exit().unwrap();
    for _ in 0..50 {
        session.tick(0.2, &mut sink);
    }
    session.register_kill();
    session.register_kill();
    assert!(session.threat().live_threat() > 0.0);

    let debt = session.threat().debt();
    session.trigger_defeat().unwrap();
    session.transition_to_next().unwrap();

    assert_eq!(session.phase(), Phase::Landing);
    assert!(session.threat().live_threat().abs() < EPSILON);
    assert_eq!(session.threat().kill_count(), 0);
    assert!((session.threat().debt() - debt).abs() < EPSILON);
    assert_eq!(session.issues().total_count(), 0);
    assert_eq!(session.cargo().occupied(), 0);
    assert_eq!(session.run_number(), 2);
}

#[test]
fn kills_add_debt_in_every_phase() {
    let mut session = make_session(1);
    for phase in Phase::ALL {
        session.transition_to(phase);
        let (debt, kills) = (session.threat().debt(), session.threat().kill_count());
        session.register_kill();
        assert!((session.threat().debt() - debt - 2.0).abs() < EPSILON);
        assert_eq!(session.threat().kill_count(), kills + 1);
    }
}

#[test]
fn second_run_can_complete_objective_again() {
    let mut session = make_session(4);
    let mut sink = RecordingSink::new();
    play_to_final_stand(&mut session, &mut sink);
    session.trigger_defeat().unwrap();
    assert_eq!(session.mission().state(), MissionState::Fail);

    session.begin_configured_mission();
    play_to_final_stand(&mut session, &mut sink);
    assert_eq!(session.run_number(), 2);
}

#[test]
fn same_seed_same_run() {
    let mut a = make_session(77);
    let mut b = make_session(77);
    let mut sink_a = RecordingSink::new();
    let mut sink_b = RecordingSink::new();
    play_to_final_stand(&mut a, &mut sink_a);
    play_to_final_stand(&mut b, &mut sink_b);

    assert_eq!(a.issues().issues(), b.issues().issues());
    assert_eq!(sink_a.orders.len(), sink_b.orders.len());
    for (x, y) in sink_a.orders.iter().zip(&sink_b.orders) {
        assert!((x.position.x - y.position.x).abs() < EPSILON);
        assert!((x.position.z - y.position.z).abs() < EPSILON);
    }
}

#[test]
fn snapshot_serializes_to_json() {
    let mut session = make_session(2);
    session.pickup_item(ItemKind::AlienTech).unwrap();
    let json = serde_json::to_value(session.snapshot()).unwrap();
    assert_eq!(json["phase"], "Landing");
    assert_eq!(json["cargo"][0], "AlienTech");
    assert_eq!(json["mission_state"], "InProgress");
}
