//! Async run loop.
//!
//! [`run_session`] drives [`RunSession::tick`] at a fixed simulated delta
//! until one of three things happens:
//!
//! - **Run end**: the session reaches `EndSuccess` or `EndFail`
//! - **Tick limit**: `max_ticks` ticks have run (0 = unlimited)
//! - **Callback stop**: the [`TickCallback`] returns [`TickControl::Stop`]
//!
//! After every tick the callback receives a [`TickSummary`] and mutable
//! access to the session, which is where the game loop (or the engine's
//! autopilot) feeds kills, pickups, zone events and repairs back in.
//! Everything still happens on one task, one tick at a time.

use chrono::{DateTime, Utc};
use dropship_types::{IssueKind, Phase};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SimulationConfig;
use crate::encounter::{EncounterSink, SpawnOrder};
use crate::session::RunSession;

/// Errors that can occur when starting a run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RunnerError {
    /// The session is already in a terminal phase.
    #[error("session already ended in {phase}")]
    AlreadyEnded {
        /// The terminal phase the session is in.
        phase: Phase,
    },

    /// The tick interval is zero, so simulated time would never advance.
    #[error("tick interval must be at least 1 ms")]
    ZeroInterval,
}

/// Why a run loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunEndReason {
    /// The session reached `EndSuccess`.
    Victory,
    /// The session reached `EndFail`.
    Defeat,
    /// The tick limit was reached first.
    MaxTicksReached,
    /// The tick callback asked to stop.
    CallbackStop,
}

/// Loop limits and pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunBounds {
    /// Simulated milliseconds per tick.
    pub tick_interval_ms: u64,
    /// Tick limit (0 = unlimited).
    pub max_ticks: u64,
    /// Sleep `tick_interval_ms` of real time between ticks.
    pub paced: bool,
}

impl RunBounds {
    /// Simulated seconds per tick.
    #[allow(clippy::cast_precision_loss)]
    pub const fn tick_seconds(&self) -> f64 {
        self.tick_interval_ms as f64 / 1000.0
    }

    /// Whether `ticks` has reached the limit.
    pub const fn limit_reached(&self, ticks: u64) -> bool {
        self.max_ticks > 0 && ticks >= self.max_ticks
    }
}

impl From<&SimulationConfig> for RunBounds {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            tick_interval_ms: config.tick_interval_ms,
            max_ticks: config.max_ticks,
            paced: config.paced,
        }
    }
}

/// What one tick of the loop did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSummary {
    /// 1-based tick number within this loop.
    pub tick: u64,
    /// Phase after the tick.
    pub phase: Phase,
    /// Seconds in the current phase after the tick.
    pub phase_elapsed: f64,
    /// Live threat after the tick.
    pub live_threat: f64,
    /// Debt after the tick.
    pub debt: f64,
    /// The unit spawned on this tick, if any.
    pub spawned: Option<SpawnOrder>,
    /// Issues repaired on this tick.
    pub repaired: Vec<IssueKind>,
    /// `(from, to)` if the tick changed phase.
    pub transition: Option<(Phase, Phase)>,
}

/// Whether the loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickControl {
    /// Run the next tick.
    Continue,
    /// End the loop with [`RunEndReason::CallbackStop`].
    Stop,
}

/// Invoked after every tick with the summary and the session.
pub trait TickCallback {
    /// React to one tick.
    fn on_tick(&mut self, summary: &TickSummary, session: &mut RunSession) -> TickControl;
}

/// A callback that never intervenes.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _session: &mut RunSession) -> TickControl {
        TickControl::Continue
    }
}

/// Result of a run loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Why the loop ended.
    pub end_reason: RunEndReason,
    /// Phase when the loop ended.
    pub final_phase: Phase,
    /// Ticks executed.
    pub total_ticks: u64,
    /// The last tick summary, if any tick ran.
    pub final_summary: Option<TickSummary>,
    /// Wall-clock start of the loop.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end of the loop.
    pub finished_at: DateTime<Utc>,
}

/// Drive `session` until the run ends, the tick limit is hit, or the
/// callback stops the loop.
///
/// # Errors
///
/// Returns [`RunnerError::AlreadyEnded`] if the session starts in a
/// terminal phase and [`RunnerError::ZeroInterval`] if the bounds would
/// never advance time.
pub async fn run_session(
    session: &mut RunSession,
    sink: &mut dyn EncounterSink,
    bounds: RunBounds,
    callback: &mut dyn TickCallback,
) -> Result<RunOutcome, RunnerError> {
    if session.phase().is_terminal() {
        return Err(RunnerError::AlreadyEnded {
            phase: session.phase(),
        });
    }
    if bounds.tick_interval_ms == 0 {
        return Err(RunnerError::ZeroInterval);
    }

    let started_at = Utc::now();
    let dt = bounds.tick_seconds();
    let mut total_ticks: u64 = 0;
    let mut last_summary: Option<TickSummary> = None;

    info!(
        session = %session.id(),
        run = session.run_number(),
        tick_interval_ms = bounds.tick_interval_ms,
        max_ticks = bounds.max_ticks,
        paced = bounds.paced,
        "Run loop starting"
    );

    let end_reason = loop {
        // --- Check tick limit (before tick) ---
        if bounds.limit_reached(total_ticks) {
            info!(ticks = total_ticks, "Tick limit reached");
            break RunEndReason::MaxTicksReached;
        }

        // --- Execute tick ---
        let report = session.tick(dt, sink);
        total_ticks = total_ticks.saturating_add(1);

        let summary = TickSummary {
            tick: total_ticks,
            phase: session.phase(),
            phase_elapsed: session.phase_elapsed(),
            live_threat: session.threat().live_threat(),
            debt: session.threat().debt(),
            spawned: report.spawned,
            repaired: report.repaired,
            transition: report.transition.map(|t| (t.from, t.to)),
        };

        // --- Notify callback ---
        let control = callback.on_tick(&summary, session);
        last_summary = Some(summary);

        // --- Check run end (after callback, which may end the run) ---
        match session.phase() {
            Phase::EndSuccess => break RunEndReason::Victory,
            Phase::EndFail => break RunEndReason::Defeat,
            _ => {}
        }
        if control == TickControl::Stop {
            debug!(ticks = total_ticks, "Tick callback requested stop");
            break RunEndReason::CallbackStop;
        }

        // --- Sleep for tick interval ---
        if bounds.paced {
            tokio::time::sleep(tokio::time::Duration::from_millis(bounds.tick_interval_ms)).await;
        } else {
            tokio::task::yield_now().await;
        }
    };

    let outcome = RunOutcome {
        end_reason,
        final_phase: session.phase(),
        total_ticks,
        final_summary: last_summary,
        started_at,
        finished_at: Utc::now(),
    };
    log_run_end(&outcome);
    Ok(outcome)
}

/// Log how a run loop ended.
pub fn log_run_end(outcome: &RunOutcome) {
    info!(
        reason = ?outcome.end_reason,
        final_phase = %outcome.final_phase,
        total_ticks = outcome.total_ticks,
        final_threat = outcome.final_summary.as_ref().map(|s| s.live_threat),
        final_debt = outcome.final_summary.as_ref().map(|s| s.debt),
        "Run loop ended"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::encounter::{DiscardSink, RecordingSink};

    fn make_bounds(max_ticks: u64) -> RunBounds {
        RunBounds {
            tick_interval_ms: 100,
            max_ticks,
            paced: true,
        }
    }

    /// Defeats the run on a fixed tick.
    struct DefeatOnTick(u64);

    impl TickCallback for DefeatOnTick {
        fn on_tick(&mut self, summary: &TickSummary, session: &mut RunSession) -> TickControl {
            if summary.tick == self.0 {
                session.trigger_defeat();
            }
            TickControl::Continue
        }
    }

    /// Stops the loop after a fixed number of ticks.
    struct StopAfter(u64);

    impl TickCallback for StopAfter {
        fn on_tick(&mut self, summary: &TickSummary, _session: &mut RunSession) -> TickControl {
            if summary.tick >= self.0 {
                TickControl::Stop
            } else {
                TickControl::Continue
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_tick_limit() {
        let mut session = RunSession::new(RunConfig::default());
        let outcome = run_session(&mut session, &mut DiscardSink, make_bounds(5), &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(outcome.end_reason, RunEndReason::MaxTicksReached);
        assert_eq!(outcome.total_ticks, 5);
        assert_eq!(outcome.final_phase, Phase::Landing);
    }

    #[tokio::test(start_paused = true)]
    async fn ends_on_defeat() {
        let mut session = RunSession::new(RunConfig::default());
        let outcome = run_session(
            &mut session,
            &mut DiscardSink,
            make_bounds(100),
            &mut DefeatOnTick(3),
        )
        .await
        .unwrap();
        assert_eq!(outcome.end_reason, RunEndReason::Defeat);
        assert_eq!(outcome.total_ticks, 3);
        assert_eq!(outcome.final_phase, Phase::EndFail);
    }

    #[tokio::test(start_paused = true)]
    async fn callback_can_stop() {
        let mut session = RunSession::new(RunConfig::default());
        let outcome = run_session(&mut session, &mut DiscardSink, make_bounds(0), &mut StopAfter(4))
            .await
            .unwrap();
        assert_eq!(outcome.end_reason, RunEndReason::CallbackStop);
        assert_eq!(outcome.final_summary.map(|s| s.tick), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn expedition_spawns_reach_sink() {
        let mut session = RunSession::new(RunConfig::default());
        session.transition_to(Phase::Expedition);
        let mut sink = RecordingSink::new();
        let outcome = run_session(&mut session, &mut sink, make_bounds(50), &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(outcome.total_ticks, 50);
        // Five simulated seconds at a two-second base interval.
        assert!(!sink.orders.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_ended_session_and_zero_interval() {
        let mut session = RunSession::new(RunConfig::default());
        let zero = RunBounds {
            tick_interval_ms: 0,
            max_ticks: 1,
            paced: false,
        };
        assert_eq!(
            run_session(&mut session, &mut DiscardSink, zero, &mut NoOpCallback).await,
            Err(RunnerError::ZeroInterval)
        );

        session.trigger_victory();
        assert_eq!(
            run_session(&mut session, &mut DiscardSink, make_bounds(1), &mut NoOpCallback).await,
            Err(RunnerError::AlreadyEnded {
                phase: Phase::EndSuccess
            })
        );
    }

    #[test]
    fn bounds_from_config() {
        let bounds = RunBounds::from(&SimulationConfig::default());
        assert_eq!(bounds.tick_interval_ms, 16);
        assert!(!bounds.limit_reached(1_000_000));
        assert!((bounds.tick_seconds() - 0.016).abs() < 1e-12);
    }
}
