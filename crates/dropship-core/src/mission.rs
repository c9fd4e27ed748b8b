//! Mission session: which mission is being played and how it went.
//!
//! A mission record comes from configuration and may be malformed.
//! [`MissionPlan::from_config`] turns it into the clamped values the rest
//! of the session applies at mission start.

use dropship_events::PhaseHooks;
use dropship_types::{MissionState, Phase};
use tracing::{debug, info, warn};

use crate::config::MissionConfig;

/// Mission record values after clamping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MissionPlan {
    /// Power cores needed for the objective.
    pub power_cores: u32,
    /// Fuel gels needed for the objective.
    pub fuel_gels: u32,
    /// Live threat at mission start.
    pub starting_threat: f64,
    /// Live threat growth multiplier.
    pub growth_multiplier: f64,
}

impl MissionPlan {
    /// Clamp a mission record. Negative counts and threat become zero and
    /// a non-finite or negative multiplier becomes one, each with a
    /// warning.
    pub fn from_config(config: &MissionConfig) -> Self {
        let power_cores = clamp_count("required_power_cores", config.required_power_cores);
        let fuel_gels = clamp_count("required_fuel_gels", config.required_fuel_gels);
        let starting_threat = f64::from(clamp_count("starting_threat", config.starting_threat));

        let growth_multiplier =
            if config.threat_growth_multiplier.is_finite() && config.threat_growth_multiplier >= 0.0 {
                config.threat_growth_multiplier
            } else {
                warn!(
                    mission = %config.mission_id,
                    value = config.threat_growth_multiplier,
                    "Invalid threat growth multiplier, using 1.0"
                );
                1.0
            };

        Self {
            power_cores,
            fuel_gels,
            starting_threat,
            growth_multiplier,
        }
    }
}

fn clamp_count(field: &'static str, value: i32) -> u32 {
    u32::try_from(value).unwrap_or_else(|_| {
        warn!(field, value, "Negative mission value clamped to zero");
        0
    })
}

/// Tracks the current mission and its outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissionSession {
    current: Option<MissionConfig>,
    state: MissionState,
    successes: u32,
    failures: u32,
}

impl MissionSession {
    /// Create a session with no mission.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `config` and mark it in progress.
    pub fn start(&mut self, config: MissionConfig) {
        info!(mission = %config.mission_id, name = %config.display_name, "Mission started");
        self.current = Some(config);
        self.state = MissionState::InProgress;
    }

    /// Mark the mission won.
    pub fn end_success(&mut self) {
        self.state = MissionState::Success;
        self.successes = self.successes.saturating_add(1);
        info!(mission = ?self.mission_id(), "Mission succeeded");
    }

    /// Mark the mission lost.
    pub fn end_fail(&mut self) {
        self.state = MissionState::Fail;
        self.failures = self.failures.saturating_add(1);
        info!(mission = ?self.mission_id(), "Mission failed");
    }

    /// Forget the mission.
    pub fn clear(&mut self) {
        self.current = None;
        self.state = MissionState::NotStarted;
    }

    /// Current state.
    pub const fn state(&self) -> MissionState {
        self.state
    }

    /// The selected mission.
    pub const fn current(&self) -> Option<&MissionConfig> {
        self.current.as_ref()
    }

    /// Identifier of the selected mission.
    pub fn mission_id(&self) -> Option<&str> {
        self.current.as_ref().map(|m| m.mission_id.as_str())
    }

    /// Runs won since creation.
    pub const fn successes(&self) -> u32 {
        self.successes
    }

    /// Runs lost since creation.
    pub const fn failures(&self) -> u32 {
        self.failures
    }
}

impl PhaseHooks for MissionSession {
    fn on_enter(&mut self, phase: Phase) {
        if self.current.is_none() {
            if phase.is_terminal() {
                debug!(phase = %phase, "Run ended without a mission selected");
            }
            return;
        }
        match phase {
            Phase::EndSuccess => self.end_success(),
            Phase::EndFail => self.end_fail(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn plan_from_defaults() {
        let plan = MissionPlan::from_config(&MissionConfig::default());
        assert_eq!(plan.power_cores, 2);
        assert_eq!(plan.fuel_gels, 2);
        assert!(plan.starting_threat.abs() < EPSILON);
        assert!((plan.growth_multiplier - 1.0).abs() < EPSILON);
    }

    #[test]
    fn plan_clamps_bad_values() {
        let config = MissionConfig {
            required_power_cores: -3,
            starting_threat: -10,
            threat_growth_multiplier: f64::NAN,
            ..MissionConfig::default()
        };
        let plan = MissionPlan::from_config(&config);
        assert_eq!(plan.power_cores, 0);
        assert!(plan.starting_threat.abs() < EPSILON);
        assert!((plan.growth_multiplier - 1.0).abs() < EPSILON);
    }

    #[test]
    fn terminal_phases_record_outcome() {
        let mut session = MissionSession::new();
        assert_eq!(session.state(), MissionState::NotStarted);

        session.start(MissionConfig::default());
        assert_eq!(session.state(), MissionState::InProgress);
        assert_eq!(session.mission_id(), Some("crash-site"));

        session.on_enter(Phase::EndFail);
        assert_eq!(session.state(), MissionState::Fail);
        session.on_enter(Phase::EndSuccess);
        assert_eq!(session.state(), MissionState::Success);
        assert_eq!((session.successes(), session.failures()), (1, 1));
    }

    #[test]
    fn no_mission_no_outcome() {
        let mut session = MissionSession::new();
        session.on_enter(Phase::EndSuccess);
        assert_eq!(session.state(), MissionState::NotStarted);
    }

    #[test]
    fn clear_forgets_mission() {
        let mut session = MissionSession::new();
        session.start(MissionConfig::default());
        session.clear();
        assert!(session.current().is_none());
        assert_eq!(session.state(), MissionState::NotStarted);
    }
}
