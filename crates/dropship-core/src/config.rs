//! Configuration loading and typed config structures for a Dropship session.
//!
//! The canonical configuration lives in `dropship-config.yaml`. This module
//! defines strongly-typed structs that mirror the YAML structure, and
//! provides a loader that reads, overrides from the environment, and
//! validates the file. Every field has a default, so an empty document is
//! a valid configuration.

use std::path::Path;

use dropship_types::Position;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides `simulation.seed`.
pub const SEED_ENV_VAR: &str = "DROPSHIP_SEED";

/// Largest accepted `cargo.max_slots`.
pub const MAX_CARGO_SLOTS: u32 = 256;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is outside its allowed range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Explanation of what is wrong with the value.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level session configuration.
///
/// Mirrors the structure of `dropship-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Threat and debt escalation rates.
    #[serde(default)]
    pub threat: ThreatConfig,

    /// Encounter cadence, placement and phase multipliers.
    #[serde(default)]
    pub encounters: EncounterConfig,

    /// Ship issue generation.
    #[serde(default)]
    pub issues: IssueConfig,

    /// Hold-to-repair interaction.
    #[serde(default)]
    pub repair: RepairConfig,

    /// Shared cargo hold.
    #[serde(default)]
    pub cargo: CargoConfig,

    /// Defense point economy.
    #[serde(default)]
    pub defense: DefenseConfig,

    /// The mission record applied at mission start.
    #[serde(default)]
    pub mission: MissionConfig,

    /// Session driver settings.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RunConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `DROPSHIP_SEED` overrides `simulation.seed` when set to a valid
    /// integer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.simulation.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check every range constraint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("threat.base_rate", self.threat.base_rate)?;
        require_non_negative("threat.debt_rate", self.threat.debt_rate)?;
        require_non_negative("threat.debt_per_kill", self.threat.debt_per_kill)?;
        require_non_negative("threat.debt_per_pickup", self.threat.debt_per_pickup)?;
        require_non_negative("threat.growth_multiplier", self.threat.growth_multiplier)?;

        let enc = &self.encounters;
        require_positive("encounters.base_interval", enc.base_interval)?;
        require_positive("encounters.min_interval", enc.min_interval)?;
        require_non_negative("encounters.spawn_radius", enc.spawn_radius)?;
        require_positive("encounters.run_back_rate_multiplier", enc.run_back_rate_multiplier)?;
        require_positive("encounters.run_back_radius_multiplier", enc.run_back_radius_multiplier)?;
        require_positive("encounters.run_back_speed_multiplier", enc.run_back_speed_multiplier)?;
        require_positive(
            "encounters.final_stand_rate_multiplier",
            enc.final_stand_rate_multiplier,
        )?;
        require_positive(
            "encounters.final_stand_radius_multiplier",
            enc.final_stand_radius_multiplier,
        )?;

        if self.issues.min_count > self.issues.max_count {
            return Err(ConfigError::Invalid {
                field: "issues.min_count",
                reason: format!(
                    "min_count ({}) exceeds max_count ({})",
                    self.issues.min_count, self.issues.max_count
                ),
            });
        }

        require_positive("repair.duration_secs", self.repair.duration_secs)?;

        if self.simulation.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "simulation.tick_interval_ms",
                reason: "tick interval must be at least 1 ms".to_owned(),
            });
        }

        if self.cargo.max_slots == 0 {
            return Err(ConfigError::Invalid {
                field: "cargo.max_slots",
                reason: "cargo needs at least one slot".to_owned(),
            });
        }
        if self.cargo.max_slots > MAX_CARGO_SLOTS {
            return Err(ConfigError::Invalid {
                field: "cargo.max_slots",
                reason: format!(
                    "{} slots exceeds the limit of {MAX_CARGO_SLOTS}",
                    self.cargo.max_slots
                ),
            });
        }

        Ok(())
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be a finite value > 0, got {value}"),
        })
    }
}

fn require_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be a finite value >= 0, got {value}"),
        })
    }
}

/// Threat engine tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatConfig {
    /// Live threat gained per second while accumulating (before the growth
    /// multiplier).
    #[serde(default = "default_base_rate")]
    pub base_rate: f64,

    /// Debt gained per second while accumulating.
    #[serde(default = "default_debt_rate")]
    pub debt_rate: f64,

    /// Debt added per registered kill.
    #[serde(default = "default_debt_per_kill")]
    pub debt_per_kill: f64,

    /// Debt added per registered pickup.
    #[serde(default = "default_debt_per_pickup")]
    pub debt_per_pickup: f64,

    /// Initial growth multiplier (missions may override it).
    #[serde(default = "default_one")]
    pub growth_multiplier: f64,
}

impl Default for ThreatConfig {
    fn default() -> Self {
        Self {
            base_rate: default_base_rate(),
            debt_rate: default_debt_rate(),
            debt_per_kill: default_debt_per_kill(),
            debt_per_pickup: default_debt_per_pickup(),
            growth_multiplier: default_one(),
        }
    }
}

/// Encounter scheduler tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterConfig {
    /// Seconds between spawns at zero threat outside escalation phases.
    #[serde(default = "default_base_interval")]
    pub base_interval: f64,

    /// Floor for the spawn interval, in seconds.
    #[serde(default = "default_min_interval")]
    pub min_interval: f64,

    /// Distance from the anchor at which units appear.
    #[serde(default = "default_spawn_radius")]
    pub spawn_radius: f64,

    /// Center of the spawn ring.
    #[serde(default)]
    pub anchor: Position,

    /// Where spawned units head. `None` leaves units without a destination.
    #[serde(default)]
    pub target: Option<Position>,

    /// Spawn rate multiplier during the run back (> 1 spawns faster).
    #[serde(default = "default_run_back_rate_multiplier")]
    pub run_back_rate_multiplier: f64,

    /// Spawn radius multiplier during the run back (< 1 spawns closer).
    #[serde(default = "default_run_back_radius_multiplier")]
    pub run_back_radius_multiplier: f64,

    /// Unit speed multiplier applied to units spawned during the run back.
    #[serde(default = "default_run_back_speed_multiplier")]
    pub run_back_speed_multiplier: f64,

    /// Spawn rate multiplier during the final stand (< 1 spawns slower).
    #[serde(default = "default_final_stand_rate_multiplier")]
    pub final_stand_rate_multiplier: f64,

    /// Spawn radius multiplier during the final stand.
    #[serde(default = "default_final_stand_radius_multiplier")]
    pub final_stand_radius_multiplier: f64,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            base_interval: default_base_interval(),
            min_interval: default_min_interval(),
            spawn_radius: default_spawn_radius(),
            anchor: Position::ORIGIN,
            target: None,
            run_back_rate_multiplier: default_run_back_rate_multiplier(),
            run_back_radius_multiplier: default_run_back_radius_multiplier(),
            run_back_speed_multiplier: default_run_back_speed_multiplier(),
            final_stand_rate_multiplier: default_final_stand_rate_multiplier(),
            final_stand_radius_multiplier: default_final_stand_radius_multiplier(),
        }
    }
}

/// Issue generation bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueConfig {
    /// Fewest issues generated per run.
    #[serde(default = "default_issue_count")]
    pub min_count: u32,

    /// Most issues generated per run (clamped to the repairable pool).
    #[serde(default = "default_issue_count")]
    pub max_count: u32,
}

impl Default for IssueConfig {
    fn default() -> Self {
        Self {
            min_count: default_issue_count(),
            max_count: default_issue_count(),
        }
    }
}

/// Repair interaction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairConfig {
    /// Seconds the interaction must be held without interruption.
    #[serde(default = "default_repair_duration")]
    pub duration_secs: f64,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_repair_duration(),
        }
    }
}

/// Shared cargo settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoConfig {
    /// Number of cargo slots.
    #[serde(default = "default_max_slots")]
    pub max_slots: u32,
}

impl Default for CargoConfig {
    fn default() -> Self {
        Self {
            max_slots: default_max_slots(),
        }
    }
}

/// Defense point economy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenseConfig {
    /// Points credited per converted salvage item.
    #[serde(default = "default_points_per_salvage")]
    pub points_per_salvage: u32,
}

impl Default for DefenseConfig {
    fn default() -> Self {
        Self {
            points_per_salvage: default_points_per_salvage(),
        }
    }
}

/// The mission record applied by mission bootstrap.
///
/// Counts are signed so that malformed records can be detected and clamped
/// rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionConfig {
    /// Stable mission identifier.
    #[serde(default = "default_mission_id")]
    pub mission_id: String,

    /// Human-readable mission name.
    #[serde(default = "default_mission_name")]
    pub display_name: String,

    /// Power cores needed before the run back triggers.
    #[serde(default = "default_required_parts")]
    pub required_power_cores: i32,

    /// Fuel gels needed before the run back triggers.
    #[serde(default = "default_required_parts")]
    pub required_fuel_gels: i32,

    /// Live threat at the start of the mission.
    #[serde(default)]
    pub starting_threat: i32,

    /// Growth multiplier for live threat during the mission.
    #[serde(default = "default_one")]
    pub threat_growth_multiplier: f64,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            mission_id: default_mission_id(),
            display_name: default_mission_name(),
            required_power_cores: default_required_parts(),
            required_fuel_gels: default_required_parts(),
            starting_threat: 0,
            threat_growth_multiplier: default_one(),
        }
    }
}

/// Session driver settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seed for every random draw in the session.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds per tick in the paced runner.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Tick limit per run (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Runs the engine plays before exiting.
    #[serde(default = "default_max_runs")]
    pub max_runs: u32,

    /// Sleep `tick_interval_ms` of real time between ticks. When `false`
    /// ticks run back to back with the same simulated delta.
    #[serde(default = "default_paced")]
    pub paced: bool,
}

impl SimulationConfig {
    /// Apply `DROPSHIP_SEED` if it is set to a valid integer.
    pub fn apply_env_overrides(&mut self) {
        if let Some(seed) = std::env::var(SEED_ENV_VAR)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.seed = seed;
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: 0,
            max_runs: default_max_runs(),
            paced: default_paced(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: `"pretty"` or `"json"`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_one() -> f64 {
    1.0
}

const fn default_base_rate() -> f64 {
    1.0
}

const fn default_debt_rate() -> f64 {
    0.5
}

const fn default_debt_per_kill() -> f64 {
    2.0
}

const fn default_debt_per_pickup() -> f64 {
    5.0
}

const fn default_base_interval() -> f64 {
    2.0
}

const fn default_min_interval() -> f64 {
    0.2
}

const fn default_spawn_radius() -> f64 {
    15.0
}

const fn default_run_back_rate_multiplier() -> f64 {
    1.5
}

const fn default_run_back_radius_multiplier() -> f64 {
    0.6
}

const fn default_run_back_speed_multiplier() -> f64 {
    1.2
}

const fn default_final_stand_rate_multiplier() -> f64 {
    0.7
}

const fn default_final_stand_radius_multiplier() -> f64 {
    0.5
}

const fn default_issue_count() -> u32 {
    3
}

const fn default_repair_duration() -> f64 {
    3.0
}

const fn default_max_slots() -> u32 {
    6
}

const fn default_points_per_salvage() -> u32 {
    10
}

fn default_mission_id() -> String {
    "crash-site".to_owned()
}

fn default_mission_name() -> String {
    "Crash Site".to_owned()
}

const fn default_required_parts() -> i32 {
    2
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    16
}

const fn default_max_runs() -> u32 {
    1
}

const fn default_paced() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_log_format() -> String {
    "pretty".to_owned()
}
