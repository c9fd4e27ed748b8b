//! Headless run driver for Dropship.
//!
//! Loads configuration, sets up logging, and plays `max_runs` runs of one
//! session with the scripted [`Autopilot`](autopilot::Autopilot) crew. Each
//! run ends on victory, defeat, or the tick limit, and a JSON run report is
//! logged.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the path given as the first argument, or
//!    `dropship-config.yaml`, falling back to defaults
//! 2. Initialize structured logging (tracing)
//! 3. Create the run session
//! 4. For each run: start the configured mission, run the loop, report

mod autopilot;
mod error;

use std::path::{Path, PathBuf};

use dropship_core::config::RunConfig;
use dropship_core::encounter::DiscardSink;
use dropship_core::runner::{self, RunBounds, RunOutcome};
use dropship_core::session::RunSession;
use dropship_types::RunSnapshot;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::autopilot::{Autopilot, AutopilotConfig};
use crate::error::EngineError;

/// Config file read when no path is given.
const DEFAULT_CONFIG_PATH: &str = "dropship-config.yaml";

/// What the engine logs after each run.
#[derive(Debug, Serialize)]
struct RunReport<'a> {
    run: u32,
    outcome: &'a RunOutcome,
    turrets: u32,
    snapshot: RunSnapshot,
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration loading or a run loop fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, found) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config);
    info!("dropship-engine starting");
    if found {
        info!(path = %config_path.display(), "Configuration file loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        seed = config.simulation.seed,
        tick_interval_ms = config.simulation.tick_interval_ms,
        max_ticks = config.simulation.max_ticks,
        max_runs = config.simulation.max_runs,
        paced = config.simulation.paced,
        mission = config.mission.mission_id,
        "Configuration loaded"
    );

    let autopilot_config = load_autopilot_config(&config_path)?;
    info!(
        pickup_interval_secs = autopilot_config.pickup_interval_secs,
        salvage_pickups = autopilot_config.salvage_pickups,
        overwhelm_threshold = autopilot_config.overwhelm_threshold,
        "Autopilot configuration loaded"
    );

    // 3. Create the session.
    let bounds = RunBounds::from(&config.simulation);
    let max_runs = config.simulation.max_runs;
    let seed = config.simulation.seed;
    let mut session = RunSession::new(config);
    info!(session = %session.id(), started_at = %session.started_at(), "Run session created");

    // 4. Play the runs.
    let mut sink = DiscardSink;
    let mut victories: u32 = 0;
    for run in 1..=max_runs {
        session.begin_configured_mission();
        let mut pilot = Autopilot::new(
            autopilot_config.clone(),
            seed.wrapping_add(u64::from(run)),
            bounds.tick_seconds(),
        );

        let outcome = runner::run_session(&mut session, &mut sink, bounds, &mut pilot).await?;
        if outcome.end_reason == runner::RunEndReason::Victory {
            victories = victories.saturating_add(1);
        }

        let report = RunReport {
            run,
            outcome: &outcome,
            turrets: pilot.turrets(),
            snapshot: session.snapshot(),
        };
        info!(
            run,
            live_hostiles = pilot.live_hostiles(),
            report = %serde_json::to_string(&report)?,
            "Run report"
        );
    }

    info!(
        runs = max_runs,
        victories,
        missions_won = session.mission().successes(),
        missions_lost = session.mission().failures(),
        "dropship-engine shut down"
    );
    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `logging.level`; `logging.format: json` switches
/// to JSON lines.
fn init_logging(config: &RunConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.logging.format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load the run configuration, or defaults when the file is missing.
///
/// The flag reports whether the file existed. Logging is not up yet, so
/// the caller logs it.
fn load_config(path: &Path) -> Result<(RunConfig, bool), EngineError> {
    if path.exists() {
        let config = RunConfig::from_file(path)?;
        Ok((config, true))
    } else {
        let mut config = RunConfig::default();
        config.simulation.apply_env_overrides();
        Ok((config, false))
    }
}

/// Read the `autopilot` section of the config file, if any.
fn load_autopilot_config(path: &Path) -> Result<AutopilotConfig, EngineError> {
    if !path.exists() {
        return Ok(AutopilotConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Autopilot {
        message: format!("failed to read config file: {e}"),
    })?;

    // Parse the full YAML and extract just the "autopilot" section.
    let raw: serde_yml::Value =
        serde_yml::from_str(&contents).map_err(|e| EngineError::Autopilot {
            message: format!("failed to parse config YAML: {e}"),
        })?;

    raw.get("autopilot").map_or_else(
        || Ok(AutopilotConfig::default()),
        |section| {
            serde_yml::from_value(section.clone()).map_err(|e| EngineError::Autopilot {
                message: format!("failed to parse autopilot config: {e}"),
            })
        },
    )
}
