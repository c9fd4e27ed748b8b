//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the run loop so
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: dropship_core::config::ConfigError,
    },

    /// The run loop refused to start.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: dropship_core::runner::RunnerError,
    },

    /// The `autopilot` section of the config file is malformed.
    #[error("autopilot error: {message}")]
    Autopilot {
        /// Description of the autopilot config failure.
        message: String,
    },

    /// A run report could not be serialized.
    #[error("report error: {source}")]
    Report {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
