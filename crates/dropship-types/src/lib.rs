//! Shared type definitions for the Dropship run orchestrator.
//!
//! This crate is the single source of truth for the value types exchanged
//! between the orchestrator subsystems and the surrounding game loop.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for sessions and spawned units
//! - [`enums`] -- Enumeration types (phases, issues, cargo items, threat levels)
//! - [`structs`] -- Value structs (positions, issues, snapshots)

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{IssueKind, ItemKind, MissionState, Phase, ThreatLevel};
pub use ids::{SessionId, UnitId};
pub use structs::{Issue, Position, RunSnapshot, ThreatSnapshot};
