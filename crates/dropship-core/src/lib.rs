//! Run lifecycle orchestration for Dropship.
//!
//! This crate owns the phase state machine that drives one run of a
//! cooperative survival session (`Landing`, `Expedition`, `RunBack`,
//! `Prep`, `FinalStand`, then victory or defeat) and the subsystems that
//! react to it. Everything is owned by a single [`RunSession`] and driven
//! by one tick per frame.
//!
//! # Modules
//!
//! - [`clock`] -- Phase clock and frame delta validation.
//! - [`config`] -- Configuration loading from `dropship-config.yaml` into
//!   strongly-typed structs.
//! - [`phase`] -- The phase state machine, successor table and
//!   [`PhaseRequest`].
//! - [`threat`] -- Live threat and debt escalation.
//! - [`encounter`] -- Threat-scaled spawn cadence and placement, and the
//!   [`EncounterSink`] seam.
//! - [`issues`] -- Ship issue generation and resolution.
//! - [`flow`] -- Zone and cargo driven forward transitions.
//! - [`completion`] -- Victory once every issue is repaired.
//! - [`cargo`] -- Shared slot-based cargo hold.
//! - [`defense`] -- Defense point currency and salvage conversion.
//! - [`repair`] -- Hold-to-repair stations.
//! - [`mission`] -- Mission selection, clamping and outcome.
//! - [`session`] -- [`RunSession`], the single-writer context.
//! - [`runner`] -- Async tick loop with run bounds and callbacks.
//!
//! [`PhaseRequest`]: phase::PhaseRequest
//! [`EncounterSink`]: encounter::EncounterSink
//! [`RunSession`]: session::RunSession

pub mod cargo;
pub mod clock;
pub mod completion;
pub mod config;
pub mod defense;
pub mod encounter;
pub mod flow;
pub mod issues;
pub mod mission;
pub mod phase;
pub mod repair;
pub mod runner;
pub mod session;
pub mod threat;
