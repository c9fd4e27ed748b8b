//! Value structs shared across the orchestrator.

use serde::{Deserialize, Serialize};

use crate::enums::{IssueKind, ItemKind, MissionState, Phase, ThreatLevel};
use crate::ids::SessionId;

/// A point in world space. `y` is height; encounters spawn on the `x`/`z`
/// plane at the anchor's height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// East-west coordinate.
    pub x: f64,
    /// Height.
    pub y: f64,
    /// North-south coordinate.
    pub z: f64,
}

impl Position {
    /// The world origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a position from its coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Offset this position on the ground plane, keeping its height.
    pub fn offset_planar(self, dx: f64, dz: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y,
            z: self.z + dz,
        }
    }

    /// Distance to `other` measured on the ground plane.
    pub fn planar_distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.z - other.z)
    }
}

/// One ship issue in the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Issue {
    /// Which system is broken.
    pub kind: IssueKind,
    /// Whether the crew has repaired it.
    pub resolved: bool,
}

impl Issue {
    /// Create a fresh, unresolved issue.
    pub const fn new(kind: IssueKind) -> Self {
        Self {
            kind,
            resolved: false,
        }
    }
}

/// Point-in-time view of the threat engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreatSnapshot {
    /// Moment-to-moment danger driving spawn cadence.
    pub live_threat: f64,
    /// Accumulated, non-decaying pressure.
    pub debt: f64,
    /// Kills registered since the last landing.
    pub kill_count: u32,
    /// Whether threat is currently growing with time.
    pub accumulating: bool,
    /// Coarse label for `live_threat`.
    pub level: ThreatLevel,
}

/// Point-in-time view of a whole run session, for logging and dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    /// The session this snapshot was taken from.
    pub session_id: SessionId,
    /// Run counter (1 for the first run of the session).
    pub run_number: u32,
    /// Current phase.
    pub phase: Phase,
    /// Seconds spent in the current phase.
    pub phase_elapsed: f64,
    /// Threat engine state.
    pub threat: ThreatSnapshot,
    /// Active issue set.
    pub issues: Vec<Issue>,
    /// Occupied cargo slots, in slot order.
    pub cargo: Vec<ItemKind>,
    /// Defense point balance.
    pub defense_points: u32,
    /// Mission progress.
    pub mission_state: MissionState,
    /// Units spawned since the session was created.
    pub units_spawned: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn planar_offset_keeps_height() {
        let p = Position::new(1.0, 5.0, -2.0).offset_planar(3.0, 4.0);
        assert!((p.x - 4.0).abs() < EPSILON);
        assert!((p.y - 5.0).abs() < EPSILON);
        assert!((p.z - 2.0).abs() < EPSILON);
    }

    #[test]
    fn planar_distance_ignores_height() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 100.0, 4.0);
        assert!((a.planar_distance(b) - 5.0).abs() < EPSILON);
    }

    #[test]
    fn new_issue_is_unresolved() {
        let issue = Issue::new(IssueKind::HullBreach);
        assert!(!issue.resolved);
        assert_eq!(issue.kind, IssueKind::HullBreach);
    }
}
