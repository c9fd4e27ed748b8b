//! Issue tracker: the ship malfunctions that gate launch.
//!
//! A fresh set of issues is rolled when the crew reaches `Prep` (or on
//! `FinalStand` entry if the run skipped `Prep`). Kinds are drawn without
//! replacement from the repairable pool, so the set never holds the same
//! kind twice. Landing clears the set.
//!
//! An empty set never counts as fully resolved.

use dropship_events::PhaseHooks;
use dropship_types::{Issue, IssueKind, Phase};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::config::IssueConfig;

/// Owns the active issue set of the current run.
#[derive(Debug, Clone)]
pub struct IssueTracker {
    config: IssueConfig,
    issues: Vec<Issue>,
    all_resolved: bool,
    active: bool,
    rng: StdRng,
}

impl IssueTracker {
    /// Create an empty tracker whose draws come from `seed`.
    pub fn new(config: IssueConfig, seed: u64) -> Self {
        Self {
            config,
            issues: Vec::new(),
            all_resolved: false,
            active: false,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Replace the active set with a freshly rolled one.
    ///
    /// The count is drawn uniformly from `[min_count, max_count]` and
    /// clamped to the size of the repairable pool.
    pub fn generate(&mut self) -> &[Issue] {
        let min = self.config.min_count.min(self.config.max_count);
        let max = self.config.max_count;
        let rolled = self.rng.random_range(min..=max);

        let mut pool = IssueKind::REPAIRABLE;
        pool.shuffle(&mut self.rng);
        let count = usize::try_from(rolled).unwrap_or(usize::MAX).min(pool.len());

        self.issues = pool.into_iter().take(count).map(Issue::new).collect();
        self.all_resolved = false;

        info!(
            count = self.issues.len(),
            kinds = ?self.issues.iter().map(|i| i.kind).collect::<Vec<_>>(),
            "Ship issues generated"
        );
        &self.issues
    }

    /// Mark the issue of `kind` resolved.
    ///
    /// Unknown and already-resolved kinds are logged and ignored. Returns
    /// `true` only when this call changed the issue.
    pub fn resolve(&mut self, kind: IssueKind) -> bool {
        let Some(issue) = self.issues.iter_mut().find(|i| i.kind == kind) else {
            warn!(kind = ?kind, "No active issue of this kind");
            return false;
        };
        if issue.resolved {
            warn!(kind = ?kind, "Issue already resolved");
            return false;
        }

        issue.resolved = true;
        info!(kind = ?kind, "Issue resolved");
        self.refresh_all_resolved();
        true
    }

    fn refresh_all_resolved(&mut self) {
        let was = self.all_resolved;
        self.all_resolved = !self.issues.is_empty() && self.issues.iter().all(|i| i.resolved);
        if self.all_resolved && !was {
            info!("All ship issues resolved");
        }
    }

    /// Clear the active set.
    pub fn reset(&mut self) {
        self.issues.clear();
        self.all_resolved = false;
    }

    /// Whether the set is non-empty and every issue is resolved.
    pub const fn all_resolved(&self) -> bool {
        self.all_resolved
    }

    /// The active set, in generation order.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// The issue of `kind`, if it is in the active set.
    pub fn get(&self, kind: IssueKind) -> Option<&Issue> {
        self.issues.iter().find(|i| i.kind == kind)
    }

    /// Whether `kind` is in the active set and still broken.
    pub fn has_unresolved(&self, kind: IssueKind) -> bool {
        self.get(kind).is_some_and(|i| !i.resolved)
    }

    /// Number of resolved issues.
    pub fn resolved_count(&self) -> usize {
        self.issues.iter().filter(|i| i.resolved).count()
    }

    /// Number of issues in the active set.
    pub fn total_count(&self) -> usize {
        self.issues.len()
    }

    /// Whether repairs are currently meaningful (`Prep` or `FinalStand`).
    pub const fn is_active(&self) -> bool {
        self.active
    }
}

impl PhaseHooks for IssueTracker {
    fn on_exit(&mut self, phase: Phase) {
        if phase == Phase::FinalStand {
            self.active = false;
        }
    }

    fn on_enter(&mut self, phase: Phase) {
        match phase {
            Phase::Prep => {
                self.generate();
            }
            Phase::FinalStand if self.issues.is_empty() => {
                debug!("Entered final stand without issues, generating now");
                self.generate();
            }
            Phase::Landing => self.reset(),
            _ => {}
        }
    }

    fn on_changed(&mut self, _from: Phase, to: Phase) {
        self.active = matches!(to, Phase::Prep | Phase::FinalStand);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn make_tracker(min: u32, max: u32) -> IssueTracker {
        IssueTracker::new(
            IssueConfig {
                min_count: min,
                max_count: max,
            },
            99,
        )
    }

    #[test]
    fn empty_set_is_not_resolved() {
        let tracker = make_tracker(3, 3);
        assert!(!tracker.all_resolved());
        assert_eq!(tracker.total_count(), 0);
    }

    #[test]
    fn generates_three_distinct_repairable_kinds() {
        let mut tracker = make_tracker(3, 3);
        tracker.generate();
        let kinds: HashSet<IssueKind> = tracker.issues().iter().map(|i| i.kind).collect();
        assert_eq!(kinds.len(), 3);
        assert!(kinds.iter().all(|k| k.is_repairable()));
        assert!(tracker.issues().iter().all(|i| !i.resolved));
    }

    #[test]
    fn count_is_clamped_to_pool() {
        let mut tracker = make_tracker(5, 9);
        tracker.generate();
        assert_eq!(tracker.total_count(), 3);
    }

    #[test]
    fn count_stays_within_bounds() {
        let mut tracker = make_tracker(1, 2);
        for _ in 0..50 {
            let n = tracker.generate().len();
            assert!((1..=2).contains(&n));
        }
    }

    #[test]
    fn all_resolved_only_after_last_issue() {
        let mut tracker = make_tracker(3, 3);
        let kinds: Vec<IssueKind> = tracker.generate().iter().map(|i| i.kind).collect();
        for (index, kind) in kinds.iter().enumerate() {
            assert!(!tracker.all_resolved());
            assert!(tracker.resolve(*kind));
            assert_eq!(tracker.resolved_count(), index + 1);
        }
        assert!(tracker.all_resolved());
    }

    #[test]
    fn resolving_twice_is_ignored() {
        let mut tracker = make_tracker(1, 1);
        let kind = tracker.generate().first().map(|i| i.kind);
        let kind = kind.unwrap_or(IssueKind::HullBreach);
        assert!(tracker.resolve(kind));
        assert!(!tracker.resolve(kind));
        assert!(tracker.all_resolved());
    }

    #[test]
    fn resolving_unknown_kind_is_ignored() {
        let mut tracker = make_tracker(3, 3);
        tracker.generate();
        assert!(!tracker.resolve(IssueKind::LifeSupport));
        assert_eq!(tracker.resolved_count(), 0);
    }

    #[test]
    fn prep_generates_and_landing_clears() {
        let mut tracker = make_tracker(3, 3);
        tracker.on_enter(Phase::Prep);
        tracker.on_changed(Phase::RunBack, Phase::Prep);
        assert_eq!(tracker.total_count(), 3);
        assert!(tracker.is_active());

        tracker.on_enter(Phase::Landing);
        tracker.on_changed(Phase::EndSuccess, Phase::Landing);
        assert_eq!(tracker.total_count(), 0);
        assert!(!tracker.is_active());
    }

    #[test]
    fn final_stand_keeps_existing_set() {
        let mut tracker = make_tracker(3, 3);
        tracker.on_enter(Phase::Prep);
        let first = tracker.issues().first().map(|i| i.kind).unwrap_or(IssueKind::HullBreach);
        tracker.resolve(first);
        tracker.on_enter(Phase::FinalStand);
        assert_eq!(tracker.resolved_count(), 1);
    }

    #[test]
    fn final_stand_generates_when_prep_was_skipped() {
        let mut tracker = make_tracker(3, 3);
        tracker.on_enter(Phase::FinalStand);
        assert_eq!(tracker.total_count(), 3);
        assert!(tracker.has_unresolved(IssueKind::PowerFailure));
    }
}
