//! Lifecycle state machine for a single tracked symbol (spec §3, §4.B).
//!
//! ```text
//!      (none) ──allocate──▶ Allocated ──size==0 assumed──▶ AllocatedOfSizeZero
//!                               │              │
//!                               │              └──free──▶ Released
//!                               │
//!                               ├── free (matching) ──▶ Released
//!                               ├── ownership transfer ──▶ Relinquished
//!                               ├── escape (opaque call) ──▶ Escaped
//!                               └── assumed NULL ──▶ (untracked)
//! ```

use super::family::Family;
use super::ids::StatementId;
use serde::{Deserialize, Serialize};

/// A symbol's place in the lifecycle (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Live, size believed non-zero.
    Allocated,
    /// Live, size was on a path equal to zero.
    AllocatedOfSizeZero,
    /// Freed by a matching deallocator.
    Released,
    /// Ownership transferred out (e.g. `ownership_holds`, a takes-ownership
    /// method).
    Relinquished,
    /// Reachable by an opaque path; no further claims can be made.
    Escaped,
}

impl LifecycleState {
    /// Terminal states for a path are fine at symbol death; `Allocated` and
    /// `AllocatedOfSizeZero` are not — those produce a leak (spec §3, §4.J).
    pub fn is_leak_candidate(&self) -> bool {
        matches!(self, LifecycleState::Allocated | LifecycleState::AllocatedOfSizeZero)
    }

    pub fn is_live(&self) -> bool {
        self.is_leak_candidate()
    }
}

/// `(state, family, origin_statement)` — spec §3.
///
/// Invariant I1: `family` is never the spec's `None` sentinel — that case is
/// represented by the record's simple absence from the region table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefRecord {
    pub state: LifecycleState,
    pub family: Family,
    pub origin_statement: StatementId,
}

impl RefRecord {
    pub fn new(state: LifecycleState, family: Family, origin_statement: StatementId) -> Self {
        Self { state, family, origin_statement }
    }

    /// Return a copy of this record transitioned to `state`, re-stamped with
    /// the statement that caused the transition (spec §3: origin_statement
    /// "is the statement of the call/expression that caused the most recent
    /// state entry").
    pub fn transition(&self, state: LifecycleState, at: StatementId) -> Self {
        Self { state, family: self.family, origin_statement: at }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(state: LifecycleState) -> RefRecord {
        RefRecord::new(state, Family::Malloc, StatementId(1))
    }

    #[test]
    fn leak_candidates_match_spec_terminal_states() {
        assert!(LifecycleState::Allocated.is_leak_candidate());
        assert!(LifecycleState::AllocatedOfSizeZero.is_leak_candidate());
        assert!(!LifecycleState::Released.is_leak_candidate());
        assert!(!LifecycleState::Relinquished.is_leak_candidate());
        assert!(!LifecycleState::Escaped.is_leak_candidate());
    }

    #[test]
    fn transition_rewrites_state_and_origin_only() {
        let r = rec(LifecycleState::Allocated);
        let r2 = r.transition(LifecycleState::Released, StatementId(7));
        assert_eq!(r2.state, LifecycleState::Released);
        assert_eq!(r2.family, r.family);
        assert_eq!(r2.origin_statement, StatementId(7));
    }
}
