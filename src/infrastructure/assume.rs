//! Assumption hook (spec §4.K).
//!
//! Invoked whenever the engine narrows a path by adding a constraint.
//! Unlike the other modelers, this one does not take a single symbol: it
//! sweeps the whole region table and realloc-pair table each time, since
//! the engine does not tell the checker *which* symbols a new constraint
//! touched.

use crate::domain::{CheckerState, LifecycleState, ReallocOwnershipPolicy, StatementId};
use crate::ports::{ConstraintManager, TriState};

/// `evalAssume` (spec §4.K). `at` is stamped as the `origin_statement` of
/// any record restored from a failed-realloc pair.
pub fn on_assume<C: ConstraintManager>(ctx: &C, state: &CheckerState, at: StatementId) -> CheckerState {
    let mut next = state.clone();

    // Sweep the region table: drop any symbol definitively null (failed
    // allocation — not a leak).
    let dead: Vec<_> = next
        .regions
        .iter()
        .filter(|(sym, _)| ctx.is_null(*sym) == TriState::True)
        .map(|(sym, _)| sym)
        .collect();
    for sym in dead {
        next.regions.remove(sym);
    }

    // Sweep the realloc-pair table: restore `fromSym` per its ownership
    // policy wherever `toSym` is definitively null.
    let failed_pairs: Vec<_> = next
        .realloc_pairs
        .iter()
        .filter(|(to_sym, _)| ctx.is_null(*to_sym) == TriState::True)
        .collect();

    for (to_sym, pair) in failed_pairs {
        match pair.policy {
            ReallocOwnershipPolicy::ToBeFreedAfterFailure => {
                if let Some(record) = next.regions.get(pair.from) {
                    next.regions.insert(pair.from, record.transition(LifecycleState::Allocated, at));
                }
            }
            ReallocOwnershipPolicy::DoNotTrackAfterFailure => {
                next.regions.remove(pair.from);
            }
            ReallocOwnershipPolicy::FreeOnFailure => {
                // Leave `fromSym` as Released — nothing to do.
            }
        }
        next.realloc_pairs.remove(to_sym);
    }

    next
}
