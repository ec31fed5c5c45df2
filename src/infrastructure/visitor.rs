//! Bug-report path visitor (spec §4.L).
//!
//! A separate, toggleable module by design (Design Notes: "Suppression
//! heuristic via name-matching ... should be kept as a separate, toggleable
//! heuristic module so it can be swapped for a more rigorous detector
//! without disturbing the core lifecycle machine").

use crate::domain::{Family, LifecycleState, SymbolId};
use crate::ports::ExplodedNode;

/// One emitted diagnostic note, in path order from allocation site to the
/// bug location (spec §4.L: "emits a one-line note at transitions").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorEvent {
    pub message: String,
}

/// The visitor's sub-mode entered after a `Released -> Allocated` node with
/// no call statement (spec §4.L: "switch visitor into a ReallocationFailed
/// sub-mode").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    ReallocationFailed { from_symbol: SymbolId },
}

/// Outcome of walking a report's path: the emitted notes, and whether the
/// report should be suppressed as a known reference-counting false
/// positive.
#[derive(Debug, Clone, Default)]
pub struct VisitorOutcome {
    pub events: Vec<VisitorEvent>,
    pub suppressed: bool,
}

/// A class name matches the reference-counting destructor heuristic if it
/// contains a pointer-ish token *and* a refcount-ish token (spec §4.L).
fn looks_like_refcounted_pointer_class(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    let pointer_ish = lower.contains("ptr") || lower.contains("pointer");
    let refcount_ish = lower.contains("ref") || lower.contains("cnt") || lower.contains("intrusive") || lower.contains("shared");
    pointer_ish && refcount_ish
}

/// Walk a report's path (from the bug location backwards through
/// predecessors, as `nodes` is ordered oldest-first for this function's
/// convenience) for the interesting `symbol`, emitting notes and applying
/// the reference-counting suppression heuristic.
pub fn visit_path<N: ExplodedNode>(nodes: &[N], symbol: SymbolId) -> VisitorOutcome {
    let mut outcome = VisitorOutcome::default();
    let mut mode = Mode::Normal;
    let mut prev_record = None;

    for node in nodes {
        let record = node.checker_state().regions.get(symbol);

        if let Some(destructor) = node.enclosing_destructor() {
            if looks_like_refcounted_pointer_class(&destructor.enclosing_class_name) {
                if let (Some(prev), Some(cur)) = (prev_record, record) {
                    if prev.state.is_live() && cur.state == LifecycleState::Released {
                        outcome.suppressed = true;
                    }
                }
            }
        }

        if node.is_atomic_refcount_op() {
            if let Some(destructor) = node.enclosing_destructor() {
                if looks_like_refcounted_pointer_class(&destructor.enclosing_class_name) {
                    outcome.suppressed = true;
                }
            }
        }

        match (prev_record.map(|r: crate::domain::RefRecord| r.state), record.map(|r| r.state)) {
            (None, Some(LifecycleState::Allocated)) => {
                outcome.events.push(VisitorEvent { message: "Memory is allocated".to_string() });
            }
            (Some(LifecycleState::Allocated), Some(LifecycleState::Released))
            | (Some(LifecycleState::AllocatedOfSizeZero), Some(LifecycleState::Released)) => {
                let message = if record.map(|r| r.family) == Some(Family::InnerBuffer) {
                    "Inner buffer invalidated by the owning container".to_string()
                } else {
                    "Memory is released".to_string()
                };
                outcome.events.push(VisitorEvent { message });
            }
            (Some(LifecycleState::Allocated), Some(LifecycleState::Relinquished))
            | (Some(LifecycleState::AllocatedOfSizeZero), Some(LifecycleState::Relinquished)) => {
                outcome.events.push(VisitorEvent { message: "Memory ownership is transferred".to_string() });
            }
            (Some(LifecycleState::Released), Some(LifecycleState::Allocated)) => {
                outcome.events.push(VisitorEvent { message: "Attempt to reallocate memory".to_string() });
                mode = Mode::ReallocationFailed { from_symbol: symbol };
            }
            _ => {}
        }

        if let Mode::ReallocationFailed { from_symbol } = mode {
            if from_symbol == symbol && record.map(|r| r.state) == prev_record.map(|r| r.state) && record.is_some() {
                // still settled in the same state; nothing to report yet
            } else if from_symbol == symbol && record.is_none() && prev_record.is_some() {
                outcome.events.push(VisitorEvent { message: "Reallocation failed".to_string() });
                mode = Mode::Normal;
            }
        }

        prev_record = record;
    }

    outcome
}
