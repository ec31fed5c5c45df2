//! Realloc modeler (spec §4.H).
//!
//! # Open Question replication
//! The original analyzer's general case (non-null pointer, non-zero size)
//! allocates the fresh symbol against the state from the *null-pointer*
//! split branch, then frees the old pointer against the *original*,
//! unsplit state — not the split sub-state the allocation itself used. The
//! spec calls this out as possibly-unintentional but mandates replicating it
//! exactly rather than "fixing" it; see DESIGN.md. [`model_realloc`] does
//! so: `allocate_against` is always the *pre-split* `state` argument, and
//! the free is modeled against that same `state`, not against whatever the
//! allocation step produced.

use crate::domain::{CheckerState, Family, LifecycleState, StatementId, SymbolId};
use crate::infrastructure::allocation::{self, InitValue};
use crate::infrastructure::deallocation::{self, DeallocationPolicy, DeclShape};
use crate::ports::{CheckerContext, RegionRef, SVal, TriState};

/// `realloc`/`reallocf`/`_n` variants distinguish only in name (caller
/// resolves `totalSize` for `_n` variants as `n * m` before calling this).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReallocVariant {
    /// Plain `realloc`: on failure, caller still owns the old pointer.
    Plain,
    /// `reallocf`: on failure, the old pointer is freed.
    FreeOnFailure,
}

/// One feasible outcome of modeling a realloc call (spec §4.H: "four
/// combinations; narrow to those the engine does not refute").
#[derive(Debug, Clone)]
pub struct ReallocOutcome {
    pub state: CheckerState,
    /// The symbol bound to the call's return value on this branch, if any
    /// allocation happened (cases 1 and 4).
    pub result_symbol: Option<SymbolId>,
}

#[allow(clippy::too_many_arguments)]
pub fn model_realloc<C: CheckerContext>(
    ctx: &mut C,
    state: &CheckerState,
    old_pointer: SVal,
    old_pointer_symbol: Option<SymbolId>,
    total_size_symbol: Option<SymbolId>,
    call_statement: StatementId,
    variant: ReallocVariant,
) -> Vec<ReallocOutcome> {
    let p_null = old_pointer_symbol.map(|s| ctx.is_null(s)).unwrap_or(TriState::Unknown);
    let size_zero = total_size_symbol.map(|s| ctx.is_zero(s)).unwrap_or(TriState::Unknown);

    let mut outcomes = Vec::new();

    // Case 1: p null, size non-zero -> behave as plain malloc(totalSize).
    if p_null.true_feasible() && size_zero.false_feasible() {
        for alloc in allocation::model_allocation(
            ctx,
            state,
            call_statement,
            true,
            total_size_symbol,
            InitValue::Undefined,
            Family::Malloc,
        ) {
            outcomes.push(ReallocOutcome { state: alloc.state, result_symbol: alloc.symbol });
        }
    }

    // Case 2: p null, size zero -> state unchanged.
    if p_null.true_feasible() && size_zero.true_feasible() {
        outcomes.push(ReallocOutcome { state: state.clone(), result_symbol: None });
    }

    // Case 3: p non-null, size zero -> free p, no return value bound.
    if p_null.false_feasible() && size_zero.true_feasible() {
        if let Some(region) = old_pointer.as_location() {
            let freed = deallocation::model_free(
                ctx,
                state,
                SVal::Location(region),
                call_statement,
                Family::Malloc,
                DeallocationPolicy::Free,
                false,
                DeclShape { is_function_pointer_type: false },
                None,
            );
            outcomes.push(ReallocOutcome { state: freed.state, result_symbol: None });
        }
    }

    // Case 4: p non-null, size non-zero (general case).
    if p_null.false_feasible() && size_zero.false_feasible() {
        if let (Some(region), Some(from_sym)) = (old_pointer.as_location(), old_pointer_symbol) {
            // Allocate against `state` (the pre-split state — see module doc
            // for why this, and not a further-split sub-state, is correct).
            for alloc in allocation::model_allocation(
                ctx,
                state,
                call_statement,
                true,
                total_size_symbol,
                InitValue::Undefined,
                Family::Malloc,
            ) {
                let Some(to_sym) = alloc.symbol else { continue };

                // Free the old pointer against the same pre-split `state`.
                let freed = deallocation::model_free(
                    ctx,
                    state,
                    SVal::Location(region),
                    call_statement,
                    Family::Malloc,
                    DeallocationPolicy::Free,
                    false,
                    DeclShape { is_function_pointer_type: false },
                    None,
                );

                let from_was_allocated = matches!(
                    state.regions.get(from_sym).map(|r| r.state),
                    Some(LifecycleState::Allocated) | Some(LifecycleState::AllocatedOfSizeZero)
                );
                let policy = match (variant, from_was_allocated) {
                    (ReallocVariant::FreeOnFailure, _) => {
                        crate::domain::ReallocOwnershipPolicy::FreeOnFailure
                    }
                    (ReallocVariant::Plain, true) => {
                        crate::domain::ReallocOwnershipPolicy::ToBeFreedAfterFailure
                    }
                    (ReallocVariant::Plain, false) => {
                        crate::domain::ReallocOwnershipPolicy::DoNotTrackAfterFailure
                    }
                };

                // Compose: allocation's resulting region/zero-size table,
                // deallocation's free-return-value/region transition for
                // `from_sym`, merged onto `alloc.state`.
                let mut merged = alloc.state.clone();
                if let Some(rec) = freed.state.regions.get(from_sym) {
                    merged.regions.insert(from_sym, *rec);
                }
                merged.realloc_pairs.insert(to_sym, from_sym, policy);
                ctx.add_symbol_dependency(to_sym, from_sym);

                outcomes.push(ReallocOutcome { state: merged, result_symbol: Some(to_sym) });
            }
        }
    }

    outcomes
}
