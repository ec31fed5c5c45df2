//! Deallocation modeler (spec §4.G).

use crate::domain::{
    BugKind, BugReport, CheckerState, Family, LifecycleState, RefRecord, StatementId, SymbolId,
};
use crate::ports::{CheckerContext, RegionRef, SVal, TriState};

/// Whether a call transfers ownership away from the checker entirely
/// (`free`) or merely hands it to code the checker no longer models
/// (`ownership_holds`-style "hold") — spec §4.G: "Policy distinguishes
/// 'free' ... vs. 'hold'".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeallocationPolicy {
    Free,
    Hold,
}

impl DeallocationPolicy {
    fn target_state(&self) -> LifecycleState {
        match self {
            DeallocationPolicy::Free => LifecycleState::Released,
            DeallocationPolicy::Hold => LifecycleState::Relinquished,
        }
    }
}

/// `modelFree(state, pointerArg, parentCall, policy, onFailureReturnsNull) ->
/// (state', isKnownToBeAllocated)` (spec §4.G).
pub struct DeallocationOutcome {
    pub state: CheckerState,
    pub is_known_to_be_allocated: bool,
    pub report: Option<BugReport>,
}

fn unchanged(state: &CheckerState) -> DeallocationOutcome {
    DeallocationOutcome { state: state.clone(), is_known_to_be_allocated: false, report: None }
}

fn bug(state: &CheckerState, report: BugReport) -> DeallocationOutcome {
    DeallocationOutcome { state: state.clone(), is_known_to_be_allocated: false, report: Some(report) }
}

/// Arguments describing the call site's declared type and function-pointer
/// shape, needed for step 7's function-pointer-free check (spec §4.G).
#[derive(Debug, Clone, Copy)]
pub struct DeclShape {
    pub is_function_pointer_type: bool,
}

#[allow(clippy::too_many_arguments)]
pub fn model_free<C: CheckerContext>(
    ctx: &mut C,
    state: &CheckerState,
    pointer_arg: SVal,
    at: StatementId,
    deallocator_family: Family,
    policy: DeallocationPolicy,
    on_failure_returns_null: bool,
    decl_shape: DeclShape,
    return_value: Option<SymbolId>,
) -> DeallocationOutcome {
    // Step 1.
    let region = match pointer_arg.as_location() {
        Some(region) => region,
        None => return unchanged(state),
    };

    // Step 2: split on `arg == null`. Only the non-null branch is modeled
    // here (the null branch is a no-op the caller already has, since
    // `unchanged` returns the same state).
    let base_symbol = match region.base_symbol {
        Some(sym) => sym,
        None => return unchanged(state),
    };
    if ctx.is_null(base_symbol) == TriState::True {
        return unchanged(state);
    }

    // Step 3.
    if region.is_block_literal {
        return bug(state, BugReport::new(BugKind::BadFree, base_symbol, at));
    }

    // Step 4.
    if !region.space.is_legal_free_target() {
        let existing_family = state.regions.get(base_symbol).map(|r| r.family);
        let kind = if existing_family == Some(Family::Alloca) {
            BugKind::FreeAlloca
        } else {
            BugKind::BadFree
        };
        return bug(state, BugReport::new(kind, base_symbol, at));
    }

    // Step 5 already done (base_symbol extracted above).

    // Step 6.
    if let Some(existing) = state.regions.get(base_symbol) {
        if existing.family == Family::Alloca {
            return bug(state, BugReport::new(BugKind::FreeAlloca, base_symbol, at));
        }
        // A tracked free-return-value symbol confirmed null means the prior
        // free call itself failed (the object was never actually
        // deallocated) — that is the realloc-recovery path the spec's
        // "previous free did not definitely fail" clause carves out.
        let previous_free_confirmed_failed = state
            .free_return_values
            .get(base_symbol)
            .map(|rv| ctx.is_null(rv) == TriState::True)
            .unwrap_or(false);
        match existing.state {
            LifecycleState::Released | LifecycleState::Relinquished if previous_free_confirmed_failed => {
                // Realloc recovery path: skip double-free reporting.
            }
            LifecycleState::Released | LifecycleState::Relinquished => {
                return bug(state, BugReport::new(BugKind::DoubleFree, base_symbol, at));
            }
            LifecycleState::Allocated | LifecycleState::AllocatedOfSizeZero | LifecycleState::Escaped => {
                if existing.family != deallocator_family {
                    return bug(
                        state,
                        BugReport::new(BugKind::MismatchedDealloc, base_symbol, at).with_detail(format!(
                            "allocated with {}, deallocated with {}",
                            existing.family, deallocator_family
                        )),
                    );
                }
            }
        }

        if let (Some(offset), true) = (region.known_offset, region.known_offset.map(|o| o != 0).unwrap_or(false)) {
            return bug(
                state,
                BugReport::new(BugKind::OffsetFree, base_symbol, at)
                    .with_detail(format!("offset by {offset} bytes from the start of the allocation")),
            );
        }
    }

    // Step 7.
    if decl_shape.is_function_pointer_type {
        return bug(
            state,
            BugReport::new(BugKind::BadFree, base_symbol, at).with_detail("argument is a function pointer"),
        );
    }

    let prior_state = state.regions.get(base_symbol).map(|r| r.state);
    let is_known_to_be_allocated =
        matches!(prior_state, Some(LifecycleState::Allocated) | Some(LifecycleState::AllocatedOfSizeZero));

    let mut next = state.clone();

    // Step 8.
    next.free_return_values.remove(base_symbol);

    // Step 9.
    if on_failure_returns_null {
        if let Some(return_symbol) = return_value {
            next.free_return_values.insert(base_symbol, return_symbol);
            ctx.add_symbol_dependency(base_symbol, return_symbol);
        }
    }

    // Step 10.
    let new_record = match next.regions.get(base_symbol) {
        Some(existing) => existing.transition(policy.target_state(), at),
        None => RefRecord::new(policy.target_state(), deallocator_family, at),
    };
    next.regions.insert(base_symbol, new_record);

    DeallocationOutcome { state: next, is_known_to_be_allocated, report: None }
}

/// Convenience constructor for a non-location [`RegionRef`]-bearing
/// location value, used by callers that already hold a resolved region
/// (e.g. the realloc modeler).
pub fn location(region: RegionRef) -> SVal {
    SVal::Location(region)
}
