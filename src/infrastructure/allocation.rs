//! Allocation modeler (spec §4.F).
//!
//! Region contents and exact extents are not modeled here — the Non-goals
//! section is explicit that sizes are tracked only as "zero" vs. "non-zero"
//! path conditions, never precisely — so the only observable effect of
//! `init`/extent binding on checker state is which branch of the
//! zero-allocation check a path takes.

use crate::domain::{CheckerState, Family, LifecycleState, RefRecord, StatementId, SymbolId};
use crate::ports::{CheckerContext, TriState};

/// What the region is filled with at allocation (spec §4.F step 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitValue {
    /// `malloc`-style: contents are indeterminate.
    Undefined,
    /// `calloc`/`g_malloc0`/zero-flagged `kmalloc`-style.
    Zero,
}

/// One feasible outcome of modeling an allocation. `symbol` is `None` only
/// when the call's declared return type was not pointer-like (step 1) —
/// that branch never allocates.
#[derive(Debug, Clone)]
pub struct AllocationOutcome {
    pub symbol: Option<SymbolId>,
    pub state: CheckerState,
}

/// `modelAllocation(call, sizeExpr, initValue, family) -> state'` (spec
/// §4.F), generalized to return every feasible branch of the zero-allocation
/// check rather than a single state — callers that only care about one
/// branch (e.g. the realloc modeler's case 1) can filter by
/// `outcome.state.regions.get(symbol).state`.
pub fn model_allocation<C: CheckerContext>(
    ctx: &mut C,
    state: &CheckerState,
    call_statement: StatementId,
    return_type_is_pointer_like: bool,
    size_symbol: Option<SymbolId>,
    _init: InitValue,
    family: Family,
) -> Vec<AllocationOutcome> {
    // Step 1.
    if !return_type_is_pointer_like {
        return vec![AllocationOutcome { symbol: None, state: state.clone() }];
    }

    // Step 2.
    let symbol = ctx.conjure_heap_symbol(call_statement);

    // Step 5 (steps 3-4, region contents and extent, are the host engine's
    // problem — see module doc).
    let mut base_state = state.clone();
    base_state
        .regions
        .insert(symbol, RefRecord::new(LifecycleState::Allocated, family, call_statement));

    // Zero-allocation check.
    let tri = match size_symbol {
        Some(size_sym) => ctx.is_zero(size_sym),
        None => TriState::False,
    };

    let mut outcomes = Vec::with_capacity(2);
    if tri.false_feasible() {
        outcomes.push(AllocationOutcome { symbol: Some(symbol), state: base_state.clone() });
    }
    if tri.true_feasible() {
        let mut zero_state = base_state;
        // `regions.get(symbol)` is always `Some` here: step 5 above inserts a
        // `RefRecord` for `symbol` unconditionally before this check runs, so
        // this function's own calls never hit the `else` branch. It is kept
        // because component E (`ZeroSizeSet`, spec §3) exists for a caller
        // that binds a size-zero outcome to a symbol without first calling
        // through this modeler's insert step — no such path exists in this
        // crate today, but the set stays part of `CheckerState`'s public
        // shape (e.g. the `to_json`/`from_json` snapshot round-trip) rather
        // than being collapsed into the region table.
        if let Some(existing) = zero_state.regions.get(symbol) {
            zero_state
                .regions
                .insert(symbol, existing.transition(LifecycleState::AllocatedOfSizeZero, call_statement));
        } else {
            zero_state.zero_size.insert(symbol);
        }
        outcomes.push(AllocationOutcome { symbol: Some(symbol), state: zero_state });
    }
    outcomes
}

/// Platforms `performKernelMalloc`'s zero-flag table distinguishes (spec
/// §4.F). Platforms outside this table are ignored (fall back to
/// [`InitValue::Undefined`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelPlatform {
    FreeBsd,
    NetBsd,
    OpenBsd,
    Linux,
}

impl KernelPlatform {
    fn zero_flag_mask(&self) -> u64 {
        match self {
            KernelPlatform::FreeBsd => 0x0100,
            KernelPlatform::NetBsd => 0x0002,
            KernelPlatform::OpenBsd => 0x0008,
            KernelPlatform::Linux => 0x8000,
        }
    }
}

/// `performKernelMalloc`'s flags check: "if the flags argument, bit-ANDed
/// with a platform-specific zero-flag value, is provably non-zero on a
/// path, initialize the region to zero; otherwise fall back to undefined"
/// (spec §4.F).
pub fn kernel_malloc_init<C: CheckerContext>(
    ctx: &C,
    flags_symbol: SymbolId,
    platform: KernelPlatform,
) -> InitValue {
    match ctx.flag_bit_set(flags_symbol, platform.zero_flag_mask()) {
        TriState::True => InitValue::Zero,
        TriState::False | TriState::Unknown => InitValue::Undefined,
    }
}
