//! Property tests for the lifecycle invariants and round-trip properties in
//! spec.md §8 (I1-I5, R1-R2), driven with `quickcheck` against the same kind
//! of mock host harness `tests/scenarios.rs` uses, fuzzing the tri-valued
//! constraint answers and allocation-family choice rather than inventing a
//! full symbolic-execution model.

use heap_lifecycle_checker::application::checker::{DeallocationPolicy, DeclShape, InitValue};
use heap_lifecycle_checker::config::{CheckerConfig, Preset};
use heap_lifecycle_checker::domain::{CheckerState, Family, LifecycleState, StatementId, SymbolId};
use heap_lifecycle_checker::ports::{
    CallKind, CheckerContext, ConstraintManager, FunctionCall, MemorySpace, RegionRef, SVal,
    SValBuilder, SymbolManager, TriState,
};
use heap_lifecycle_checker::HeapLifecycleChecker;
use quickcheck::{Arbitrary, Gen, TestResult};
use quickcheck_macros::quickcheck;
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
struct Harness {
    next_symbol: u64,
    null_answers: FxHashMap<SymbolId, TriState>,
    reports: Vec<heap_lifecycle_checker::BugReport>,
}

impl Harness {
    fn new() -> Self {
        Self::default()
    }
}

impl ConstraintManager for Harness {
    fn is_null(&self, sym: SymbolId) -> TriState {
        self.null_answers.get(&sym).copied().unwrap_or(TriState::Unknown)
    }
    fn is_zero(&self, _sym: SymbolId) -> TriState {
        TriState::False
    }
    fn flag_bit_set(&self, _sym: SymbolId, _mask: u64) -> TriState {
        TriState::Unknown
    }
}

impl SValBuilder for Harness {
    fn conjure_heap_symbol(&mut self, _call_site: StatementId) -> SymbolId {
        self.next_symbol += 1;
        SymbolId(1_000 + self.next_symbol)
    }
}

impl SymbolManager for Harness {
    fn add_symbol_dependency(&mut self, _base: SymbolId, _dependent: SymbolId) {}
}

impl CheckerContext for Harness {
    fn generate_error_node(&mut self) {}
    fn generate_non_fatal_error_node(&mut self) {}
    fn emit_report(&mut self, report: heap_lifecycle_checker::BugReport) {
        self.reports.push(report);
    }
}

/// A small wrapper so quickcheck can generate one of the five allocation
/// families (spec §3) at random.
#[derive(Debug, Clone, Copy)]
struct AnyFamily(Family);

impl Arbitrary for AnyFamily {
    fn arbitrary(g: &mut Gen) -> Self {
        let choices =
            [Family::Malloc, Family::CxxNew, Family::CxxNewArray, Family::IfNameIndex, Family::Alloca, Family::InnerBuffer];
        AnyFamily(*g.choose(&choices).unwrap())
    }
}

fn heap_region(sym: SymbolId, offset: i64) -> SVal {
    SVal::Location(RegionRef { space: MemorySpace::Heap, base_symbol: Some(sym), known_offset: Some(offset), is_block_literal: false })
}

/// R1: allocate then free with a matching family yields `Released`. Only
/// families reachable through an actual deallocator call path are
/// exercised here: `Alloca` is never freed (spec: FreeAlloca instead) and
/// `InnerBuffer` is invalidated by a container method, not a classified
/// deallocator call — both are out of scope for this property and skipped.
#[quickcheck]
fn r1_allocate_then_matching_free_releases(family: AnyFamily) -> TestResult {
    if matches!(family.0, Family::Alloca | Family::InnerBuffer) {
        return TestResult::discard();
    }
    let checker = HeapLifecycleChecker::new(CheckerConfig::from_preset(Preset::Thorough));
    let mut harness = Harness::new();
    let mut state = CheckerState::new();
    let sym = SymbolId(1);
    state.regions.insert(sym, heap_lifecycle_checker::domain::RefRecord::new(LifecycleState::Allocated, family.0, StatementId(0)));

    let next = match family.0 {
        Family::Malloc | Family::IfNameIndex => {
            let callee_name = if family.0 == Family::Malloc { "free" } else { "if_freenameindex" };
            let call = CallKind::Function(FunctionCall {
                callee_name: callee_name.to_string(),
                statement: StatementId(1),
                args: vec![],
                in_system_header: false,
                return_type_is_pointer_like: true,
                ownership_attr: None,
                deallocator_arg_is_null_constant: false,
                buffer_arg_is_named_std_variable: false,
            });
            checker.pre_call(
                &mut harness,
                &state,
                &call,
                heap_region(sym, 0),
                DeallocationPolicy::Free,
                false,
                DeclShape { is_function_pointer_type: false },
                None,
            )
        }
        Family::CxxNew | Family::CxxNewArray => {
            let call = CallKind::Delete(heap_lifecycle_checker::ports::DeleteExpr {
                statement: StatementId(1),
                is_array: family.0 == Family::CxxNewArray,
                in_system_header: true,
                target: sym,
                is_const_pointer: false,
            });
            checker.pre_stmt_delete_expr(&mut harness, &state, &call, heap_region(sym, 0))
        }
        Family::Alloca | Family::InnerBuffer => unreachable!("discarded above"),
    };

    TestResult::from_bool(next.regions.get(sym).map(|r| r.state) == Some(LifecycleState::Released))
}

/// R2: freeing the same symbol twice reports `DoubleFree` exactly once and
/// the second call does not further mutate the record's state.
#[quickcheck]
fn r2_double_free_reported_once(offset: u8) -> TestResult {
    if offset == 0 {
        return TestResult::discard(); // offset 0 is the non-offending case, covered elsewhere
    }
    let checker = HeapLifecycleChecker::new(CheckerConfig::from_preset(Preset::Thorough));
    let mut harness = Harness::new();
    let mut state = CheckerState::new();
    let sym = SymbolId(1);
    state.regions.insert(sym, heap_lifecycle_checker::domain::RefRecord::new(LifecycleState::Allocated, Family::Malloc, StatementId(0)));

    let call = CallKind::Function(FunctionCall {
        callee_name: "free".to_string(),
        statement: StatementId(1),
        args: vec![],
        in_system_header: false,
        return_type_is_pointer_like: true,
        ownership_attr: None,
        deallocator_arg_is_null_constant: false,
        buffer_arg_is_named_std_variable: false,
    });

    let once = checker.pre_call(
        &mut harness,
        &state,
        &call,
        heap_region(sym, 0),
        DeallocationPolicy::Free,
        false,
        DeclShape { is_function_pointer_type: false },
        None,
    );
    assert!(harness.reports.is_empty());

    let twice = checker.pre_call(
        &mut harness,
        &once,
        &call,
        heap_region(sym, 0),
        DeallocationPolicy::Free,
        false,
        DeclShape { is_function_pointer_type: false },
        None,
    );

    TestResult::from_bool(
        harness.reports.len() == 1
            && harness.reports[0].kind == heap_lifecycle_checker::BugKind::DoubleFree
            && twice.regions.get(sym).map(|r| r.state) == once.regions.get(sym).map(|r| r.state),
    )
}

/// I2 (allocation half): `modelAllocation`'s result is always `Allocated`
/// or `AllocatedOfSizeZero`, never anything else, regardless of whether a
/// size symbol was supplied.
#[quickcheck]
fn i2_allocation_always_lands_in_an_allocated_state(has_size: bool) -> bool {
    let checker = HeapLifecycleChecker::new(CheckerConfig::from_preset(Preset::Thorough));
    let mut harness = Harness::new();
    let state = CheckerState::new();
    let size_symbol = if has_size { Some(SymbolId(42)) } else { None };

    let call = CallKind::Function(FunctionCall {
        callee_name: "malloc".to_string(),
        statement: StatementId(1),
        args: vec![],
        in_system_header: false,
        return_type_is_pointer_like: true,
        ownership_attr: None,
        deallocator_arg_is_null_constant: false,
        buffer_arg_is_named_std_variable: false,
    });

    checker
        .post_stmt_call_expr(&mut harness, &state, &call, true, size_symbol, InitValue::Undefined)
        .into_iter()
        .all(|(s, sym)| {
            let Some(sym) = sym else { return false };
            matches!(
                s.regions.get(sym).map(|r| r.state),
                Some(LifecycleState::Allocated) | Some(LifecycleState::AllocatedOfSizeZero)
            )
        })
}

/// I5: once the engine assumes a tracked symbol is definitely null, its
/// region-table entry is gone — no leak can ever be reported for it.
#[quickcheck]
fn i5_assumed_null_symbol_leaves_no_region_entry(family: AnyFamily) -> bool {
    let mut harness = Harness::new();
    let mut state = CheckerState::new();
    let sym = SymbolId(7);
    state.regions.insert(sym, heap_lifecycle_checker::domain::RefRecord::new(LifecycleState::Allocated, family.0, StatementId(0)));
    harness.null_answers.insert(sym, TriState::True);

    let checker = HeapLifecycleChecker::new(CheckerConfig::from_preset(Preset::Thorough));
    let next = checker.eval_assume(&harness, &state, StatementId(1));

    !next.regions.contains(sym)
}

/// I3: after `dead_symbols` runs, no realloc-pair or free-return-value
/// entry mentions a symbol that was in the dead batch.
#[quickcheck]
fn i3_dead_symbols_leaves_no_dangling_table_entries(dead_is_to: bool) -> bool {
    let checker = HeapLifecycleChecker::new(CheckerConfig::from_preset(Preset::Thorough));
    let mut harness = Harness::new();
    let mut state = CheckerState::new();
    let from = SymbolId(1);
    let to = SymbolId(2);
    state.regions.insert(from, heap_lifecycle_checker::domain::RefRecord::new(LifecycleState::Released, Family::Malloc, StatementId(0)));
    state.realloc_pairs.insert(to, from, heap_lifecycle_checker::domain::ReallocOwnershipPolicy::ToBeFreedAfterFailure);

    let dead = if dead_is_to { vec![to] } else { vec![from] };
    let (next, _leaks) = checker.dead_symbols(&mut harness, &state, &dead, StatementId(5));

    next.realloc_pairs.get(to).is_none()
}
