//! The heap lifecycle checker (spec §6 item 2): one method per callback the
//! host engine dispatches to, wiring the infrastructure modelers together
//! and gating emitted diagnostics by [`CheckerConfig`].
//!
//! Each method is pure in the sense spec §5 requires: given `&CheckerState`
//! it returns a new one (or, where the engine itself would fork the path,
//! one new state per feasible branch) and never mutates its input.

use crate::config::CheckerConfig;
use crate::domain::{
    BugKind, BugReport, CheckerState, LifecycleState, OperationKind, StatementId, SymbolId,
};
use crate::infrastructure::{allocation, assume, classifier, deallocation, escape, leak, realloc};
use crate::ports::{CallKind, CheckerContext, ExplodedNode, SVal};
use tracing::{debug, trace};

pub use allocation::InitValue;
pub use deallocation::{DeallocationPolicy, DeclShape};
pub use realloc::ReallocVariant;

/// The checker's entire public surface: construct with a [`CheckerConfig`]
/// and call the method matching whichever hook the host engine just fired.
#[derive(Debug, Clone)]
pub struct HeapLifecycleChecker {
    config: CheckerConfig,
}

impl HeapLifecycleChecker {
    pub fn new(config: CheckerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Emit `report` only if its kind's gate is on (spec §7 propagation
    /// policy, §6.4 toggles); the modeling decision that produced it (abort
    /// vs. continue) has already happened regardless.
    fn gate_and_emit<C: CheckerContext>(&self, ctx: &mut C, report: Option<BugReport>) {
        let Some(report) = report else { return };
        if self.config.toggles.gates(report.kind) {
            debug!(kind = %report.kind, symbol = ?report.symbol, "emitting bug report");
            ctx.generate_error_node();
            ctx.emit_report(report);
        } else {
            trace!(kind = %report.kind, "bug report suppressed by sub-checker toggle");
        }
    }

    /// `preCall` (spec §6.2): models deallocation calls. Allocation calls
    /// are modeled in [`Self::post_stmt_call_expr`], after the engine has a
    /// return-value symbol to bind.
    #[allow(clippy::too_many_arguments)]
    pub fn pre_call<C: CheckerContext>(
        &self,
        ctx: &mut C,
        state: &CheckerState,
        call: &CallKind,
        pointer_arg: SVal,
        policy: DeallocationPolicy,
        on_failure_returns_null: bool,
        decl_shape: DeclShape,
        return_value: Option<SymbolId>,
    ) -> CheckerState {
        let Some(family) = classifier::classify(call, OperationKind::Free, self.config.optimistic) else {
            return state.clone();
        };
        let outcome = deallocation::model_free(
            ctx,
            state,
            pointer_arg,
            call.statement(),
            family,
            policy,
            on_failure_returns_null,
            decl_shape,
            return_value,
        );
        self.gate_and_emit(ctx, outcome.report);
        outcome.state
    }

    /// `postStmt(CallExpr)` (spec §6.2): models plain-function allocation
    /// calls. Returns one state per feasible branch of the zero-allocation
    /// check (spec §4.F); most callers take the first.
    pub fn post_stmt_call_expr<C: CheckerContext>(
        &self,
        ctx: &mut C,
        state: &CheckerState,
        call: &CallKind,
        return_type_is_pointer_like: bool,
        size_symbol: Option<SymbolId>,
        init: InitValue,
    ) -> Vec<(CheckerState, Option<SymbolId>)> {
        match classifier::classify(call, OperationKind::Allocate, self.config.optimistic) {
            Some(family) => allocation::model_allocation(
                ctx,
                state,
                call.statement(),
                return_type_is_pointer_like,
                size_symbol,
                init,
                family,
            )
            .into_iter()
            .map(|o| (o.state, o.symbol))
            .collect(),
            None => vec![(state.clone(), None)],
        }
    }

    /// `realloc`/`reallocf`/`_n`-variant modeling (spec §4.H). The host
    /// integration is expected to dispatch here itself once it recognizes
    /// the callee name, since `classify` groups these under
    /// `(Family::Malloc, Any)` rather than a distinct tag.
    pub fn model_realloc<C: CheckerContext>(
        &self,
        ctx: &mut C,
        state: &CheckerState,
        old_pointer: SVal,
        old_pointer_symbol: Option<SymbolId>,
        total_size_symbol: Option<SymbolId>,
        call_statement: StatementId,
        variant: ReallocVariant,
    ) -> Vec<(CheckerState, Option<SymbolId>)> {
        realloc::model_realloc(ctx, state, old_pointer, old_pointer_symbol, total_size_symbol, call_statement, variant)
            .into_iter()
            .map(|o| (o.state, o.result_symbol))
            .collect()
    }

    /// `postStmt(CXXNewExpr)` / `newAllocator` (spec §6.2).
    pub fn post_stmt_new_expr<C: CheckerContext>(
        &self,
        ctx: &mut C,
        state: &CheckerState,
        call: &CallKind,
        size_symbol: Option<SymbolId>,
    ) -> Vec<(CheckerState, Option<SymbolId>)> {
        match classifier::classify(call, OperationKind::Allocate, self.config.optimistic) {
            Some(family) => allocation::model_allocation(
                ctx,
                state,
                call.statement(),
                true,
                size_symbol,
                InitValue::Undefined,
                family,
            )
            .into_iter()
            .map(|o| (o.state, o.symbol))
            .collect(),
            None => vec![(state.clone(), None)],
        }
    }

    /// `preStmt(CXXDeleteExpr)` (spec §6.2).
    pub fn pre_stmt_delete_expr<C: CheckerContext>(
        &self,
        ctx: &mut C,
        state: &CheckerState,
        call: &CallKind,
        pointer_arg: SVal,
    ) -> CheckerState {
        let Some(family) = classifier::classify(call, OperationKind::Free, self.config.optimistic) else {
            return state.clone();
        };
        let outcome = deallocation::model_free(
            ctx,
            state,
            pointer_arg,
            call.statement(),
            family,
            DeallocationPolicy::Free,
            false,
            DeclShape { is_function_pointer_type: false },
            None,
        );
        let report = match (&outcome.report, family) {
            (Some(r), _) if r.kind == BugKind::DoubleFree => {
                Some(BugReport::new(BugKind::DoubleDelete, r.symbol, r.at))
            }
            _ => outcome.report,
        };
        self.gate_and_emit(ctx, report);
        outcome.state
    }

    /// `postObjCMessage` (spec §4.I rule 2, §6.2).
    pub fn post_obj_c_message<C: CheckerContext>(
        &self,
        state: &CheckerState,
        call: &CallKind,
        candidates: &[SymbolId],
        at: StatementId,
    ) -> CheckerState {
        if !escape::call_may_escape(call, self.config.optimistic) {
            return state.clone();
        }
        escape::apply_escape(state, candidates, &escape::EscapeDecision::All, escape::EscapeKind::Ordinary, at)
    }

    /// `postStmt(BlockExpr)` (spec §6.2, §4.I rule 1: block literals always
    /// escape their captures).
    pub fn post_stmt_block_expr(&self, state: &CheckerState, captured: &[SymbolId], at: StatementId) -> CheckerState {
        escape::apply_escape(state, captured, &escape::EscapeDecision::All, escape::EscapeKind::Ordinary, at)
    }

    /// `checkPointerEscape` (spec §4.I, §6.2).
    pub fn check_pointer_escape(
        &self,
        state: &CheckerState,
        call: &CallKind,
        candidates: &[SymbolId],
        at: StatementId,
    ) -> CheckerState {
        if !escape::call_may_escape(call, self.config.optimistic) {
            return state.clone();
        }
        escape::apply_escape(state, candidates, &escape::EscapeDecision::All, escape::EscapeKind::Ordinary, at)
    }

    /// `checkConstPointerEscape` (spec §4.I const-pointer variant).
    pub fn check_const_pointer_escape(
        &self,
        state: &CheckerState,
        call: &CallKind,
        candidates: &[SymbolId],
        at: StatementId,
    ) -> CheckerState {
        if !escape::call_may_escape(call, self.config.optimistic) {
            return state.clone();
        }
        escape::apply_escape(state, candidates, &escape::EscapeDecision::All, escape::EscapeKind::ConstPointer, at)
    }

    /// `deadSymbols` (spec §4.J). Returns the new state and the finalized
    /// leak reports (allocation-site-rewritten, with the visitor's
    /// reference-counting suppression already applied by the caller if it
    /// chooses to call [`crate::infrastructure::visitor::visit_path`]
    /// itself — that pass is on the diagnostic-rendering side, not here).
    pub fn dead_symbols<C: CheckerContext>(
        &self,
        ctx: &mut C,
        state: &CheckerState,
        dead: &[SymbolId],
        at: StatementId,
    ) -> (CheckerState, Vec<BugReport>) {
        let outcome = leak::handle_dead_symbols(ctx, state, dead, at);
        let reports: Vec<BugReport> = outcome
            .leaks
            .into_iter()
            .filter(|r| self.config.toggles.gates(r.kind))
            .collect();
        for report in &reports {
            ctx.emit_report(report.clone());
        }
        (outcome.state, reports)
    }

    /// Rewrites leak reports' uniqueing location to the allocation site
    /// (spec §4.J.1), given the node the `deadSymbols` callback fired at.
    pub fn finalize_leaks<N: ExplodedNode>(&self, cleanup_node: &N, leaks: Vec<BugReport>) -> Vec<BugReport> {
        leak::finalize_leak_reports(cleanup_node, leaks)
    }

    /// `evalAssume` (spec §4.K).
    pub fn eval_assume<C: CheckerContext>(&self, ctx: &C, state: &CheckerState, at: StatementId) -> CheckerState {
        assume::on_assume(ctx, state, at)
    }

    /// `location` (pointer use, spec §6.2). Not given a dedicated component
    /// in spec §4, but `UseAfterFree`/`UseZeroAllocated` appear in the bug
    /// taxonomy (§7) with no other producer — this is where they fire.
    pub fn location<C: CheckerContext>(
        &self,
        ctx: &mut C,
        state: &CheckerState,
        symbol: SymbolId,
        at: StatementId,
    ) -> CheckerState {
        let Some(record) = state.regions.get(symbol) else { return state.clone() };
        let kind = match record.state {
            LifecycleState::Released | LifecycleState::Relinquished => Some(BugKind::UseAfterFree),
            LifecycleState::AllocatedOfSizeZero => Some(BugKind::UseZeroAllocated),
            LifecycleState::Allocated | LifecycleState::Escaped => None,
        };
        if let Some(kind) = kind {
            self.gate_and_emit(ctx, Some(BugReport::new(kind, symbol, at)));
        }
        state.clone()
    }

    /// `preStmt(ReturnStmt)` (spec §6.2). No distinct state transition is
    /// specified for this hook in spec §4 — it exists so a host integration
    /// can observe return-of-a-tracked-pointer if it wants to layer
    /// additional checks on top; this crate's core doesn't need it.
    pub fn pre_stmt_return(&self, state: &CheckerState, _returned: Option<SymbolId>) -> CheckerState {
        state.clone()
    }

    /// `endFunction` (spec §6.2). Cleanup is driven entirely by
    /// `deadSymbols`; this hook is a no-op here.
    pub fn end_function(&self, state: &CheckerState) -> CheckerState {
        state.clone()
    }

    /// `printState` (spec §6.2, SPEC_FULL.md §4 supplement): a debugging
    /// dump of all four tables through `tracing`, never part of analysis
    /// behavior.
    pub fn print_state(&self, state: &CheckerState) {
        for (sym, record) in state.regions.iter() {
            debug!(%sym, state = ?record.state, family = %record.family, "region");
        }
        for (to, pair) in state.realloc_pairs.iter() {
            debug!(%to, from = %pair.from, policy = ?pair.policy, "realloc-pair");
        }
    }
}
