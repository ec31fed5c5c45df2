//! A minimal in-memory [`CheckerContext`] for unit tests.
//!
//! Not a full mock of a real engine — just enough to drive the modelers in
//! this module in isolation. [`crate::application::checker`]'s own tests and
//! the integration suite under `tests/` build a richer harness on top of the
//! same [`crate::ports`] traits.

#![cfg(test)]

use crate::domain::{BugReport, StatementId, SymbolId};
use crate::ports::{CheckerContext, ConstraintManager, SValBuilder, SymbolManager, TriState};
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct MockCtx {
    next_symbol: u64,
    pub null_answers: FxHashMap<SymbolId, TriState>,
    pub zero_answers: FxHashMap<SymbolId, TriState>,
    pub flag_answers: FxHashMap<(SymbolId, u64), TriState>,
    pub default_tristate: TriState,
    pub reports: Vec<BugReport>,
    pub error_nodes: u32,
    pub non_fatal_error_nodes: u32,
    pub dependencies: Vec<(SymbolId, SymbolId)>,
}

impl MockCtx {
    pub fn new() -> Self {
        Self { next_symbol: 0, default_tristate: TriState::Unknown, ..Default::default() }
    }

    pub fn with_default(tri: TriState) -> Self {
        Self { default_tristate: tri, ..Self::new() }
    }

    pub fn set_null(&mut self, sym: SymbolId, tri: TriState) {
        self.null_answers.insert(sym, tri);
    }

    pub fn set_zero(&mut self, sym: SymbolId, tri: TriState) {
        self.zero_answers.insert(sym, tri);
    }
}

impl ConstraintManager for MockCtx {
    fn is_null(&self, sym: SymbolId) -> TriState {
        self.null_answers.get(&sym).copied().unwrap_or(self.default_tristate)
    }

    fn is_zero(&self, sym: SymbolId) -> TriState {
        self.zero_answers.get(&sym).copied().unwrap_or(self.default_tristate)
    }

    fn flag_bit_set(&self, sym: SymbolId, mask: u64) -> TriState {
        self.flag_answers.get(&(sym, mask)).copied().unwrap_or(self.default_tristate)
    }
}

impl SValBuilder for MockCtx {
    fn conjure_heap_symbol(&mut self, _call_site: StatementId) -> SymbolId {
        self.next_symbol += 1;
        SymbolId(10_000 + self.next_symbol)
    }
}

impl SymbolManager for MockCtx {
    fn add_symbol_dependency(&mut self, base: SymbolId, dependent: SymbolId) {
        self.dependencies.push((base, dependent));
    }
}

impl CheckerContext for MockCtx {
    fn generate_error_node(&mut self) {
        self.error_nodes += 1;
    }

    fn generate_non_fatal_error_node(&mut self) {
        self.non_fatal_error_nodes += 1;
    }

    fn emit_report(&mut self, report: BugReport) {
        self.reports.push(report);
    }
}
