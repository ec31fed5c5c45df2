//! Per-path state tables (spec §3 "Region table" through "Zero-size-symbol
//! set") and the realloc ownership policy (spec §3, §4.H).
//!
//! # Ownership note (spec §3)
//! All tables here are logically part of the engine's per-path program
//! state, which is copy-on-write and shared across sibling paths. Every
//! table wraps its map in `Arc` so that forking a path (cloning the whole
//! [`CheckerState`]) is O(1); a mutation calls `Arc::make_mut`, which only
//! performs a real clone of the backing map the first time a given `Arc` is
//! shared — see SPEC_FULL.md §3 for why this stands in for a true
//! structural-sharing persistent map.

use super::family::Family;
use super::ids::SymbolId;
use super::state::{LifecycleState, RefRecord};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How a realloc-pair's "from" symbol should be treated if the realloc call
/// fails (spec §3, §4.K).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReallocOwnershipPolicy {
    /// `realloc`-style: on failure, the caller still owns `from`.
    ToBeFreedAfterFailure,
    /// `reallocf`-style: on failure, `from` is freed.
    FreeOnFailure,
    /// `from` was not tracked to begin with (e.g. `realloc(NULL, n)`).
    DoNotTrackAfterFailure,
}

/// `to -> (from, policy)` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReallocPair {
    pub from: SymbolId,
    pub policy: ReallocOwnershipPolicy,
}

/// Region table: symbol -> lifecycle record (spec §3 "Region table").
#[derive(Debug, Clone, Default)]
pub struct RegionTable(Arc<FxHashMap<SymbolId, RefRecord>>);

impl RegionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, sym: SymbolId) -> Option<RefRecord> {
        self.0.get(&sym).copied()
    }

    pub fn contains(&self, sym: SymbolId) -> bool {
        self.0.contains_key(&sym)
    }

    /// Invariant I1: callers must never pass a record whose family is the
    /// spec's `None` sentinel — that is enforced at the type level since
    /// [`Family`] has no such variant.
    pub fn insert(&mut self, sym: SymbolId, record: RefRecord) {
        Arc::make_mut(&mut self.0).insert(sym, record);
    }

    pub fn remove(&mut self, sym: SymbolId) -> Option<RefRecord> {
        Arc::make_mut(&mut self.0).remove(&sym)
    }

    /// All symbols currently in `state` (or `AllocatedOfSizeZero` too, if
    /// asked) — used by the assumption hook (§4.K) and leak finder (§4.J).
    pub fn symbols_in_state<'a>(
        &'a self,
        pred: impl Fn(LifecycleState) -> bool + 'a,
    ) -> impl Iterator<Item = (SymbolId, RefRecord)> + 'a {
        self.0
            .iter()
            .filter(move |(_, rec)| pred(rec.state))
            .map(|(sym, rec)| (*sym, *rec))
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, RefRecord)> + '_ {
        self.0.iter().map(|(sym, rec)| (*sym, *rec))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Realloc-pair table: "to" symbol -> `(fromSym, policy)` (spec §3).
#[derive(Debug, Clone, Default)]
pub struct ReallocPairTable(Arc<FxHashMap<SymbolId, ReallocPair>>);

impl ReallocPairTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, to: SymbolId) -> Option<ReallocPair> {
        self.0.get(&to).copied()
    }

    pub fn insert(&mut self, to: SymbolId, from: SymbolId, policy: ReallocOwnershipPolicy) {
        Arc::make_mut(&mut self.0).insert(to, ReallocPair { from, policy });
    }

    pub fn remove(&mut self, to: SymbolId) -> Option<ReallocPair> {
        Arc::make_mut(&mut self.0).remove(&to)
    }

    /// Drop every entry whose `to` or `from` symbol is in `dead` — used by
    /// the leak finder to keep invariant I3 (no dangling cross-table
    /// references after a `deadSymbols` callback).
    pub fn drop_dead(&mut self, dead: impl Fn(SymbolId) -> bool) {
        let map = Arc::make_mut(&mut self.0);
        map.retain(|to, pair| !dead(*to) && !dead(pair.from));
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, ReallocPair)> + '_ {
        self.0.iter().map(|(to, pair)| (*to, *pair))
    }
}

/// Free-return-value table: freed symbol -> the deallocator call's return
/// value symbol (spec §3 "Free-return-value table").
#[derive(Debug, Clone, Default)]
pub struct FreeReturnValueTable(Arc<FxHashMap<SymbolId, SymbolId>>);

impl FreeReturnValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, freed: SymbolId) -> Option<SymbolId> {
        self.0.get(&freed).copied()
    }

    pub fn insert(&mut self, freed: SymbolId, return_value: SymbolId) {
        Arc::make_mut(&mut self.0).insert(freed, return_value);
    }

    pub fn remove(&mut self, freed: SymbolId) -> Option<SymbolId> {
        Arc::make_mut(&mut self.0).remove(&freed)
    }

    pub fn drop_dead(&mut self, dead: impl Fn(SymbolId) -> bool) {
        let map = Arc::make_mut(&mut self.0);
        map.retain(|freed, ret| !dead(*freed) && !dead(*ret));
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, SymbolId)> + '_ {
        self.0.iter().map(|(freed, ret)| (*freed, *ret))
    }
}

/// Zero-size-symbol set (spec §3 "Zero-size-symbol set"): tracked
/// separately from the region table because realloc-with-size-zero symbols
/// never get a `RefRecord`.
#[derive(Debug, Clone, Default)]
pub struct ZeroSizeSet(Arc<FxHashSet<SymbolId>>);

impl ZeroSizeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, sym: SymbolId) -> bool {
        self.0.contains(&sym)
    }

    pub fn insert(&mut self, sym: SymbolId) {
        Arc::make_mut(&mut self.0).insert(sym);
    }

    pub fn remove(&mut self, sym: SymbolId) -> bool {
        Arc::make_mut(&mut self.0).remove(&sym)
    }

    pub fn iter(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.0.iter().copied()
    }
}

/// The complete per-path checker-owned state (spec §3): the union of the
/// four tables above. This is the value the host engine's program state is
/// expected to carry as extension data, threaded through every callback.
#[derive(Debug, Clone, Default)]
pub struct CheckerState {
    pub regions: RegionTable,
    pub realloc_pairs: ReallocPairTable,
    pub free_return_values: FreeReturnValueTable,
    pub zero_size: ZeroSizeSet,
}

/// A flattened, JSON-serializable view of [`CheckerState`] (spec §3 tables,
/// plain `Vec`s instead of the `Arc`-wrapped maps the tables use internally
/// for clone-on-fork sharing). A host integration can persist this
/// alongside a suspended path and restore it later, e.g. when replaying a
/// saved diagnostic for a bug report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckerStateSnapshot {
    pub regions: Vec<(SymbolId, RefRecord)>,
    pub realloc_pairs: Vec<(SymbolId, ReallocPair)>,
    pub free_return_values: Vec<(SymbolId, SymbolId)>,
    pub zero_size: Vec<SymbolId>,
}

impl CheckerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> CheckerStateSnapshot {
        CheckerStateSnapshot {
            regions: self.regions.iter().collect(),
            realloc_pairs: self.realloc_pairs.iter().collect(),
            free_return_values: self.free_return_values.iter().collect(),
            zero_size: self.zero_size.iter().collect(),
        }
    }

    pub fn from_snapshot(snapshot: &CheckerStateSnapshot) -> Self {
        let mut state = Self::new();
        for (sym, record) in &snapshot.regions {
            state.regions.insert(*sym, *record);
        }
        for (to, pair) in &snapshot.realloc_pairs {
            state.realloc_pairs.insert(*to, pair.from, pair.policy);
        }
        for (freed, return_value) in &snapshot.free_return_values {
            state.free_return_values.insert(*freed, *return_value);
        }
        for sym in &snapshot.zero_size {
            state.zero_size.insert(*sym);
        }
        state
    }

    /// Serialize to JSON via the snapshot above, matching the teacher's
    /// convention of JSON-serializable analysis artifacts.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let snapshot: CheckerStateSnapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(&snapshot))
    }
}
