//! Bug-kind taxonomy (spec §7).
//!
//! Each [`BugKind`] is gated by one or more [`crate::config::SubChecker`]
//! toggles; the modeler always runs (it has to, to keep tracking state
//! correctly for later calls) but a toggle decides whether a given kind is
//! actually allowed to surface as a [`BugReport`].

use super::ids::{StatementId, SymbolId};
use crate::config::SubChecker;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BugKind {
    DoubleFree,
    DoubleDelete,
    UseAfterFree,
    BadFree,
    FreeAlloca,
    MismatchedDealloc,
    OffsetFree,
    UseZeroAllocated,
    Leak,
}

impl BugKind {
    /// The sub-checker(s) that gate reporting this kind (spec §7 table).
    pub fn gates(&self) -> &'static [SubChecker] {
        use SubChecker::*;
        match self {
            BugKind::DoubleFree => &[Malloc, NewDelete],
            BugKind::DoubleDelete => &[NewDelete],
            BugKind::UseAfterFree => &[Malloc, NewDelete, InnerPointer],
            BugKind::BadFree => &[Malloc, NewDelete],
            BugKind::FreeAlloca => &[Malloc, MismatchedDeallocator],
            BugKind::MismatchedDealloc => &[MismatchedDeallocator],
            BugKind::OffsetFree => &[Malloc, NewDelete],
            BugKind::UseZeroAllocated => &[Malloc, NewDelete],
            BugKind::Leak => &[Malloc, NewDeleteLeaks],
        }
    }

    /// Short message-hint text (spec §7 "Message hint" column).
    pub fn message_hint(&self) -> &'static str {
        match self {
            BugKind::DoubleFree => "Attempt to free released memory",
            BugKind::DoubleDelete => "Attempt to delete released memory",
            BugKind::UseAfterFree => "Use of memory after it is freed",
            BugKind::BadFree => "Argument to free/delete is not memory allocated by the matching allocator",
            BugKind::FreeAlloca => "Memory allocated by alloca() should not be deallocated",
            BugKind::MismatchedDealloc => "Allocator and deallocator do not match",
            BugKind::OffsetFree => "Attempt to free memory offset from the start of an allocation",
            BugKind::UseZeroAllocated => "Use of zero-allocated memory",
            BugKind::Leak => "Potential leak of memory",
        }
    }
}

impl fmt::Display for BugKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message_hint())
    }
}

/// A diagnostic the checker emits (spec §7 "synthesizes a diagnostic").
///
/// Propagation policy (§7): producing a `BugReport` always means the
/// modeling operation that found it stops and returns the unchanged state —
/// the report itself, not a mutated state, is this crate's observable
/// output for that path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugReport {
    pub kind: BugKind,
    pub symbol: SymbolId,
    /// The statement at which the defect was detected (not necessarily the
    /// allocation site — see [`crate::infrastructure::leak::LeakReport`] for
    /// the leak-specific uniqueing location).
    pub at: StatementId,
    pub message: String,
    /// Extra structured detail specific to a kind (e.g. `OffsetFree`'s byte
    /// offset, `MismatchedDealloc`'s allocator/deallocator name pair).
    pub detail: Option<String>,
}

impl BugReport {
    pub fn new(kind: BugKind, symbol: SymbolId, at: StatementId) -> Self {
        let message = kind.message_hint().to_string();
        Self { kind, symbol, at, message, detail: None }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
