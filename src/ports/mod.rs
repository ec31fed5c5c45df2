//! Heap Lifecycle Checker — Ports Layer (Hexagonal Architecture)
//!
//! These are the contracts the host symbolic-execution engine must satisfy
//! for this crate to model allocation lifecycles against it (spec §6). They
//! are deliberately *not* concrete engine types — spec §6 itself frames them
//! as "contracts, not specific type names" so the core stays implementable
//! against any equivalent engine.
//!
//! ## SOLID Compliance
//! - **I (Interface Segregation)**: each capability (constraint queries,
//!   fresh-symbol conjuring, symbol-dependency bookkeeping, diagnostics) is
//!   its own small trait.
//! - **D (Dependency Inversion)**: [`crate::infrastructure`] and
//!   [`crate::application`] depend only on these traits, never on a
//!   concrete engine.
//!
//! A real integration implements [`CheckerContext`] (which bundles the
//! others) once per host engine and passes it by `&mut` into every modeler
//! call; [`ExplodedNode`] is implemented separately since it is walked
//! read-only, after the fact, by the bug-report visitor (§4.L).

use crate::domain::{BugReport, CheckerState, StatementId, SymbolId};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════
// Tri-valued truth (GLOSSARY; spec §6 ConstraintManager.isNull)
// ═══════════════════════════════════════════════════════════════════════════

/// The constraint solver's answer to "is this condition definitely true,
/// definitely false, or could go either way on this path".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriState {
    True,
    False,
    Unknown,
}

impl Default for TriState {
    fn default() -> Self {
        TriState::Unknown
    }
}

impl TriState {
    /// Whether a true-branch is feasible (spec: `State.assume` "may return
    /// one or both sides depending on feasibility").
    pub fn true_feasible(&self) -> bool {
        !matches!(self, TriState::False)
    }

    pub fn false_feasible(&self) -> bool {
        !matches!(self, TriState::True)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Memory regions & symbolic values (GLOSSARY: "Region", "Symbolic value")
// ═══════════════════════════════════════════════════════════════════════════

/// The memory space a [`RegionRef`] lives in (spec §4.G step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemorySpace {
    Heap,
    /// Includes `alloca()` regions — distinguished further by the region's
    /// recorded [`crate::domain::Family`] when one is tracked.
    Stack,
    Unknown,
    Global,
    Code,
}

impl MemorySpace {
    /// Spec §4.G step 4: "only unknown-space or heap-space is legal;
    /// otherwise emit BadFree (or FreeAlloca if the region is an alloca)".
    pub fn is_legal_free_target(&self) -> bool {
        matches!(self, MemorySpace::Unknown | MemorySpace::Heap)
    }
}

/// A memory region as the deallocation modeler needs to see it (spec
/// GLOSSARY "Region": a memory space, a base region, optional byte offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRef {
    pub space: MemorySpace,
    /// The symbol identifying the base region, once casts are stripped
    /// (spec §4.G step 4: "Strip casts, take the base region").
    pub base_symbol: Option<SymbolId>,
    /// Byte offset from the base region, if statically known (spec §4.G
    /// step 6's OffsetFree check).
    pub known_offset: Option<i64>,
    /// Whether this region is a block literal (`^{ ... }`), which is never
    /// a legal free target regardless of space (spec §4.G step 3).
    pub is_block_literal: bool,
}

/// A symbolic value as it reaches the checker (spec GLOSSARY "Symbolic
/// value / SVal"): concrete, an unknown symbol, or a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SVal {
    /// Not yet constrained to anything concrete, and not known to be a
    /// location.
    Unknown(SymbolId),
    /// A concrete integer (e.g. a literal `0` for `NULL`, or a concrete
    /// size argument).
    Concrete(i128),
    /// A location value: denotes a memory region.
    Location(RegionRef),
}

impl SVal {
    pub fn as_location(&self) -> Option<RegionRef> {
        match self {
            SVal::Location(region) => Some(*region),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<SymbolId> {
        match self {
            SVal::Unknown(sym) => Some(*sym),
            SVal::Location(region) => region.base_symbol,
            SVal::Concrete(_) => None,
        }
    }

    pub fn concrete_is_zero(&self) -> Option<bool> {
        match self {
            SVal::Concrete(n) => Some(*n == 0),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Calls (Design Notes: "Polymorphic call expression")
// ═══════════════════════════════════════════════════════════════════════════

/// An ownership attribute recognized in optimistic mode (spec §4.A).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnershipAttrKind {
    Returns,
    Takes,
    Holds,
}

/// `ownership_returns`/`ownership_takes`/`ownership_holds("malloc", ...)`.
/// Spec §4.A: "the attribute's 'module' string must equal `malloc`".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipAttr {
    pub kind: OwnershipAttrKind,
    pub module: String,
}

/// A plain C-style function call (spec §4.A classifier input).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub callee_name: String,
    pub statement: StatementId,
    pub args: Vec<SymbolId>,
    pub in_system_header: bool,
    /// Spec §4.G step 7: "If the symbol's declared type is a function-pointer
    /// type, emit BadFree".
    pub return_type_is_pointer_like: bool,
    pub ownership_attr: Option<OwnershipAttr>,
    /// Spec §4.I.3: a small allow/deny-list is consulted by callee name for
    /// escape decisions (`*NoCopy`, `funopen`, `setbuf` family, ...); the
    /// engine surfaces whatever extra detail those rules need.
    pub deallocator_arg_is_null_constant: bool,
    pub buffer_arg_is_named_std_variable: bool,
}

/// `new`/`new[]` (spec §4.A: "only when their definition site is in a
/// system header").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpr {
    pub statement: StatementId,
    pub is_array: bool,
    pub in_system_header: bool,
    /// Array-size sub-expression's symbol and the element type's size in
    /// bytes (spec §4.F "Extent binding for new[]").
    pub array_size: Option<(SymbolId, u64)>,
    pub size_arg: Option<SymbolId>,
}

/// `delete`/`delete[]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteExpr {
    pub statement: StatementId,
    pub is_array: bool,
    pub in_system_header: bool,
    pub target: SymbolId,
    /// Whether the deleted pointer's static type is `const`-qualified (spec
    /// §4.I "const-pointer escape variant").
    pub is_const_pointer: bool,
}

/// An Objective-C message send (spec §4.I.2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjCMessageCall {
    pub statement: StatementId,
    pub selector: String,
    pub in_system_header: bool,
    pub has_callback_args: bool,
    /// The constant value of a `freeWhenDone:` argument, if present.
    pub free_when_done: Option<bool>,
    pub receiver: SymbolId,
}

/// A block literal expression (spec §6.2 `postStmt(BlockExpr)`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockExprCall {
    pub statement: StatementId,
    pub captured: Vec<SymbolId>,
}

/// The tagged variant the family classifier and escape policy pattern-match
/// on (Design Notes: "Polymorphic call expression").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    Function(FunctionCall),
    New(NewExpr),
    Delete(DeleteExpr),
    ObjCMessage(ObjCMessageCall),
    Block(BlockExprCall),
}

impl CallKind {
    pub fn statement(&self) -> StatementId {
        match self {
            CallKind::Function(c) => c.statement,
            CallKind::New(c) => c.statement,
            CallKind::Delete(c) => c.statement,
            CallKind::ObjCMessage(c) => c.statement,
            CallKind::Block(c) => c.statement,
        }
    }

    pub fn in_system_header(&self) -> bool {
        match self {
            CallKind::Function(c) => c.in_system_header,
            CallKind::New(c) => c.in_system_header,
            CallKind::Delete(c) => c.in_system_header,
            CallKind::ObjCMessage(c) => c.in_system_header,
            CallKind::Block(_) => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Engine capability traits (spec §6 item 1)
// ═══════════════════════════════════════════════════════════════════════════

/// `ConstraintManager.isNull` and the size==0 oracle the zero-allocation
/// check and realloc modeler both need (spec §4.F, §4.H, §4.K).
pub trait ConstraintManager {
    fn is_null(&self, sym: SymbolId) -> TriState;
    fn is_zero(&self, sym: SymbolId) -> TriState;
    /// `(sym & mask) != 0`, tri-valued (spec §4.F `performKernelMalloc`'s
    /// platform zero-flag test).
    fn flag_bit_set(&self, sym: SymbolId, mask: u64) -> TriState;
}

/// `SValBuilder.conjuredHeapSymbol` (spec §4.F step 2).
pub trait SValBuilder {
    fn conjure_heap_symbol(&mut self, call_site: StatementId) -> SymbolId;
}

/// `SymbolManager.addSymbolDependency` (spec §3 realloc-pair invariant I4;
/// §4.G step 9 for the free-return-value table).
pub trait SymbolManager {
    fn add_symbol_dependency(&mut self, base: SymbolId, dependent: SymbolId);
}

/// `CheckerContext.generateErrorNode`/`generateNonFatalErrorNode`/`emitReport`
/// (spec §6 item 1, §7 propagation policy). Bundles the three capability
/// traits above so modeler functions only need one generic bound.
pub trait CheckerContext: ConstraintManager + SValBuilder + SymbolManager {
    /// A fatal finding: this path's further exploration from here is moot
    /// (e.g. a definite double free).
    fn generate_error_node(&mut self);
    /// A non-fatal finding: exploration continues (spec §4.J: leaks use
    /// this — they don't invalidate the rest of the path).
    fn generate_non_fatal_error_node(&mut self);
    fn emit_report(&mut self, report: BugReport);
}

/// One point in the engine's execution graph (GLOSSARY "ExplodedNode"):
/// state + program point, with predecessors forming the replay chain the
/// bug visitor (§4.L) and allocation-site search (§4.J.1) walk.
pub trait ExplodedNode: Clone {
    fn checker_state(&self) -> &CheckerState;
    fn predecessor(&self) -> Option<Self>
    where
        Self: Sized;
    /// Identity of the stack frame this node belongs to — used by the
    /// allocation-site search to find "the most recent binding of the
    /// symbol to a memory region that belongs to the same stack frame as
    /// the report" (spec §4.J.1).
    fn frame(&self) -> FrameId;
    /// The statement this node models, if any (destructor detection in the
    /// bug visitor's reference-counting suppression walks these).
    fn enclosing_destructor(&self) -> Option<DestructorFrame>;
    /// Whether an atomic fetch_add/fetch_sub appears at this node (spec
    /// §4.L reference-counting suppression, second rule).
    fn is_atomic_refcount_op(&self) -> bool;
    /// The name of a local variable this node binds `symbol` to, within the
    /// same stack frame as the report, if any (spec §4.J.1: "used to print
    /// 'leak of memory pointed to by X'").
    fn variable_binding_name(&self, symbol: SymbolId) -> Option<String>;
}

/// Opaque stack-frame identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameId(pub u64);

/// Enough about an enclosing destructor for the reference-counting
/// suppression heuristic (spec §4.L) to pattern-match the class name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestructorFrame {
    pub frame: FrameId,
    pub enclosing_class_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tristate_feasibility() {
        assert!(TriState::True.true_feasible());
        assert!(!TriState::True.false_feasible());
        assert!(TriState::Unknown.true_feasible());
        assert!(TriState::Unknown.false_feasible());
        assert!(!TriState::False.true_feasible());
    }

    #[test]
    fn memory_space_legal_free_targets() {
        assert!(MemorySpace::Heap.is_legal_free_target());
        assert!(MemorySpace::Unknown.is_legal_free_target());
        assert!(!MemorySpace::Stack.is_legal_free_target());
        assert!(!MemorySpace::Global.is_legal_free_target());
    }

    #[test]
    fn sval_location_extracts_base_symbol() {
        let region = RegionRef {
            space: MemorySpace::Heap,
            base_symbol: Some(SymbolId(3)),
            known_offset: Some(0),
            is_block_literal: false,
        };
        let v = SVal::Location(region);
        assert_eq!(v.as_symbol(), Some(SymbolId(3)));
        assert_eq!(v.as_location(), Some(region));
    }

    #[test]
    fn sval_concrete_zero_check() {
        assert_eq!(SVal::Concrete(0).concrete_is_zero(), Some(true));
        assert_eq!(SVal::Concrete(8).concrete_is_zero(), Some(false));
        assert_eq!(SVal::Unknown(SymbolId(1)).concrete_is_zero(), None);
    }
}
