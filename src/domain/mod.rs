//! Heap Lifecycle Checker — Domain Layer
//!
//! Core value objects and entities (spec §3): the allocation-family tag,
//! the per-symbol lifecycle state machine, the per-path state tables, and
//! the bug-kind taxonomy. Domain logic here is independent of the host
//! engine — it knows nothing about how a `SymbolId` was produced, only how
//! to transition and store records keyed by one.

pub mod bug;
pub mod family;
pub mod ids;
pub mod state;
pub mod tables;

pub use bug::{BugKind, BugReport};
pub use family::{Family, OperationKind};
pub use ids::{StatementId, SymbolId};
pub use state::{LifecycleState, RefRecord};
pub use tables::{
    CheckerState, CheckerStateSnapshot, FreeReturnValueTable, ReallocOwnershipPolicy, ReallocPair,
    ReallocPairTable, RegionTable, ZeroSizeSet,
};
