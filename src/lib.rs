//! Heap Lifecycle Checker
//!
//! A path-sensitive, symbolic heap-lifecycle analysis: a state-extension
//! plugin for a host symbolic execution engine. Tracks allocation/
//! deallocation pairing across `malloc`/`free`, POSIX `if_nameindex`,
//! `alloca`, C++ `new`/`delete`, and container inner-buffer invalidation,
//! surfacing double-free, use-after-free, mismatched-allocator, offset-free,
//! use-of-zero-sized-allocation, and leak diagnostics.
//!
//! Hexagonal layering:
//! - [`domain`]      : allocation-family tags, the per-symbol lifecycle state
//!   machine, the per-path state tables, and the bug-kind taxonomy — no
//!   dependency on the host engine.
//! - [`ports`]       : the contracts a host engine must satisfy (constraint
//!   queries, symbol conjuring, diagnostics, the execution-graph node).
//! - [`infrastructure`]: one modeler per operation the host dispatches —
//!   allocation, deallocation, realloc, escape, leak-finding, the
//!   assumption hook, and the bug-report path visitor.
//! - [`application`] : [`application::HeapLifecycleChecker`], the facade a
//!   host integration actually calls.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ports;

pub use application::HeapLifecycleChecker;
pub use config::{CheckerConfig, Preset, SubCheckerToggles};
pub use domain::{BugKind, BugReport, CheckerState};
pub use error::{CheckerError, Result};
