//! Opaque identifiers for engine-owned objects.
//!
//! The checker never constructs these itself — they are handed back by the
//! host engine's [`crate::ports`] traits (a symbolic value's identity, a
//! statement's identity) and used here purely as map keys. Newtypes keep a
//! stray `u64` from one domain leaking into the other at a call site.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a symbolic value (spec GLOSSARY: "Symbolic value / SVal").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u64);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sym${}", self.0)
    }
}

/// Identity of the statement/call expression that caused a state entry,
/// used by diagnostics (spec §3 RefRecord.origin_statement) and by the
/// allocation-site search (§4.J.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatementId(pub u64);

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stmt${}", self.0)
    }
}
