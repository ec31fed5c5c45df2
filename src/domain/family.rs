//! Allocation-family classification (spec §3, §4.A).
//!
//! A [`Family`] tags the allocator lineage of a tracked symbol so that the
//! deallocation modeler (§4.G) can enforce correct pairing: `free` pairs with
//! `malloc`, not `delete`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Allocator kind. `None` (spec's sentinel) is deliberately not a variant
/// here — it is represented as `Option<Family>` at call sites, since a
/// [`crate::domain::state::RefRecord`] must never hold a non-allocation
/// family (invariant I1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    Malloc,
    CxxNew,
    CxxNewArray,
    IfNameIndex,
    Alloca,
    InnerBuffer,
}

impl Family {
    /// The allocator/deallocator names considered "standard" for this
    /// family, for mismatch diagnostics (spec §4.G step 6, §7 message hint).
    pub fn display_name(&self) -> &'static str {
        match self {
            Family::Malloc => "malloc/free",
            Family::CxxNew => "new/delete",
            Family::CxxNewArray => "new[]/delete[]",
            Family::IfNameIndex => "if_nameindex/if_freenameindex",
            Family::Alloca => "alloca",
            Family::InnerBuffer => "container inner buffer",
        }
    }

    /// `delete`/`delete[]` on a const pointer is legal C++; `free` is not.
    /// Used by the const-pointer escape variant (spec §4.I).
    pub fn permits_const_pointer_deallocation(&self) -> bool {
        matches!(self, Family::CxxNew | Family::CxxNewArray)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// The operation-kind filter a classification query takes (spec §4.A).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Allocate,
    Free,
    Any,
}
