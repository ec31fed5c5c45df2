//! Allocation-family classifier (spec §4.A).
//!
//! Recognizes callee identifiers by table lookup rather than the lazily
//! populated identifier cache the original analyzer uses (Design Notes:
//! "Lazy identifier interning") — callers here intern eagerly, so a plain
//! static hash set is both simpler and faster.

use crate::domain::{Family, OperationKind};
use crate::ports::CallKind;
use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

/// Malloc-family names, including the `g_`-prefixed GLib mirror and its `_n`
/// variants (spec §4.A).
static MALLOC_ALLOCATE_NAMES: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "malloc",
        "calloc",
        "valloc",
        "strdup",
        "strndup",
        "wcsdup",
        "kmalloc",
        "g_malloc",
        "g_malloc0",
        "g_try_malloc",
        "g_try_malloc0",
        "g_memdup",
        "g_malloc_n",
        "g_malloc0_n",
        "g_try_malloc_n",
        "g_try_malloc0_n",
    ]
    .into_iter()
    .collect()
});

/// `realloc`/`reallocf` and GLib equivalents are allocation *and*
/// potentially-free calls; the realloc modeler (§4.H) handles them
/// separately from [`MALLOC_ALLOCATE_NAMES`].
static MALLOC_REALLOC_NAMES: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "realloc",
        "reallocf",
        "g_realloc",
        "g_try_realloc",
        "g_realloc_n",
        "g_try_realloc_n",
    ]
    .into_iter()
    .collect()
});

static MALLOC_FREE_NAMES: Lazy<FxHashSet<&'static str>> =
    Lazy::new(|| ["free", "kfree", "g_free"].into_iter().collect());

static IF_NAMEINDEX_ALLOCATE_NAMES: Lazy<FxHashSet<&'static str>> =
    Lazy::new(|| ["if_nameindex"].into_iter().collect());

static IF_NAMEINDEX_FREE_NAMES: Lazy<FxHashSet<&'static str>> =
    Lazy::new(|| ["if_freenameindex"].into_iter().collect());

static ALLOCA_NAMES: Lazy<FxHashSet<&'static str>> =
    Lazy::new(|| ["alloca", "_alloca"].into_iter().collect());

/// Strip a single leading underscore (spec §4.A: "platform-prefixed variants
/// (leading underscore on one platform)").
fn strip_platform_prefix(name: &str) -> &str {
    name.strip_prefix('_').unwrap_or(name)
}

fn is_in(table: &Lazy<FxHashSet<&'static str>>, name: &str) -> bool {
    table.contains(name) || table.contains(strip_platform_prefix(name))
}

/// Classify a plain function-call callee name into an allocation family and
/// operation, ignoring `new`/`delete`/ownership attributes (those are
/// handled by [`classify`] directly from the [`CallKind`]).
fn classify_function_name(name: &str) -> Option<(Family, OperationKind)> {
    if is_in(&MALLOC_ALLOCATE_NAMES, name) {
        return Some((Family::Malloc, OperationKind::Allocate));
    }
    if is_in(&MALLOC_REALLOC_NAMES, name) {
        return Some((Family::Malloc, OperationKind::Any));
    }
    if is_in(&MALLOC_FREE_NAMES, name) {
        return Some((Family::Malloc, OperationKind::Free));
    }
    if is_in(&IF_NAMEINDEX_ALLOCATE_NAMES, name) {
        return Some((Family::IfNameIndex, OperationKind::Allocate));
    }
    if is_in(&IF_NAMEINDEX_FREE_NAMES, name) {
        return Some((Family::IfNameIndex, OperationKind::Free));
    }
    if is_in(&ALLOCA_NAMES, name) {
        return Some((Family::Alloca, OperationKind::Allocate));
    }
    None
}

/// `classify(call) -> AllocationFamily | None` (spec §4.A), filtered by
/// `op`. `optimistic` gates whether the ownership-attribute family
/// participates (spec §6 item 3).
pub fn classify(call: &CallKind, op: OperationKind, optimistic: bool) -> Option<Family> {
    let (family, call_op) = match call {
        CallKind::New(new_expr) => {
            if !new_expr.in_system_header {
                return None;
            }
            let family = if new_expr.is_array { Family::CxxNewArray } else { Family::CxxNew };
            (family, OperationKind::Allocate)
        }
        CallKind::Delete(delete_expr) => {
            if !delete_expr.in_system_header {
                return None;
            }
            let family = if delete_expr.is_array { Family::CxxNewArray } else { Family::CxxNew };
            (family, OperationKind::Free)
        }
        CallKind::Function(function_call) => {
            if let Some(found) = classify_function_name(&function_call.callee_name) {
                found
            } else if optimistic {
                classify_by_ownership_attr(function_call)?
            } else {
                return None;
            }
        }
        CallKind::ObjCMessage(_) | CallKind::Block(_) => return None,
    };

    let matches_op = match op {
        OperationKind::Any => true,
        OperationKind::Allocate => call_op != OperationKind::Free,
        OperationKind::Free => call_op != OperationKind::Allocate,
    };
    matches_op.then_some(family)
}

/// Optimistic-mode ownership-attribute classification (spec §4.A: "the
/// attribute's 'module' string must equal `malloc`").
fn classify_by_ownership_attr(
    function_call: &crate::ports::FunctionCall,
) -> Option<(Family, OperationKind)> {
    use crate::ports::OwnershipAttrKind;

    let attr = function_call.ownership_attr.as_ref()?;
    if attr.module != "malloc" {
        return None;
    }
    let op = match attr.kind {
        OwnershipAttrKind::Returns => OperationKind::Allocate,
        OwnershipAttrKind::Takes | OwnershipAttrKind::Holds => OperationKind::Free,
    };
    Some((Family::Malloc, op))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StatementId;
    use crate::ports::{FunctionCall, NewExpr, OwnershipAttr, OwnershipAttrKind};

    fn function_call(name: &str) -> CallKind {
        CallKind::Function(FunctionCall {
            callee_name: name.to_string(),
            statement: StatementId(1),
            args: vec![],
            in_system_header: false,
            return_type_is_pointer_like: true,
            ownership_attr: None,
            deallocator_arg_is_null_constant: false,
            buffer_arg_is_named_std_variable: false,
        })
    }

    #[test]
    fn classifies_malloc_and_free() {
        assert_eq!(
            classify(&function_call("malloc"), OperationKind::Any, false),
            Some(Family::Malloc)
        );
        assert_eq!(
            classify(&function_call("free"), OperationKind::Free, false),
            Some(Family::Malloc)
        );
        assert_eq!(classify(&function_call("free"), OperationKind::Allocate, false), None);
    }

    #[test]
    fn recognizes_platform_prefixed_alloca() {
        assert_eq!(
            classify(&function_call("_alloca"), OperationKind::Any, false),
            Some(Family::Alloca)
        );
    }

    #[test]
    fn glib_n_suffixed_variants_are_recognized() {
        assert_eq!(
            classify(&function_call("g_malloc0_n"), OperationKind::Allocate, false),
            Some(Family::Malloc)
        );
        assert_eq!(
            classify(&function_call("g_try_realloc_n"), OperationKind::Any, false),
            Some(Family::Malloc)
        );
    }

    #[test]
    fn new_requires_system_header_definition() {
        let user_defined = CallKind::New(NewExpr {
            statement: StatementId(1),
            is_array: false,
            in_system_header: false,
            array_size: None,
            size_arg: None,
        });
        assert_eq!(classify(&user_defined, OperationKind::Allocate, false), None);

        let std_new = CallKind::New(NewExpr {
            statement: StatementId(1),
            is_array: true,
            in_system_header: true,
            array_size: None,
            size_arg: None,
        });
        assert_eq!(classify(&std_new, OperationKind::Allocate, false), Some(Family::CxxNewArray));
    }

    #[test]
    fn ownership_attr_only_recognized_when_optimistic() {
        let mut call = match function_call("my_custom_alloc") {
            CallKind::Function(f) => f,
            _ => unreachable!(),
        };
        call.ownership_attr =
            Some(OwnershipAttr { kind: OwnershipAttrKind::Returns, module: "malloc".to_string() });
        let wrapped = CallKind::Function(call);

        assert_eq!(classify(&wrapped, OperationKind::Any, false), None);
        assert_eq!(classify(&wrapped, OperationKind::Any, true), Some(Family::Malloc));
    }

    #[test]
    fn ownership_attr_module_must_be_malloc() {
        let mut call = match function_call("custom_pool_alloc") {
            CallKind::Function(f) => f,
            _ => unreachable!(),
        };
        call.ownership_attr =
            Some(OwnershipAttr { kind: OwnershipAttrKind::Returns, module: "pool".to_string() });
        let wrapped = CallKind::Function(call);

        assert_eq!(classify(&wrapped, OperationKind::Any, true), None);
    }
}
