//! Escape policy (spec §4.I).
//!
//! Decides, for an opaque call the engine flags as a potential escape
//! point, which tracked symbols stop being claimed by the checker.

use crate::domain::{CheckerState, Family, LifecycleState, StatementId, SymbolId};
use crate::infrastructure::classifier;
use crate::domain::OperationKind;
use crate::ports::CallKind;

/// Whether escaped symbols should only transition out of
/// `Allocated`/`AllocatedOfSizeZero` unconditionally, or only when their
/// family is one where the escaping operation is legal (spec §4.I:
/// "const-pointer escape variant ... only escapes if the allocation family
/// is CXXNew or CXXNewArray").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeKind {
    Ordinary,
    ConstPointer,
}

/// The escape decision for a set of candidate symbols (spec §4.I rule 4:
/// "may return a single specific escaping symbol").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscapeDecision {
    None,
    All,
    Only(SymbolId),
}

/// Rules 1-3 of spec §4.I, determining whether this call escapes its
/// pointer-shaped arguments at all (rule 4, selecting *which* symbol, is
/// left to the caller since it depends on which argument position matched).
pub fn call_may_escape(call: &CallKind, optimistic: bool) -> bool {
    match call {
        // Rule 1.
        CallKind::Block(_) | CallKind::New(_) | CallKind::Delete(_) => true,
        CallKind::ObjCMessage(msg) => objc_message_may_escape(msg),
        CallKind::Function(function_call) => {
            // Rule 3: modeled allocators never escape their own arguments.
            if classifier::classify(call, OperationKind::Any, optimistic).is_some() {
                return false;
            }
            if !function_call.in_system_header {
                return true;
            }
            system_function_may_escape(function_call)
        }
    }
}

fn objc_message_may_escape(msg: &crate::ports::ObjCMessageCall) -> bool {
    if !msg.in_system_header || msg.has_callback_args {
        return true;
    }
    if msg.selector == "init" {
        return true;
    }
    if let Some(free_when_done) = msg.free_when_done {
        return free_when_done;
    }
    if msg.selector.ends_with("NoCopy:") || msg.selector.contains("NoCopy:") {
        return true;
    }
    msg.selector.starts_with("addPointer")
        || msg.selector.starts_with("insertPointer")
        || msg.selector.starts_with("replacePointer")
        || msg.selector == "valueWithPointer:"
}

/// Rule 3's allow/deny-list of non-system-header-exempt library names (spec
/// §4.I): `*NoCopy` functions escape unless the deallocator argument is a
/// named null allocator constant; `funopen` only escapes with a non-null
/// `closefn`; the `setbuf` family only escapes when the buffer argument is a
/// "std*"-named variable; a fixed set of names always escape.
fn system_function_may_escape(call: &crate::ports::FunctionCall) -> bool {
    const ALWAYS_ESCAPE: &[&str] = &["pthread_setspecific", "CFArrayCreate", "CGBitmapContextCreateWithData"];
    const SETBUF_FAMILY: &[&str] = &["setbuf", "setbuffer", "setlinebuf", "setvbuf"];

    if ALWAYS_ESCAPE.contains(&call.callee_name.as_str()) {
        return true;
    }
    if call.callee_name.ends_with("NoCopy") {
        return !call.deallocator_arg_is_null_constant;
    }
    if call.callee_name == "funopen" {
        return !call.deallocator_arg_is_null_constant;
    }
    if SETBUF_FAMILY.contains(&call.callee_name.as_str()) {
        return call.buffer_arg_is_named_std_variable;
    }
    false
}

/// Apply an [`EscapeDecision`] to `state`: every candidate symbol currently
/// `Allocated`/`AllocatedOfSizeZero` (and, for [`EscapeKind::ConstPointer`],
/// only those of a family [`Family::permits_const_pointer_deallocation`])
/// transitions to `Escaped` (spec §4.I final paragraph).
pub fn apply_escape(
    state: &CheckerState,
    candidates: &[SymbolId],
    decision: &EscapeDecision,
    kind: EscapeKind,
    at: StatementId,
) -> CheckerState {
    let mut next = state.clone();
    let escaping: Vec<SymbolId> = match decision {
        EscapeDecision::None => return next,
        EscapeDecision::All => candidates.to_vec(),
        EscapeDecision::Only(sym) => vec![*sym],
    };

    for sym in escaping {
        let Some(record) = next.regions.get(sym) else { continue };
        if !record.state.is_live() {
            continue;
        }
        if kind == EscapeKind::ConstPointer && !record.family.permits_const_pointer_deallocation() {
            continue;
        }
        next.regions.insert(sym, record.transition(LifecycleState::Escaped, at));
    }
    next
}
