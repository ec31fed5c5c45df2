//! Checker configuration.
//!
//! Two independent axes of configuration, per spec §6:
//! - `optimistic`: whether the ownership-attribute family participates in
//!   classification (§4.A).
//! - five sub-checker toggles (§6.4): the modeler always runs; a toggle only
//!   gates whether a given [`crate::domain::bug::BugKind`] is actually
//!   reported (§7).

use crate::domain::bug::BugKind;
use crate::error::{CheckerError, Result};
use serde::{Deserialize, Serialize};

/// Independent on/off switches for the five sub-checkers (spec §6.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCheckerToggles {
    pub malloc_checker: bool,
    pub new_delete_checker: bool,
    pub new_delete_leaks_checker: bool,
    pub mismatched_deallocator_checker: bool,
    pub inner_pointer_checker: bool,
}

impl SubCheckerToggles {
    pub const fn all_enabled() -> Self {
        Self {
            malloc_checker: true,
            new_delete_checker: true,
            new_delete_leaks_checker: true,
            mismatched_deallocator_checker: true,
            inner_pointer_checker: true,
        }
    }

    pub const fn all_disabled() -> Self {
        Self {
            malloc_checker: false,
            new_delete_checker: false,
            new_delete_leaks_checker: false,
            mismatched_deallocator_checker: false,
            inner_pointer_checker: false,
        }
    }

    /// Whether any toggle gating `kind` (per spec §7's gate table) is on.
    pub fn gates(&self, kind: BugKind) -> bool {
        kind.gates().iter().any(|gate| match gate {
            SubChecker::Malloc => self.malloc_checker,
            SubChecker::NewDelete => self.new_delete_checker,
            SubChecker::NewDeleteLeaks => self.new_delete_leaks_checker,
            SubChecker::MismatchedDeallocator => self.mismatched_deallocator_checker,
            SubChecker::InnerPointer => self.inner_pointer_checker,
        })
    }
}

impl Default for SubCheckerToggles {
    fn default() -> Self {
        Self::all_enabled()
    }
}

/// One of the five sub-checkers from spec §6.4, used as a gate key in
/// [`crate::domain::bug::BugKind::gates`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubChecker {
    Malloc,
    NewDelete,
    NewDeleteLeaks,
    MismatchedDeallocator,
    InnerPointer,
}

/// Configuration preset bundling sensible toggle combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Everything on, including the ownership-attribute family.
    Thorough,
    /// Everything on, ownership attributes off (default engine behavior).
    Balanced,
    /// C++ `new`/`delete`-specific leak reporting off; useful for engines
    /// without a reliable symbol-cleanup callback for C++ frames. Note that
    /// `Leak` is also gated by `malloc_checker` (spec §7), which this preset
    /// leaves on, so `malloc`-family leaks are still reported.
    Fast,
    /// User-defined: starts from `Balanced` and is meant to be overridden.
    Custom,
}

impl Default for Preset {
    fn default() -> Self {
        Preset::Balanced
    }
}

/// Top-level checker configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Whether `ownership_returns`/`ownership_takes`/`ownership_holds`
    /// annotated functions participate in classification (§4.A).
    pub optimistic: bool,
    pub toggles: SubCheckerToggles,
}

impl CheckerConfig {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Thorough => Self {
                optimistic: true,
                toggles: SubCheckerToggles::all_enabled(),
            },
            Preset::Balanced => Self {
                optimistic: false,
                toggles: SubCheckerToggles::all_enabled(),
            },
            Preset::Fast => Self {
                optimistic: false,
                toggles: SubCheckerToggles {
                    new_delete_leaks_checker: false,
                    ..SubCheckerToggles::all_enabled()
                },
            },
            Preset::Custom => Self {
                optimistic: false,
                toggles: SubCheckerToggles::all_enabled(),
            },
        }
    }

    /// A config is invalid only if every sub-checker is disabled — in that
    /// case the modeler still runs but no diagnostic could ever surface,
    /// which is never what a caller wants from this crate.
    pub fn validate(&self) -> Result<()> {
        let t = &self.toggles;
        if !(t.malloc_checker
            || t.new_delete_checker
            || t.new_delete_leaks_checker
            || t.mismatched_deallocator_checker
            || t.inner_pointer_checker)
        {
            return Err(CheckerError::InvalidConfig(
                "all sub-checker toggles are disabled; no diagnostic can ever be emitted".into(),
            ));
        }
        Ok(())
    }
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self::from_preset(Preset::default())
    }
}
