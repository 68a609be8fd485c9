//! # Domain Invariants
//!
//! | Invariant | Check |
//! |-----------|-------|
//! | State only moves forward, one step at a time | [`check_state_advance`] |
//! | Identity fields never change after creation | [`check_identity_preserved`] |
//! | Nothing but DELIVERED is terminal | [`PaperState::is_terminal`] |

use crate::domain::entities::VdxPaper;
use crate::domain::value_objects::PaperState;
use thiserror::Error;

/// A broken lifecycle invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// State moved backwards.
    #[error("state regressed from {from} to {to}")]
    StateRegressed {
        /// State before.
        from: PaperState,
        /// State after.
        to: PaperState,
    },

    /// State advanced more than one step.
    #[error("state skipped from {from:?} to {to}")]
    StateSkipped {
        /// State before, `None` for a fresh paper.
        from: Option<PaperState>,
        /// State after.
        to: PaperState,
    },

    /// State was cleared.
    #[error("state cleared")]
    StateCleared,

    /// Issuer, number or key changed.
    #[error("identity of paper {key} changed")]
    IdentityChanged {
        /// Key before the change.
        key: String,
    },
}

/// A state change is legal if it stays put or advances exactly one step.
/// A fresh paper may only enter CREATED.
///
/// # Errors
///
/// The violation found.
pub fn check_state_advance(
    from: Option<PaperState>,
    to: Option<PaperState>,
) -> Result<(), InvariantViolation> {
    match (from, to) {
        (None, None) => Ok(()),
        (Some(_), None) => Err(InvariantViolation::StateCleared),
        (None, Some(PaperState::Created)) => Ok(()),
        (None, Some(next)) => Err(InvariantViolation::StateSkipped { from, to: next }),
        (Some(prev), Some(next)) if next < prev => Err(InvariantViolation::StateRegressed {
            from: prev,
            to: next,
        }),
        (Some(prev), Some(next)) if next == prev || prev.next() == Some(next) => Ok(()),
        (Some(_), Some(next)) => Err(InvariantViolation::StateSkipped { from, to: next }),
    }
}

/// Issuer, paper number and key are immutable.
///
/// # Errors
///
/// `IdentityChanged` if any of them differ.
pub fn check_identity_preserved(
    before: &VdxPaper,
    after: &VdxPaper,
) -> Result<(), InvariantViolation> {
    if before.issuer() == after.issuer()
        && before.paper_number() == after.paper_number()
        && before.key() == after.key()
    {
        Ok(())
    } else {
        Err(InvariantViolation::IdentityChanged {
            key: before.key().to_string(),
        })
    }
}

/// Run every invariant over a before/after pair.
///
/// # Errors
///
/// The first violation found.
pub fn check_all_invariants(before: &VdxPaper, after: &VdxPaper) -> Result<(), InvariantViolation> {
    check_identity_preserved(before, after)?;
    check_state_advance(before.state(), after.state())
}

// =============================================================================
// TESTS
// =============================================================================
