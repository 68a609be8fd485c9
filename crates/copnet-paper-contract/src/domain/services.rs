//! # Domain Services
//!
//! Pure workflow logic: the transition table, the authorization gates and the
//! advance-then-verify guard every transition runs. Nothing here touches the
//! world state.

use crate::domain::entities::VdxPaper;
use crate::domain::invariants::check_state_advance;
use crate::domain::value_objects::{ClientIdentity, PaperState};
use crate::errors::ContractError;

// =============================================================================
// TRANSITION TABLE
// =============================================================================

/// Who may initiate a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gatekeeper {
    /// The caller must name the stored operator as current operator.
    Operator,
    /// The caller's organization must be the paper's issuer organization.
    IssuerOrganization,
}

/// A workflow step after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// CREATED → ISSUED.
    Issue,
    /// ISSUED → CHECKED.
    Check,
    /// CHECKED → TREATED.
    Treat,
    /// TREATED → PAID.
    Pay,
    /// PAID → RECEIVED.
    Receive,
    /// RECEIVED → DELIVERED.
    Deliver,
}

impl Transition {
    /// All transitions in workflow order.
    pub const ALL: [Transition; 6] = [
        Self::Issue,
        Self::Check,
        Self::Treat,
        Self::Pay,
        Self::Receive,
        Self::Deliver,
    ];

    /// State this transition produces.
    #[must_use]
    pub const fn result(self) -> PaperState {
        match self {
            Self::Issue => PaperState::Issued,
            Self::Check => PaperState::Checked,
            Self::Treat => PaperState::Treated,
            Self::Pay => PaperState::Paid,
            Self::Receive => PaperState::Received,
            Self::Deliver => PaperState::Delivered,
        }
    }

    /// State the paper must be in for the transition to advance it.
    #[must_use]
    pub const fn precondition(self) -> PaperState {
        match self {
            Self::Issue => PaperState::Created,
            Self::Check => PaperState::Issued,
            Self::Treat => PaperState::Checked,
            Self::Pay => PaperState::Treated,
            Self::Receive => PaperState::Paid,
            Self::Deliver => PaperState::Received,
        }
    }

    /// Authorization gate.
    #[must_use]
    pub const fn gatekeeper(self) -> Gatekeeper {
        match self {
            Self::Pay => Gatekeeper::IssuerOrganization,
            _ => Gatekeeper::Operator,
        }
    }

    /// Exported function name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Check => "check",
            Self::Treat => "treat",
            Self::Pay => "pay",
            Self::Receive => "receive",
            Self::Deliver => "deliver",
        }
    }
}

// =============================================================================
// GUARDS
// =============================================================================

/// Apply the transition's gate.
///
/// # Errors
///
/// `UnauthorizedOperator` or `UnauthorizedOrganization`.
pub fn authorize(
    paper: &VdxPaper,
    transition: Transition,
    current_operator: &str,
    caller: &ClientIdentity,
) -> Result<(), ContractError> {
    match transition.gatekeeper() {
        Gatekeeper::Operator if paper.operator() != current_operator => {
            Err(ContractError::UnauthorizedOperator {
                issuer: paper.issuer().to_string(),
                paper_number: paper.paper_number().to_string(),
                operator: current_operator.to_string(),
            })
        }
        Gatekeeper::IssuerOrganization if paper.issuer_org() != caller.msp_id => {
            Err(ContractError::UnauthorizedOrganization {
                issuer: paper.issuer().to_string(),
                paper_number: paper.paper_number().to_string(),
                msp_id: caller.msp_id.clone(),
            })
        }
        _ => Ok(()),
    }
}

/// Fail if the paper has reached its terminal state.
///
/// # Errors
///
/// `AlreadyDelivered`.
pub fn ensure_not_delivered(paper: &VdxPaper) -> Result<(), ContractError> {
    if paper.is(PaperState::Delivered) {
        return Err(ContractError::AlreadyDelivered {
            issuer: paper.issuer().to_string(),
            paper_number: paper.paper_number().to_string(),
        });
    }
    Ok(())
}

/// Advance one step if the paper sits in the precondition state, then require
/// it to be in the transition's result state.
///
/// A paper already in the result state passes unchanged, so repeating a step
/// re-applies its side effects without moving the state.
///
/// # Errors
///
/// `InvalidStateTransition` naming the paper's own current state.
pub fn advance(paper: &mut VdxPaper, transition: Transition) -> Result<(), ContractError> {
    let before = paper.state();
    if paper.is(transition.precondition()) {
        paper.set_state(transition.result());
    }

    let legal = check_state_advance(before, paper.state()).is_ok();
    if legal && paper.is(transition.result()) {
        return Ok(());
    }
    Err(ContractError::InvalidStateTransition {
        issuer: paper.issuer().to_string(),
        paper_number: paper.paper_number().to_string(),
        target: transition.result().label(),
        current: paper.current_state_name(),
    })
}

/// Hand the paper to its next operator on behalf of the caller's organization.
pub fn reassign(paper: &mut VdxPaper, new_operator: &str, caller: &ClientIdentity) {
    paper.set_operator(new_operator);
    paper.set_operator_org(caller.msp_id.as_str());
}

// =============================================================================
// TESTS
// =============================================================================
