//! # Error Types
//!
//! All error types raised by the paper contract and its world-state port.
//!
//! Every [`ContractError`] maps to a stable [`ErrorCode`], so callers branch on
//! the code instead of matching message text.

use thiserror::Error;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Machine-readable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No entry exists for the requested key.
    NotFound,
    /// An entry already exists for the key being created.
    DuplicateKey,
    /// Caller is not the current operator, or not the issuer organization.
    UnauthorizedTransition,
    /// Paper is not in the state the operation requires.
    InvalidStateTransition,
    /// Unknown named query.
    InvalidQueryName,
    /// Paper has already reached its terminal state.
    AlreadyDelivered,
    /// Positional arguments are missing or malformed.
    InvalidArguments,
    /// Function name is not exported by the contract.
    UnknownFunction,
    /// A key part cannot be encoded into a composite key.
    InvalidKey,
    /// Stored value carries a foreign class discriminator.
    UnknownClass,
    /// JSON encoding or decoding failed.
    Serialization,
    /// A rich query selector is malformed.
    InvalidQuery,
    /// A read key changed before the transaction committed.
    MvccConflict,
    /// Any other world-state failure.
    WorldState,
}

impl ErrorCode {
    /// Stable wire name of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::DuplicateKey => "DUPLICATE_KEY",
            Self::UnauthorizedTransition => "UNAUTHORIZED_TRANSITION",
            Self::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            Self::InvalidQueryName => "INVALID_QUERY_NAME",
            Self::AlreadyDelivered => "ALREADY_DELIVERED",
            Self::InvalidArguments => "INVALID_ARGUMENTS",
            Self::UnknownFunction => "UNKNOWN_FUNCTION",
            Self::InvalidKey => "INVALID_KEY",
            Self::UnknownClass => "UNKNOWN_CLASS",
            Self::Serialization => "SERIALIZATION",
            Self::InvalidQuery => "INVALID_QUERY",
            Self::MvccConflict => "MVCC_CONFLICT",
            Self::WorldState => "WORLD_STATE",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CONTRACT ERRORS
// =============================================================================

/// Errors returned by contract operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContractError {
    /// No paper stored under the key.
    #[error("Paper {key} does not exist")]
    NotFound {
        /// Human-readable key (`issuer:paperNumber`).
        key: String,
    },

    /// A paper is already stored under the key.
    #[error("Paper {key} already exists")]
    DuplicateKey {
        /// Human-readable key.
        key: String,
    },

    /// The supplied current operator does not match the stored one.
    #[error("Paper {issuer}{paper_number} is not operated by {operator}")]
    UnauthorizedOperator {
        /// Paper issuer.
        issuer: String,
        /// Paper number.
        paper_number: String,
        /// Operator claimed by the caller.
        operator: String,
    },

    /// The caller's organization is not the paper's issuer organization.
    #[error("Paper {issuer}{paper_number} cannot be paid by organization {msp_id}")]
    UnauthorizedOrganization {
        /// Paper issuer.
        issuer: String,
        /// Paper number.
        paper_number: String,
        /// Caller MSP id.
        msp_id: String,
    },

    /// The paper is not in the state the operation produces.
    #[error("Paper {issuer}{paper_number} is not {target}. Current state = {current}")]
    InvalidStateTransition {
        /// Paper issuer.
        issuer: String,
        /// Paper number.
        paper_number: String,
        /// Lower-case name of the state the operation leads to.
        target: &'static str,
        /// Name of the state the paper is actually in.
        current: &'static str,
    },

    /// Named query not in the fixed table.
    #[error("Unknown named query: {0}")]
    InvalidQueryName(String),

    /// The paper is already DELIVERED.
    #[error("Paper {issuer}{paper_number} has already been delivered")]
    AlreadyDelivered {
        /// Paper issuer.
        issuer: String,
        /// Paper number.
        paper_number: String,
    },

    /// Missing or malformed positional arguments.
    #[error("invalid arguments for {function}: {reason}")]
    InvalidArguments {
        /// Function being invoked.
        function: String,
        /// What is wrong.
        reason: String,
    },

    /// Function name not exported by the contract.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// A key part contains the composite-key delimiter.
    #[error("invalid key part {part:?}: {reason}")]
    InvalidKey {
        /// Offending part.
        part: String,
        /// What is wrong.
        reason: &'static str,
    },

    /// Stored class discriminator does not match the requested type.
    #[error("Unknown class of {found}, expected {expected}")]
    UnknownClass {
        /// Expected discriminator.
        expected: &'static str,
        /// Discriminator found in storage.
        found: String,
    },

    /// JSON encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// World-state failure.
    #[error("world state error: {0}")]
    State(#[from] StateError),
}

impl ContractError {
    /// Structured code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::DuplicateKey { .. } => ErrorCode::DuplicateKey,
            Self::UnauthorizedOperator { .. } | Self::UnauthorizedOrganization { .. } => {
                ErrorCode::UnauthorizedTransition
            }
            Self::InvalidStateTransition { .. } => ErrorCode::InvalidStateTransition,
            Self::InvalidQueryName(_) => ErrorCode::InvalidQueryName,
            Self::AlreadyDelivered { .. } => ErrorCode::AlreadyDelivered,
            Self::InvalidArguments { .. } => ErrorCode::InvalidArguments,
            Self::UnknownFunction(_) => ErrorCode::UnknownFunction,
            Self::InvalidKey { .. } => ErrorCode::InvalidKey,
            Self::UnknownClass { .. } => ErrorCode::UnknownClass,
            Self::Serialization(_) => ErrorCode::Serialization,
            Self::State(StateError::MvccReadConflict { .. }) => ErrorCode::MvccConflict,
            Self::State(StateError::InvalidQuery(_)) => ErrorCode::InvalidQuery,
            Self::State(_) => ErrorCode::WorldState,
        }
    }

    /// Returns true if the error was raised by a workflow guard, before any write.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self.code(),
            ErrorCode::UnauthorizedTransition
                | ErrorCode::InvalidStateTransition
                | ErrorCode::AlreadyDelivered
        )
    }

    pub(crate) fn invalid_args(function: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            function: function.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ContractError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// STATE ERRORS
// =============================================================================

/// Errors from the world-state port.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Backing store cannot be reached.
    #[error("world state unavailable: {0}")]
    Unavailable(String),

    /// Rich query is malformed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A key read by the transaction was rewritten before commit.
    #[error("MVCC read conflict on key {key:?}")]
    MvccReadConflict {
        /// Conflicting ledger key.
        key: String,
    },

    /// Transaction was already committed or belongs to another ledger.
    #[error("transaction {tx_id} is not active")]
    InactiveTransaction {
        /// Transaction id.
        tx_id: String,
    },
}

// =============================================================================
// CONFIG ERRORS
// =============================================================================

/// Invalid contract or service configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A field holds an unusable value.
    #[error("invalid {field}: {reason}")]
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// What is wrong.
        reason: String,
    },
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_mismatch_message() {
        let err = ContractError::UnauthorizedOperator {
            issuer: "PC".into(),
            paper_number: "0001".into(),
            operator: "RQ".into(),
        };
        assert_eq!(err.to_string(), "Paper PC0001 is not operated by RQ");
        assert_eq!(err.code(), ErrorCode::UnauthorizedTransition);
        assert!(err.is_rejection());
    }

    #[test]
    fn test_state_mismatch_message_names_current_state() {
        let err = ContractError::InvalidStateTransition {
            issuer: "PC".into(),
            paper_number: "0001".into(),
            target: "checked",
            current: "CREATED",
        };
        assert_eq!(
            err.to_string(),
            "Paper PC0001 is not checked. Current state = CREATED"
        );
    }

    #[test]
    fn test_mvcc_conflict_has_its_own_code() {
        let err: ContractError = StateError::MvccReadConflict { key: "k".into() }.into();
        assert_eq!(err.code(), ErrorCode::MvccConflict);
        let err: ContractError = StateError::Unavailable("down".into()).into();
        assert_eq!(err.code(), ErrorCode::WorldState);
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_malformed_query_is_not_a_world_state_fault() {
        let err: ContractError = StateError::InvalidQuery("missing selector object".into()).into();
        assert_eq!(err.code(), ErrorCode::InvalidQuery);
        assert_eq!(err.code().as_str(), "INVALID_QUERY");
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_code_wire_names() {
        assert_eq!(ErrorCode::AlreadyDelivered.as_str(), "ALREADY_DELIVERED");
        assert_eq!(ErrorCode::InvalidQueryName.to_string(), "INVALID_QUERY_NAME");
    }
}
