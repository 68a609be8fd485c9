//! API Gateway error types and their HTTP mapping.
//!
//! Every failure reaches the client as `{"error": {"code", "message"}}`.
//! Contract rejections keep the contract's error code; gateway-level failures
//! use the codes in [`codes`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use copnet_paper_contract::prelude::{ContractError, ErrorCode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gateway-level error codes
pub mod codes {
    /// Request body is not valid JSON for the route
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    /// Request body exceeds the configured limit
    pub const PAYLOAD_TOO_LARGE: &str = "PAYLOAD_TOO_LARGE";
    /// Ledger network could not be reached
    pub const NETWORK_UNAVAILABLE: &str = "NETWORK_UNAVAILABLE";
    /// Unexpected gateway failure
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Result type of route handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned to HTTP clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status
    pub status: StatusCode,
    /// Machine-readable code
    pub code: String,
    /// Error message
    pub message: String,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Malformed request body
    pub fn bad_request(details: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, details)
    }

    /// Internal error
    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL_ERROR,
            details,
        )
    }

    /// JSON body sent to the client
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: ErrorDetail {
                code: self.code.clone(),
                message: self.message.clone(),
            },
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body())).into_response()
    }
}

/// HTTP status for a contract error code.
#[must_use]
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::DuplicateKey
        | ErrorCode::InvalidStateTransition
        | ErrorCode::AlreadyDelivered
        | ErrorCode::MvccConflict => StatusCode::CONFLICT,
        ErrorCode::UnauthorizedTransition => StatusCode::FORBIDDEN,
        ErrorCode::InvalidQueryName
        | ErrorCode::InvalidQuery
        | ErrorCode::InvalidArguments
        | ErrorCode::InvalidKey => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ContractError> for ApiError {
    fn from(err: ContractError) -> Self {
        let code = err.code();
        Self::new(status_for(code), code.as_str(), err.to_string())
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Contract(err) => err.into(),
            GatewayError::Network(reason) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::NETWORK_UNAVAILABLE,
                reason,
            ),
            other => Self::internal(other.to_string()),
        }
    }
}

/// Wire form of an error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error details
    pub error: ErrorDetail,
}

/// Code and message of an error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

/// Gateway errors
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// The contract rejected the transaction
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// Ledger network unreachable
    #[error("ledger network unavailable: {0}")]
    Network(String),

    /// Contract returned a payload that is not JSON
    #[error("malformed contract payload: {0}")]
    Payload(String),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns true if the contract refused the request.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Contract(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorCode::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorCode::DuplicateKey), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorCode::MvccConflict), StatusCode::CONFLICT);
        assert_eq!(
            status_for(ErrorCode::UnauthorizedTransition),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(ErrorCode::InvalidQueryName),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(ErrorCode::InvalidQuery), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(ErrorCode::WorldState),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(ErrorCode::Serialization),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(ErrorCode::UnknownFunction),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_contract_error_conversion() {
        let err: ApiError = ContractError::NotFound {
            key: "PC:0001".into(),
        }
        .into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "NOT_FOUND");
        assert!(err.message.contains("PC:0001"));
    }

    #[test]
    fn test_gateway_error_conversion() {
        let err: ApiError = GatewayError::Network("peer down".into()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, codes::NETWORK_UNAVAILABLE);

        let err: ApiError = GatewayError::Payload("not json".into()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, codes::INTERNAL_ERROR);

        let rejection = GatewayError::from(ContractError::InvalidQueryName("bogus".into()));
        assert!(rejection.is_rejection());
        assert_eq!(ApiError::from(rejection).status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_serialization() {
        let err = ApiError::bad_request("missing field `paperNumber`");
        let json = serde_json::to_value(err.body()).unwrap();
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert_eq!(json["error"]["message"], "missing field `paperNumber`");
    }
}
