//! REST route handlers.
//!
//! Submit routes commit through the ledger network and answer
//! `{"response": {"TxID", "result"}}`; evaluate routes answer
//! `{"response": <json>}`. Failures never take the process down: they are
//! logged and returned as [`ApiError`].

use crate::domain::error::{codes, ApiError, ApiResult, GatewayError};
use crate::domain::types::{
    AdhocRequest, ApiResponse, CheckRequest, ContractCall, CreateRequest, DeliverRequest,
    HistoryRequest, IssueRequest, IssuerRequest, NamedRequest, OperatorRequest, PayRequest,
    ReceiveRequest, RequestDefaults, SubmitOutcome, TreatRequest,
};
use crate::ports::outbound::LedgerNetwork;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Ledger network the gateway talks to
    pub network: Arc<dyn LedgerNetwork>,
    /// Request fallbacks
    pub defaults: Arc<RequestDefaults>,
    /// Organization name, reported by `/health`
    pub organization: Arc<str>,
}

fn decode(payload: &[u8]) -> Result<Value, GatewayError> {
    if payload.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(payload).map_err(|e| GatewayError::Payload(e.to_string()))
}

fn body<T>(request: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    request.map(|Json(request)| request).map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                codes::PAYLOAD_TOO_LARGE,
                rejection.body_text(),
            )
        } else {
            ApiError::bad_request(rejection.body_text())
        }
    })
}

fn log_failure(kind: &str, function: &str, err: &GatewayError) {
    if err.is_rejection() {
        warn!(function, error = %err, "{kind} rejected");
    } else {
        error!(function, error = %err, "{kind} failed");
    }
}

async fn submit<C: ContractCall>(
    state: &AppState,
    request: Result<Json<C>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<SubmitOutcome>>> {
    let args = body(request)?.into_args(&state.defaults);
    let submitted = match state.network.submit(C::FUNCTION, &args).await {
        Ok(submitted) => submitted,
        Err(err) => {
            log_failure("submit", C::FUNCTION, &err);
            return Err(err.into());
        }
    };
    info!(function = C::FUNCTION, tx_id = %submitted.tx_id, "transaction submitted");
    let result = decode(&submitted.payload)?;
    Ok(Json(ApiResponse::new(SubmitOutcome {
        tx_id: submitted.tx_id,
        result,
    })))
}

async fn evaluate<C: ContractCall>(
    state: &AppState,
    request: C,
) -> ApiResult<Json<ApiResponse<Value>>> {
    let args = request.into_args(&state.defaults);
    let payload = match state.network.evaluate(C::FUNCTION, &args).await {
        Ok(payload) => payload,
        Err(err) => {
            log_failure("evaluate", C::FUNCTION, &err);
            return Err(err.into());
        }
    };
    Ok(Json(ApiResponse::new(decode(&payload)?)))
}

// =============================================================================
// SUBMIT ROUTES
// =============================================================================

/// `POST /api/create`
pub async fn create(
    State(state): State<AppState>,
    request: Result<Json<CreateRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<SubmitOutcome>>> {
    submit(&state, request).await
}

/// `POST /api/issue`
pub async fn issue(
    State(state): State<AppState>,
    request: Result<Json<IssueRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<SubmitOutcome>>> {
    submit(&state, request).await
}

/// `POST /api/check`
pub async fn check(
    State(state): State<AppState>,
    request: Result<Json<CheckRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<SubmitOutcome>>> {
    submit(&state, request).await
}

/// `POST /api/treat`
pub async fn treat(
    State(state): State<AppState>,
    request: Result<Json<TreatRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<SubmitOutcome>>> {
    submit(&state, request).await
}

/// `POST /api/pay`
pub async fn pay(
    State(state): State<AppState>,
    request: Result<Json<PayRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<SubmitOutcome>>> {
    submit(&state, request).await
}

/// `POST /api/receive`
pub async fn receive(
    State(state): State<AppState>,
    request: Result<Json<ReceiveRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<SubmitOutcome>>> {
    submit(&state, request).await
}

/// `POST /api/deliver`
pub async fn deliver(
    State(state): State<AppState>,
    request: Result<Json<DeliverRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<SubmitOutcome>>> {
    submit(&state, request).await
}

// =============================================================================
// EVALUATE ROUTES
// =============================================================================

/// `POST /api/queryHistory`
pub async fn query_history(
    State(state): State<AppState>,
    request: Result<Json<HistoryRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Value>>> {
    evaluate(&state, body(request)?).await
}

/// `POST /api/queryOperator`
pub async fn query_operator(
    State(state): State<AppState>,
    request: Result<Json<OperatorRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Value>>> {
    evaluate(&state, body(request)?).await
}

/// `POST /api/queryIssuer`
pub async fn query_issuer(
    State(state): State<AppState>,
    request: Result<Json<IssuerRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Value>>> {
    evaluate(&state, body(request)?).await
}

/// `POST /api/queryNamed`
pub async fn query_named(
    State(state): State<AppState>,
    request: Result<Json<NamedRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Value>>> {
    evaluate(&state, body(request)?).await
}

/// `POST /api/queryAdhoc`
pub async fn query_adhoc(
    State(state): State<AppState>,
    request: Result<Json<AdhocRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<Value>>> {
    evaluate(&state, body(request)?).await
}

/// `GET /api/queryAll`
pub async fn query_all(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<Value>>> {
    evaluate(&state, AdhocRequest::all_papers()).await
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "copnet-api-gateway",
        "organization": &*state.organization,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_payload() {
        assert_eq!(decode(b"").unwrap(), Value::Null);
        assert_eq!(decode(br#"{"a":1}"#).unwrap()["a"], 1);
        assert!(matches!(
            decode(b"not json"),
            Err(GatewayError::Payload(_))
        ));
    }
}
