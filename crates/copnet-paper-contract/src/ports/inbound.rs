//! # Driving Ports (API - Inbound)
//!
//! The operations the paper contract exports. The ledger platform invokes
//! them through [`crate::dispatch`]; tests and embedders may call them directly.

use crate::context::TransactionContext;
use crate::domain::entities::{HistoryRecord, PaperDetails, QueryRecord, VdxPaper};
use crate::errors::ContractError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// =============================================================================
// REQUESTS
// =============================================================================

/// Identifies one paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperRef {
    /// Issuer.
    pub issuer: String,
    /// Paper number.
    pub paper_number: String,
}

impl PaperRef {
    /// Build a reference.
    pub fn new(issuer: impl Into<String>, paper_number: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            paper_number: paper_number.into(),
        }
    }
}

/// Operator hand-over carried by every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handover {
    /// Operator the caller claims currently holds the paper.
    pub current_operator: String,
    /// Operator the paper passes to.
    pub new_operator: String,
}

impl Handover {
    /// Build a hand-over.
    pub fn new(current_operator: impl Into<String>, new_operator: impl Into<String>) -> Self {
        Self {
            current_operator: current_operator.into(),
            new_operator: new_operator.into(),
        }
    }
}

/// `create` arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaper {
    /// Paper identity.
    pub paper: PaperRef,
    /// Creation timestamp.
    pub create_date_time: String,
    /// Descriptive fields.
    pub details: PaperDetails,
    /// Hash of the source document. Not stored.
    pub doc_hash: Option<String>,
}

/// `issue` arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePaper {
    /// Paper identity.
    pub paper: PaperRef,
    /// Operator hand-over.
    pub handover: Handover,
    /// Issue timestamp.
    pub issue_date_time: String,
}

/// `check` arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPaper {
    /// Paper identity.
    pub paper: PaperRef,
    /// Operator hand-over.
    pub handover: Handover,
    /// Check timestamp. Not stored.
    pub check_date_time: Option<String>,
    /// Reviewer comment. Not stored.
    pub comment: Option<String>,
}

/// `treat` arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatPaper {
    /// Paper identity.
    pub paper: PaperRef,
    /// Operator hand-over.
    pub handover: Handover,
    /// Treatment timestamp. Not stored.
    pub treat_date_time: String,
    /// Hash of the treatment document. Not stored.
    pub doc_hash: String,
    /// Assessed value.
    pub vat: f64,
}

/// `pay` arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayPaper {
    /// Paper identity.
    pub paper: PaperRef,
    /// Operator hand-over.
    pub handover: Handover,
    /// Payment timestamp. Not stored.
    pub pay_date_time: Option<String>,
    /// Receipt hash. Not stored.
    pub doc_hash: Option<String>,
    /// Payment reference. Not stored.
    pub reference: Option<String>,
}

/// `receive` arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivePaper {
    /// Paper identity.
    pub paper: PaperRef,
    /// Operator hand-over.
    pub handover: Handover,
    /// Reception timestamp. Not stored.
    pub receive_date_time: Option<String>,
    /// Comment. Not stored.
    pub comment: Option<String>,
}

/// `deliver` arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverPaper {
    /// Paper identity.
    pub paper: PaperRef,
    /// Operator hand-over.
    pub handover: Handover,
    /// Delivery timestamp.
    pub deliver_date_time: String,
    /// Registry file number.
    pub file_number: String,
    /// Immatriculation document hash.
    pub doc_imma: String,
}

// =============================================================================
// CONTRACT API
// =============================================================================

/// Exported contract operations.
///
/// Workflow operations return the updated paper; queries never write.
#[async_trait]
pub trait PaperContractApi: Send + Sync {
    /// Setup hook run when the contract is instantiated.
    async fn instantiate(&self, ctx: &TransactionContext<'_>) -> Result<(), ContractError>;

    /// Record a new paper in CREATED state.
    async fn create(
        &self,
        ctx: &TransactionContext<'_>,
        request: CreatePaper,
    ) -> Result<VdxPaper, ContractError>;

    /// CREATED → ISSUED.
    async fn issue(
        &self,
        ctx: &TransactionContext<'_>,
        request: IssuePaper,
    ) -> Result<VdxPaper, ContractError>;

    /// ISSUED → CHECKED.
    async fn check(
        &self,
        ctx: &TransactionContext<'_>,
        request: CheckPaper,
    ) -> Result<VdxPaper, ContractError>;

    /// CHECKED → TREATED.
    async fn treat(
        &self,
        ctx: &TransactionContext<'_>,
        request: TreatPaper,
    ) -> Result<VdxPaper, ContractError>;

    /// TREATED → PAID. Only the issuer organization may pay.
    async fn pay(
        &self,
        ctx: &TransactionContext<'_>,
        request: PayPaper,
    ) -> Result<VdxPaper, ContractError>;

    /// PAID → RECEIVED.
    async fn receive(
        &self,
        ctx: &TransactionContext<'_>,
        request: ReceivePaper,
    ) -> Result<VdxPaper, ContractError>;

    /// RECEIVED → DELIVERED.
    async fn deliver(
        &self,
        ctx: &TransactionContext<'_>,
        request: DeliverPaper,
    ) -> Result<VdxPaper, ContractError>;

    /// Committed history of a paper, most recent first.
    async fn query_history(
        &self,
        ctx: &TransactionContext<'_>,
        paper: PaperRef,
    ) -> Result<Vec<HistoryRecord>, ContractError>;

    /// Papers held by an operator.
    async fn query_operator(
        &self,
        ctx: &TransactionContext<'_>,
        operator: &str,
    ) -> Result<Vec<QueryRecord>, ContractError>;

    /// Papers of one issuer.
    async fn query_partial(
        &self,
        ctx: &TransactionContext<'_>,
        prefix: &str,
    ) -> Result<Vec<QueryRecord>, ContractError>;

    /// Papers matching a rich query.
    async fn query_adhoc(
        &self,
        ctx: &TransactionContext<'_>,
        query: &serde_json::Value,
    ) -> Result<Vec<QueryRecord>, ContractError>;

    /// Papers matching a named query.
    async fn query_named(
        &self,
        ctx: &TransactionContext<'_>,
        name: &str,
    ) -> Result<Vec<QueryRecord>, ContractError>;
}
