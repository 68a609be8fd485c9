//! # VDX Paper Contract
//!
//! Workflow engine over the paper store. Every transition runs the same
//! template:
//!
//! 1. load the paper (`NotFound` if absent)
//! 2. apply the transition's gate (operator, or issuer organization for `pay`)
//! 3. advance one step if in the precondition state, then require the result state
//! 4. hand the paper to the new operator and write the step's fields
//! 5. persist with an unconditional update
//!
//! No write happens before steps 1 to 3 succeed.

use crate::context::TransactionContext;
use crate::domain::entities::{HistoryRecord, QueryRecord, VdxPaper};
use crate::domain::invariants::check_all_invariants;
use crate::domain::services::{advance, authorize, ensure_not_delivered, reassign, Transition};
use crate::domain::value_objects::PaperState;
use crate::errors::{ConfigError, ContractError};
use crate::ports::inbound::{
    CheckPaper, CreatePaper, DeliverPaper, Handover, IssuePaper, PaperContractApi, PaperRef,
    PayPaper, ReceivePaper, TreatPaper,
};
use async_trait::async_trait;
use tracing::{debug, info, instrument};

/// Contract configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractConfig {
    /// `vat` above which a paper matches the `value` named query.
    pub value_threshold: f64,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            value_threshold: 1000.0,
        }
    }
}

impl ContractConfig {
    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// `InvalidValue` for a non-finite threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.value_threshold.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "value_threshold",
                reason: "must be a finite number".to_string(),
            });
        }
        Ok(())
    }
}

/// The paper lifecycle contract.
#[derive(Debug, Clone, Default)]
pub struct VdxPaperContract {
    config: ContractConfig,
}

impl VdxPaperContract {
    /// Build a contract.
    #[must_use]
    pub fn new(config: ContractConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    async fn run_transition<F>(
        &self,
        ctx: &TransactionContext<'_>,
        target: &PaperRef,
        handover: &Handover,
        transition: Transition,
        apply: F,
    ) -> Result<VdxPaper, ContractError>
    where
        F: FnOnce(&mut VdxPaper) + Send,
    {
        let list = ctx.paper_list();
        let mut paper = list.get_paper(&target.issuer, &target.paper_number).await?;

        authorize(&paper, transition, &handover.current_operator, ctx.client())?;
        if transition == Transition::Deliver {
            ensure_not_delivered(&paper)?;
        }

        let before = paper.clone();
        advance(&mut paper, transition)?;
        reassign(&mut paper, &handover.new_operator, ctx.client());
        apply(&mut paper);
        debug_assert!(check_all_invariants(&before, &paper).is_ok());

        list.update_paper(&paper).await?;
        info!(
            transition = transition.name(),
            state = paper.current_state_name(),
            operator = paper.operator(),
            "paper transitioned"
        );
        Ok(paper)
    }
}

#[async_trait]
impl PaperContractApi for VdxPaperContract {
    #[instrument(skip(self, ctx), fields(tx_id = %ctx.tx_id()))]
    async fn instantiate(&self, ctx: &TransactionContext<'_>) -> Result<(), ContractError> {
        info!(contract = crate::CONTRACT_NAME, "instantiated");
        Ok(())
    }

    #[instrument(
        skip(self, ctx, request),
        fields(tx_id = %ctx.tx_id(), issuer = %request.paper.issuer, paper_number = %request.paper.paper_number)
    )]
    async fn create(
        &self,
        ctx: &TransactionContext<'_>,
        request: CreatePaper,
    ) -> Result<VdxPaper, ContractError> {
        let CreatePaper {
            paper: target,
            create_date_time,
            details,
            doc_hash: _,
        } = request;
        let msp_id = ctx.client().msp_id.clone();

        let mut paper = VdxPaper::create_instance(
            target.issuer.as_str(),
            target.paper_number.as_str(),
            create_date_time,
            details,
        );
        paper.set_state(PaperState::Created);
        paper.set_issuer_org(msp_id.as_str());
        paper.set_operator(target.issuer.as_str());
        paper.set_operator_org(msp_id);

        ctx.paper_list().add_paper(&paper).await?;
        info!(issuer_org = paper.issuer_org(), "paper created");
        Ok(paper)
    }

    #[instrument(
        skip(self, ctx, request),
        fields(tx_id = %ctx.tx_id(), issuer = %request.paper.issuer, paper_number = %request.paper.paper_number)
    )]
    async fn issue(
        &self,
        ctx: &TransactionContext<'_>,
        request: IssuePaper,
    ) -> Result<VdxPaper, ContractError> {
        let IssuePaper {
            paper,
            handover,
            issue_date_time,
        } = request;
        self.run_transition(ctx, &paper, &handover, Transition::Issue, move |p| {
            p.issue_date_time = Some(issue_date_time);
        })
        .await
    }

    #[instrument(
        skip(self, ctx, request),
        fields(tx_id = %ctx.tx_id(), issuer = %request.paper.issuer, paper_number = %request.paper.paper_number)
    )]
    async fn check(
        &self,
        ctx: &TransactionContext<'_>,
        request: CheckPaper,
    ) -> Result<VdxPaper, ContractError> {
        if let Some(comment) = &request.comment {
            debug!(comment = %comment, "check comment");
        }
        self.run_transition(ctx, &request.paper, &request.handover, Transition::Check, |_| {})
            .await
    }

    #[instrument(
        skip(self, ctx, request),
        fields(tx_id = %ctx.tx_id(), issuer = %request.paper.issuer, paper_number = %request.paper.paper_number)
    )]
    async fn treat(
        &self,
        ctx: &TransactionContext<'_>,
        request: TreatPaper,
    ) -> Result<VdxPaper, ContractError> {
        let vat = request.vat;
        self.run_transition(ctx, &request.paper, &request.handover, Transition::Treat, move |p| {
            p.vat = Some(vat);
        })
        .await
    }

    #[instrument(
        skip(self, ctx, request),
        fields(tx_id = %ctx.tx_id(), issuer = %request.paper.issuer, paper_number = %request.paper.paper_number)
    )]
    async fn pay(
        &self,
        ctx: &TransactionContext<'_>,
        request: PayPaper,
    ) -> Result<VdxPaper, ContractError> {
        if let Some(reference) = &request.reference {
            debug!(reference = %reference, "payment reference");
        }
        self.run_transition(ctx, &request.paper, &request.handover, Transition::Pay, |_| {})
            .await
    }

    #[instrument(
        skip(self, ctx, request),
        fields(tx_id = %ctx.tx_id(), issuer = %request.paper.issuer, paper_number = %request.paper.paper_number)
    )]
    async fn receive(
        &self,
        ctx: &TransactionContext<'_>,
        request: ReceivePaper,
    ) -> Result<VdxPaper, ContractError> {
        self.run_transition(
            ctx,
            &request.paper,
            &request.handover,
            Transition::Receive,
            |_| {},
        )
        .await
    }

    #[instrument(
        skip(self, ctx, request),
        fields(tx_id = %ctx.tx_id(), issuer = %request.paper.issuer, paper_number = %request.paper.paper_number)
    )]
    async fn deliver(
        &self,
        ctx: &TransactionContext<'_>,
        request: DeliverPaper,
    ) -> Result<VdxPaper, ContractError> {
        let DeliverPaper {
            paper,
            handover,
            deliver_date_time,
            file_number,
            doc_imma,
        } = request;
        self.run_transition(ctx, &paper, &handover, Transition::Deliver, move |p| {
            p.file_number = Some(file_number);
            p.deliver_date_time = Some(deliver_date_time);
            p.doc_imma = Some(doc_imma);
        })
        .await
    }

    #[instrument(skip(self, ctx), fields(tx_id = %ctx.tx_id()))]
    async fn query_history(
        &self,
        ctx: &TransactionContext<'_>,
        paper: PaperRef,
    ) -> Result<Vec<HistoryRecord>, ContractError> {
        let records = ctx
            .queries()
            .history(&paper.issuer, &paper.paper_number)
            .await?;
        Ok(records.collect())
    }

    #[instrument(skip(self, ctx), fields(tx_id = %ctx.tx_id()))]
    async fn query_operator(
        &self,
        ctx: &TransactionContext<'_>,
        operator: &str,
    ) -> Result<Vec<QueryRecord>, ContractError> {
        ctx.queries().by_operator(operator).await
    }

    #[instrument(skip(self, ctx), fields(tx_id = %ctx.tx_id()))]
    async fn query_partial(
        &self,
        ctx: &TransactionContext<'_>,
        prefix: &str,
    ) -> Result<Vec<QueryRecord>, ContractError> {
        ctx.queries().by_prefix(prefix).await
    }

    #[instrument(skip(self, ctx, query), fields(tx_id = %ctx.tx_id()))]
    async fn query_adhoc(
        &self,
        ctx: &TransactionContext<'_>,
        query: &serde_json::Value,
    ) -> Result<Vec<QueryRecord>, ContractError> {
        debug!(query = %query, "rich query");
        ctx.queries().by_predicate(query).await
    }

    #[instrument(skip(self, ctx), fields(tx_id = %ctx.tx_id()))]
    async fn query_named(
        &self,
        ctx: &TransactionContext<'_>,
        name: &str,
    ) -> Result<Vec<QueryRecord>, ContractError> {
        ctx.queries()
            .by_named_query(name, self.config.value_threshold)
            .await
    }
}

// =============================================================================
// TESTS
// =============================================================================
