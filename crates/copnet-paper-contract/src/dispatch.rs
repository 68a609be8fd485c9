//! # Function Dispatch
//!
//! Entry point used by the ledger platform: a function name plus positional
//! string arguments in, JSON payload bytes out.
//!
//! | Function | Arguments |
//! |----------|-----------|
//! | `instantiate` | - |
//! | `create` | issuer, paperNumber, createDateTime, nid, nvh, fullname, nas, lines, [docHash] |
//! | `issue` | issuer, paperNumber, issueDateTime, currentOperator, newOperator |
//! | `check` | issuer, paperNumber, currentOperator, newOperator, [checkDateTime, comment] |
//! | `treat` | issuer, paperNumber, currentOperator, newOperator, treatDateTime, docHash, vat |
//! | `pay` | issuer, paperNumber, currentOperator, newOperator, [payDateTime, docHash, reference] |
//! | `receive` | issuer, paperNumber, currentOperator, newOperator, [receiveDateTime, comment] |
//! | `deliver` | issuer, paperNumber, currentOperator, newOperator, deliverDateTime, fileNumber, docImma |
//! | `queryHistory` | issuer, paperNumber |
//! | `queryOperator` | operator |
//! | `queryPartial` | issuer prefix |
//! | `queryAdhoc` | JSON query string |
//! | `queryNamed` | query name |

use crate::context::TransactionContext;
use crate::domain::entities::PaperDetails;
use crate::errors::ContractError;
use crate::ports::inbound::{
    CheckPaper, CreatePaper, DeliverPaper, Handover, IssuePaper, PaperContractApi, PaperRef,
    PayPaper, ReceivePaper, TreatPaper,
};
use serde::Serialize;
use std::str::FromStr;
use tracing::debug;

/// Functions exported by the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractFunction {
    /// Setup hook.
    Instantiate,
    /// Record a paper.
    Create,
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
    /// Key history.
    QueryHistory,
    /// Papers held by an operator.
    QueryOperator,
    /// Papers of an issuer.
    QueryPartial,
    /// Rich query.
    QueryAdhoc,
    /// Named query.
    QueryNamed,
}

impl ContractFunction {
    /// Every exported function.
    pub const ALL: [ContractFunction; 13] = [
        Self::Instantiate,
        Self::Create,
        Self::Issue,
        Self::Check,
        Self::Treat,
        Self::Pay,
        Self::Receive,
        Self::Deliver,
        Self::QueryHistory,
        Self::QueryOperator,
        Self::QueryPartial,
        Self::QueryAdhoc,
        Self::QueryNamed,
    ];

    /// Exported name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Instantiate => "instantiate",
            Self::Create => "create",
            Self::Issue => "issue",
            Self::Check => "check",
            Self::Treat => "treat",
            Self::Pay => "pay",
            Self::Receive => "receive",
            Self::Deliver => "deliver",
            Self::QueryHistory => "queryHistory",
            Self::QueryOperator => "queryOperator",
            Self::QueryPartial => "queryPartial",
            Self::QueryAdhoc => "queryAdhoc",
            Self::QueryNamed => "queryNamed",
        }
    }

    /// Minimum and maximum positional argument count.
    #[must_use]
    pub const fn arity(self) -> (usize, usize) {
        match self {
            Self::Instantiate => (0, 0),
            Self::Create => (8, 9),
            Self::Issue => (5, 5),
            Self::Check | Self::Receive => (4, 6),
            Self::Treat | Self::Deliver => (7, 7),
            Self::Pay => (4, 7),
            Self::QueryHistory => (2, 2),
            Self::QueryOperator | Self::QueryPartial | Self::QueryAdhoc | Self::QueryNamed => {
                (1, 1)
            }
        }
    }

    /// Returns true if the function never writes.
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(
            self,
            Self::QueryHistory
                | Self::QueryOperator
                | Self::QueryPartial
                | Self::QueryAdhoc
                | Self::QueryNamed
        )
    }
}

impl FromStr for ContractFunction {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| ContractError::UnknownFunction(s.to_string()))
    }
}

impl std::fmt::Display for ContractFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Arity-checked positional arguments.
struct Args<'a> {
    function: ContractFunction,
    values: &'a [String],
}

impl<'a> Args<'a> {
    fn new(function: ContractFunction, values: &'a [String]) -> Result<Self, ContractError> {
        let (min, max) = function.arity();
        if values.len() < min || values.len() > max {
            let expected = if min == max {
                format!("{min}")
            } else {
                format!("{min} to {max}")
            };
            return Err(ContractError::invalid_args(
                function.name(),
                format!("expected {expected} arguments, got {}", values.len()),
            ));
        }
        Ok(Self { function, values })
    }

    /// Argument `idx`; callers only ask for indices below the minimum arity.
    fn at(&self, idx: usize) -> String {
        self.values.get(idx).cloned().unwrap_or_default()
    }

    fn optional(&self, idx: usize) -> Option<String> {
        self.values.get(idx).cloned()
    }

    fn float(&self, idx: usize, name: &str) -> Result<f64, ContractError> {
        let raw = self.at(idx);
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                ContractError::invalid_args(
                    self.function.name(),
                    format!("{name} must be a finite number, got {raw:?}"),
                )
            })
    }

    fn json(&self, idx: usize, name: &str) -> Result<serde_json::Value, ContractError> {
        serde_json::from_str(&self.at(idx)).map_err(|err| {
            ContractError::invalid_args(self.function.name(), format!("{name}: {err}"))
        })
    }

    fn paper(&self) -> PaperRef {
        PaperRef::new(self.at(0), self.at(1))
    }

    /// Hand-over at positions `idx` and `idx + 1`.
    fn handover(&self, idx: usize) -> Handover {
        Handover::new(self.at(idx), self.at(idx + 1))
    }
}

/// Invoke a contract function by name.
///
/// # Errors
///
/// `UnknownFunction`, `InvalidArguments`, or whatever the operation returns.
pub async fn invoke<C>(
    contract: &C,
    ctx: &TransactionContext<'_>,
    function: &str,
    args: &[String],
) -> Result<Vec<u8>, ContractError>
where
    C: PaperContractApi + ?Sized,
{
    let function: ContractFunction = function.parse()?;
    let args = Args::new(function, args)?;
    debug!(function = %function, argc = args.values.len(), tx_id = %ctx.tx_id(), "invoke");

    match function {
        ContractFunction::Instantiate => {
            contract.instantiate(ctx).await?;
            Ok(Vec::new())
        }
        ContractFunction::Create => {
            let request = CreatePaper {
                paper: args.paper(),
                create_date_time: args.at(2),
                details: PaperDetails {
                    nid: args.at(3),
                    nvh: args.at(4),
                    fullname: args.at(5),
                    nas: args.at(6),
                    lines: args.at(7),
                },
                doc_hash: args.optional(8),
            };
            encode(&contract.create(ctx, request).await?)
        }
        ContractFunction::Issue => {
            let request = IssuePaper {
                paper: args.paper(),
                issue_date_time: args.at(2),
                handover: args.handover(3),
            };
            encode(&contract.issue(ctx, request).await?)
        }
        ContractFunction::Check => {
            let request = CheckPaper {
                paper: args.paper(),
                handover: args.handover(2),
                check_date_time: args.optional(4),
                comment: args.optional(5),
            };
            encode(&contract.check(ctx, request).await?)
        }
        ContractFunction::Treat => {
            let request = TreatPaper {
                paper: args.paper(),
                handover: args.handover(2),
                treat_date_time: args.at(4),
                doc_hash: args.at(5),
                vat: args.float(6, "vat")?,
            };
            encode(&contract.treat(ctx, request).await?)
        }
        ContractFunction::Pay => {
            let request = PayPaper {
                paper: args.paper(),
                handover: args.handover(2),
                pay_date_time: args.optional(4),
                doc_hash: args.optional(5),
                reference: args.optional(6),
            };
            encode(&contract.pay(ctx, request).await?)
        }
        ContractFunction::Receive => {
            let request = ReceivePaper {
                paper: args.paper(),
                handover: args.handover(2),
                receive_date_time: args.optional(4),
                comment: args.optional(5),
            };
            encode(&contract.receive(ctx, request).await?)
        }
        ContractFunction::Deliver => {
            let request = DeliverPaper {
                paper: args.paper(),
                handover: args.handover(2),
                deliver_date_time: args.at(4),
                file_number: args.at(5),
                doc_imma: args.at(6),
            };
            encode(&contract.deliver(ctx, request).await?)
        }
        ContractFunction::QueryHistory => {
            encode(&contract.query_history(ctx, args.paper()).await?)
        }
        ContractFunction::QueryOperator => {
            encode(&contract.query_operator(ctx, &args.at(0)).await?)
        }
        ContractFunction::QueryPartial => encode(&contract.query_partial(ctx, &args.at(0)).await?),
        ContractFunction::QueryAdhoc => {
            let query = args.json(0, "query")?;
            encode(&contract.query_adhoc(ctx, &query).await?)
        }
        ContractFunction::QueryNamed => encode(&contract.query_named(ctx, &args.at(0)).await?),
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, ContractError> {
    Ok(serde_json::to_vec(value)?)
}

// =============================================================================
// TESTS
// =============================================================================
