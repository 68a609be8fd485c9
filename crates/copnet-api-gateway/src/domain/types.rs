//! Request and response bodies of the REST routes.
//!
//! Each request knows how to lay itself out as the positional arguments of
//! its contract function. Fields a request leaves out fall back to
//! [`RequestDefaults`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fallbacks for omitted request fields, taken from the gateway config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDefaults {
    /// Issuer when `issuer` is missing
    pub issuer: String,
    /// Operator when `currentOperator`, `newOperator` or `operator` is missing
    pub operator: String,
}

impl RequestDefaults {
    fn issuer(&self, value: Option<String>) -> String {
        value.unwrap_or_else(|| self.issuer.clone())
    }

    fn operator(&self, value: Option<String>) -> String {
        value.unwrap_or_else(|| self.operator.clone())
    }
}

/// Contract call built from a request body.
pub trait ContractCall {
    /// Contract function name.
    const FUNCTION: &'static str;

    /// Positional arguments after the transaction context.
    fn into_args(self, defaults: &RequestDefaults) -> Vec<String>;
}

/// A JSON value the contract expects as a string argument.
///
/// Strings pass through unchanged; anything else is sent as its JSON text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TextOrJson {
    /// Already a string
    Text(String),
    /// Any other JSON value
    Json(Value),
}

impl TextOrJson {
    fn into_arg(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Json(value) => value.to_string(),
        }
    }
}

impl Default for TextOrJson {
    fn default() -> Self {
        Self::Json(Value::Array(Vec::new()))
    }
}

/// Trailing optional arguments. Positions before the last present value are
/// padded with empty strings; nothing is sent after it.
fn push_trailing(args: &mut Vec<String>, optional: Vec<Option<String>>) {
    let Some(last) = optional.iter().rposition(Option::is_some) else {
        return;
    };
    args.extend(
        optional
            .into_iter()
            .take(last + 1)
            .map(Option::unwrap_or_default),
    );
}

// =============================================================================
// SUBMIT REQUESTS
// =============================================================================

/// Body of `POST /api/create`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// Issuer; defaults to the configured issuer
    #[serde(default)]
    pub issuer: Option<String>,
    /// Paper number
    pub paper_number: String,
    /// Creation timestamp
    #[serde(default)]
    pub create_date_time: String,
    /// Identification number
    #[serde(default)]
    pub nid: String,
    /// Vehicle number
    #[serde(default)]
    pub nvh: String,
    /// Holder's full name
    #[serde(default)]
    pub fullname: String,
    /// Insurance reference
    #[serde(default)]
    pub nas: String,
    /// Line items, as a JSON string or any JSON value
    #[serde(default)]
    pub lines: TextOrJson,
    /// Document hash
    #[serde(default)]
    pub doc_hash: Option<String>,
}

impl ContractCall for CreateRequest {
    const FUNCTION: &'static str = "create";

    fn into_args(self, defaults: &RequestDefaults) -> Vec<String> {
        let mut args = vec![
            defaults.issuer(self.issuer),
            self.paper_number,
            self.create_date_time,
            self.nid,
            self.nvh,
            self.fullname,
            self.nas,
            self.lines.into_arg(),
        ];
        push_trailing(&mut args, vec![self.doc_hash]);
        args
    }
}

/// Fields shared by every transition request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoverFields {
    /// Issuer; defaults to the configured issuer
    #[serde(default)]
    pub issuer: Option<String>,
    /// Paper number
    pub paper_number: String,
    /// Operator the caller claims to be; defaults to the organization's
    #[serde(default)]
    pub current_operator: Option<String>,
    /// Operator the paper is handed to; defaults to the organization's
    #[serde(default)]
    pub new_operator: Option<String>,
}

impl HandoverFields {
    fn paper_args(&mut self, defaults: &RequestDefaults) -> Vec<String> {
        vec![
            defaults.issuer(self.issuer.take()),
            std::mem::take(&mut self.paper_number),
        ]
    }

    fn into_args(mut self, defaults: &RequestDefaults) -> Vec<String> {
        let mut args = self.paper_args(defaults);
        args.push(defaults.operator(self.current_operator));
        args.push(defaults.operator(self.new_operator));
        args
    }
}

/// Body of `POST /api/issue`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    /// Paper and hand-over
    #[serde(flatten)]
    pub handover: HandoverFields,
    /// Issue timestamp
    #[serde(default)]
    pub issue_date_time: String,
}

impl ContractCall for IssueRequest {
    const FUNCTION: &'static str = "issue";

    fn into_args(self, defaults: &RequestDefaults) -> Vec<String> {
        // issue takes its timestamp before the operators
        let mut handover = self.handover;
        let mut args = handover.paper_args(defaults);
        args.push(self.issue_date_time);
        args.push(defaults.operator(handover.current_operator));
        args.push(defaults.operator(handover.new_operator));
        args
    }
}

/// Body of `POST /api/check`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    /// Paper and hand-over
    #[serde(flatten)]
    pub handover: HandoverFields,
    /// Check timestamp
    #[serde(default)]
    pub check_date_time: Option<String>,
    /// Reviewer comment
    #[serde(default)]
    pub comment: Option<String>,
}

impl ContractCall for CheckRequest {
    const FUNCTION: &'static str = "check";

    fn into_args(self, defaults: &RequestDefaults) -> Vec<String> {
        let mut args = self.handover.into_args(defaults);
        push_trailing(&mut args, vec![self.check_date_time, self.comment]);
        args
    }
}

/// Body of `POST /api/treat`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatRequest {
    /// Paper and hand-over
    #[serde(flatten)]
    pub handover: HandoverFields,
    /// Treatment timestamp
    #[serde(default)]
    pub treat_date_time: String,
    /// Document hash
    #[serde(default)]
    pub doc_hash: String,
    /// Amount, as a JSON number or numeric string
    pub vat: TextOrJson,
}

impl ContractCall for TreatRequest {
    const FUNCTION: &'static str = "treat";

    fn into_args(self, defaults: &RequestDefaults) -> Vec<String> {
        let mut args = self.handover.into_args(defaults);
        args.extend([self.treat_date_time, self.doc_hash, self.vat.into_arg()]);
        args
    }
}

/// Body of `POST /api/pay`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    /// Paper and hand-over
    #[serde(flatten)]
    pub handover: HandoverFields,
    /// Payment timestamp
    #[serde(default)]
    pub pay_date_time: Option<String>,
    /// Receipt hash
    #[serde(default)]
    pub doc_hash: Option<String>,
    /// Payment reference
    #[serde(default)]
    pub reference: Option<String>,
}

impl ContractCall for PayRequest {
    const FUNCTION: &'static str = "pay";

    fn into_args(self, defaults: &RequestDefaults) -> Vec<String> {
        let mut args = self.handover.into_args(defaults);
        push_trailing(
            &mut args,
            vec![self.pay_date_time, self.doc_hash, self.reference],
        );
        args
    }
}

/// Body of `POST /api/receive`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveRequest {
    /// Paper and hand-over
    #[serde(flatten)]
    pub handover: HandoverFields,
    /// Reception timestamp
    #[serde(default)]
    pub receive_date_time: Option<String>,
    /// Reception comment
    #[serde(default)]
    pub comment: Option<String>,
}

impl ContractCall for ReceiveRequest {
    const FUNCTION: &'static str = "receive";

    fn into_args(self, defaults: &RequestDefaults) -> Vec<String> {
        let mut args = self.handover.into_args(defaults);
        push_trailing(&mut args, vec![self.receive_date_time, self.comment]);
        args
    }
}

/// Body of `POST /api/deliver`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverRequest {
    /// Paper and hand-over
    #[serde(flatten)]
    pub handover: HandoverFields,
    /// Delivery timestamp
    #[serde(default)]
    pub deliver_date_time: String,
    /// Archive file number
    #[serde(default)]
    pub file_number: String,
    /// Registration document hash
    #[serde(default)]
    pub doc_imma: String,
}

impl ContractCall for DeliverRequest {
    const FUNCTION: &'static str = "deliver";

    fn into_args(self, defaults: &RequestDefaults) -> Vec<String> {
        let mut args = self.handover.into_args(defaults);
        args.extend([self.deliver_date_time, self.file_number, self.doc_imma]);
        args
    }
}

// =============================================================================
// QUERY REQUESTS
// =============================================================================

/// Body of `POST /api/queryHistory`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRequest {
    /// Issuer; defaults to the configured issuer
    #[serde(default)]
    pub issuer: Option<String>,
    /// Paper number
    pub paper_number: String,
}

impl ContractCall for HistoryRequest {
    const FUNCTION: &'static str = "queryHistory";

    fn into_args(self, defaults: &RequestDefaults) -> Vec<String> {
        vec![defaults.issuer(self.issuer), self.paper_number]
    }
}

/// Body of `POST /api/queryOperator`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorRequest {
    /// Operator; defaults to the organization's
    #[serde(default)]
    pub operator: Option<String>,
}

impl ContractCall for OperatorRequest {
    const FUNCTION: &'static str = "queryOperator";

    fn into_args(self, defaults: &RequestDefaults) -> Vec<String> {
        vec![defaults.operator(self.operator)]
    }
}

/// Body of `POST /api/queryIssuer`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerRequest {
    /// Issuer; defaults to the configured issuer
    #[serde(default)]
    pub issuer: Option<String>,
}

impl ContractCall for IssuerRequest {
    const FUNCTION: &'static str = "queryPartial";

    fn into_args(self, defaults: &RequestDefaults) -> Vec<String> {
        vec![defaults.issuer(self.issuer)]
    }
}

/// Body of `POST /api/queryNamed`
#[derive(Debug, Clone, Deserialize)]
pub struct NamedRequest {
    /// Query name: a state label or `value`
    pub status: String,
}

impl ContractCall for NamedRequest {
    const FUNCTION: &'static str = "queryNamed";

    fn into_args(self, _defaults: &RequestDefaults) -> Vec<String> {
        vec![self.status]
    }
}

/// Body of `POST /api/queryAdhoc`
#[derive(Debug, Clone, Deserialize)]
pub struct AdhocRequest {
    /// Rich query, as an object or its JSON text
    pub query: TextOrJson,
}

impl AdhocRequest {
    /// Query listing every paper with an issuer.
    #[must_use]
    pub fn all_papers() -> Self {
        Self {
            query: TextOrJson::Json(serde_json::json!({
                "selector": { "issuer": { "$ne": "" } }
            })),
        }
    }
}

impl ContractCall for AdhocRequest {
    const FUNCTION: &'static str = "queryAdhoc";

    fn into_args(self, _defaults: &RequestDefaults) -> Vec<String> {
        vec![self.query.into_arg()]
    }
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Outcome of a submitted transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    /// Transaction id
    #[serde(rename = "TxID")]
    pub tx_id: String,
    /// Decoded contract payload
    pub result: Value,
}

/// `{"response": ...}` envelope used by every successful route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Route result
    pub response: T,
}

impl<T> ApiResponse<T> {
    /// Wrap a result.
    pub fn new(response: T) -> Self {
        Self { response }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defaults() -> RequestDefaults {
        RequestDefaults {
            issuer: "PC".into(),
            operator: "SAAQ".into(),
        }
    }

    fn parse<T: serde::de::DeserializeOwned>(value: Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_create_args_with_defaults() {
        let request: CreateRequest = parse(json!({
            "paperNumber": "0001",
            "createDateTime": "2022-11-21",
            "fullname": "Jane Roe",
            "lines": [{"item": "fee", "amount": 12}]
        }));
        let args = request.into_args(&defaults());
        assert_eq!(args.len(), 8);
        assert_eq!(args[0], "PC");
        assert_eq!(args[1], "0001");
        assert_eq!(args[5], "Jane Roe");
        let lines: Value = serde_json::from_str(&args[7]).unwrap();
        assert_eq!(lines[0]["amount"], 12);
    }

    #[test]
    fn test_create_passes_doc_hash() {
        let request: CreateRequest = parse(json!({
            "issuer": "PCX",
            "paperNumber": "0002",
            "lines": "[]",
            "docHash": "abc"
        }));
        let args = request.into_args(&defaults());
        assert_eq!(args[0], "PCX");
        assert_eq!(args[7], "[]");
        assert_eq!(args[8], "abc");
    }

    #[test]
    fn test_paper_number_required() {
        let err = serde_json::from_value::<IssueRequest>(json!({"issueDateTime": "t"}));
        assert!(err.is_err());
    }

    #[test]
    fn test_issue_argument_order() {
        let request: IssueRequest = parse(json!({
            "paperNumber": "0001",
            "issueDateTime": "2022-11-21",
            "newOperator": "RQ"
        }));
        assert_eq!(
            request.into_args(&defaults()),
            vec!["PC", "0001", "2022-11-21", "SAAQ", "RQ"]
        );
    }

    #[test]
    fn test_optional_trailing_arguments() {
        let request: PayRequest = parse(json!({"paperNumber": "0001"}));
        assert_eq!(request.into_args(&defaults()).len(), 4);

        let request: PayRequest = parse(json!({"paperNumber": "0001", "reference": "REF-1"}));
        assert_eq!(
            request.into_args(&defaults()),
            vec!["PC", "0001", "SAAQ", "SAAQ", "", "", "REF-1"]
        );

        let request: ReceiveRequest = parse(json!({
            "paperNumber": "0001",
            "receiveDateTime": "2022-11-21",
            "comment": "Document received"
        }));
        assert_eq!(request.into_args(&defaults())[5], "Document received");
    }

    #[test]
    fn test_treat_accepts_number_or_string_vat() {
        let request: TreatRequest = parse(json!({"paperNumber": "1", "vat": 1500.5}));
        assert_eq!(request.into_args(&defaults())[6], "1500.5");

        let request: TreatRequest = parse(json!({"paperNumber": "1", "vat": "1500"}));
        assert_eq!(request.into_args(&defaults())[6], "1500");
    }

    #[test]
    fn test_deliver_argument_order() {
        let request: DeliverRequest = parse(json!({
            "paperNumber": "00001",
            "currentOperator": "SAAQ",
            "newOperator": "PC",
            "deliverDateTime": "2022-11-21",
            "fileNumber": "088383838",
            "docImma": "Document delivered"
        }));
        assert_eq!(
            request.into_args(&defaults()),
            vec![
                "PC",
                "00001",
                "SAAQ",
                "PC",
                "2022-11-21",
                "088383838",
                "Document delivered"
            ]
        );
    }

    #[test]
    fn test_query_requests() {
        let named: NamedRequest = parse(json!({"status": "treated"}));
        assert_eq!(named.into_args(&defaults()), vec!["treated"]);

        let operator: OperatorRequest = parse(json!({}));
        assert_eq!(operator.into_args(&defaults()), vec!["SAAQ"]);

        let all = AdhocRequest::all_papers().into_args(&defaults());
        let query: Value = serde_json::from_str(&all[0]).unwrap();
        assert_eq!(query["selector"]["issuer"]["$ne"], "");
    }

    #[test]
    fn test_submit_outcome_wire_names() {
        let body = ApiResponse::new(SubmitOutcome {
            tx_id: "abc".into(),
            result: json!({"currentState": 1}),
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["response"]["TxID"], "abc");
        assert_eq!(json["response"]["result"]["currentState"], 1);
    }
}
