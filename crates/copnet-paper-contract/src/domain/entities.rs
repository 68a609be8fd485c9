//! # Domain Entities
//!
//! The VDX paper and the records returned by ledger queries.
//!
//! Entities are plain data tagged with a `class` discriminator. Ledger-side
//! encoding goes through [`LedgerState`], which every stored type implements.

use crate::domain::value_objects::{PaperState, UNDEFINED_STATE_NAME};
use crate::errors::ContractError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Class discriminator stored with every paper.
pub const PAPER_CLASS: &str = "org.copnet.vdxpaper";

// =============================================================================
// LEDGER STATE
// =============================================================================

/// A type that can live in the world state under a composite key.
pub trait LedgerState: Serialize + DeserializeOwned {
    /// Class discriminator written into, and checked on, every stored value.
    const CLASS: &'static str;

    /// Ordered attributes the composite key is built from.
    fn key_parts(&self) -> Vec<&str>;

    /// Encode as JSON bytes.
    ///
    /// # Errors
    ///
    /// `Serialization` if encoding fails.
    fn to_bytes(&self) -> Result<Vec<u8>, ContractError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode JSON bytes, rejecting a foreign class discriminator.
    ///
    /// # Errors
    ///
    /// `Serialization` on malformed JSON, `UnknownClass` on a foreign class.
    fn from_bytes(bytes: &[u8]) -> Result<Self, ContractError> {
        let json: serde_json::Value = serde_json::from_slice(bytes)?;
        match json.get("class").and_then(serde_json::Value::as_str) {
            Some(class) if class == Self::CLASS => Ok(serde_json::from_value(json)?),
            other => Err(ContractError::UnknownClass {
                expected: Self::CLASS,
                found: other.unwrap_or_default().to_string(),
            }),
        }
    }
}

/// Join key parts the way the `key` field of a stored entity is written.
#[must_use]
pub fn make_key(parts: &[&str]) -> String {
    parts.join(":")
}

// =============================================================================
// VDX PAPER
// =============================================================================

/// Descriptive fields supplied when a paper is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperDetails {
    /// Issuer identification number.
    pub nid: String,
    /// Vehicle number.
    pub nvh: String,
    /// Holder's full name.
    pub fullname: String,
    /// Insurance reference.
    pub nas: String,
    /// Free-form line items.
    pub lines: String,
}

/// The paper document tracked on the ledger.
///
/// Identity fields and the workflow gates (state, organizations, operator) are
/// only reachable through accessors. Timestamps are opaque strings supplied by
/// the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VdxPaper {
    class: String,
    key: String,
    issuer: String,
    paper_number: String,
    /// Creation timestamp.
    pub create_date_time: String,
    /// Issuer identification number.
    pub nid: String,
    /// Vehicle number.
    pub nvh: String,
    /// Holder's full name.
    pub fullname: String,
    /// Insurance reference.
    pub nas: String,
    /// Free-form line items.
    pub lines: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current_state: Option<PaperState>,
    #[serde(default)]
    mspid: String,
    #[serde(default)]
    operator: String,
    #[serde(default)]
    op_mspid: String,
    /// Set by `issue`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date_time: Option<String>,
    /// Monetary value, set by `treat`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat: Option<f64>,
    /// Registry file number, set by `deliver`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_number: Option<String>,
    /// Set by `deliver`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deliver_date_time: Option<String>,
    /// Immatriculation document hash, set by `deliver`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_imma: Option<String>,
}

impl VdxPaper {
    /// Build a paper with no state yet. The creating operation sets CREATED.
    pub fn create_instance(
        issuer: impl Into<String>,
        paper_number: impl Into<String>,
        create_date_time: impl Into<String>,
        details: PaperDetails,
    ) -> Self {
        let issuer = issuer.into();
        let paper_number = paper_number.into();
        Self {
            class: PAPER_CLASS.to_string(),
            key: make_key(&[issuer.as_str(), paper_number.as_str()]),
            issuer,
            paper_number,
            create_date_time: create_date_time.into(),
            nid: details.nid,
            nvh: details.nvh,
            fullname: details.fullname,
            nas: details.nas,
            lines: details.lines,
            current_state: None,
            mspid: String::new(),
            operator: String::new(),
            op_mspid: String::new(),
            issue_date_time: None,
            vat: None,
            file_number: None,
            deliver_date_time: None,
            doc_imma: None,
        }
    }

    /// `issuer:paperNumber`.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Class discriminator.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Issuing party.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Paper number, unique per issuer.
    #[must_use]
    pub fn paper_number(&self) -> &str {
        &self.paper_number
    }

    /// Organization that created the paper.
    #[must_use]
    pub fn issuer_org(&self) -> &str {
        &self.mspid
    }

    /// Set the issuing organization.
    pub fn set_issuer_org(&mut self, msp_id: impl Into<String>) {
        self.mspid = msp_id.into();
    }

    /// Party currently responsible for the paper.
    #[must_use]
    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// Reassign the responsible party.
    pub fn set_operator(&mut self, operator: impl Into<String>) {
        self.operator = operator.into();
    }

    /// Organization of the current operator.
    #[must_use]
    pub fn operator_org(&self) -> &str {
        &self.op_mspid
    }

    /// Set the operator's organization.
    pub fn set_operator_org(&mut self, msp_id: impl Into<String>) {
        self.op_mspid = msp_id.into();
    }

    /// Current lifecycle state; `None` before creation completes.
    #[must_use]
    pub fn state(&self) -> Option<PaperState> {
        self.current_state
    }

    /// Overwrite the lifecycle state.
    pub fn set_state(&mut self, state: PaperState) {
        self.current_state = Some(state);
    }

    /// Returns true if the paper is in `state`.
    #[must_use]
    pub fn is(&self, state: PaperState) -> bool {
        self.current_state == Some(state)
    }

    /// Name of this paper's current state.
    #[must_use]
    pub fn current_state_name(&self) -> &'static str {
        self.current_state
            .map_or(UNDEFINED_STATE_NAME, PaperState::name)
    }

    /// JSON view with `currentState` rendered as its name.
    ///
    /// # Errors
    ///
    /// `Serialization` if encoding fails.
    pub fn to_report(&self) -> Result<serde_json::Value, ContractError> {
        let mut json = serde_json::to_value(self)?;
        if let Some(obj) = json.as_object_mut() {
            obj.insert(
                "currentState".to_string(),
                serde_json::Value::from(self.current_state_name()),
            );
        }
        Ok(json)
    }
}

impl LedgerState for VdxPaper {
    const CLASS: &'static str = PAPER_CLASS;

    fn key_parts(&self) -> Vec<&str> {
        vec![self.issuer.as_str(), self.paper_number.as_str()]
    }
}

// =============================================================================
// QUERY RECORDS
// =============================================================================

/// A paper matched by a query, with its key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryRecord {
    /// `issuer:paperNumber`.
    #[serde(rename = "Key")]
    pub key: String,
    /// Stored paper.
    #[serde(rename = "Record")]
    pub record: VdxPaper,
}

/// Value carried by one history entry.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryValue {
    /// Decoded paper.
    Paper(Box<VdxPaper>),
    /// Bytes that did not decode as a paper.
    Raw(String),
    /// Write with an empty value.
    Empty,
    /// The key was deleted by this transaction.
    Deleted,
}

/// One committed modification of a paper key.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    /// Transaction that wrote the value.
    pub tx_id: String,
    /// Commit time.
    pub timestamp: DateTime<Utc>,
    /// Written value.
    pub value: HistoryValue,
}

impl HistoryRecord {
    /// Returns true for a tombstone.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        matches!(self.value, HistoryValue::Deleted)
    }

    /// The paper written by this entry, if it decoded.
    #[must_use]
    pub fn paper(&self) -> Option<&VdxPaper> {
        match &self.value {
            HistoryValue::Paper(paper) => Some(&**paper),
            _ => None,
        }
    }
}

impl Serialize for HistoryRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("TxId", &self.tx_id)?;
        map.serialize_entry("Timestamp", &self.timestamp)?;
        match &self.value {
            HistoryValue::Deleted => map.serialize_entry("IsDelete", &true)?,
            HistoryValue::Empty => map.serialize_entry("Value", &serde_json::Value::Null)?,
            HistoryValue::Raw(text) => map.serialize_entry("Value", text)?,
            HistoryValue::Paper(paper) => {
                let report = paper
                    .to_report()
                    .map_err(<S::Error as serde::ser::Error>::custom)?;
                map.serialize_entry("Value", &report)?;
            }
        }
        map.end()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VdxPaper {
        let mut paper = VdxPaper::create_instance(
            "PC",
            "0001",
            "2020-05-01",
            PaperDetails {
                nid: "N1".into(),
                nvh: "V1".into(),
                fullname: "Jane Roe".into(),
                nas: "A1".into(),
                lines: "[]".into(),
            },
        );
        paper.set_state(PaperState::Created);
        paper.set_issuer_org("Org1MSP");
        paper.set_operator("PC");
        paper.set_operator_org("Org1MSP");
        paper
    }

    #[test]
    fn test_new_paper_has_no_state() {
        let paper = VdxPaper::create_instance("PC", "0001", "t", PaperDetails::default());
        assert_eq!(paper.state(), None);
        assert_eq!(paper.current_state_name(), "UNDEFINED");
        assert_eq!(paper.key(), "PC:0001");
        assert_eq!(paper.class(), PAPER_CLASS);
    }

    #[test]
    fn test_serialized_field_names() {
        let mut paper = sample();
        paper.vat = Some(1200.5);
        let json = serde_json::to_value(&paper).unwrap();
        assert_eq!(json["class"], "org.copnet.vdxpaper");
        assert_eq!(json["paperNumber"], "0001");
        assert_eq!(json["currentState"], 1);
        assert_eq!(json["opMspid"], "Org1MSP");
        assert_eq!(json["mspid"], "Org1MSP");
        assert_eq!(json["vat"], 1200.5);
        assert!(json.get("fileNumber").is_none());
    }

    #[test]
    fn test_bytes_round_trip() {
        let paper = sample();
        let bytes = paper.to_bytes().unwrap();
        assert_eq!(VdxPaper::from_bytes(&bytes).unwrap(), paper);
    }

    #[test]
    fn test_foreign_class_rejected() {
        let err = VdxPaper::from_bytes(br#"{"class":"org.other","issuer":"x"}"#).unwrap_err();
        assert!(matches!(err, ContractError::UnknownClass { .. }));
        let err = VdxPaper::from_bytes(b"not json").unwrap_err();
        assert!(matches!(err, ContractError::Serialization(_)));
    }

    #[test]
    fn test_report_uses_state_name() {
        let report = sample().to_report().unwrap();
        assert_eq!(report["currentState"], "CREATED");
    }

    #[test]
    fn test_history_record_serialization() {
        let ts = Utc::now();
        let deleted = HistoryRecord {
            tx_id: "tx1".into(),
            timestamp: ts,
            value: HistoryValue::Deleted,
        };
        let json = serde_json::to_value(&deleted).unwrap();
        assert_eq!(json["IsDelete"], true);
        assert!(json.get("Value").is_none());

        let written = HistoryRecord {
            tx_id: "tx2".into(),
            timestamp: ts,
            value: HistoryValue::Paper(Box::new(sample())),
        };
        let json = serde_json::to_value(&written).unwrap();
        assert_eq!(json["TxId"], "tx2");
        assert_eq!(json["Value"]["currentState"], "CREATED");
        assert!(written.paper().is_some());
    }
}
