//! # Value Objects
//!
//! Immutable domain primitives: paper lifecycle state, composite ledger keys,
//! caller identity and transaction ids.

use crate::errors::ContractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// PAPER STATE
// =============================================================================

/// Lifecycle state of a paper.
///
/// Serialized as its numeric value (`1..=7`). The declaration order is the
/// only legal advance order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PaperState {
    /// Recorded on the ledger.
    Created = 1,
    /// Issued by its issuer.
    Issued = 2,
    /// Checked by the current operator.
    Checked = 3,
    /// Treated and valued.
    Treated = 4,
    /// Paid by the issuer organization.
    Paid = 5,
    /// Received by the delivering party.
    Received = 6,
    /// Delivered. Terminal.
    Delivered = 7,
}

impl PaperState {
    /// All states in advance order.
    pub const ORDER: [PaperState; 7] = [
        Self::Created,
        Self::Issued,
        Self::Checked,
        Self::Treated,
        Self::Paid,
        Self::Received,
        Self::Delivered,
    ];

    /// Numeric value stored on the ledger.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Upper-case state name used in reports and error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Issued => "ISSUED",
            Self::Checked => "CHECKED",
            Self::Treated => "TREATED",
            Self::Paid => "PAID",
            Self::Received => "RECEIVED",
            Self::Delivered => "DELIVERED",
        }
    }

    /// Lower-case adjective used in transition error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Issued => "issued",
            Self::Checked => "checked",
            Self::Treated => "treated",
            Self::Paid => "paid",
            Self::Received => "received",
            Self::Delivered => "delivered",
        }
    }

    /// State reached by advancing one step, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ORDER.get(usize::from(self.value())).copied()
    }

    /// State this one is reached from, if any.
    #[must_use]
    pub fn previous(self) -> Option<Self> {
        let idx = usize::from(self.value()).checked_sub(2)?;
        Self::ORDER.get(idx).copied()
    }

    /// Returns true for the terminal state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Delivered
    }

    /// Reverse lookup from the stored numeric value.
    #[must_use]
    pub fn from_value(value: u8) -> Option<Self> {
        value
            .checked_sub(1)
            .and_then(|idx| Self::ORDER.get(usize::from(idx)).copied())
    }
}

impl fmt::Display for PaperState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<PaperState> for u8 {
    fn from(state: PaperState) -> Self {
        state.value()
    }
}

impl TryFrom<u8> for PaperState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(value).ok_or_else(|| format!("unknown paper state {value}"))
    }
}

/// Name reported for a paper that has not been given a state yet.
pub const UNDEFINED_STATE_NAME: &str = "UNDEFINED";

// =============================================================================
// COMPOSITE KEY
// =============================================================================

/// Separator between composite key components.
pub const COMPOSITE_KEY_DELIMITER: char = '\u{0000}';

/// Highest code point, used as the exclusive end of a partial-key range.
pub const MAX_UNICODE_RUNE: char = '\u{10FFFF}';

/// World-state key built from an object type and its attributes.
///
/// Layout: `U+0000 type U+0000 attr1 U+0000 ... attrN U+0000`. A key built from
/// a prefix of the attributes is a lexicographic prefix of every full key that
/// extends it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeKey(String);

impl CompositeKey {
    /// Build a key from an object type and attributes.
    ///
    /// # Errors
    ///
    /// `InvalidKey` if any component is empty (type only) or contains the
    /// delimiter or the max rune.
    pub fn new(object_type: &str, attributes: &[&str]) -> Result<Self, ContractError> {
        if object_type.is_empty() {
            return Err(ContractError::InvalidKey {
                part: String::new(),
                reason: "object type must not be empty",
            });
        }
        validate_part(object_type)?;

        let mut key = String::with_capacity(
            2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>(),
        );
        key.push(COMPOSITE_KEY_DELIMITER);
        key.push_str(object_type);
        key.push(COMPOSITE_KEY_DELIMITER);
        for attr in attributes {
            validate_part(attr)?;
            key.push_str(attr);
            key.push(COMPOSITE_KEY_DELIMITER);
        }
        Ok(Self(key))
    }

    /// Wrap a raw ledger key that is already in composite form.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let well_formed = raw.starts_with(COMPOSITE_KEY_DELIMITER)
            && raw.ends_with(COMPOSITE_KEY_DELIMITER)
            && raw.len() > 2;
        well_formed.then_some(Self(raw))
    }

    /// Raw ledger key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exclusive upper bound of the range covering every key with this prefix.
    #[must_use]
    pub fn range_end(&self) -> String {
        let mut end = self.0.clone();
        end.push(MAX_UNICODE_RUNE);
        end
    }

    /// Split back into object type and attributes.
    #[must_use]
    pub fn split(&self) -> (String, Vec<String>) {
        let mut parts = self
            .0
            .trim_start_matches(COMPOSITE_KEY_DELIMITER)
            .split(COMPOSITE_KEY_DELIMITER)
            .map(str::to_string)
            .collect::<Vec<_>>();
        // trailing delimiter leaves one empty component
        parts.pop();
        if parts.is_empty() {
            return (String::new(), Vec::new());
        }
        let object_type = parts.remove(0);
        (object_type, parts)
    }

    /// Attributes joined with `:`, for messages and query results.
    #[must_use]
    pub fn display_key(&self) -> String {
        self.split().1.join(":")
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_key())
    }
}

fn validate_part(part: &str) -> Result<(), ContractError> {
    if part.contains(COMPOSITE_KEY_DELIMITER) || part.contains(MAX_UNICODE_RUNE) {
        return Err(ContractError::InvalidKey {
            part: part.to_string(),
            reason: "contains a reserved code point",
        });
    }
    Ok(())
}

// =============================================================================
// CLIENT IDENTITY
// =============================================================================

/// Identity of the party invoking a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientIdentity {
    /// Enrolled user id.
    pub id: String,
    /// Membership service provider id of the caller's organization.
    pub msp_id: String,
}

impl ClientIdentity {
    /// Create an identity.
    pub fn new(id: impl Into<String>, msp_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            msp_id: msp_id.into(),
        }
    }
}

// =============================================================================
// TRANSACTION ID
// =============================================================================

/// Ledger transaction id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(String);

impl TxId {
    /// Fresh random id (32 lower-case hex chars).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap an existing id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_order_is_one_step_chain() {
        for pair in PaperState::ORDER.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
            assert_eq!(pair[1].previous(), Some(pair[0]));
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(PaperState::Created.previous(), None);
        assert_eq!(PaperState::Delivered.next(), None);
        assert!(PaperState::Delivered.is_terminal());
    }

    #[test]
    fn test_state_serializes_as_number() {
        let json = serde_json::to_string(&PaperState::Treated).unwrap();
        assert_eq!(json, "4");
        let state: PaperState = serde_json::from_str("7").unwrap();
        assert_eq!(state, PaperState::Delivered);
        assert!(serde_json::from_str::<PaperState>("0").is_err());
        assert!(serde_json::from_str::<PaperState>("8").is_err());
    }

    #[test]
    fn test_state_names() {
        assert_eq!(PaperState::from_value(5).map(PaperState::name), Some("PAID"));
        assert_eq!(PaperState::Received.label(), "received");
    }

    #[test]
    fn test_composite_key_layout() {
        let key = CompositeKey::new("org.copnet.paper", &["PC", "0001"]).unwrap();
        assert_eq!(key.as_str(), "\u{0}org.copnet.paper\u{0}PC\u{0}0001\u{0}");
        assert_eq!(key.display_key(), "PC:0001");

        let (ty, attrs) = key.split();
        assert_eq!(ty, "org.copnet.paper");
        assert_eq!(attrs, vec!["PC".to_string(), "0001".to_string()]);
    }

    #[test]
    fn test_partial_key_is_prefix() {
        let full = CompositeKey::new("ns", &["PC", "0001"]).unwrap();
        let partial = CompositeKey::new("ns", &["PC"]).unwrap();
        let other = CompositeKey::new("ns", &["PCX", "0001"]).unwrap();
        assert!(full.as_str().starts_with(partial.as_str()));
        assert!(!other.as_str().starts_with(partial.as_str()));
        assert!(full.as_str() < partial.range_end().as_str());
    }

    #[test]
    fn test_composite_key_rejects_delimiter() {
        let err = CompositeKey::new("ns", &["P\u{0}C"]).unwrap_err();
        assert!(matches!(err, ContractError::InvalidKey { .. }));
        assert!(CompositeKey::new("", &["PC"]).is_err());
    }

    #[test]
    fn test_from_raw() {
        assert!(CompositeKey::from_raw("plain").is_none());
        let key = CompositeKey::from_raw("\u{0}ns\u{0}a\u{0}").unwrap();
        assert_eq!(key.display_key(), "a");
    }

    #[test]
    fn test_tx_id_is_hex() {
        let id = TxId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
