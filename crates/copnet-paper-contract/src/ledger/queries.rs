//! # Paper Queries
//!
//! Secondary lookups over the paper namespace: key history, operator scan,
//! issuer prefix, rich selector and the fixed table of named queries.

use crate::domain::entities::{HistoryRecord, HistoryValue, LedgerState, QueryRecord, VdxPaper};
use crate::domain::value_objects::{CompositeKey, PaperState};
use crate::errors::ContractError;
use crate::ports::outbound::{KeyModification, KeyValue, WorldState};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Lazy history of one paper, most recent first.
pub type HistoryRecords = Box<dyn Iterator<Item = HistoryRecord> + Send>;

/// Query helpers bound to one transaction.
pub struct PaperQueries<'a> {
    stub: &'a dyn WorldState,
    namespace: &'static str,
}

impl<'a> PaperQueries<'a> {
    /// Bind to a stub and namespace.
    pub fn new(stub: &'a dyn WorldState, namespace: &'static str) -> Self {
        Self { stub, namespace }
    }

    /// Every committed value of a paper.
    ///
    /// Deleted and empty values are kept as explicit records; values that do
    /// not decode as a paper are kept as raw text.
    ///
    /// # Errors
    ///
    /// `InvalidKey` or a world-state failure.
    pub async fn history(
        &self,
        issuer: &str,
        paper_number: &str,
    ) -> Result<HistoryRecords, ContractError> {
        let key = CompositeKey::new(self.namespace, &[issuer, paper_number])?;
        let modifications = self.stub.get_history_for_key(key.as_str()).await?;
        Ok(Box::new(modifications.map(decode_modification)))
    }

    /// Papers currently held by `operator`, ordered by key.
    ///
    /// # Errors
    ///
    /// World-state failure.
    pub async fn by_operator(&self, operator: &str) -> Result<Vec<QueryRecord>, ContractError> {
        let namespace = CompositeKey::new(self.namespace, &[])?;
        let entries = self
            .stub
            .get_state_by_partial_composite_key(&namespace)
            .await?;
        let scanned = entries.len();

        // keyed by the raw ledger key: display keys are not unique
        let matches: BTreeMap<String, QueryRecord> = entries
            .into_iter()
            .filter_map(|entry| {
                let raw = entry.key.clone();
                decode_entry(entry).map(|record| (raw, record))
            })
            .filter(|(_, record)| record.record.operator() == operator)
            .collect();
        debug!(operator, scanned, matched = matches.len(), "operator scan");
        Ok(matches.into_values().collect())
    }

    /// Papers whose first key part (issuer) equals `prefix`.
    ///
    /// # Errors
    ///
    /// `InvalidKey` or a world-state failure.
    pub async fn by_prefix(&self, prefix: &str) -> Result<Vec<QueryRecord>, ContractError> {
        let partial = CompositeKey::new(self.namespace, &[prefix])?;
        let entries = self.stub.get_state_by_partial_composite_key(&partial).await?;
        Ok(decode_entries(entries).collect())
    }

    /// Papers matching an opaque rich query.
    ///
    /// # Errors
    ///
    /// `InvalidQuery` from the world state, or another world-state failure.
    pub async fn by_predicate(
        &self,
        query: &serde_json::Value,
    ) -> Result<Vec<QueryRecord>, ContractError> {
        let entries = self.stub.get_query_result(query).await?;
        Ok(decode_entries(entries).collect())
    }

    /// Run one of the fixed named queries.
    ///
    /// # Errors
    ///
    /// `InvalidQueryName` for a name outside the table.
    pub async fn by_named_query(
        &self,
        name: &str,
        value_threshold: f64,
    ) -> Result<Vec<QueryRecord>, ContractError> {
        let query = named_query(name, value_threshold)?;
        self.by_predicate(&query).await
    }
}

/// Rich query for a named query.
///
/// | Name | Selector |
/// |------|----------|
/// | `issued` .. `delivered` | `currentState` equals the state's value |
/// | `value` | `vat` greater than the threshold |
///
/// # Errors
///
/// `InvalidQueryName` for any other name.
pub fn named_query(name: &str, value_threshold: f64) -> Result<serde_json::Value, ContractError> {
    let state = match name {
        "issued" => PaperState::Issued,
        "checked" => PaperState::Checked,
        "treated" => PaperState::Treated,
        "paid" => PaperState::Paid,
        "received" => PaperState::Received,
        "delivered" => PaperState::Delivered,
        "value" => return Ok(json!({ "selector": { "vat": { "$gt": value_threshold } } })),
        other => return Err(ContractError::InvalidQueryName(other.to_string())),
    };
    Ok(json!({ "selector": { "currentState": state.value() } }))
}

fn decode_modification(modification: KeyModification) -> HistoryRecord {
    let value = if modification.is_delete {
        HistoryValue::Deleted
    } else if modification.value.is_empty() {
        HistoryValue::Empty
    } else {
        match VdxPaper::from_bytes(&modification.value) {
            Ok(paper) => HistoryValue::Paper(Box::new(paper)),
            Err(_) => HistoryValue::Raw(String::from_utf8_lossy(&modification.value).into_owned()),
        }
    };
    HistoryRecord {
        tx_id: modification.tx_id.to_string(),
        timestamp: modification.timestamp,
        value,
    }
}

fn decode_entry(entry: KeyValue) -> Option<QueryRecord> {
    let key = CompositeKey::from_raw(entry.key.as_str())
        .map_or_else(|| entry.key.clone(), |k| k.display_key());
    match VdxPaper::from_bytes(&entry.value) {
        Ok(record) => Some(QueryRecord { key, record }),
        Err(err) => {
            warn!(key = %key, error = %err, "skipping undecodable entry");
            None
        }
    }
}

fn decode_entries(entries: Vec<KeyValue>) -> impl Iterator<Item = QueryRecord> {
    entries.into_iter().filter_map(decode_entry)
}

// =============================================================================
// TESTS
// =============================================================================
