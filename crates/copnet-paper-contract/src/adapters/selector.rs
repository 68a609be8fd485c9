//! # Selector Evaluator
//!
//! Evaluates JSON rich queries of the form
//! `{"selector": {...}, "limit": n}` against stored documents.
//!
//! Supported:
//!
//! | Kind | Operators |
//! |------|-----------|
//! | Field | implicit equality, `$eq $ne $gt $gte $lt $lte $in $nin $exists` |
//! | Combination | `$and $or $nor $not` |
//!
//! Field names may be dotted paths into nested objects. Every field condition
//! except `$exists: false` requires the field to be present.

use crate::errors::StateError;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// A parsed rich query.
#[derive(Debug, Clone, PartialEq)]
pub struct RichQuery {
    selector: Map<String, Value>,
    limit: Option<usize>,
}

impl RichQuery {
    /// Parse a query object.
    ///
    /// # Errors
    ///
    /// `InvalidQuery` if `selector` is missing or not an object, or `limit`
    /// is not a non-negative integer.
    pub fn parse(query: &Value) -> Result<Self, StateError> {
        let selector = query
            .get("selector")
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| StateError::InvalidQuery("missing selector object".into()))?;

        let limit = match query.get("limit") {
            None => None,
            Some(value) => Some(
                value
                    .as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| StateError::InvalidQuery("limit must be a count".into()))?,
            ),
        };
        Ok(Self { selector, limit })
    }

    /// Maximum number of results, if any.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Whether a document satisfies the selector.
    ///
    /// # Errors
    ///
    /// `InvalidQuery` on an unknown operator or a malformed operand.
    pub fn matches(&self, doc: &Value) -> Result<bool, StateError> {
        match_selector(&self.selector, doc)
    }
}

fn match_selector(selector: &Map<String, Value>, doc: &Value) -> Result<bool, StateError> {
    for (key, condition) in selector {
        let matched = match key.as_str() {
            "$and" => all_of(condition, doc)?,
            "$or" => any_of(condition, doc)?,
            "$nor" => !any_of(condition, doc)?,
            "$not" => !match_selector(as_selector(condition)?, doc)?,
            op if op.starts_with('$') => {
                return Err(StateError::InvalidQuery(format!(
                    "unknown combination operator {op}"
                )))
            }
            field => match_field(lookup(doc, field), condition)?,
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn all_of(condition: &Value, doc: &Value) -> Result<bool, StateError> {
    for selector in as_selector_list(condition)? {
        if !match_selector(selector, doc)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn any_of(condition: &Value, doc: &Value) -> Result<bool, StateError> {
    for selector in as_selector_list(condition)? {
        if match_selector(selector, doc)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn as_selector(value: &Value) -> Result<&Map<String, Value>, StateError> {
    value
        .as_object()
        .ok_or_else(|| StateError::InvalidQuery("expected a selector object".into()))
}

fn as_selector_list(value: &Value) -> Result<Vec<&Map<String, Value>>, StateError> {
    value
        .as_array()
        .ok_or_else(|| StateError::InvalidQuery("expected an array of selectors".into()))?
        .iter()
        .map(as_selector)
        .collect()
}

fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |value, segment| value.get(segment))
}

fn match_field(field: Option<&Value>, condition: &Value) -> Result<bool, StateError> {
    let operators = condition
        .as_object()
        .filter(|obj| !obj.is_empty() && obj.keys().all(|k| k.starts_with('$')));

    let Some(operators) = operators else {
        return Ok(field.is_some_and(|value| values_equal(value, condition)));
    };

    for (op, operand) in operators {
        if !apply_operator(field, op, operand)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn apply_operator(field: Option<&Value>, op: &str, operand: &Value) -> Result<bool, StateError> {
    if op == "$exists" {
        let wanted = operand
            .as_bool()
            .ok_or_else(|| StateError::InvalidQuery("$exists takes a boolean".into()))?;
        return Ok(field.is_some() == wanted);
    }

    let Some(value) = field else {
        return Ok(false);
    };
    let matched = match op {
        "$eq" => values_equal(value, operand),
        "$ne" => !values_equal(value, operand),
        "$gt" => compare(value, operand) == Some(Ordering::Greater),
        "$gte" => matches!(
            compare(value, operand),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        "$lt" => compare(value, operand) == Some(Ordering::Less),
        "$lte" => matches!(compare(value, operand), Some(Ordering::Less | Ordering::Equal)),
        "$in" => operand_list(op, operand)?
            .iter()
            .any(|candidate| values_equal(value, candidate)),
        "$nin" => !operand_list(op, operand)?
            .iter()
            .any(|candidate| values_equal(value, candidate)),
        other => {
            return Err(StateError::InvalidQuery(format!(
                "unknown field operator {other}"
            )))
        }
    };
    Ok(matched)
}

fn operand_list<'a>(op: &str, operand: &'a Value) -> Result<&'a Vec<Value>, StateError> {
    operand
        .as_array()
        .ok_or_else(|| StateError::InvalidQuery(format!("{op} takes an array")))
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => (x - y).abs() < f64::EPSILON,
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================
