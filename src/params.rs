//! Parameter reconciliation.
//!
//! Every operation declares one [`OperationSchema`]. The schema is the single
//! source of truth for which parameters are required and which are merely
//! recognized; both request narrowing and cache key construction read it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// A single request parameter value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<String>),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(value) => write!(f, "{value}"),
            ParamValue::Int(value) => write!(f, "{value}"),
            ParamValue::Str(value) => f.write_str(value),
            ParamValue::List(values) => f.write_str(&values.join(",")),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::List(values)
    }
}

/// A parameter record. Names are kept sorted so equal records always
/// serialize, hash and compare identically regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// String value of `name`, if present and a string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (index, (name, value)) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("}")
    }
}

/// Static description of an operation's parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSchema {
    pub name: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

impl OperationSchema {
    /// Whether `name` is on this operation's allow-list.
    pub fn recognizes(&self, name: &str) -> bool {
        self.required.contains(&name) || self.optional.contains(&name)
    }

    /// First required parameter missing from `params`, if any.
    pub fn first_missing(&self, params: &Params) -> Option<&'static str> {
        self.required
            .iter()
            .copied()
            .find(|name| !params.contains(name))
    }
}

/// Shallow right-biased merge: call-site parameters win over defaults.
pub fn merge(defaults: &Params, call: &Params) -> Params {
    let mut merged = defaults.clone();
    for (name, value) in call.iter() {
        merged.insert(name, value.clone());
    }
    merged
}

/// Drop every parameter the schema does not recognize.
pub fn narrow(params: &Params, schema: &OperationSchema) -> Params {
    params
        .iter()
        .filter(|(name, _)| schema.recognizes(name))
        .map(|(name, value)| (name, value.clone()))
        .collect()
}

/// Fail fast when a required parameter is absent.
pub fn ensure_required(params: &Params, schema: &OperationSchema) -> Result<(), QueryError> {
    match schema.first_missing(params) {
        Some(parameter) => Err(QueryError::MissingParameter {
            operation: schema.name,
            parameter,
        }),
        None => Ok(()),
    }
}

/// Merge, validate and narrow in one step.
pub fn reconcile(
    defaults: &Params,
    call: &Params,
    schema: &OperationSchema,
) -> Result<Params, QueryError> {
    let merged = merge(defaults, call);
    ensure_required(&merged, schema)?;
    Ok(narrow(&merged, schema))
}
