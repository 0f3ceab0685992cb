//! Named value tables used for block parameters and block results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FbError, FbResult};

/// A single table entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
    List(Vec<f64>),
}

impl Value {
    /// Numeric view; integers widen to `f64`.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::List(v)
    }
}

/// Ordered name → value map.
///
/// Ordering is by key so serialized tables are stable across runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table(BTreeMap<String, Value>);

/// Parameters a block script reads and may rewrite.
pub type ParameterTable = Table;
/// Results a block script reports for one invocation.
pub type ResultsTable = Table;

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overwrite entries of `self` with those of `other`.
    pub fn merge(&mut self, other: &Table) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Numeric entry, or an error naming the key.
    pub fn real(&self, key: &str) -> FbResult<f64> {
        let value = self.get(key).ok_or_else(|| FbError::MissingKey {
            key: key.to_string(),
        })?;
        value.as_real().ok_or_else(|| FbError::WrongType {
            key: key.to_string(),
            expected: "number",
        })
    }

    /// Numeric entry with a fallback when absent. A present entry of the
    /// wrong type is still an error.
    pub fn real_or(&self, key: &str, default: f64) -> FbResult<f64> {
        if self.contains_key(key) {
            self.real(key)
        } else {
            Ok(default)
        }
    }

    pub fn text(&self, key: &str) -> FbResult<&str> {
        let value = self.get(key).ok_or_else(|| FbError::MissingKey {
            key: key.to_string(),
        })?;
        value.as_text().ok_or_else(|| FbError::WrongType {
            key: key.to_string(),
            expected: "string",
        })
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Table {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
