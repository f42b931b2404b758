// ============================================================
// Layer 3 — Hyperparameter Records
// ============================================================
// A hyperparameter record is the subset of parsed configuration
// that belongs to one module (data, model or graph).
//
// Records are serialised into the checkpoint so that a model can
// be rebuilt later with exactly the same settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::error::{BodaError, Result};

/// One scalar hyperparameter value.
///
/// `untagged` keeps the JSON form plain (`600`, `0.0005`, `"Adam"`, `true`).
/// Int is listed before Float so whole numbers read back as Int.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for HValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HValue::Bool(v)  => write!(f, "{v}"),
            HValue::Int(v)   => write!(f, "{v}"),
            HValue::Float(v) => write!(f, "{v}"),
            HValue::Str(v)   => write!(f, "{v}"),
        }
    }
}

/// Ordered mapping from parameter name to value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HParams {
    values: BTreeMap<String, HValue>,
}

impl HParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: HValue) -> Option<HValue> {
        self.values.insert(key.into(), value)
    }

    /// Builder-style insert, handy for tests and defaults
    pub fn with(mut self, key: impl Into<String>, value: HValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&HValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    fn require(&self, key: &str) -> Result<&HValue> {
        self.values
            .get(key)
            .ok_or_else(|| BodaError::MissingHparam(key.to_string()))
    }

    pub fn get_i64(&self, key: &str) -> Result<i64> {
        match self.require(key)? {
            HValue::Int(v) => Ok(*v),
            _ => Err(type_error(key, "integer")),
        }
    }

    pub fn get_usize(&self, key: &str) -> Result<usize> {
        let v = self.get_i64(key)?;
        usize::try_from(v).map_err(|_| type_error(key, "non-negative integer"))
    }

    /// Integers are accepted where a float is expected (`--lr 1`).
    /// NaN and infinities are rejected, JSON cannot store them.
    pub fn get_f64(&self, key: &str) -> Result<f64> {
        match self.require(key)? {
            HValue::Float(v) if v.is_finite() => Ok(*v),
            HValue::Int(v) => Ok(*v as f64),
            _ => Err(type_error(key, "finite number")),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<&str> {
        match self.require(key)? {
            HValue::Str(v) => Ok(v.as_str()),
            _ => Err(type_error(key, "string")),
        }
    }

    /// Keys present in both records
    pub fn overlapping_keys(&self, other: &HParams) -> Vec<String> {
        self.values
            .keys()
            .filter(|k| other.values.contains_key(*k))
            .cloned()
            .collect()
    }

    /// Apply `later` on top of `self`. Values from `later` win.
    ///
    /// Returns the keys that were overwritten. Every collision is
    /// logged, callers decide whether to treat it as fatal.
    pub fn merge_over(&mut self, later: &HParams, later_name: &str) -> Vec<String> {
        let collisions = self.overlapping_keys(later);
        for key in &collisions {
            tracing::warn!(
                "Hyperparameter '{}' redefined by {} ({} -> {})",
                key,
                later_name,
                self.values[key],
                later.values[key],
            );
        }
        for (k, v) in &later.values {
            self.values.insert(k.clone(), v.clone());
        }
        collisions
    }
}

fn type_error(key: &str, expected: &'static str) -> BodaError {
    BodaError::HparamType { key: key.to_string(), expected }
}
