// ============================================================
// Layer 3 — Argument Schemas
// ============================================================
// Every module declares the flags it understands as a list of
// ArgSpec values. The CLI layer turns those into clap arguments;
// after parsing, each module pulls its own subset back out of
// ParsedArgs as an HParams record.

use std::collections::BTreeMap;

use crate::domain::error::{BodaError, Result};
use crate::domain::hparams::{HParams, HValue};

/// Value type of a flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Int,
    Float,
    Str,
    Bool,
}

/// Declaration of one command-line flag
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
    pub name:     &'static str,
    pub kind:     ArgKind,
    pub default:  Option<&'static str>,
    pub help:     &'static str,
    pub required: bool,
}

impl ArgSpec {
    pub const fn int(name: &'static str, default: &'static str, help: &'static str) -> Self {
        Self { name, kind: ArgKind::Int, default: Some(default), help, required: false }
    }

    pub const fn float(name: &'static str, default: &'static str, help: &'static str) -> Self {
        Self { name, kind: ArgKind::Float, default: Some(default), help, required: false }
    }

    pub const fn string(name: &'static str, default: &'static str, help: &'static str) -> Self {
        Self { name, kind: ArgKind::Str, default: Some(default), help, required: false }
    }

    pub const fn boolean(name: &'static str, default: &'static str, help: &'static str) -> Self {
        Self { name, kind: ArgKind::Bool, default: Some(default), help, required: false }
    }

    /// A flag with no default that must be supplied
    pub const fn required(name: &'static str, kind: ArgKind, help: &'static str) -> Self {
        Self { name, kind, default: None, help, required: true }
    }

    /// An optional flag with no default
    pub const fn optional(name: &'static str, kind: ArgKind, help: &'static str) -> Self {
        Self { name, kind, default: None, help, required: false }
    }

    /// Parse a raw string the same way the CLI does
    pub fn parse_value(&self, raw: &str) -> Result<HValue> {
        let bad = || BodaError::HparamType {
            key:      self.name.to_string(),
            expected: match self.kind {
                ArgKind::Int   => "integer",
                ArgKind::Float => "finite number",
                ArgKind::Str   => "string",
                ArgKind::Bool  => "boolean",
            },
        };
        match self.kind {
            ArgKind::Int   => raw.trim().parse().map(HValue::Int).map_err(|_| bad()),
            ArgKind::Float => parse_finite(raw).map(HValue::Float).map_err(|_| bad()),
            ArgKind::Str   => Ok(HValue::Str(raw.to_string())),
            ArgKind::Bool  => parse_boolish(raw).map(HValue::Bool).ok_or_else(bad),
        }
    }
}

/// A float that survives a JSON round trip (no NaN or infinity)
pub fn parse_finite(raw: &str) -> std::result::Result<f64, String> {
    let value: f64 = raw.trim().parse().map_err(|_| format!("'{raw}' is not a number"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("'{raw}' is not a finite number"))
    }
}

/// Accepts the usual yes/no spellings
pub fn parse_boolish(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "t" | "y" | "1" | "on" => Some(true),
        "no" | "false" | "f" | "n" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Fully parsed configuration, keyed by flag name.
///
/// Holds the values of every flag that was exposed, whichever
/// module declared it.
#[derive(Debug, Clone, Default)]
pub struct ParsedArgs {
    values: BTreeMap<String, HValue>,
}

impl ParsedArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: HValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&HValue> {
        self.values.get(name)
    }

    /// Build from schema defaults, then apply `overrides`.
    /// Used by tests and programmatic callers that skip clap.
    pub fn from_defaults(schema: &[ArgSpec], overrides: &[(&str, &str)]) -> Result<Self> {
        let mut parsed = Self::new();
        for spec in schema {
            if let Some(default) = spec.default {
                parsed.set(spec.name, spec.parse_value(default)?);
            }
        }
        for (name, raw) in overrides {
            let spec = schema
                .iter()
                .find(|s| s.name == *name)
                .ok_or_else(|| BodaError::MissingHparam(name.to_string()))?;
            parsed.set(spec.name, spec.parse_value(raw)?);
        }
        Ok(parsed)
    }

    /// Extract the values a schema declares into a record.
    ///
    /// Optional flags without a value are left out; required ones
    /// must be present.
    pub fn extract(&self, schema: &[ArgSpec]) -> Result<HParams> {
        let mut hparams = HParams::new();
        for spec in schema {
            match self.values.get(spec.name) {
                Some(v) => {
                    hparams.insert(spec.name, v.clone());
                }
                None if spec.required => {
                    return Err(BodaError::MissingHparam(spec.name.to_string()));
                }
                None => {}
            }
        }
        Ok(hparams)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Vec<ArgSpec> {
        vec![
            ArgSpec::int("seq_len", "600", "sequence length"),
            ArgSpec::float("lr", "0.0005", "learning rate"),
            ArgSpec::optional("data_path", ArgKind::Str, "input file"),
        ]
    }

    #[test]
    fn test_defaults_and_overrides() {
        let parsed = ParsedArgs::from_defaults(&schema(), &[("lr", "0.01")]).unwrap();
        let hp = parsed.extract(&schema()).unwrap();
        assert_eq!(hp.get_usize("seq_len").unwrap(), 600);
        assert_eq!(hp.get_f64("lr").unwrap(), 0.01);
        // optional without value is skipped
        assert!(!hp.contains("data_path"));
    }

    #[test]
    fn test_extract_only_declared_keys() {
        let mut parsed = ParsedArgs::from_defaults(&schema(), &[]).unwrap();
        parsed.set("patience", HValue::Int(4));
        let hp = parsed.extract(&schema()).unwrap();
        assert!(!hp.contains("patience"));
    }

    #[test]
    fn test_required_flag_missing() {
        let spec = [ArgSpec::required("data_path", ArgKind::Str, "input")];
        let parsed = ParsedArgs::new();
        assert!(matches!(parsed.extract(&spec), Err(BodaError::MissingHparam(_))));
    }

    #[test]
    fn test_boolish() {
        assert_eq!(parse_boolish("True"), Some(true));
        assert_eq!(parse_boolish("0"), Some(false));
        assert_eq!(parse_boolish("maybe"), None);
    }

    #[test]
    fn test_bad_int_value() {
        let spec = ArgSpec::int("seq_len", "600", "");
        assert!(spec.parse_value("six hundred").is_err());
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let spec = ArgSpec::float("lr", "0.0005", "");
        for raw in ["NaN", "inf", "-inf", "infinity"] {
            assert!(matches!(spec.parse_value(raw), Err(BodaError::HparamType { .. })), "{raw}");
        }
        assert_eq!(spec.parse_value("1e-8").unwrap(), HValue::Float(1e-8));
    }
}
