//! Status-dictionary plumbing.
//!
//! Every node exposes its externally visible parameters through a flat
//! `StatusMap`. Writing a configuration and immediately reading it back
//! reproduces the same observable values for every settable key.

use super::error::{KernelError, KernelResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A status dictionary. `BTreeMap` keeps iteration order deterministic.
pub type StatusMap = BTreeMap<String, StatusValue>;

/// A single status dictionary value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatusValue {
    Int(i64),
    Real(f64),
    Bool(bool),
    Str(String),
}

impl StatusValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            StatusValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Real view; integers are widened, matching the usual dictionary
    /// convention of the status protocol.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            StatusValue::Real(r) => Some(*r),
            StatusValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StatusValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StatusValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for StatusValue {
    fn from(v: i64) -> Self {
        StatusValue::Int(v)
    }
}

impl From<f64> for StatusValue {
    fn from(v: f64) -> Self {
        StatusValue::Real(v)
    }
}

impl From<bool> for StatusValue {
    fn from(v: bool) -> Self {
        StatusValue::Bool(v)
    }
}

impl From<&str> for StatusValue {
    fn from(v: &str) -> Self {
        StatusValue::Str(v.to_string())
    }
}

/// Reject any key outside `allowed` before a write is applied, so a
/// failing `set_status` never partially mutates the node.
pub fn ensure_known_keys(status: &StatusMap, allowed: &[&str]) -> KernelResult<()> {
    for key in status.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(KernelError::UnknownStatusKey { key: key.clone() });
        }
    }
    Ok(())
}

/// Typed read of an optional real-valued key.
pub fn get_real(status: &StatusMap, key: &str) -> KernelResult<Option<f64>> {
    match status.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_real()
            .map(Some)
            .ok_or_else(|| KernelError::StatusTypeMismatch {
                key: key.to_string(),
                expected: "real",
            }),
    }
}

/// Typed read of an optional integer key.
pub fn get_int(status: &StatusMap, key: &str) -> KernelResult<Option<i64>> {
    match status.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_int()
            .map(Some)
            .ok_or_else(|| KernelError::StatusTypeMismatch {
                key: key.to_string(),
                expected: "integer",
            }),
    }
}

/// Typed read of an optional string key.
pub fn get_str(status: &StatusMap, key: &str) -> KernelResult<Option<String>> {
    match status.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| KernelError::StatusTypeMismatch {
                key: key.to_string(),
                expected: "string",
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_access() {
        let mut status = StatusMap::new();
        status.insert("rate".to_string(), StatusValue::Real(2.5));
        status.insert("steps".to_string(), StatusValue::Int(4));
        status.insert("name".to_string(), StatusValue::from("alpha"));

        assert_eq!(get_real(&status, "rate").unwrap(), Some(2.5));
        // Integers widen to reals.
        assert_eq!(get_real(&status, "steps").unwrap(), Some(4.0));
        assert_eq!(get_str(&status, "name").unwrap(), Some("alpha".to_string()));
        assert_eq!(get_real(&status, "missing").unwrap(), None);
    }

    #[test]
    fn test_type_mismatch_is_surfaced() {
        let mut status = StatusMap::new();
        status.insert("rate".to_string(), StatusValue::from("fast"));

        let err = get_real(&status, "rate").unwrap_err();
        assert_eq!(
            err,
            KernelError::StatusTypeMismatch {
                key: "rate".to_string(),
                expected: "real",
            }
        );
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let mut status = StatusMap::new();
        status.insert("rate".to_string(), StatusValue::Real(1.0));
        status.insert("typo".to_string(), StatusValue::Real(1.0));

        let err = ensure_known_keys(&status, &["rate"]).unwrap_err();
        assert_eq!(
            err,
            KernelError::UnknownStatusKey {
                key: "typo".to_string()
            }
        );
        assert!(ensure_known_keys(&status, &["rate", "typo"]).is_ok());
    }
}
