//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic checks on mount entries (serde handles syntax)
//! - Decide which entries are blank and skipped
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function over the resolved mount entries
//! - Provider-specific parameters are checked later, by the driver
//!   constructors

use std::fmt;

use serde_json::Value;

/// A problem with one mount entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Position of the entry in the `mounts` sequence.
    pub index: usize,
    pub message: String,
}

impl ValidationError {
    fn new(index: usize, message: impl Into<String>) -> Self {
        Self {
            index,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mounts[{}]: {}", self.index, self.message)
    }
}

/// True for entries that declare nothing: `null`, `false`, `0`, `""`, `{}`.
pub fn is_blank_entry(entry: &Value) -> bool {
    match entry {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Array(_) => false,
    }
}

/// Check every non-blank mount entry.
pub fn validate_mounts(entries: &[Value]) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        if is_blank_entry(entry) {
            continue;
        }
        let Some(map) = entry.as_object() else {
            errors.push(ValidationError::new(index, "entry must be an object"));
            continue;
        };

        match map.get("mount") {
            Some(Value::String(path)) if path.starts_with('/') => {}
            Some(Value::String(path)) => errors.push(ValidationError::new(
                index,
                format!("mount path '{path}' must start with '/'"),
            )),
            Some(_) => errors.push(ValidationError::new(index, "'mount' must be a string")),
            None => errors.push(ValidationError::new(index, "missing 'mount'")),
        }

        match map.get("provider") {
            Some(Value::String(provider)) if !provider.is_empty() => {}
            Some(Value::String(_)) => errors.push(ValidationError::new(index, "'provider' is empty")),
            Some(_) => errors.push(ValidationError::new(index, "'provider' must be a string")),
            None => errors.push(ValidationError::new(index, "missing 'provider'")),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
