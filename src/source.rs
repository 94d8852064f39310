//! The source abstraction every adapter implements.

use serde_json::Value;

use crate::error::ConfigError;
use crate::field::Field;

/// A value as a source produced it, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Raw {
    /// Text from env vars, flags, or anywhere only strings exist.
    Text(String),
    /// A decoded document value (scalar, list or mapping).
    Structured(Value),
}

impl Raw {
    /// Human-readable rendering for error messages.
    pub fn display(&self) -> String {
        match self {
            Raw::Text(s) => s.clone(),
            Raw::Structured(Value::String(s)) => s.clone(),
            Raw::Structured(v) => v.to_string(),
        }
    }
}

/// A configuration source queried field by field.
///
/// The collector calls [`init`](Source::init) once per resolution with every
/// discovered field, then [`read`](Source::read) for each field. Neither
/// touches the record; the collector does the assignment.
pub trait Source {
    /// Name used in error messages and logs.
    fn name(&self) -> &str;

    /// Load whatever backing data the source needs. Called before any read.
    fn init(&mut self, fields: &[Field<'_>]) -> Result<(), ConfigError> {
        let _ = fields;
        Ok(())
    }

    /// Raw value for `field`, or `None` when this source doesn't provide it.
    fn read(&self, field: &Field<'_>) -> Result<Option<Raw>, ConfigError>;
}
