use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read {origin}: {source}")]
    ReadError {
        origin: String,
        source: std::io::Error,
    },

    #[error("Unsupported or malformed config format in {origin} (expected YAML or JSON)")]
    UnsupportedFormat { origin: String },

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidGlob { pattern: String, reason: String },

    #[error("Invalid value {raw:?} for '{field}' from {origin}: {source}")]
    InvalidValue {
        field: String,
        origin: String,
        raw: String,
        source: CoerceError,
    },

    #[error("Failed to parse command line flags: {0}")]
    FlagParse(#[from] clap::Error),

    #[error("Help requested")]
    HelpRequested { usage: String },
}

/// Failure to turn one raw value into a field's type.
#[derive(Debug, Error, PartialEq)]
pub enum CoerceError {
    #[error("cannot parse {input:?} as {expected}: {reason}")]
    Parse {
        input: String,
        expected: &'static str,
        reason: String,
    },

    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl CoerceError {
    pub(crate) fn parse(input: &str, expected: &'static str, reason: impl ToString) -> Self {
        CoerceError::Parse {
            input: input.to_string(),
            expected,
            reason: reason.to_string(),
        }
    }
}

/// A malformed `#[config(tag = "...")]` string. This is a bug in the record
/// definition, not in the configuration data, so discovery panics with it.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("config tag entry '{entry}' must have the format key=value (e.g. \"file=val,env=val,flag=l long\")")]
    MalformedEntry { entry: String },

    #[error("unknown config tag key '{key}' (only env, file and flag are allowed)")]
    UnknownKey { key: String },

    #[error("malformed flag config '{value}' (expected \"[short] [long]\")")]
    MalformedFlag { value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_names_field_and_source() {
        let err = ConfigError::InvalidValue {
            field: "db.timeout".into(),
            origin: "env".into(),
            raw: "soon".into(),
            source: CoerceError::parse("soon", "duration", "expected number"),
        };
        let msg = err.to_string();
        assert!(msg.contains("db.timeout"));
        assert!(msg.contains("env"));
        assert!(msg.contains("soon"));
    }

    #[test]
    fn unsupported_format_names_origin() {
        let err = ConfigError::UnsupportedFormat {
            origin: "/etc/app/config.toml".into(),
        };
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn schema_error_formats_entry() {
        let err = SchemaError::MalformedEntry {
            entry: "file".into(),
        };
        assert!(err.to_string().contains("'file'"));
    }
}
