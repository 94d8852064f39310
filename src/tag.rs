//! The per-field tag micro-language.
//!
//! A tag is a comma-separated list of `key=value` pairs:
//!
//! ```text
//! env=PORT,file=server.port,flag=p port
//! ```
//!
//! `env` and `file` take a name. `flag` takes up to two space-separated
//! tokens in any order: a single character is the short flag, anything longer
//! is the long flag name.

use crate::error::SchemaError;

/// Source identifier for environment overrides.
pub const ENV_KEY: &str = "env";
/// Source identifier for file overrides.
pub const FILE_KEY: &str = "file";
/// Source identifier for flag overrides.
pub const FLAG_KEY: &str = "flag";

/// Overrides parsed from one field's tag. `None` means "derive the name".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    pub env: Option<String>,
    pub file: Option<String>,
    pub flag: FlagTag,
}

/// The `flag=...` part of a tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagTag {
    pub short: Option<char>,
    pub long: Option<String>,
}

impl Tags {
    /// Override for the given source identifier (`"env"`, `"file"` or `"flag"`).
    ///
    /// For `flag` this is the long name only.
    pub fn get(&self, source: &str) -> Option<&str> {
        match source {
            ENV_KEY => self.env.as_deref(),
            FILE_KEY => self.file.as_deref(),
            FLAG_KEY => self.flag.long.as_deref(),
            _ => None,
        }
    }
}

/// Parse a tag string. An empty string yields no overrides.
pub fn parse(tag: &str) -> Result<Tags, SchemaError> {
    let mut tags = Tags::default();
    if tag.is_empty() {
        return Ok(tags);
    }

    for entry in tag.split(',') {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(SchemaError::MalformedEntry {
                entry: entry.to_string(),
            });
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            return Err(SchemaError::MalformedEntry {
                entry: entry.to_string(),
            });
        }

        match key {
            ENV_KEY => tags.env = Some(value.to_string()),
            FILE_KEY => tags.file = Some(value.to_string()),
            FLAG_KEY => tags.flag = parse_flag(value)?,
            other => {
                return Err(SchemaError::UnknownKey {
                    key: other.to_string(),
                });
            }
        }
    }

    Ok(tags)
}

/// Parse the value of a `flag=` entry: `"p"`, `"port"`, `"p port"` or `"port p"`.
pub fn parse_flag(value: &str) -> Result<FlagTag, SchemaError> {
    let malformed = || SchemaError::MalformedFlag {
        value: value.to_string(),
    };

    let tokens: Vec<&str> = value.split_whitespace().collect();
    if tokens.is_empty() || tokens.len() > 2 {
        return Err(malformed());
    }

    let mut flag = FlagTag::default();
    for token in tokens {
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                if flag.short.is_some() {
                    return Err(malformed());
                }
                flag.short = Some(c);
            }
            _ => {
                if flag.long.is_some() {
                    return Err(malformed());
                }
                flag.long = Some(token.to_string());
            }
        }
    }

    Ok(flag)
}
