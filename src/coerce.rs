//! Turning raw source values into field types.
//!
//! Every assignable field type implements [`Coerce`], which knows how to build
//! the type from text (env vars, flags, string-valued file entries) and from a
//! decoded document value. The object-safe [`Setting`] trait wraps that for the
//! resolver and owns the rules shared by all types:
//!
//! - empty text (or a `null` / `""` document value) resets the field to
//!   `Default::default()` instead of being parsed;
//! - a document value of the wrong shape that happens to be a string is
//!   retried as text, so `timeout: "2m"` works for a `Duration` field.
//!
//! Custom types opt in either by implementing [`Coerce`] directly or with
//! [`coerce_from_str!`](crate::coerce_from_str) (any `FromStr` type) and
//! [`coerce_from_json!`](crate::coerce_from_json) (any `Deserialize` type,
//! text parsed as a JSON literal).

use std::any::type_name;
use std::collections::{BTreeMap, HashMap};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use num_complex::Complex;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CoerceError;
use crate::source::Raw;

/// A type that can be built from raw configuration input.
pub trait Coerce: Sized {
    /// Parse a non-empty text value.
    fn from_text(raw: &str) -> Result<Self, CoerceError>;

    /// Convert a decoded document value. Strings are handed to
    /// [`from_text`](Self::from_text); any other shape is a mismatch.
    fn from_structured(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::String(s) => Self::from_text(s),
            other => Err(CoerceError::Mismatch {
                expected: type_name::<Self>(),
                found: kind(other),
            }),
        }
    }
}

/// Object-safe assignment handle the resolver writes through.
pub trait Setting {
    fn assign(&mut self, raw: &Raw) -> Result<(), CoerceError>;
}

impl<T: Coerce + Default> Setting for T {
    fn assign(&mut self, raw: &Raw) -> Result<(), CoerceError> {
        *self = match raw {
            Raw::Text(text) if text.is_empty() => T::default(),
            Raw::Text(text) => T::from_text(text)?,
            Raw::Structured(Value::Null) => T::default(),
            Raw::Structured(Value::String(s)) if s.is_empty() => T::default(),
            Raw::Structured(value) => T::from_structured(value)?,
        };
        Ok(())
    }
}

/// Decode a document value directly, retrying strings through `from_text`.
pub fn decode_structured<T: Coerce + DeserializeOwned>(value: &Value) -> Result<T, CoerceError> {
    serde_json::from_value(value.clone()).or_else(|err| match value {
        Value::String(s) => T::from_text(s),
        other => Err(CoerceError::parse(&other.to_string(), type_name::<T>(), err)),
    })
}

/// Parse text as a JSON literal. A bare unquoted string that is not valid
/// JSON is retried as a JSON string, so callers don't need to quote plain
/// strings.
pub fn from_json_text<T: DeserializeOwned>(raw: &str) -> Result<T, CoerceError> {
    serde_json::from_str(raw).or_else(|err| {
        serde_json::from_value(Value::String(raw.to_string()))
            .map_err(|_| CoerceError::parse(raw, type_name::<T>(), err))
    })
}

/// Decode a document value with serde, treating string values that don't
/// decode directly as JSON text.
pub fn from_json_value<T: DeserializeOwned>(value: &Value) -> Result<T, CoerceError> {
    serde_json::from_value(value.clone()).or_else(|err| match value {
        Value::String(s) => from_json_text(s),
        other => Err(CoerceError::parse(&other.to_string(), type_name::<T>(), err)),
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

macro_rules! coerce_numbers {
    ($($ty:ty),+ $(,)?) => {$(
        impl Coerce for $ty {
            fn from_text(raw: &str) -> Result<Self, CoerceError> {
                raw.parse::<$ty>()
                    .map_err(|e| CoerceError::parse(raw, stringify!($ty), e))
            }

            fn from_structured(value: &Value) -> Result<Self, CoerceError> {
                decode_structured(value)
            }
        }
    )+};
}

coerce_numbers!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64
);

impl Coerce for bool {
    fn from_text(raw: &str) -> Result<Self, CoerceError> {
        match raw {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            _ => Err(CoerceError::parse(raw, "bool", "expected true or false")),
        }
    }

    fn from_structured(value: &Value) -> Result<Self, CoerceError> {
        decode_structured(value)
    }
}

impl Coerce for String {
    fn from_text(raw: &str) -> Result<Self, CoerceError> {
        Ok(raw.to_string())
    }

    fn from_structured(value: &Value) -> Result<Self, CoerceError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(CoerceError::Mismatch {
                expected: "String",
                found: kind(other),
            }),
        }
    }
}

impl Coerce for char {
    fn from_text(raw: &str) -> Result<Self, CoerceError> {
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(CoerceError::parse(raw, "char", "expected a single character")),
        }
    }
}

impl Coerce for Duration {
    fn from_text(raw: &str) -> Result<Self, CoerceError> {
        humantime::parse_duration(raw).map_err(|e| CoerceError::parse(raw, "duration", e))
    }
}

impl Coerce for DateTime<Utc> {
    fn from_text(raw: &str) -> Result<Self, CoerceError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| CoerceError::parse(raw, "RFC 3339 timestamp", e))
    }
}

impl Coerce for DateTime<FixedOffset> {
    fn from_text(raw: &str) -> Result<Self, CoerceError> {
        DateTime::parse_from_rfc3339(raw)
            .map_err(|e| CoerceError::parse(raw, "RFC 3339 timestamp", e))
    }
}

macro_rules! coerce_complex {
    ($($ty:ty),+ $(,)?) => {$(
        impl Coerce for Complex<$ty> {
            fn from_text(raw: &str) -> Result<Self, CoerceError> {
                let inner = raw
                    .strip_prefix('(')
                    .and_then(|s| s.strip_suffix(')'))
                    .unwrap_or(raw);
                inner
                    .parse::<Self>()
                    .map_err(|e| CoerceError::parse(raw, concat!("Complex<", stringify!($ty), ">"), e))
            }

            fn from_structured(value: &Value) -> Result<Self, CoerceError> {
                match value {
                    Value::Number(n) => Self::from_text(&n.to_string()),
                    Value::String(s) => Self::from_text(s),
                    other => Err(CoerceError::Mismatch {
                        expected: "complex number",
                        found: kind(other),
                    }),
                }
            }
        }
    )+};
}

// `1+2i`, `2.5`, `3i`, optionally parenthesized: `(1+2i)`.
coerce_complex!(f32, f64);

/// Comma-separated, each element trimmed: `"a, b,c"` → `["a", "b", "c"]`.
impl Coerce for Vec<String> {
    fn from_text(raw: &str) -> Result<Self, CoerceError> {
        Ok(raw.split(',').map(|s| s.trim().to_string()).collect())
    }

    fn from_structured(value: &Value) -> Result<Self, CoerceError> {
        decode_structured(value)
    }
}

/// Comma-separated `key=value` pairs, both sides trimmed.
impl Coerce for HashMap<String, String> {
    fn from_text(raw: &str) -> Result<Self, CoerceError> {
        parse_pairs(raw).map(|pairs| pairs.collect())
    }

    fn from_structured(value: &Value) -> Result<Self, CoerceError> {
        decode_structured(value)
    }
}

impl Coerce for BTreeMap<String, String> {
    fn from_text(raw: &str) -> Result<Self, CoerceError> {
        parse_pairs(raw).map(|pairs| pairs.collect())
    }

    fn from_structured(value: &Value) -> Result<Self, CoerceError> {
        decode_structured(value)
    }
}

fn parse_pairs(raw: &str) -> Result<impl Iterator<Item = (String, String)>, CoerceError> {
    let mut pairs = Vec::new();
    for entry in raw.split(',') {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(CoerceError::parse(
                raw,
                "string map",
                format!("entry '{}' is not key=value", entry.trim()),
            ));
        };
        pairs.push((key.trim().to_string(), value.trim().to_string()));
    }
    Ok(pairs.into_iter())
}

impl<T: Coerce> Coerce for Option<T> {
    fn from_text(raw: &str) -> Result<Self, CoerceError> {
        T::from_text(raw).map(Some)
    }

    fn from_structured(value: &Value) -> Result<Self, CoerceError> {
        T::from_structured(value).map(Some)
    }
}

/// Implement [`Coerce`] for types that parse from text via `FromStr`.
///
/// ```ignore
/// collectfig::coerce_from_str!(LogLevel);
/// ```
#[macro_export]
macro_rules! coerce_from_str {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Coerce for $ty {
            fn from_text(raw: &str) -> ::std::result::Result<Self, $crate::CoerceError> {
                raw.parse::<$ty>().map_err(|e| $crate::CoerceError::Parse {
                    input: raw.to_string(),
                    expected: ::std::any::type_name::<$ty>(),
                    reason: e.to_string(),
                })
            }
        }
    )+};
}

/// Implement [`Coerce`] for `Deserialize` types: text is decoded as a JSON
/// literal (bare strings allowed), document values are decoded directly.
#[macro_export]
macro_rules! coerce_from_json {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Coerce for $ty {
            fn from_text(raw: &str) -> ::std::result::Result<Self, $crate::CoerceError> {
                $crate::coerce::from_json_text(raw)
            }

            fn from_structured(
                value: &$crate::serde_json::Value,
            ) -> ::std::result::Result<Self, $crate::CoerceError> {
                $crate::coerce::from_json_value(value)
            }
        }
    )+};
}

// Addresses have no `Default`; fields hold them as `Option<_>`.
coerce_from_str!(PathBuf, IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr);
