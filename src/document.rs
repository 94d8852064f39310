//! Decoded config documents with case-insensitive path lookup.
//!
//! A [`Document`] is the tree decoded from one file or reader. The root must be
//! a mapping; leaves are whatever YAML/JSON produced (scalars, lists, nested
//! mappings). Lookup walks a path of segments and compares keys
//! case-insensitively at every level, so `PORT`, `port` and `PoRt` all resolve
//! a field named `port`.

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    root: Map<String, Value>,
}

impl Document {
    pub fn new(root: Map<String, Value>) -> Self {
        Self { root }
    }

    /// Decode `content` as YAML (first document), falling back to JSON.
    ///
    /// Returns `None` when neither format yields a top-level mapping.
    /// Whitespace-only content is an empty document.
    pub fn parse(content: &str) -> Option<Self> {
        if content.trim().is_empty() {
            return Some(Self::default());
        }
        // Only the first document of a multi-document stream is used.
        let first = serde_yaml::Deserializer::from_str(content).next();
        if let Some(Ok(root)) = first.map(Map::<String, Value>::deserialize) {
            return Some(Self::new(root));
        }
        if let Ok(root) = serde_json::from_str::<Map<String, Value>>(content) {
            return Some(Self::new(root));
        }
        None
    }

    /// Look up a value by path segments.
    ///
    /// Returns `None` if any segment is missing or if an intermediate value is
    /// not a mapping.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = lookup(&self.root, first.as_ref())?;
        for segment in rest {
            let Value::Object(map) = current else {
                return None;
            };
            current = lookup(map, segment.as_ref())?;
        }
        Some(current)
    }

    /// Look up a value by a single key split on `separator` (e.g. `"db.timeout"`).
    pub fn get_joined(&self, key: &str, separator: &str) -> Option<&Value> {
        let segments: Vec<&str> = key.split(separator).collect();
        self.get(&segments)
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

/// Exact key first, then the first key (in map order) that matches ignoring case.
fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    if let Some(value) = map.get(key) {
        return Some(value);
    }
    let needle = key.to_lowercase();
    map.iter()
        .find(|(k, _)| k.to_lowercase() == needle)
        .map(|(_, v)| v)
}
