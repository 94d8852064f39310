//! Config documents from files and arbitrary readers.
//!
//! # Discovery
//!
//! [`FilesSource`] finds its inputs one of two ways:
//!
//! - **Locations + basename** ([`FilesSource::new`]): every entry in each
//!   location whose stem equals the basename, whatever the extension
//!   (`config.yml`, `config.json`, plain `config`). Locations are visited in
//!   order, entries within a location sorted by file name. Missing or
//!   unreadable locations are skipped.
//! - **Glob patterns** ([`FilesSource::globs`]): every file matching each
//!   pattern, patterns visited in order.
//!
//! Only actual I/O errors on matched files are propagated.
//!
//! # Decoding
//!
//! Each input is decoded into a [`Document`], YAML first, then JSON. Content
//! that is neither is an [`UnsupportedFormat`](ConfigError::UnsupportedFormat)
//! error in strict mode and skipped with a warning otherwise. Files default to
//! strict, readers to lenient.
//!
//! # Resolution
//!
//! Documents are layered in load order: for any field, the last document that
//! has the key wins. The key is the field's path joined by the separator
//! (default `.`), where every ancestor with a `file=` override contributes
//! that override instead of its name. A field's own `file=` override replaces
//! its leaf name, or the whole path when it contains the separator. Section
//! descriptors are never read; their children resolve individually.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::document::Document;
use crate::error::ConfigError;
use crate::field::Field;
use crate::source::{Raw, Source};
use crate::tag::FILE_KEY;

pub const DEFAULT_SEPARATOR: &str = ".";

/// Decoded documents, lowest priority first.
#[derive(Debug, Default)]
struct Layers {
    documents: Vec<Document>,
}

impl Layers {
    fn push(&mut self, origin: &str, bytes: &[u8], strict: bool) -> Result<(), ConfigError> {
        match std::str::from_utf8(bytes).ok().and_then(Document::parse) {
            Some(doc) => {
                tracing::debug!(origin, keys = doc.len(), "loaded config document");
                self.documents.push(doc);
            }
            None if strict => {
                return Err(ConfigError::UnsupportedFormat {
                    origin: origin.to_string(),
                });
            }
            None => {
                tracing::warn!(origin, "skipping config document that is neither YAML nor JSON");
            }
        }
        Ok(())
    }

    fn read(&self, field: &Field<'_>, separator: &str) -> Option<Raw> {
        if field.is_section() {
            return None;
        }
        let key = file_key(field, separator);
        self.documents
            .iter()
            .rev()
            .find_map(|doc| doc.get_joined(&key, separator))
            .map(|value| Raw::Structured(value.clone()))
    }
}

/// Document key for `field`, joined by `separator`.
pub fn file_key(field: &Field<'_>, separator: &str) -> String {
    match field.tags().file.as_deref() {
        Some(absolute) if absolute.contains(separator) => absolute.to_string(),
        Some(leaf) => {
            let mut parts = field.base_names(FILE_KEY);
            parts.push(leaf);
            parts.join(separator)
        }
        None => field.hierarchical_name(FILE_KEY, separator),
    }
}

#[derive(Debug, Clone)]
enum Inputs {
    Locations {
        locations: Vec<PathBuf>,
        basenames: Vec<String>,
    },
    Globs(Vec<String>),
}

/// Reads YAML or JSON config files from disk.
#[derive(Debug)]
pub struct FilesSource {
    inputs: Inputs,
    separator: String,
    strict: bool,
    layers: Layers,
}

impl FilesSource {
    /// Files named `basename` (any extension) in each of `locations`.
    pub fn new<P: Into<PathBuf>>(
        locations: impl IntoIterator<Item = P>,
        basename: impl Into<String>,
    ) -> Self {
        Self::basenames(locations, [basename.into()])
    }

    /// Like [`new`](Self::new), matching any of several basenames.
    pub fn basenames<P: Into<PathBuf>, S: Into<String>>(
        locations: impl IntoIterator<Item = P>,
        basenames: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::with_inputs(Inputs::Locations {
            locations: locations.into_iter().map(Into::into).collect(),
            basenames: basenames.into_iter().map(Into::into).collect(),
        })
    }

    /// Files matching any of the glob `patterns`.
    pub fn globs<S: Into<String>>(patterns: impl IntoIterator<Item = S>) -> Self {
        Self::with_inputs(Inputs::Globs(
            patterns.into_iter().map(Into::into).collect(),
        ))
    }

    fn with_inputs(inputs: Inputs) -> Self {
        Self {
            inputs,
            separator: DEFAULT_SEPARATOR.to_string(),
            strict: true,
            layers: Layers::default(),
        }
    }

    /// Separator between nesting levels in document keys and `file=` overrides.
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// When `false`, files that are neither YAML nor JSON are skipped with a
    /// warning instead of failing the resolution.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// The concrete files this source would load, in load order.
    pub fn matches(&self) -> Result<Vec<PathBuf>, ConfigError> {
        match &self.inputs {
            Inputs::Locations {
                locations,
                basenames,
            } => Ok(locations
                .iter()
                .flat_map(|dir| matches_in_dir(dir, basenames))
                .collect()),
            Inputs::Globs(patterns) => {
                let mut found = Vec::new();
                for pattern in patterns {
                    found.extend(glob_matches(pattern)?);
                }
                Ok(found)
            }
        }
    }
}

/// Entries of `dir` whose stem is one of `basenames`, sorted by name.
/// A directory that can't be listed yields nothing.
fn matches_in_dir(dir: &Path, basenames: &[String]) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "skipping config location");
            return Vec::new();
        }
    };

    let mut found: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .is_some_and(|stem| basenames.iter().any(|b| b == stem))
        })
        .collect();
    found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    found
}

fn glob_matches(pattern: &str) -> Result<Vec<PathBuf>, ConfigError> {
    let paths = glob::glob(pattern).map_err(|e| ConfigError::InvalidGlob {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let mut found = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| ConfigError::IoError {
            path: e.path().to_path_buf(),
            source: e.into(),
        })?;
        if path.is_file() {
            found.push(path);
        }
    }
    Ok(found)
}

impl Source for FilesSource {
    fn name(&self) -> &str {
        "files"
    }

    fn init(&mut self, _fields: &[Field<'_>]) -> Result<(), ConfigError> {
        let mut layers = Layers::default();
        for path in self.matches()? {
            let bytes = std::fs::read(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            layers.push(&path.display().to_string(), &bytes, self.strict)?;
        }
        self.layers = layers;
        Ok(())
    }

    fn read(&self, field: &Field<'_>) -> Result<Option<Raw>, ConfigError> {
        Ok(self.layers.read(field, &self.separator))
    }
}

/// Reads YAML or JSON documents from arbitrary readers.
///
/// Readers are drained and dropped by the first resolution; their decoded
/// documents are kept for later ones.
pub struct ReaderSource {
    readers: Vec<Box<dyn Read>>,
    separator: String,
    strict: bool,
    loaded: usize,
    layers: Layers,
}

impl ReaderSource {
    pub fn new(readers: impl IntoIterator<Item = Box<dyn Read>>) -> Self {
        Self {
            readers: readers.into_iter().collect(),
            separator: DEFAULT_SEPARATOR.to_string(),
            strict: false,
            loaded: 0,
            layers: Layers::default(),
        }
    }

    /// Add one more reader after the existing ones.
    pub fn reader(mut self, reader: impl Read + 'static) -> Self {
        self.readers.push(Box::new(reader));
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// When `true`, undecodable content fails the resolution.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

impl Source for ReaderSource {
    fn name(&self) -> &str {
        "readers"
    }

    fn init(&mut self, _fields: &[Field<'_>]) -> Result<(), ConfigError> {
        for mut reader in std::mem::take(&mut self.readers) {
            let origin = format!("reader #{}", self.loaded);
            self.loaded += 1;
            let mut bytes = Vec::new();
            reader
                .read_to_end(&mut bytes)
                .map_err(|e| ConfigError::ReadError {
                    origin: origin.clone(),
                    source: e,
                })?;
            drop(reader);
            self.layers.push(&origin, &bytes, self.strict)?;
        }
        Ok(())
    }

    fn read(&self, field: &Field<'_>) -> Result<Option<Raw>, ConfigError> {
        Ok(self.layers.read(field, &self.separator))
    }
}
