//! The resolution driver.
//!
//! [`Collector::get`] fills a record from its sources in order:
//!
//! 1. Discover the record's fields (a malformed tag panics here, before any
//!    source is touched).
//! 2. For each source, in the order added: `init` it with the field list,
//!    then `read` every leaf field.
//! 3. Coerce each value a source provides and write it into the record.
//!    Later sources overwrite earlier ones; fields no source provides keep
//!    whatever the caller put there.
//!
//! The first error from any source or coercion aborts the whole call. Fields
//! assigned before the error keep their new values.

use std::path::PathBuf;

use crate::env::EnvSource;
use crate::error::ConfigError;
use crate::field::{Record, discover};
use crate::file::FilesSource;
use crate::flags::FlagsSource;
use crate::source::Source;

/// Basename looked up by [`Collector::with_defaults`].
pub const DEFAULT_BASENAME: &str = "config";

/// An ordered list of sources, lowest priority first.
#[derive(Default)]
pub struct Collector {
    sources: Vec<Box<dyn Source>>,
}

impl Collector {
    /// A collector with no sources. `get` leaves every field untouched until
    /// sources are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Files named `config.*` in the working directory, then environment
    /// variables without a prefix, then command-line flags.
    pub fn with_defaults() -> Self {
        Self::new()
            .files(["."], DEFAULT_BASENAME)
            .env("")
            .flags()
    }

    /// Append a source. It overrides every source added before it.
    pub fn source(mut self, source: impl Source + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Shorthand for `.source(FilesSource::new(locations, basename))`.
    pub fn files<P: Into<PathBuf>>(
        self,
        locations: impl IntoIterator<Item = P>,
        basename: &str,
    ) -> Self {
        self.source(FilesSource::new(locations, basename))
    }

    /// Shorthand for `.source(EnvSource::new(prefix))`.
    pub fn env(self, prefix: &str) -> Self {
        self.source(EnvSource::new(prefix))
    }

    /// Shorthand for `.source(FlagsSource::new())`.
    pub fn flags(self) -> Self {
        self.source(FlagsSource::new())
    }

    /// Names of the configured sources, in order.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Fill `record` from every source.
    ///
    /// # Panics
    ///
    /// If a field's tag is malformed or two fields claim the same flag. Both
    /// are bugs in the record definition, not in the configuration.
    pub fn get<R: Record + ?Sized>(&mut self, record: &mut R) -> Result<(), ConfigError> {
        let mut fields = discover(record);

        for source in &mut self.sources {
            source.init(&fields)?;

            for field in fields.iter_mut().filter(|f| !f.is_section()) {
                let Some(raw) = source.read(field)? else {
                    continue;
                };
                field
                    .assign(&raw)
                    .map_err(|e| ConfigError::InvalidValue {
                        field: field.path(),
                        origin: source.name().to_string(),
                        raw: raw.display(),
                        source: e,
                    })?;
                tracing::debug!(field = %field.path(), source = source.name(), "assigned config value");
            }
        }

        Ok(())
    }
}

/// Fill `record` using [`Collector::with_defaults`].
pub fn get<R: Record + ?Sized>(record: &mut R) -> Result<(), ConfigError> {
    Collector::with_defaults().get(record)
}
