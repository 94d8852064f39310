//! Environment variables as a config source.
//!
//! A field `db.timeout` with prefix `app` and the default `_` separator is
//! read from `APP_DB_TIMEOUT`. Ancestors with an `env=` override contribute
//! the override instead of their name. A field's own `env=` override replaces
//! the whole name after the prefix, so `env=TIMEOUT` reads `APP_TIMEOUT`.
//! Names are compared upper-cased.
//!
//! The environment is snapshotted once per resolution in [`Source::init`].

use std::collections::HashMap;

use crate::error::ConfigError;
use crate::field::Field;
use crate::source::{Raw, Source};
use crate::tag::ENV_KEY;

pub const DEFAULT_SEPARATOR: &str = "_";

#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    separator: String,
    pinned: Option<Vec<(String, String)>>,
    snapshot: HashMap<String, String>,
}

impl EnvSource {
    /// Read variables starting with `prefix`. An empty prefix reads bare names.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: DEFAULT_SEPARATOR.to_string(),
            pinned: None,
            snapshot: HashMap::new(),
        }
    }

    /// Separator between the prefix and nesting levels.
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Use these pairs instead of the process environment.
    ///
    /// Takes an iterator so tests can pass synthetic data instead of
    /// `std::env::vars()`.
    pub fn vars<K: Into<String>, V: Into<String>>(
        mut self,
        vars: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.pinned = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// The variable name `field` is read from.
    pub fn env_name(&self, field: &Field<'_>) -> String {
        let name = match field.tags().env.as_deref() {
            Some(name) => name.to_string(),
            None => field.hierarchical_name(ENV_KEY, &self.separator),
        };
        let full = if self.prefix.is_empty() {
            name
        } else {
            format!("{}{}{}", self.prefix, self.separator, name)
        };
        full.to_uppercase()
    }
}

/// Upper-cased lookup table.
fn snapshot(vars: impl IntoIterator<Item = (String, String)>) -> HashMap<String, String> {
    vars.into_iter()
        .map(|(k, v)| (k.to_uppercase(), v))
        .collect()
}

impl Source for EnvSource {
    fn name(&self) -> &str {
        "env"
    }

    fn init(&mut self, _fields: &[Field<'_>]) -> Result<(), ConfigError> {
        self.snapshot = match &self.pinned {
            Some(vars) => snapshot(vars.iter().cloned()),
            // Non-UTF-8 entries are skipped.
            None => snapshot(std::env::vars_os().filter_map(|(k, v)| {
                Some((k.into_string().ok()?, v.into_string().ok()?))
            })),
        };
        Ok(())
    }

    fn read(&self, field: &Field<'_>) -> Result<Option<Raw>, ConfigError> {
        if field.is_section() {
            return Ok(None);
        }
        Ok(self
            .snapshot
            .get(&self.env_name(field))
            .map(|value| Raw::Text(value.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::discover;
    use crate::fixtures::test::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn names(source: &EnvSource, fields: &[Field<'_>]) -> Vec<String> {
        fields
            .iter()
            .filter(|f| !f.is_section())
            .map(|f| source.env_name(f))
            .collect()
    }

    fn read(source: &EnvSource, fields: &[Field<'_>], path: &str) -> Option<Raw> {
        let field = fields.iter().find(|f| f.path() == path).unwrap();
        source.read(field).unwrap()
    }

    #[test]
    fn names_without_prefix() {
        let mut cfg = Server::default();
        let fields = discover(&mut cfg);
        let source = EnvSource::new("");
        assert_eq!(
            names(&source, &fields),
            vec!["PORT", "DB_URL", "DB_TIMEOUT", "DB_POOL_SIZE"]
        );
    }

    #[test]
    fn names_with_prefix_and_separator() {
        let mut cfg = Server::default();
        let fields = discover(&mut cfg);
        let source = EnvSource::new("app").separator("__");
        assert_eq!(
            names(&source, &fields),
            vec!["APP__PORT", "APP__DB__URL", "APP__DB__TIMEOUT", "APP__DB__POOL__SIZE"]
        );
    }

    #[test]
    fn overrides_replace_name_but_keep_prefix() {
        let mut cfg = Tagged::default();
        let fields = discover(&mut cfg);
        let source = EnvSource::new("test");
        assert_eq!(names(&source, &fields), vec!["TEST_IN_VALUE", "TEST_OTHER_NAME"]);
    }

    #[test]
    fn reads_from_snapshot() {
        let mut cfg = Server::default();
        let fields = discover(&mut cfg);
        let mut source = EnvSource::new("").vars(vars(&[("PORT", "8080"), ("DB_URL", "pg://")]));
        source.init(&fields).unwrap();

        assert_eq!(read(&source, &fields, "port"), Some(Raw::Text("8080".into())));
        assert_eq!(read(&source, &fields, "db.url"), Some(Raw::Text("pg://".into())));
        assert_eq!(read(&source, &fields, "db.timeout"), None);
        assert_eq!(read(&source, &fields, "db"), None);
    }

    #[test]
    fn lookup_ignores_case_of_variable_names() {
        let mut cfg = Flat::default();
        let fields = discover(&mut cfg);
        let mut source = EnvSource::new("App").vars(vars(&[("app_Name", "x")]));
        source.init(&fields).unwrap();
        assert_eq!(read(&source, &fields, "name"), Some(Raw::Text("x".into())));
    }

    #[test]
    fn empty_value_is_present() {
        let mut cfg = Flat::default();
        let fields = discover(&mut cfg);
        let mut source = EnvSource::new("").vars(vars(&[("NAME", "")]));
        source.init(&fields).unwrap();
        assert_eq!(read(&source, &fields, "name"), Some(Raw::Text(String::new())));
        assert_eq!(read(&source, &fields, "port"), None);
    }

    #[test]
    fn override_suppresses_default_name() {
        let mut cfg = Tagged::default();
        let fields = discover(&mut cfg);
        let mut source = EnvSource::new("").vars(vars(&[("RENAMED", "default")]));
        source.init(&fields).unwrap();
        assert_eq!(read(&source, &fields, "renamed"), None);
    }

    #[test]
    fn override_is_read() {
        let mut cfg = Tagged::default();
        let fields = discover(&mut cfg);
        let mut source = EnvSource::new("").vars(vars(&[("OTHER_NAME", "o"), ("IN_VALUE", "i")]));
        source.init(&fields).unwrap();
        assert_eq!(read(&source, &fields, "renamed"), Some(Raw::Text("o".into())));
        assert_eq!(read(&source, &fields, "inner.value"), Some(Raw::Text("i".into())));
    }

    #[test]
    fn value_containing_equals_is_kept_whole() {
        let mut cfg = Flat::default();
        let fields = discover(&mut cfg);
        let mut source = EnvSource::new("").vars(vars(&[("NAME", "a=b=c")]));
        source.init(&fields).unwrap();
        assert_eq!(read(&source, &fields, "name"), Some(Raw::Text("a=b=c".into())));
    }

    #[test]
    fn init_refreshes_snapshot() {
        let mut cfg = Flat::default();
        let fields = discover(&mut cfg);
        let mut source = EnvSource::new("").vars(vars(&[("NAME", "one")]));
        source.init(&fields).unwrap();
        source = source.vars(vars(&[("NAME", "two")]));
        source.init(&fields).unwrap();
        assert_eq!(read(&source, &fields, "name"), Some(Raw::Text("two".into())));
    }
}
