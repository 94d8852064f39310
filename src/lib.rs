//! Fill a typed config struct from files, environment variables and
//! command-line flags.
//!
//! Define a struct, set its defaults the normal way, and let the sources
//! override whatever they provide:
//!
//! ```ignore
//! use std::time::Duration;
//! use collectfig::Record;
//!
//! #[derive(Record)]
//! struct Config {
//!     /// Port to listen on.
//!     #[config(tag = "flag=p")]
//!     port: u16,
//!     #[config(nested)]
//!     db: Db,
//! }
//!
//! #[derive(Record, Default)]
//! struct Db {
//!     timeout: Duration,
//! }
//!
//! let mut cfg = Config { port: 8080, db: Db::default() };
//! collectfig::get(&mut cfg)?;
//! ```
//!
//! That single call reads `config.yml` / `config.json` (any file named
//! `config.*`) from the working directory, then `PORT` and `DB_TIMEOUT` from
//! the environment, then `--port` / `-p` and `--db-timeout` from the command
//! line. Each source overrides the ones before it.
//!
//! # Sources and precedence
//!
//! ```text
//! Caller's values      whatever the struct held before the call
//!        ↑ overridden by
//! Files                FilesSource: locations + basename, or globs
//!        ↑ overridden by
//! Environment vars     EnvSource: PREFIX_DB_TIMEOUT
//!        ↑ overridden by
//! Flags                FlagsSource: --db-timeout
//! ```
//!
//! [`Collector`] takes any list of sources in any order; the defaults above
//! are only what [`get`] and [`Collector::with_defaults`] set up. Readers
//! ([`ReaderSource`]) and your own [`Source`] implementations slot in the
//! same way.
//!
//! Sources are **sparse**: a field no source mentions keeps its value. A
//! field a source sets to an empty value (`PORT=`, `--port ""`, `port: ~`) is
//! reset to `Default::default()`. "Not provided" and "provided empty" are
//! never confused.
//!
//! # Naming
//!
//! Each source derives a name from the field's path:
//!
//! | path         | files        | env          | flags           |
//! |--------------|--------------|--------------|-----------------|
//! | `port`       | `port`       | `PORT`       | `--port`        |
//! | `db.timeout` | `db.timeout` | `DB_TIMEOUT` | `--db-timeout`  |
//!
//! File keys and env names are matched case-insensitively. Separators and the
//! env prefix are configurable per source.
//!
//! A field's tag overrides the derived names:
//!
//! ```text
//! #[config(tag = "env=LISTEN_PORT,file=listen,flag=p port")]
//! ```
//!
//! - `env=NAME` replaces the whole env name (the prefix is still applied).
//! - `file=name` replaces the field's own key; `file=server.port` (containing
//!   the separator) is a full path from the document root.
//! - `flag=p` adds a short alias; `flag=port` adds a long flag that several
//!   fields may share. The field's own `--path-name` flag wins over it.
//!
//! An override on a nested section replaces that section's segment in every
//! child's derived name. A field's own override always wins outright over its
//! derived name.
//!
//! # Types
//!
//! Anything implementing [`Coerce`] + `Default` can be a field: integers,
//! floats, complex numbers (`"1+2i"`), `bool`, `String`, `char`, `PathBuf`,
//! `Duration` (`"1h30m"`), `chrono` timestamps (RFC 3339), `Vec<String>`
//! (`"a,b,c"`), string maps (`"k=v,k2=v2"`) and `Option<T>`. IP and socket
//! addresses have no default, so declare them as `Option<IpAddr>` and the
//! like. Your own types opt in with [`coerce_from_str!`] or
//! [`coerce_from_json!`].
//!
//! # Errors
//!
//! Configuration problems (unreadable files, malformed documents, values that
//! don't parse) are returned as [`ConfigError`] naming the field and the
//! source. Mistakes in the struct definition itself, like a malformed tag or
//! two fields claiming the same flag, panic on the first call.
//!
//! # Logging
//!
//! The crate emits [`tracing`](https://docs.rs/tracing) events: loaded
//! documents and assignments at `debug`, skipped content at `warn`, dropped
//! command-line arguments at `trace`. Install any subscriber to see them.

extern crate self as collectfig;

pub mod coerce;
pub mod error;
pub mod tag;

mod collector;
mod document;
mod env;
mod field;
mod file;
mod flags;
mod source;

#[cfg(test)]
mod fixtures;

pub use coerce::{Coerce, Setting};
pub use collector::{Collector, DEFAULT_BASENAME, get};
pub use document::Document;
pub use env::EnvSource;
pub use error::{CoerceError, ConfigError, SchemaError};
pub use field::{Discovery, Field, Record, Segment, discover};
pub use file::{FilesSource, ReaderSource};
pub use flags::FlagsSource;
pub use source::{Raw, Source};
pub use tag::{FlagTag, Tags};

#[cfg(feature = "derive")]
pub use collectfig_derive::Record;

#[doc(hidden)]
pub use serde_json;
