//! Command-line flags as a config source, parsed with clap.
//!
//! Every leaf field gets a string-valued long flag named after its path,
//! lower-cased and joined by the separator (default `-`): `db.timeout` becomes
//! `--db-timeout`. Ancestors with a `flag=` long override contribute the
//! override instead of their name.
//!
//! A field's `flag=` tag adds:
//!
//! - a **short alias** (`flag=p`) for the field's own flag;
//! - a **shared long flag** (`flag=port`). Several fields may name the same
//!   shared flag; the first registers it, later ones reuse it. When both the
//!   field's own flag and the shared flag are passed, the field's own flag
//!   wins.
//!
//! Flags the record doesn't know about, and positional arguments, are dropped
//! before parsing so the rest of the program's command line never breaks
//! resolution. `--help` (and `-h` unless a field claims it) returns
//! [`ConfigError::HelpRequested`] with the rendered usage.

use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::Path;

use clap::error::ErrorKind;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

use crate::error::ConfigError;
use crate::field::Field;
use crate::source::{Raw, Source};
use crate::tag::FLAG_KEY;

pub const DEFAULT_SEPARATOR: &str = "-";

const HELP_ID: &str = "help";

/// The flags that can set one field, in precedence order.
#[derive(Debug, Clone)]
struct Binding {
    own: String,
    shared: Option<String>,
}

#[derive(Debug, Default)]
pub struct FlagsSource {
    separator: Option<String>,
    pinned: Option<Vec<OsString>>,
    bindings: HashMap<String, Binding>,
    matches: Option<ArgMatches>,
}

impl FlagsSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Separator between nesting levels in flag names.
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    /// Parse these arguments (without the program name) instead of the
    /// process command line.
    pub fn args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        self.pinned = Some(args.into_iter().map(Into::into).collect());
        self
    }

    fn sep(&self) -> &str {
        self.separator.as_deref().unwrap_or(DEFAULT_SEPARATOR)
    }

    /// The field's own long flag name, without leading dashes.
    pub fn flag_name(&self, field: &Field<'_>) -> String {
        field.hierarchical_name(FLAG_KEY, self.sep()).to_lowercase()
    }

    /// Build the clap command for `fields`, recording which flags feed which
    /// field.
    ///
    /// # Panics
    ///
    /// If two fields end up with the same flag name or the same short alias.
    fn command(&mut self, fields: &[Field<'_>]) -> Command {
        let mut cmd = Command::new(program_name())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .args_override_self(true);

        let mut longs: HashSet<String> = HashSet::new();
        let mut shorts: HashSet<char> = HashSet::new();
        self.bindings.clear();

        let leaves = || fields.iter().filter(|f| !f.is_section());

        for field in leaves() {
            let long = self.flag_name(field);
            if !longs.insert(long.clone()) {
                panic!("collectfig: flag --{long} is defined twice");
            }

            let mut arg = value_arg(&long, field.doc());
            if let Some(short) = field.tags().flag.short {
                if !shorts.insert(short) {
                    panic!("collectfig: short flag -{short} is defined twice");
                }
                arg = arg.short(short);
            }
            cmd = cmd.arg(arg);

            self.bindings.insert(
                field.path(),
                Binding {
                    own: long,
                    shared: None,
                },
            );
        }

        // Shared flags after every field's own flag, so a shared name that
        // matches an existing flag reuses it.
        for field in leaves() {
            let Some(shared) = field.tags().flag.long.as_deref() else {
                continue;
            };
            let shared = shared.to_lowercase();
            if longs.insert(shared.clone()) {
                cmd = cmd.arg(value_arg(&shared, field.doc()));
            }
            if let Some(binding) = self.bindings.get_mut(&field.path()) {
                binding.shared = Some(shared);
            }
        }

        if !longs.contains(HELP_ID) {
            let mut help = Arg::new(HELP_ID)
                .long(HELP_ID)
                .action(ArgAction::Help)
                .help("Print help");
            if !shorts.contains(&'h') {
                help = help.short('h');
            }
            cmd = cmd.arg(help);
        }

        cmd
    }
}

fn value_arg(long: &str, doc: Option<&'static str>) -> Arg {
    let mut arg = Arg::new(long.to_string())
        .long(long.to_string())
        .num_args(1)
        .allow_hyphen_values(true)
        .action(ArgAction::Set)
        .value_parser(value_parser!(String));
    if let Some(doc) = doc {
        arg = arg.help(doc);
    }
    arg
}

fn program_name() -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .map(Path::new)
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| "app".to_string())
}

/// Drop positional arguments and flags `cmd` doesn't define, along with the
/// value following an unknown flag when it doesn't look like a flag itself.
fn known_args(cmd: &Command, args: Vec<OsString>) -> Vec<OsString> {
    let takes_value = |arg: &Arg| !matches!(arg.get_action(), ArgAction::Help);
    let long = |name: &str| cmd.get_arguments().find(|a| a.get_long() == Some(name));
    let short = |c: char| cmd.get_arguments().find(|a| a.get_short() == Some(c));

    let mut kept = Vec::with_capacity(args.len());
    let mut iter = args.into_iter().peekable();
    while let Some(arg) = iter.next() {
        let Some(text) = arg.to_str() else {
            tracing::trace!(arg = ?arg, "dropping non-UTF-8 positional argument");
            continue;
        };

        if text == "--" {
            break;
        }

        let (known, inline_value) = if let Some(rest) = text.strip_prefix("--") {
            let (name, value) = match rest.split_once('=') {
                Some((name, _)) => (name, true),
                None => (rest, false),
            };
            (long(name), value)
        } else if let Some(rest) = text.strip_prefix('-').filter(|r| !r.is_empty()) {
            let mut chars = rest.chars();
            let c = chars.next();
            (c.and_then(short), chars.next().is_some())
        } else {
            tracing::trace!(arg = text, "dropping positional argument");
            continue;
        };

        match known {
            Some(def) => {
                let needs_value = takes_value(def) && !inline_value;
                kept.push(arg);
                if needs_value {
                    if let Some(value) = iter.next() {
                        kept.push(value);
                    }
                }
            }
            None => {
                tracing::trace!(arg = text, "dropping unknown flag");
                if !inline_value
                    && iter
                        .peek()
                        .and_then(|next| next.to_str())
                        .is_some_and(|next| !next.starts_with('-'))
                {
                    iter.next();
                }
            }
        }
    }
    kept
}

impl Source for FlagsSource {
    fn name(&self) -> &str {
        "flags"
    }

    fn init(&mut self, fields: &[Field<'_>]) -> Result<(), ConfigError> {
        let mut cmd = self.command(fields);
        let args = match &self.pinned {
            Some(args) => args.clone(),
            None => std::env::args_os().skip(1).collect(),
        };
        let args = known_args(&cmd, args);

        match cmd.try_get_matches_from_mut(args) {
            Ok(matches) => {
                self.matches = Some(matches);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::DisplayHelp => Err(ConfigError::HelpRequested {
                usage: cmd.render_help().to_string(),
            }),
            Err(e) => Err(ConfigError::FlagParse(e)),
        }
    }

    fn read(&self, field: &Field<'_>) -> Result<Option<Raw>, ConfigError> {
        let (Some(matches), Some(binding)) = (&self.matches, self.bindings.get(&field.path()))
        else {
            return Ok(None);
        };

        let passed = |id: &str| {
            (matches.value_source(id) == Some(ValueSource::CommandLine))
                .then(|| matches.get_one::<String>(id))
                .flatten()
        };

        Ok(passed(&binding.own)
            .or_else(|| binding.shared.as_deref().and_then(passed))
            .map(|value| Raw::Text(value.clone())))
    }
}
