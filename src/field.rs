//! Field discovery: walking a record into a flat list of descriptors.
//!
//! A [`Record`] reports its fields to a [`Discovery`] in declaration order.
//! Leaves are registered with [`Discovery::value`] and carry a mutable handle
//! to the caller's storage. Nested records are registered with
//! [`Discovery::nested`], which emits a section descriptor (no storage) and
//! then walks the child with the section appended to the base path.
//!
//! Descriptors borrow the record for the lifetime of one resolution and are
//! thrown away afterwards. `#[derive(Record)]` writes the walk for you; the
//! trait can also be implemented by hand:
//!
//! ```ignore
//! impl Record for Server {
//!     fn fields<'a>(&'a mut self, d: &mut Discovery<'a>) {
//!         d.value("port", "flag=p", Some("port to listen on"), &mut self.port);
//!         d.nested("db", "", None, &mut self.db);
//!     }
//! }
//! ```

use crate::coerce::Setting;
use crate::error::CoerceError;
use crate::source::Raw;
use crate::tag::{self, Tags};

/// A struct whose fields can be filled from configuration sources.
pub trait Record {
    fn fields<'a>(&'a mut self, d: &mut Discovery<'a>);
}

/// A `None` section is filled with `R::default()` before its fields are visited.
impl<R: Record + Default> Record for Option<R> {
    fn fields<'a>(&'a mut self, d: &mut Discovery<'a>) {
        self.get_or_insert_with(R::default).fields(d)
    }
}

impl<R: Record + ?Sized> Record for Box<R> {
    fn fields<'a>(&'a mut self, d: &mut Discovery<'a>) {
        (**self).fields(d)
    }
}

/// One ancestor on a field's path: its name and the overrides it declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: &'static str,
    pub tags: Tags,
}

impl Segment {
    /// This segment's contribution to a hierarchical name for `source`.
    pub fn name_for(&self, source: &str) -> &str {
        self.tags.get(source).unwrap_or(self.name)
    }
}

pub(crate) enum Slot<'a> {
    Value(&'a mut dyn Setting),
    /// A nested record. Its children carry their own descriptors.
    Section,
}

/// Descriptor of one discovered field.
pub struct Field<'a> {
    base: Vec<Segment>,
    name: &'static str,
    tags: Tags,
    doc: Option<&'static str>,
    slot: Slot<'a>,
}

impl<'a> Field<'a> {
    pub fn base(&self) -> &[Segment] {
        &self.base
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// First doc-comment line, if any. Used as flag help.
    pub fn doc(&self) -> Option<&'static str> {
        self.doc
    }

    pub fn is_section(&self) -> bool {
        matches!(self.slot, Slot::Section)
    }

    /// Dotted path from the record root, e.g. `db.timeout`. Used in errors.
    pub fn path(&self) -> String {
        self.hierarchical_name("", ".")
    }

    /// Ancestor names as seen by `source`: each ancestor's own override for
    /// that source if it declared one, otherwise its name.
    pub fn base_names(&self, source: &str) -> Vec<&str> {
        self.base.iter().map(|s| s.name_for(source)).collect()
    }

    /// Ancestors (with their `source` overrides) and this field's own name,
    /// joined by `separator`. The field's own override is not applied.
    pub fn hierarchical_name(&self, source: &str, separator: &str) -> String {
        let mut parts = self.base_names(source);
        parts.push(self.name);
        parts.join(separator)
    }

    pub(crate) fn assign(&mut self, raw: &Raw) -> Result<(), CoerceError> {
        match &mut self.slot {
            Slot::Value(setting) => setting.assign(raw),
            Slot::Section => Ok(()),
        }
    }
}

impl std::fmt::Debug for Field<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("path", &self.path())
            .field("tags", &self.tags)
            .field("section", &self.is_section())
            .finish()
    }
}

/// Collects descriptors while a record walks itself.
#[derive(Default)]
pub struct Discovery<'a> {
    base: Vec<Segment>,
    fields: Vec<Field<'a>>,
}

impl<'a> Discovery<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an assignable field.
    ///
    /// # Panics
    ///
    /// If `tag` is malformed or the name is already registered at this level.
    pub fn value(
        &mut self,
        name: &'static str,
        tag: &str,
        doc: Option<&'static str>,
        slot: &'a mut dyn Setting,
    ) {
        let tags = self.parse_tag(name, tag);
        self.push(name, tags, doc, Slot::Value(slot));
    }

    /// Register a nested record and walk its fields.
    ///
    /// # Panics
    ///
    /// Same as [`value`](Self::value).
    pub fn nested<R: Record + ?Sized>(
        &mut self,
        name: &'static str,
        tag: &str,
        doc: Option<&'static str>,
        record: &'a mut R,
    ) {
        let tags = self.parse_tag(name, tag);
        self.push(name, tags.clone(), doc, Slot::Section);
        self.base.push(Segment { name, tags });
        record.fields(self);
        self.base.pop();
    }

    pub fn into_fields(self) -> Vec<Field<'a>> {
        self.fields
    }

    fn parse_tag(&self, name: &str, tag: &str) -> Tags {
        tag::parse(tag).unwrap_or_else(|e| panic!("collectfig: field '{}': {e}", self.dotted(name)))
    }

    fn push(&mut self, name: &'static str, tags: Tags, doc: Option<&'static str>, slot: Slot<'a>) {
        if self
            .fields
            .iter()
            .any(|f| f.name == name && f.base == self.base)
        {
            panic!("collectfig: field '{}' registered twice", self.dotted(name));
        }
        self.fields.push(Field {
            base: self.base.clone(),
            name,
            tags,
            doc,
            slot,
        });
    }

    fn dotted(&self, name: &str) -> String {
        let mut parts: Vec<&str> = self.base.iter().map(|s| s.name).collect();
        parts.push(name);
        parts.join(".")
    }
}

/// Walk `record` and return its field descriptors in declaration order.
pub fn discover<R: Record + ?Sized>(record: &mut R) -> Vec<Field<'_>> {
    let mut d = Discovery::new();
    record.fields(&mut d);
    d.into_fields()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::*;

    fn paths(fields: &[Field<'_>]) -> Vec<String> {
        fields.iter().map(|f| f.path()).collect()
    }

    #[test]
    fn flat_record_in_declaration_order() {
        let mut cfg = Flat::default();
        let fields = discover(&mut cfg);
        assert_eq!(paths(&fields), vec!["name", "port", "debug"]);
        assert!(fields.iter().all(|f| f.base().is_empty()));
    }

    #[test]
    fn nested_records_emit_section_then_children() {
        let mut cfg = Server::default();
        let fields = discover(&mut cfg);
        assert_eq!(
            paths(&fields),
            vec!["port", "db", "db.url", "db.timeout", "db.pool", "db.pool.size"]
        );
        let db = &fields[1];
        assert!(db.is_section());
        let url = &fields[2];
        assert!(!url.is_section());
        assert_eq!(url.base().len(), 1);
        assert_eq!(url.base()[0].name, "db");
        assert_eq!(url.name(), "url");
    }

    #[test]
    fn children_carry_ancestor_tags() {
        let mut cfg = Tagged::default();
        let fields = discover(&mut cfg);
        let leaf = fields.iter().find(|f| f.path() == "inner.value").unwrap();
        assert_eq!(leaf.base()[0].tags.env.as_deref(), Some("IN"));
        assert_eq!(leaf.hierarchical_name("env", "_"), "IN_value");
        assert_eq!(leaf.hierarchical_name("file", "."), "section.value");
        assert_eq!(leaf.hierarchical_name("flag", "-"), "grp-value");
        assert_eq!(leaf.path(), "inner.value");
    }

    #[test]
    fn tags_and_doc_are_recorded() {
        let mut cfg = Server::default();
        let fields = discover(&mut cfg);
        let port = &fields[0];
        assert_eq!(port.tags().flag.short, Some('p'));
        assert_eq!(port.doc(), Some("Port to listen on"));
    }

    #[test]
    fn none_section_is_filled_with_default() {
        let mut cfg = WithOptional::default();
        assert!(cfg.extra.is_none());
        let count = discover(&mut cfg).len();
        assert_eq!(count, 5);
        assert_eq!(cfg.extra, Some(Flat::default()));
    }

    #[test]
    fn boxed_record_is_walked() {
        let mut cfg: Box<Flat> = Box::default();
        assert_eq!(discover(&mut cfg).len(), 3);
    }

    #[test]
    fn assign_writes_through_to_record() {
        let mut cfg = Flat::default();
        {
            let mut fields = discover(&mut cfg);
            fields[1].assign(&Raw::Text("8080".into())).unwrap();
        }
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn empty_record_has_no_fields() {
        let mut cfg = Empty;
        assert!(discover(&mut cfg).is_empty());
    }

    #[test]
    #[should_panic(expected = "collectfig: field 'bad'")]
    fn malformed_tag_panics_with_field_path() {
        let mut cfg = BadTag::default();
        discover(&mut cfg);
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_name_panics() {
        struct Dup {
            a: u8,
            b: u8,
        }
        impl Record for Dup {
            fn fields<'a>(&'a mut self, d: &mut Discovery<'a>) {
                d.value("a", "", None, &mut self.a);
                d.value("a", "", None, &mut self.b);
            }
        }
        discover(&mut Dup { a: 0, b: 0 });
    }
}
