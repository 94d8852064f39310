#[cfg(test)]
pub mod test {
    use std::collections::HashMap;
    use std::time::Duration;

    use crate::field::{Discovery, Record};
    use crate::source::{Raw, Source};
    use crate::{ConfigError, Field};

    // Records are implemented by hand here so unit tests don't depend on the
    // derive crate.

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Flat {
        pub name: String,
        pub port: u16,
        pub debug: bool,
    }

    impl Record for Flat {
        fn fields<'a>(&'a mut self, d: &mut Discovery<'a>) {
            d.value("name", "", None, &mut self.name);
            d.value("port", "", None, &mut self.port);
            d.value("debug", "", None, &mut self.debug);
        }
    }

    #[derive(Debug, Default, PartialEq)]
    pub struct Server {
        pub port: u16,
        pub db: Db,
    }

    #[derive(Debug, Default, PartialEq)]
    pub struct Db {
        pub url: String,
        pub timeout: Duration,
        pub pool: Pool,
    }

    #[derive(Debug, Default, PartialEq)]
    pub struct Pool {
        pub size: usize,
    }

    impl Record for Server {
        fn fields<'a>(&'a mut self, d: &mut Discovery<'a>) {
            d.value("port", "flag=p", Some("Port to listen on"), &mut self.port);
            d.nested("db", "", Some("Database settings"), &mut self.db);
        }
    }

    impl Record for Db {
        fn fields<'a>(&'a mut self, d: &mut Discovery<'a>) {
            d.value("url", "", Some("Connection string"), &mut self.url);
            d.value("timeout", "", None, &mut self.timeout);
            d.nested("pool", "", None, &mut self.pool);
        }
    }

    impl Record for Pool {
        fn fields<'a>(&'a mut self, d: &mut Discovery<'a>) {
            d.value("size", "", None, &mut self.size);
        }
    }

    // -- Fixture for override tests --------------------------------------------

    #[derive(Debug, Default, PartialEq)]
    pub struct Tagged {
        pub inner: Inner,
        pub renamed: String,
    }

    #[derive(Debug, Default, PartialEq)]
    pub struct Inner {
        pub value: String,
    }

    impl Record for Tagged {
        fn fields<'a>(&'a mut self, d: &mut Discovery<'a>) {
            d.nested("inner", "env=IN,file=section,flag=grp", None, &mut self.inner);
            d.value(
                "renamed",
                "env=OTHER_NAME,file=alias,flag=r shared",
                None,
                &mut self.renamed,
            );
        }
    }

    impl Record for Inner {
        fn fields<'a>(&'a mut self, d: &mut Discovery<'a>) {
            d.value("value", "", None, &mut self.value);
        }
    }

    // -- Fixture for structured types -------------------------------------------

    #[derive(Debug, Default, PartialEq)]
    pub struct Rich {
        pub tags: Vec<String>,
        pub labels: HashMap<String, String>,
        pub limit: Option<u32>,
    }

    impl Record for Rich {
        fn fields<'a>(&'a mut self, d: &mut Discovery<'a>) {
            d.value("tags", "", None, &mut self.tags);
            d.value("labels", "", None, &mut self.labels);
            d.value("limit", "", None, &mut self.limit);
        }
    }

    #[derive(Debug, Default, PartialEq)]
    pub struct WithOptional {
        pub name: String,
        pub extra: Option<Flat>,
    }

    impl Record for WithOptional {
        fn fields<'a>(&'a mut self, d: &mut Discovery<'a>) {
            d.value("name", "", None, &mut self.name);
            d.nested("extra", "", None, &mut self.extra);
        }
    }

    #[derive(Debug, Default)]
    pub struct BadTag {
        pub bad: String,
    }

    impl Record for BadTag {
        fn fields<'a>(&'a mut self, d: &mut Discovery<'a>) {
            d.value("bad", "yaml=x", None, &mut self.bad);
        }
    }

    pub struct Empty;

    impl Record for Empty {
        fn fields<'a>(&'a mut self, _d: &mut Discovery<'a>) {}
    }

    // -- In-memory source ------------------------------------------------------

    /// Answers reads from a fixed path → text table.
    pub struct MapSource {
        pub name: &'static str,
        pub values: HashMap<String, String>,
    }

    impl MapSource {
        pub fn new<'a>(name: &'static str, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
            Self {
                name,
                values: pairs
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            }
        }
    }

    impl Source for MapSource {
        fn name(&self) -> &str {
            self.name
        }

        fn read(&self, field: &Field<'_>) -> Result<Option<Raw>, ConfigError> {
            Ok(self.values.get(&field.path()).cloned().map(Raw::Text))
        }
    }

    #[test]
    fn map_source_reads_by_path() {
        let source = MapSource::new("map", [("db.url", "x")]);
        let mut cfg = Server::default();
        let fields = crate::field::discover(&mut cfg);
        let url = fields.iter().find(|f| f.path() == "db.url").unwrap();
        assert_eq!(source.read(url).unwrap(), Some(Raw::Text("x".into())));
        assert_eq!(source.read(&fields[0]).unwrap(), None);
    }
}
