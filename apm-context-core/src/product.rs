use std::fmt;

/// Datastore backend categories segments are reported under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DatastoreProduct {
    Postgres,
    MySql,
    Sqlite,
    Mssql,
    Redis,
}

impl DatastoreProduct {
    /// The `db.system.name` value reported for this backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            DatastoreProduct::Postgres => "postgresql",
            DatastoreProduct::MySql => "mysql",
            DatastoreProduct::Sqlite => "sqlite",
            DatastoreProduct::Mssql => "mssql",
            DatastoreProduct::Redis => "redis",
        }
    }
}

impl fmt::Display for DatastoreProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
