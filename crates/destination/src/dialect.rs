//! SQL dialect differences between the supported destination drivers.

use crate::InsertError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    /// Pick the dialect from a DSN's scheme.
    pub fn from_dsn(dsn: &str) -> Result<Self, InsertError> {
        let scheme = dsn
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .unwrap_or_default();

        match scheme.as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(InsertError::UnsupportedDsn(redact(dsn))),
        }
    }

    /// Pick the dialect from `AnyConnection::backend_name()`.
    pub fn from_backend_name(name: &str) -> Option<Self> {
        match name {
            "PostgreSQL" => Some(Self::Postgres),
            "MySQL" => Some(Self::MySql),
            "SQLite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Quote an identifier, doubling any embedded quote character.
    pub fn quote(self, ident: &str) -> String {
        match self {
            Self::MySql => format!("`{}`", ident.replace('`', "``")),
            Self::Postgres | Self::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    /// Bind placeholder for the 1-based parameter `n`.
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Self::Postgres => format!("${n}"),
            Self::MySql | Self::Sqlite => "?".to_string(),
        }
    }

    /// Query returning a table's column names in ordinal order. Takes the
    /// table name as its only parameter.
    pub fn columns_query(self) -> &'static str {
        match self {
            Self::Postgres => {
                "SELECT column_name::text FROM information_schema.columns \
                 WHERE table_schema = current_schema() AND table_name = $1 \
                 ORDER BY ordinal_position"
            }
            Self::MySql => {
                "SELECT CAST(column_name AS CHAR) FROM information_schema.columns \
                 WHERE table_schema = DATABASE() AND table_name = ? \
                 ORDER BY ordinal_position"
            }
            Self::Sqlite => "SELECT name FROM pragma_table_info(?) ORDER BY cid",
        }
    }
}

/// Strip everything after the scheme so credentials never reach logs.
fn redact(dsn: &str) -> String {
    match dsn.split_once("://") {
        Some((scheme, _)) => format!("{scheme}://…"),
        None => "<unrecognised>".to_string(),
    }
}
