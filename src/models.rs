//! Shared value and change types used by every driver.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DriverError;

/// Sentinel cell rendered for a true SQL NULL.
pub const NULL_CELL: &str = "NULL&";

/// Sentinel cell rendered for an empty (but non-NULL) string.
pub const EMPTY_CELL: &str = "EMPTY&";

/// Page size substituted when a caller passes `limit == 0`.
pub const DEFAULT_ROW_LIMIT: usize = 300;

/// Fixed header row for [`crate::Driver::get_constraints`].
pub const CONSTRAINTS_HEADER: [&str; 4] = [
    "CONSTRAINT_NAME",
    "COLUMN_NAME",
    "REFERENCED_TABLE_NAME",
    "REFERENCED_COLUMN_NAME",
];

/// Fixed header row for [`crate::Driver::get_foreign_keys`].
pub const FOREIGN_KEYS_HEADER: [&str; 5] = [
    "TABLE_NAME",
    "COLUMN_NAME",
    "CONSTRAINT_NAME",
    "REFERENCED_COLUMN_NAME",
    "REFERENCED_TABLE_NAME",
];

/// Fixed header row for [`crate::Driver::get_indexes`].
pub const INDEXES_HEADER: [&str; 4] =
    ["INDEX_NAME", "COLUMN_NAME", "NON_UNIQUE", "INDEX_TYPE"];

/// Tabular query output: row 0 is always the column-header row.
pub type TableRows = Vec<Vec<String>>;

/// Build the header row of a tabular result from a fixed header constant.
#[must_use]
pub fn header_row(header: &[&str]) -> Vec<String> {
    header.iter().map(|h| (*h).to_string()).collect()
}

/// Render a non-NULL text cell, mapping the empty string to its sentinel.
#[must_use]
pub fn text_cell(value: &str) -> String {
    if value.is_empty() {
        EMPTY_CELL.to_string()
    } else {
        value.to_string()
    }
}

/// The supported SQL engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Mysql,
    Postgres,
    Sqlite,
    Mssql,
    Clickhouse,
}

impl Provider {
    /// Canonical URL scheme for this provider.
    #[must_use]
    pub fn as_scheme(&self) -> &'static str {
        match self {
            Provider::Mysql => "mysql",
            Provider::Postgres => "postgres",
            Provider::Sqlite => "sqlite",
            Provider::Mssql => "mssql",
            Provider::Clickhouse => "clickhouse",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_scheme())
    }
}

impl FromStr for Provider {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mysql" => Ok(Provider::Mysql),
            "postgres" | "postgresql" => Ok(Provider::Postgres),
            "sqlite" | "file" => Ok(Provider::Sqlite),
            "mssql" | "sqlserver" => Ok(Provider::Mssql),
            "clickhouse" => Ok(Provider::Clickhouse),
            other => Err(DriverError::Validation(format!(
                "unknown provider scheme: {other}"
            ))),
        }
    }
}

/// The kind of row edit a [`DmlChange`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DmlType {
    Insert,
    Update,
    Delete,
}

/// A staged cell value handed to the formatters and the query builder.
///
/// `Text("NULL")` and `Text("DEFAULT")` are keyword passthroughs: formatters
/// render them unquoted so a staged edit can set a column to SQL NULL or to
/// its default.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Int(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Float(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Text(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Text(value)
    }
}

impl From<Vec<u8>> for ArgValue {
    fn from(value: Vec<u8>) -> Self {
        ArgValue::Bytes(value)
    }
}

/// One pending row-level edit, staged by the caller and consumed by
/// [`crate::Driver::execute_pending_changes`].
///
/// `primary_key` must uniquely identify exactly one row in `table`. It is
/// unused for `Insert` and mandatory for `Update`/`Delete`, where it forms
/// the WHERE predicate in its given order.
#[derive(Debug, Clone)]
pub struct DmlChange {
    pub kind: DmlType,
    pub database: String,
    pub table: String,
    /// Ordered `(column, value)` pairs to insert or assign.
    pub values: Vec<(String, ArgValue)>,
    /// Ordered `(column, value)` pairs identifying the target row.
    pub primary_key: Vec<(String, ArgValue)>,
}

impl DmlChange {
    /// Stage an INSERT of the given column/value pairs.
    #[must_use]
    pub fn insert(
        database: impl Into<String>,
        table: impl Into<String>,
        values: Vec<(String, ArgValue)>,
    ) -> Self {
        Self {
            kind: DmlType::Insert,
            database: database.into(),
            table: table.into(),
            values,
            primary_key: Vec::new(),
        }
    }

    /// Stage an UPDATE of `values` on the row identified by `primary_key`.
    #[must_use]
    pub fn update(
        database: impl Into<String>,
        table: impl Into<String>,
        values: Vec<(String, ArgValue)>,
        primary_key: Vec<(String, ArgValue)>,
    ) -> Self {
        Self {
            kind: DmlType::Update,
            database: database.into(),
            table: table.into(),
            values,
            primary_key,
        }
    }

    /// Stage a DELETE of the row identified by `primary_key`.
    #[must_use]
    pub fn delete(
        database: impl Into<String>,
        table: impl Into<String>,
        primary_key: Vec<(String, ArgValue)>,
    ) -> Self {
        Self {
            kind: DmlType::Delete,
            database: database.into(),
            table: table.into(),
            values: Vec::new(),
            primary_key,
        }
    }
}

/// A built statement ready for the transaction executor.
///
/// `statement` carries the staged values folded in as escaped literals, so it
/// is byte-identical to the preview text returned by
/// [`crate::Driver::dml_change_to_query_string`]. `args` keeps the rendered
/// literals in fold order for logging and inspection.
#[derive(Debug, Clone)]
pub struct Query {
    pub statement: String,
    pub args: Vec<String>,
}

impl Query {
    #[must_use]
    pub fn new(statement: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            statement: statement.into(),
            args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_scheme_aliases() {
        assert_eq!("postgres".parse::<Provider>().unwrap(), Provider::Postgres);
        assert_eq!(
            "postgresql".parse::<Provider>().unwrap(),
            Provider::Postgres
        );
        assert_eq!("sqlserver".parse::<Provider>().unwrap(), Provider::Mssql);
        assert_eq!("file".parse::<Provider>().unwrap(), Provider::Sqlite);
        assert!("oracle".parse::<Provider>().is_err());
    }

    #[test]
    fn provider_displays_canonical_scheme() {
        assert_eq!(Provider::Clickhouse.to_string(), "clickhouse");
        assert_eq!(Provider::Mssql.to_string(), "mssql");
    }

    #[test]
    fn text_cell_distinguishes_empty_from_populated() {
        assert_eq!(text_cell(""), EMPTY_CELL);
        assert_eq!(text_cell("x"), "x");
    }

    #[test]
    fn header_rows_match_contract() {
        assert_eq!(
            header_row(&CONSTRAINTS_HEADER),
            vec![
                "CONSTRAINT_NAME",
                "COLUMN_NAME",
                "REFERENCED_TABLE_NAME",
                "REFERENCED_COLUMN_NAME"
            ]
        );
        assert_eq!(header_row(&FOREIGN_KEYS_HEADER).len(), 5);
        assert_eq!(header_row(&INDEXES_HEADER).len(), 4);
    }
}
