//! The capability-set interface every dialect implements, plus the single
//! provider-selection point that turns a connection URL into a boxed driver.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::DriverError;
use crate::models::{DmlChange, Provider, TableRows};
use crate::query_builder::QueryFormatter;

/// Uniform driver contract over MySQL, PostgreSQL, SQLite, SQL Server, and
/// ClickHouse.
///
/// One driver instance owns one live connection. Methods take `&mut self`:
/// exclusive use of the underlying connection is structural, and callers
/// that need concurrency provision one driver per consumer. No method is
/// retried internally; every error is surfaced to the caller.
#[async_trait]
pub trait Driver: QueryFormatter + Send {
    /// Parse a URL-form connection string, open the engine connection, and
    /// ping it.
    ///
    /// # Errors
    /// Returns `DriverError::Connection` on a malformed URL, an unreachable
    /// engine, or a failed liveness check.
    async fn connect(&mut self, url: &str) -> Result<(), DriverError>;

    /// Validate a connection string without any obligation to retain the
    /// session.
    ///
    /// # Errors
    /// Same contract as [`Driver::connect`], to which this delegates.
    async fn test_connection(&mut self, url: &str) -> Result<(), DriverError> {
        self.connect(url).await
    }

    /// The dialect tag, fixed at construction.
    fn provider(&self) -> Provider;

    /// List databases, excluding engine-internal schemas.
    async fn get_databases(&mut self) -> Result<Vec<String>, DriverError>;

    /// List tables grouped by database (by schema for PostgreSQL).
    async fn get_tables(
        &mut self,
        database: &str,
    ) -> Result<BTreeMap<String, Vec<String>>, DriverError>;

    /// DESCRIBE-equivalent column listing; row 0 is the header.
    async fn get_table_columns(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError>;

    /// Constraint listing with the fixed four-column header. Dialects
    /// without the concept return only the header row.
    async fn get_constraints(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError>;

    /// Foreign-key listing with the fixed five-column header. Dialects
    /// without the concept return only the header row.
    async fn get_foreign_keys(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError>;

    /// Index listing with the fixed four-column header.
    async fn get_indexes(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError>;

    /// Column names defining row identity for the table.
    async fn get_primary_key_column_names(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<Vec<String>, DriverError>;

    /// Paginated row read plus the table's total row count.
    ///
    /// `limit == 0` substitutes [`crate::models::DEFAULT_ROW_LIMIT`].
    /// `where_clause` is appended verbatim and `sort_clause` is wrapped in
    /// `ORDER BY`; both are trusted fragments from the caller's own
    /// filter/sort builder, not re-validated here. Cells use the
    /// `NULL&`/`EMPTY&` sentinel convention. Both the page and the count
    /// query must succeed or the whole call fails.
    async fn get_records(
        &mut self,
        database: &str,
        table: &str,
        where_clause: &str,
        sort_clause: &str,
        offset: usize,
        limit: usize,
    ) -> Result<(TableRows, usize), DriverError>;

    /// Arbitrary read; returns rows with the header prepended and the
    /// data-row count.
    async fn execute_query(&mut self, sql: &str) -> Result<(TableRows, usize), DriverError>;

    /// Arbitrary single write; returns an affected-row-count message.
    async fn execute_dml_statement(&mut self, sql: &str) -> Result<String, DriverError>;

    /// Build one statement per change in input order and execute them all in
    /// one transaction: either every change applies or none does.
    ///
    /// # Errors
    /// Returns `DriverError::Transaction` after a full rollback; the caller
    /// may re-stage and retry the same change set.
    async fn execute_pending_changes(
        &mut self,
        changes: &[DmlChange],
    ) -> Result<(), DriverError>;

    /// Render the statement a change would execute, without executing it.
    /// Uses the same formatting rules as the executed path, so preview and
    /// execution never diverge.
    ///
    /// # Errors
    /// Returns `DriverError::Validation` for an Update/Delete staged without
    /// primary-key values.
    fn dml_change_to_query_string(&self, change: &DmlChange) -> Result<String, DriverError>;
}

/// Construct an unconnected driver for the given provider.
///
/// # Errors
/// Returns `DriverError::Unsupported` when the matching engine feature was
/// compiled out.
pub fn driver_for(provider: Provider) -> Result<Box<dyn Driver>, DriverError> {
    match provider {
        #[cfg(feature = "mysql")]
        Provider::Mysql => Ok(Box::new(crate::mysql::MysqlDriver::new())),
        #[cfg(feature = "postgres")]
        Provider::Postgres => Ok(Box::new(crate::postgres::PostgresDriver::new())),
        #[cfg(feature = "sqlite")]
        Provider::Sqlite => Ok(Box::new(crate::sqlite::SqliteDriver::new())),
        #[cfg(feature = "mssql")]
        Provider::Mssql => Ok(Box::new(crate::mssql::MssqlDriver::new())),
        #[cfg(feature = "clickhouse")]
        Provider::Clickhouse => Ok(Box::new(crate::clickhouse::ClickhouseDriver::new())),
        #[allow(unreachable_patterns)]
        other => Err(DriverError::Unsupported(format!(
            "{other} support is not compiled into this build"
        ))),
    }
}

/// Pick the provider from the URL scheme, construct its driver, and connect.
///
/// # Errors
/// Returns `DriverError::Connection` for a malformed URL or unreachable
/// engine, `DriverError::Validation` for an unknown scheme.
pub async fn connect(url: &str) -> Result<Box<dyn Driver>, DriverError> {
    let provider = provider_from_url(url)?;
    let mut driver = driver_for(provider)?;
    driver.connect(url).await?;
    Ok(driver)
}

/// Parse the provider tag out of a connection string's scheme.
///
/// # Errors
/// Returns `DriverError::Connection` when the string has no scheme,
/// `DriverError::Validation` when the scheme names no supported engine.
pub fn provider_from_url(url: &str) -> Result<Provider, DriverError> {
    let scheme = url
        .split_once("://")
        .map(|(scheme, _)| scheme)
        .ok_or_else(|| {
            DriverError::Connection(format!("connection string has no scheme: {url}"))
        })?;
    scheme.parse()
}
