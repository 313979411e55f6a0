// SQLite driver
//
// - connection: path resolution and liveness check
// - schema: PRAGMA-based introspection
// - records: row reads and cell rendering
// - transaction: pending-change batches

mod connection;
mod records;
mod schema;
mod transaction;

use std::collections::BTreeMap;

use async_trait::async_trait;
use rusqlite::Connection;

use crate::driver::Driver;
use crate::error::{DriverError, require_name};
use crate::models::{DmlChange, Provider, TableRows};
use crate::query_builder::{self, MutationSyntax, QueryFormatter};

/// Driver for SQLite databases.
///
/// All operations run directly on the owned [`rusqlite::Connection`]; SQLite
/// calls are fast local file I/O, so they execute inline rather than on a
/// blocking pool.
pub struct SqliteDriver {
    conn: Option<Connection>,
}

impl SqliteDriver {
    #[must_use]
    pub fn new() -> Self {
        Self { conn: None }
    }

    fn conn(&self) -> Result<&Connection, DriverError> {
        self.conn
            .as_ref()
            .ok_or_else(|| DriverError::Connection("not connected to sqlite".to_string()))
    }

    fn conn_mut(&mut self) -> Result<&mut Connection, DriverError> {
        self.conn
            .as_mut()
            .ok_or_else(|| DriverError::Connection("not connected to sqlite".to_string()))
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryFormatter for SqliteDriver {
    fn format_reference(&self, identifier: &str) -> String {
        format!("`{identifier}`")
    }

    fn format_placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    // A connection addresses one database; the qualifier is implicit.
    fn format_table_name(&self, _database: &str, table: &str) -> String {
        self.format_reference(table)
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    async fn connect(&mut self, url: &str) -> Result<(), DriverError> {
        let conn = connection::open(url)?;
        tracing::debug!(url, "connected to sqlite");
        self.conn = Some(conn);
        Ok(())
    }

    fn provider(&self) -> Provider {
        Provider::Sqlite
    }

    async fn get_databases(&mut self) -> Result<Vec<String>, DriverError> {
        schema::databases(self.conn()?)
    }

    async fn get_tables(
        &mut self,
        database: &str,
    ) -> Result<BTreeMap<String, Vec<String>>, DriverError> {
        require_name(database, "database")?;
        let tables = schema::tables(self.conn()?)?;
        let mut grouped = BTreeMap::new();
        grouped.insert(database.to_string(), tables);
        Ok(grouped)
    }

    async fn get_table_columns(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        schema::table_columns(self.conn()?, table)
    }

    async fn get_constraints(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        schema::constraints(self.conn()?, table)
    }

    async fn get_foreign_keys(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        schema::foreign_keys(self.conn()?, table)
    }

    async fn get_indexes(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        schema::indexes(self.conn()?, table)
    }

    async fn get_primary_key_column_names(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<Vec<String>, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        schema::primary_key_columns(self.conn()?, table)
    }

    async fn get_records(
        &mut self,
        database: &str,
        table: &str,
        where_clause: &str,
        sort_clause: &str,
        offset: usize,
        limit: usize,
    ) -> Result<(TableRows, usize), DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        let formatted = self.format_table_name(database, table);
        records::records(
            self.conn()?,
            &formatted,
            where_clause,
            sort_clause,
            offset,
            limit,
        )
    }

    async fn execute_query(&mut self, sql: &str) -> Result<(TableRows, usize), DriverError> {
        let rows = records::query_rows(self.conn()?, sql, rusqlite::params![])?;
        let count = rows.len().saturating_sub(1);
        Ok((rows, count))
    }

    async fn execute_dml_statement(&mut self, sql: &str) -> Result<String, DriverError> {
        let affected = self
            .conn()?
            .execute(sql, [])
            .map_err(|e| DriverError::Query(format!("sqlite execution error: {e}")))?;
        Ok(format!("{affected} rows affected"))
    }

    async fn execute_pending_changes(
        &mut self,
        changes: &[DmlChange],
    ) -> Result<(), DriverError> {
        let queries =
            query_builder::build_queries(changes, self, MutationSyntax::Standard)?;
        tracing::debug!(count = queries.len(), "applying pending sqlite changes");
        transaction::apply_queries(self.conn_mut()?, &queries)
    }

    fn dml_change_to_query_string(&self, change: &DmlChange) -> Result<String, DriverError> {
        query_builder::change_to_query_string(change, self, MutationSyntax::Standard)
    }
}
