// PostgreSQL driver
//
// - connection: connect/spawn the connection task, liveness check
// - schema: information_schema and pg_catalog introspection
// - records: simple-protocol reads and cell rendering
// - transaction: pending-change batches
//
// Navigation maps schemas, not catalogs, onto the "database" level below the
// connected database: get_tables groups by schema, and the schema name is
// what callers pass back as `database` for table-scoped operations.

mod connection;
mod records;
mod schema;
mod transaction;

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio_postgres::Client;

use crate::driver::Driver;
use crate::error::{DriverError, require_name};
use crate::models::{DmlChange, Provider, TableRows};
use crate::query_builder::{self, MutationSyntax, QueryFormatter};

/// Driver for PostgreSQL servers.
///
/// Dynamic reads go through the simple-query protocol: the server renders
/// every column as text, which is exactly the shape the tabular contract
/// needs, and folded-literal statements never hit binary-parameter typing.
pub struct PostgresDriver {
    client: Option<Client>,
}

impl PostgresDriver {
    #[must_use]
    pub fn new() -> Self {
        Self { client: None }
    }

    fn client(&self) -> Result<&Client, DriverError> {
        self.client
            .as_ref()
            .ok_or_else(|| DriverError::Connection("not connected to postgres".to_string()))
    }

    fn client_mut(&mut self) -> Result<&mut Client, DriverError> {
        self.client
            .as_mut()
            .ok_or_else(|| DriverError::Connection("not connected to postgres".to_string()))
    }
}

impl Default for PostgresDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryFormatter for PostgresDriver {
    fn format_reference(&self, identifier: &str) -> String {
        format!("\"{identifier}\"")
    }

    fn format_placeholder(&self, index: usize) -> String {
        format!("${index}")
    }
}

#[async_trait]
impl Driver for PostgresDriver {
    async fn connect(&mut self, url: &str) -> Result<(), DriverError> {
        let client = connection::open(url).await?;
        tracing::debug!("connected to postgres");
        self.client = Some(client);
        Ok(())
    }

    fn provider(&self) -> Provider {
        Provider::Postgres
    }

    async fn get_databases(&mut self) -> Result<Vec<String>, DriverError> {
        schema::databases(self.client()?).await
    }

    async fn get_tables(
        &mut self,
        database: &str,
    ) -> Result<BTreeMap<String, Vec<String>>, DriverError> {
        require_name(database, "database")?;
        schema::tables(self.client()?, database).await
    }

    async fn get_table_columns(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        schema::table_columns(self.client()?, database, table).await
    }

    async fn get_constraints(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        schema::constraints(self.client()?, database, table).await
    }

    async fn get_foreign_keys(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        schema::foreign_keys(self.client()?, database, table).await
    }

    async fn get_indexes(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        schema::indexes(self.client()?, database, table).await
    }

    async fn get_primary_key_column_names(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<Vec<String>, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        schema::primary_key_columns(self.client()?, database, table).await
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
            self.client()?,
            &formatted,
            where_clause,
            sort_clause,
            offset,
            limit,
        )
        .await
    }

    async fn execute_query(&mut self, sql: &str) -> Result<(TableRows, usize), DriverError> {
        let rows = records::simple_rows(self.client()?, sql).await?;
        let count = rows.len().saturating_sub(1);
        Ok((rows, count))
    }

    async fn execute_dml_statement(&mut self, sql: &str) -> Result<String, DriverError> {
        let affected = self
            .client()?
            .execute(sql, &[])
            .await
            .map_err(|e| DriverError::Query(format!("postgres execution error: {e}")))?;
        Ok(format!("{affected} rows affected"))
    }

    async fn execute_pending_changes(
        &mut self,
        changes: &[DmlChange],
    ) -> Result<(), DriverError> {
        let queries =
            query_builder::build_queries(changes, self, MutationSyntax::Standard)?;
        tracing::debug!(count = queries.len(), "applying pending postgres changes");
        transaction::apply_queries(self.client_mut()?, &queries).await
    }

    fn dml_change_to_query_string(&self, change: &DmlChange) -> Result<String, DriverError> {
        query_builder::change_to_query_string(change, self, MutationSyntax::Standard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArgValue;

    #[test]
    fn references_use_double_quotes_and_dollar_placeholders() {
        let driver = PostgresDriver::new();
        assert_eq!(driver.format_reference("users"), "\"users\"");
        assert_eq!(driver.format_table_name("public", "users"), "\"public\".\"users\"");
        assert_eq!(driver.format_placeholder(2), "$2");
    }

    #[test]
    fn preview_renders_literal_statement() {
        let driver = PostgresDriver::new();
        let change = DmlChange::update(
            "public",
            "users",
            vec![("name".into(), ArgValue::from("O'Brien"))],
            vec![("id".into(), ArgValue::Int(7))],
        );
        assert_eq!(
            driver.dml_change_to_query_string(&change).unwrap(),
            "UPDATE \"public\".\"users\" SET \"name\" = 'O''Brien' WHERE \"id\" = 7"
        );
    }
}
