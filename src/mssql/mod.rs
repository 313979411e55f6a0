// SQL Server driver
//
// - connection: URL -> tiberius config, TCP setup, liveness check
// - schema: INFORMATION_SCHEMA and sys catalog introspection
// - records: simple-query reads and typed cell rendering
// - transaction: pending-change batches

mod connection;
mod records;
mod schema;
mod transaction;

use std::collections::BTreeMap;

use async_trait::async_trait;

use self::connection::MssqlClient;
use crate::driver::Driver;
use crate::error::{DriverError, require_name};
use crate::models::{DmlChange, Provider, TableRows};
use crate::query_builder::{self, MutationSyntax, QueryFormatter};

/// Driver for Microsoft SQL Server.
pub struct MssqlDriver {
    client: Option<MssqlClient>,
}

impl MssqlDriver {
    #[must_use]
    pub fn new() -> Self {
        Self { client: None }
    }

    fn client_mut(&mut self) -> Result<&mut MssqlClient, DriverError> {
        self.client
            .as_mut()
            .ok_or_else(|| DriverError::Connection("not connected to sql server".to_string()))
    }
}

impl Default for MssqlDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryFormatter for MssqlDriver {
    fn format_reference(&self, identifier: &str) -> String {
        format!("[{identifier}]")
    }

    fn format_placeholder(&self, index: usize) -> String {
        format!("@P{index}")
    }
}

#[async_trait]
impl Driver for MssqlDriver {
    async fn connect(&mut self, url: &str) -> Result<(), DriverError> {
        let client = connection::open(url).await?;
        tracing::debug!("connected to sql server");
        self.client = Some(client);
        Ok(())
    }

    fn provider(&self) -> Provider {
        Provider::Mssql
    }

    async fn get_databases(&mut self) -> Result<Vec<String>, DriverError> {
        schema::databases(self.client_mut()?).await
    }

    async fn get_tables(
        &mut self,
        database: &str,
    ) -> Result<BTreeMap<String, Vec<String>>, DriverError> {
        require_name(database, "database")?;
        let tables = schema::tables(self.client_mut()?, database).await?;
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
        schema::table_columns(self.client_mut()?, database, table).await
    }

    async fn get_constraints(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        schema::constraints(self.client_mut()?, database, table).await
    }

    async fn get_foreign_keys(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        schema::foreign_keys(self.client_mut()?, database, table).await
    }

    async fn get_indexes(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        schema::indexes(self.client_mut()?, database, table).await
    }

    async fn get_primary_key_column_names(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<Vec<String>, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        schema::primary_key_columns(self.client_mut()?, database, table).await
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
            self.client_mut()?,
            &formatted,
            where_clause,
            sort_clause,
            offset,
            limit,
        )
        .await
    }

    async fn execute_query(&mut self, sql: &str) -> Result<(TableRows, usize), DriverError> {
        let rows = records::simple_rows(self.client_mut()?, sql).await?;
        let count = rows.len().saturating_sub(1);
        Ok((rows, count))
    }

    async fn execute_dml_statement(&mut self, sql: &str) -> Result<String, DriverError> {
        let affected = records::execute_dml(self.client_mut()?, sql).await?;
        Ok(format!("{affected} rows affected"))
    }

    async fn execute_pending_changes(
        &mut self,
        changes: &[DmlChange],
    ) -> Result<(), DriverError> {
        let queries =
            query_builder::build_queries(changes, self, MutationSyntax::Standard)?;
        tracing::debug!(count = queries.len(), "applying pending sql server changes");
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
    fn references_are_bracketed_and_qualified() {
        let driver = MssqlDriver::new();
        assert_eq!(driver.format_reference("users"), "[users]");
        assert_eq!(driver.format_table_name("shop", "users"), "[shop].[users]");
        assert_eq!(driver.format_placeholder(1), "@P1");
    }

    #[test]
    fn preview_renders_literal_statement() {
        let driver = MssqlDriver::new();
        let change = DmlChange::insert(
            "shop",
            "users",
            vec![("name".into(), ArgValue::from("Ada"))],
        );
        assert_eq!(
            driver.dml_change_to_query_string(&change).unwrap(),
            "INSERT INTO [shop].[users] ([name]) VALUES ('Ada')"
        );
    }
}
