// MySQL driver
//
// - connection: URL options and liveness check
// - schema: information_schema / SHOW introspection
// - records: text-protocol reads and cell rendering
// - transaction: pending-change batches

mod connection;
mod records;
mod schema;
mod transaction;

use std::collections::BTreeMap;

use async_trait::async_trait;
use mysql_async::Conn;

use crate::driver::Driver;
use crate::error::{DriverError, require_name};
use crate::models::{DmlChange, Provider, TableRows};
use crate::query_builder::{self, MutationSyntax, QueryFormatter};

/// Schemas the engine maintains for itself; hidden from navigation.
const INTERNAL_DATABASES: [&str; 4] =
    ["information_schema", "mysql", "performance_schema", "sys"];

/// Driver for MySQL and MariaDB servers.
pub struct MysqlDriver {
    conn: Option<Conn>,
}

impl MysqlDriver {
    #[must_use]
    pub fn new() -> Self {
        Self { conn: None }
    }

    fn conn_mut(&mut self) -> Result<&mut Conn, DriverError> {
        self.conn
            .as_mut()
            .ok_or_else(|| DriverError::Connection("not connected to mysql".to_string()))
    }
}

impl Default for MysqlDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryFormatter for MysqlDriver {
    fn format_reference(&self, identifier: &str) -> String {
        format!("`{identifier}`")
    }

    fn format_placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }
}

#[async_trait]
impl Driver for MysqlDriver {
    async fn connect(&mut self, url: &str) -> Result<(), DriverError> {
        let conn = connection::open(url).await?;
        tracing::debug!("connected to mysql");
        self.conn = Some(conn);
        Ok(())
    }

    fn provider(&self) -> Provider {
        Provider::Mysql
    }

    async fn get_databases(&mut self) -> Result<Vec<String>, DriverError> {
        let names = schema::databases(self.conn_mut()?).await?;
        Ok(names
            .into_iter()
            .filter(|name| !INTERNAL_DATABASES.contains(&name.as_str()))
            .collect())
    }

    async fn get_tables(
        &mut self,
        database: &str,
    ) -> Result<BTreeMap<String, Vec<String>>, DriverError> {
        require_name(database, "database")?;
        let tables = schema::tables(self.conn_mut()?, database).await?;
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
        let formatted = self.format_table_name(database, table);
        schema::table_columns(self.conn_mut()?, &formatted).await
    }

    async fn get_constraints(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        schema::constraints(self.conn_mut()?, database, table).await
    }

    async fn get_foreign_keys(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        schema::foreign_keys(self.conn_mut()?, database, table).await
    }

    async fn get_indexes(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        let formatted = self.format_table_name(database, table);
        schema::indexes(self.conn_mut()?, &formatted).await
    }

    async fn get_primary_key_column_names(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<Vec<String>, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        schema::primary_key_columns(self.conn_mut()?, database, table).await
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
            self.conn_mut()?,
            &formatted,
            where_clause,
            sort_clause,
            offset,
            limit,
        )
        .await
    }

    async fn execute_query(&mut self, sql: &str) -> Result<(TableRows, usize), DriverError> {
        let rows = records::query_rows(self.conn_mut()?, sql).await?;
        let count = rows.len().saturating_sub(1);
        Ok((rows, count))
    }

    async fn execute_dml_statement(&mut self, sql: &str) -> Result<String, DriverError> {
        let affected = records::execute_dml(self.conn_mut()?, sql).await?;
        Ok(format!("{affected} rows affected"))
    }

    async fn execute_pending_changes(
        &mut self,
        changes: &[DmlChange],
    ) -> Result<(), DriverError> {
        let queries =
            query_builder::build_queries(changes, self, MutationSyntax::Standard)?;
        tracing::debug!(count = queries.len(), "applying pending mysql changes");
        transaction::apply_queries(self.conn_mut()?, &queries).await
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
    fn references_are_backticked_and_qualified() {
        let driver = MysqlDriver::new();
        assert_eq!(driver.format_reference("users"), "`users`");
        assert_eq!(driver.format_table_name("shop", "users"), "`shop`.`users`");
        assert_eq!(driver.format_placeholder(3), "?");
    }

    #[test]
    fn preview_renders_literal_statement() {
        let driver = MysqlDriver::new();
        let change = DmlChange::delete(
            "shop",
            "users",
            vec![("id".into(), ArgValue::from("7"))],
        );
        assert_eq!(
            driver.dml_change_to_query_string(&change).unwrap(),
            "DELETE FROM `shop`.`users` WHERE `id` = '7'"
        );
    }
}
