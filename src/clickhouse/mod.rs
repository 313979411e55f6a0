// ClickHouse driver
//
// - connection: URL -> HTTP client options
// - schema: system.* catalog introspection
// - records: JSON-format reads and cell rendering
// - transaction: pending-change batches (sequential; see transaction.rs)
//
// Mutations use the ALTER TABLE .. UPDATE/DELETE form; constraints and
// foreign keys do not exist in the engine and return header-only results.

mod connection;
mod records;
mod schema;
mod transaction;

use std::collections::BTreeMap;

use async_trait::async_trait;
use clickhouse::Client;

use crate::driver::Driver;
use crate::error::{DriverError, require_name};
use crate::models::{
    CONSTRAINTS_HEADER, FOREIGN_KEYS_HEADER, DmlChange, Provider, TableRows, header_row,
};
use crate::query_builder::{self, MutationSyntax, QueryFormatter};

/// Schemas hidden from navigation: the MySQL-compatibility set the engine
/// exposes plus its own catalog databases.
const INTERNAL_DATABASES: [&str; 6] = [
    "information_schema",
    "INFORMATION_SCHEMA",
    "mysql",
    "performance_schema",
    "sys",
    "system",
];

/// Driver for ClickHouse servers over the HTTP interface.
pub struct ClickhouseDriver {
    client: Option<Client>,
}

impl ClickhouseDriver {
    #[must_use]
    pub fn new() -> Self {
        Self { client: None }
    }

    fn client(&self) -> Result<&Client, DriverError> {
        self.client
            .as_ref()
            .ok_or_else(|| DriverError::Connection("not connected to clickhouse".to_string()))
    }
}

impl Default for ClickhouseDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryFormatter for ClickhouseDriver {
    fn format_reference(&self, identifier: &str) -> String {
        format!("`{identifier}`")
    }

    fn format_placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }
}

#[async_trait]
impl Driver for ClickhouseDriver {
    async fn connect(&mut self, url: &str) -> Result<(), DriverError> {
        let client = connection::open(url).await?;
        tracing::debug!("connected to clickhouse");
        self.client = Some(client);
        Ok(())
    }

    fn provider(&self) -> Provider {
        Provider::Clickhouse
    }

    async fn get_databases(&mut self) -> Result<Vec<String>, DriverError> {
        let names = schema::databases(self.client()?).await?;
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
        let tables = schema::tables(self.client()?, database).await?;
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
        schema::table_columns(self.client()?, &formatted).await
    }

    async fn get_constraints(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        // No such concept in the engine: well-formed but empty.
        Ok(vec![header_row(&CONSTRAINTS_HEADER)])
    }

    async fn get_foreign_keys(
        &mut self,
        database: &str,
        table: &str,
    ) -> Result<TableRows, DriverError> {
        require_name(database, "database")?;
        require_name(table, "table")?;
        Ok(vec![header_row(&FOREIGN_KEYS_HEADER)])
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
        let rows = records::fetch_rows(self.client()?, sql).await?;
        let count = rows.len().saturating_sub(1);
        Ok((rows, count))
    }

    async fn execute_dml_statement(&mut self, sql: &str) -> Result<String, DriverError> {
        records::execute(self.client()?, sql).await?;
        // Mutations are asynchronous; the interface reports no counts.
        Ok("0 rows affected".to_string())
    }

    async fn execute_pending_changes(
        &mut self,
        changes: &[DmlChange],
    ) -> Result<(), DriverError> {
        let queries =
            query_builder::build_queries(changes, self, MutationSyntax::AlterTable)?;
        tracing::debug!(count = queries.len(), "applying pending clickhouse changes");
        transaction::apply_queries(self.client()?, &queries).await
    }

    fn dml_change_to_query_string(&self, change: &DmlChange) -> Result<String, DriverError> {
        query_builder::change_to_query_string(change, self, MutationSyntax::AlterTable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArgValue;

    #[test]
    fn references_are_backticked_and_qualified() {
        let driver = ClickhouseDriver::new();
        assert_eq!(driver.format_reference("events"), "`events`");
        assert_eq!(
            driver.format_table_name("metrics", "events"),
            "`metrics`.`events`"
        );
    }

    #[test]
    fn mutations_preview_in_alter_table_form() {
        let driver = ClickhouseDriver::new();
        let update = DmlChange::update(
            "metrics",
            "events",
            vec![("level".into(), ArgValue::from("warn"))],
            vec![("id".into(), ArgValue::from("9"))],
        );
        assert_eq!(
            driver.dml_change_to_query_string(&update).unwrap(),
            "ALTER TABLE `metrics`.`events` UPDATE `level` = 'warn' WHERE `id` = '9'"
        );

        let delete = DmlChange::delete(
            "metrics",
            "events",
            vec![("id".into(), ArgValue::from("9"))],
        );
        assert_eq!(
            driver.dml_change_to_query_string(&delete).unwrap(),
            "ALTER TABLE `metrics`.`events` DELETE WHERE `id` = '9'"
        );
    }

    #[test]
    fn inserts_use_standard_syntax() {
        let driver = ClickhouseDriver::new();
        let insert = DmlChange::insert(
            "metrics",
            "events",
            vec![("level".into(), ArgValue::from("info"))],
        );
        assert_eq!(
            driver.dml_change_to_query_string(&insert).unwrap(),
            "INSERT INTO `metrics`.`events` (`level`) VALUES ('info')"
        );
    }
}
