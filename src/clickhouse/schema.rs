use std::sync::LazyLock;

use clickhouse::Client;
use regex::Regex;

use super::records::fetch_rows;
use crate::error::DriverError;
use crate::models::{INDEXES_HEADER, TableRows, header_row};
use crate::query_builder::quote_literal;

/// Best-effort extraction of the sorting-key columns from a CREATE TABLE
/// statement. Matches either `ORDER BY (a, b)` or a single bare expression.
static ORDER_BY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)ORDER BY\s*(\([^)]*\)|[^\s;]+)").expect("static regex"));

async fn first_column(client: &Client, sql: &str) -> Result<Vec<String>, DriverError> {
    let mut rows = fetch_rows(client, sql).await?;
    rows.remove(0);
    Ok(rows
        .into_iter()
        .filter_map(|mut row| if row.is_empty() { None } else { Some(row.remove(0)) })
        .collect())
}

pub(crate) async fn databases(client: &Client) -> Result<Vec<String>, DriverError> {
    first_column(client, "SHOW DATABASES").await
}

pub(crate) async fn tables(
    client: &Client,
    database: &str,
) -> Result<Vec<String>, DriverError> {
    first_column(client, &format!("SHOW TABLES FROM `{database}`")).await
}

pub(crate) async fn table_columns(
    client: &Client,
    formatted_table: &str,
) -> Result<TableRows, DriverError> {
    fetch_rows(client, &format!("DESCRIBE {formatted_table}")).await
}

/// Indexes approximated from the table's sorting key: the engine has no
/// index catalog, so the ORDER BY columns are parsed out of the CREATE
/// TABLE text. Heuristic by design, not authoritative.
pub(crate) async fn indexes(
    client: &Client,
    database: &str,
    table: &str,
) -> Result<TableRows, DriverError> {
    let sql = format!(
        "SELECT name, engine, create_table_query FROM system.tables \
         WHERE database = {} AND name = {}",
        quote_literal(database),
        quote_literal(table)
    );

    let mut out = vec![header_row(&INDEXES_HEADER)];
    let mut rows = fetch_rows(client, &sql).await?;
    rows.remove(0);

    for row in rows {
        let [name, engine, create_query] = row.as_slice() else {
            continue;
        };
        for column in order_by_columns(create_query) {
            out.push(vec![name.clone(), column, "0".to_string(), engine.clone()]);
        }
    }
    Ok(out)
}

pub(crate) async fn primary_key_columns(
    client: &Client,
    database: &str,
    table: &str,
) -> Result<Vec<String>, DriverError> {
    let sql = format!(
        "SELECT name FROM system.columns \
         WHERE database = {} AND table = {} AND is_in_primary_key = 1",
        quote_literal(database),
        quote_literal(table)
    );
    first_column(client, &sql).await
}

pub(crate) fn order_by_columns(create_query: &str) -> Vec<String> {
    let Some(captures) = ORDER_BY.captures(create_query) else {
        return Vec::new();
    };
    let clause = captures.get(1).map_or("", |m| m.as_str());
    let clause = clause.trim_start_matches('(').trim_end_matches(')');
    clause
        .split(',')
        .map(str::trim)
        .filter(|column| !column.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_by_tuple_yields_each_column() {
        let ddl = "CREATE TABLE metrics.events (`id` UInt64, `ts` DateTime) \
                   ENGINE = MergeTree PARTITION BY toYYYYMM(ts) ORDER BY (id, ts) \
                   SETTINGS index_granularity = 8192";
        assert_eq!(order_by_columns(ddl), vec!["id", "ts"]);
    }

    #[test]
    fn bare_order_by_yields_one_column() {
        let ddl = "CREATE TABLE t (`id` UInt64) ENGINE = MergeTree ORDER BY id";
        assert_eq!(order_by_columns(ddl), vec!["id"]);
    }

    #[test]
    fn missing_order_by_yields_nothing() {
        assert!(order_by_columns("CREATE TABLE t (`id` UInt64) ENGINE = Log").is_empty());
    }
}
