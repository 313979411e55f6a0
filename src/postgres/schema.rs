use std::collections::BTreeMap;

use tokio_postgres::Client;

use super::records::{data_rows, first_column, simple_rows};
use crate::error::DriverError;
use crate::models::{
    CONSTRAINTS_HEADER, FOREIGN_KEYS_HEADER, INDEXES_HEADER, TableRows, header_row,
};
use crate::query_builder::quote_literal;

pub(crate) async fn databases(client: &Client) -> Result<Vec<String>, DriverError> {
    first_column(
        client,
        "SELECT datname FROM pg_database WHERE datistemplate = false ORDER BY datname",
    )
    .await
}

/// Tables of the connected database, grouped by schema.
pub(crate) async fn tables(
    client: &Client,
    database: &str,
) -> Result<BTreeMap<String, Vec<String>>, DriverError> {
    let sql = format!(
        "SELECT table_schema, table_name FROM information_schema.tables \
         WHERE table_catalog = {} \
           AND table_schema NOT IN ('pg_catalog', 'information_schema') \
         ORDER BY table_schema, table_name",
        quote_literal(database)
    );

    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for row in data_rows(client, &sql).await? {
        if let [schema, table] = row.as_slice() {
            grouped.entry(schema.clone()).or_default().push(table.clone());
        }
    }
    Ok(grouped)
}

pub(crate) async fn table_columns(
    client: &Client,
    schema: &str,
    table: &str,
) -> Result<TableRows, DriverError> {
    let sql = format!(
        "SELECT column_name, data_type, is_nullable, column_default \
         FROM information_schema.columns \
         WHERE table_schema = {} AND table_name = {} \
         ORDER BY ordinal_position",
        quote_literal(schema),
        quote_literal(table)
    );
    simple_rows(client, &sql).await
}

pub(crate) async fn constraints(
    client: &Client,
    schema: &str,
    table: &str,
) -> Result<TableRows, DriverError> {
    let sql = format!(
        "SELECT tc.constraint_name, kcu.column_name, ccu.table_name, ccu.column_name \
         FROM information_schema.table_constraints tc \
         JOIN information_schema.key_column_usage kcu \
           ON kcu.constraint_name = tc.constraint_name \
          AND kcu.table_schema = tc.table_schema \
         LEFT JOIN information_schema.constraint_column_usage ccu \
           ON ccu.constraint_name = tc.constraint_name \
          AND ccu.table_schema = tc.table_schema \
         WHERE tc.table_schema = {} AND tc.table_name = {} \
         ORDER BY tc.constraint_name",
        quote_literal(schema),
        quote_literal(table)
    );

    let mut out = vec![header_row(&CONSTRAINTS_HEADER)];
    out.extend(data_rows(client, &sql).await?);
    Ok(out)
}

pub(crate) async fn foreign_keys(
    client: &Client,
    schema: &str,
    table: &str,
) -> Result<TableRows, DriverError> {
    let sql = format!(
        "SELECT tc.table_name, kcu.column_name, tc.constraint_name, \
                ccu.column_name, ccu.table_name \
         FROM information_schema.table_constraints tc \
         JOIN information_schema.key_column_usage kcu \
           ON kcu.constraint_name = tc.constraint_name \
          AND kcu.table_schema = tc.table_schema \
         JOIN information_schema.constraint_column_usage ccu \
           ON ccu.constraint_name = tc.constraint_name \
          AND ccu.table_schema = tc.table_schema \
         WHERE tc.constraint_type = 'FOREIGN KEY' \
           AND tc.table_schema = {} AND tc.table_name = {} \
         ORDER BY tc.constraint_name",
        quote_literal(schema),
        quote_literal(table)
    );

    let mut out = vec![header_row(&FOREIGN_KEYS_HEADER)];
    out.extend(data_rows(client, &sql).await?);
    Ok(out)
}

pub(crate) async fn indexes(
    client: &Client,
    schema: &str,
    table: &str,
) -> Result<TableRows, DriverError> {
    let sql = format!(
        "SELECT i.relname, a.attname, \
                CASE WHEN ix.indisunique THEN 0 ELSE 1 END, am.amname \
         FROM pg_class t \
         JOIN pg_namespace n ON n.oid = t.relnamespace \
         JOIN pg_index ix ON ix.indrelid = t.oid \
         JOIN pg_class i ON i.oid = ix.indexrelid \
         JOIN pg_am am ON am.oid = i.relam \
         JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey) \
         WHERE n.nspname = {} AND t.relname = {} \
         ORDER BY i.relname, a.attnum",
        quote_literal(schema),
        quote_literal(table)
    );

    let mut out = vec![header_row(&INDEXES_HEADER)];
    out.extend(data_rows(client, &sql).await?);
    Ok(out)
}

pub(crate) async fn primary_key_columns(
    client: &Client,
    schema: &str,
    table: &str,
) -> Result<Vec<String>, DriverError> {
    let target = quote_literal(&format!("\"{schema}\".\"{table}\""));
    let sql = format!(
        "SELECT a.attname FROM pg_index i \
         JOIN pg_attribute a ON a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey) \
         WHERE i.indrelid = {target}::regclass AND i.indisprimary"
    );
    first_column(client, &sql).await
}
