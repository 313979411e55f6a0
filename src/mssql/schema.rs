use super::connection::MssqlClient;
use super::records::simple_rows;
use crate::error::DriverError;
use crate::models::{
    CONSTRAINTS_HEADER, FOREIGN_KEYS_HEADER, INDEXES_HEADER, TableRows, header_row,
};
use crate::query_builder::quote_literal;

/// System databases hidden from navigation.
const INTERNAL_DATABASES: &str = "('master', 'tempdb', 'model', 'msdb')";

async fn data_rows(
    client: &mut MssqlClient,
    sql: &str,
) -> Result<Vec<Vec<String>>, DriverError> {
    let mut rows = simple_rows(client, sql).await?;
    rows.remove(0);
    Ok(rows)
}

async fn first_column(
    client: &mut MssqlClient,
    sql: &str,
) -> Result<Vec<String>, DriverError> {
    Ok(data_rows(client, sql)
        .await?
        .into_iter()
        .filter_map(|mut row| if row.is_empty() { None } else { Some(row.remove(0)) })
        .collect())
}

pub(crate) async fn databases(client: &mut MssqlClient) -> Result<Vec<String>, DriverError> {
    first_column(
        client,
        &format!("SELECT name FROM sys.databases WHERE name NOT IN {INTERNAL_DATABASES} ORDER BY name"),
    )
    .await
}

pub(crate) async fn tables(
    client: &mut MssqlClient,
    database: &str,
) -> Result<Vec<String>, DriverError> {
    let sql = format!(
        "SELECT TABLE_NAME FROM [{database}].INFORMATION_SCHEMA.TABLES \
         WHERE TABLE_TYPE = 'BASE TABLE' ORDER BY TABLE_NAME"
    );
    first_column(client, &sql).await
}

pub(crate) async fn table_columns(
    client: &mut MssqlClient,
    database: &str,
    table: &str,
) -> Result<TableRows, DriverError> {
    let sql = format!(
        "SELECT COLUMN_NAME, DATA_TYPE, IS_NULLABLE, COLUMN_DEFAULT \
         FROM [{database}].INFORMATION_SCHEMA.COLUMNS \
         WHERE TABLE_NAME = {} ORDER BY ORDINAL_POSITION",
        quote_literal(table)
    );
    simple_rows(client, &sql).await
}

/// Primary-key/unique constraints plus foreign keys with their referenced
/// side, projected onto the fixed constraints header.
pub(crate) async fn constraints(
    client: &mut MssqlClient,
    database: &str,
    table: &str,
) -> Result<TableRows, DriverError> {
    let mut out = vec![header_row(&CONSTRAINTS_HEADER)];

    let keys_sql = format!(
        "SELECT tc.CONSTRAINT_NAME, kcu.COLUMN_NAME, '', '' \
         FROM [{database}].INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
         JOIN [{database}].INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu \
           ON kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME \
          AND kcu.TABLE_NAME = tc.TABLE_NAME \
         WHERE tc.TABLE_NAME = {table_lit} \
           AND tc.CONSTRAINT_TYPE IN ('PRIMARY KEY', 'UNIQUE') \
         ORDER BY tc.CONSTRAINT_NAME, kcu.ORDINAL_POSITION",
        table_lit = quote_literal(table)
    );
    out.extend(data_rows(client, &keys_sql).await?);

    let fk_sql = format!(
        "SELECT fk.name, pc.name, rt.name, rc.name \
         FROM [{database}].sys.foreign_keys fk \
         JOIN [{database}].sys.foreign_key_columns fkc \
           ON fkc.constraint_object_id = fk.object_id \
         JOIN [{database}].sys.tables t ON t.object_id = fk.parent_object_id \
         JOIN [{database}].sys.columns pc \
           ON pc.object_id = fkc.parent_object_id AND pc.column_id = fkc.parent_column_id \
         JOIN [{database}].sys.tables rt ON rt.object_id = fk.referenced_object_id \
         JOIN [{database}].sys.columns rc \
           ON rc.object_id = fkc.referenced_object_id \
          AND rc.column_id = fkc.referenced_column_id \
         WHERE t.name = {table_lit} ORDER BY fk.name",
        table_lit = quote_literal(table)
    );
    out.extend(data_rows(client, &fk_sql).await?);

    Ok(out)
}

pub(crate) async fn foreign_keys(
    client: &mut MssqlClient,
    database: &str,
    table: &str,
) -> Result<TableRows, DriverError> {
    let sql = format!(
        "SELECT t.name, pc.name, fk.name, rc.name, rt.name \
         FROM [{database}].sys.foreign_keys fk \
         JOIN [{database}].sys.foreign_key_columns fkc \
           ON fkc.constraint_object_id = fk.object_id \
         JOIN [{database}].sys.tables t ON t.object_id = fk.parent_object_id \
         JOIN [{database}].sys.columns pc \
           ON pc.object_id = fkc.parent_object_id AND pc.column_id = fkc.parent_column_id \
         JOIN [{database}].sys.tables rt ON rt.object_id = fk.referenced_object_id \
         JOIN [{database}].sys.columns rc \
           ON rc.object_id = fkc.referenced_object_id \
          AND rc.column_id = fkc.referenced_column_id \
         WHERE t.name = {} ORDER BY fk.name",
        quote_literal(table)
    );

    let mut out = vec![header_row(&FOREIGN_KEYS_HEADER)];
    out.extend(data_rows(client, &sql).await?);
    Ok(out)
}

pub(crate) async fn indexes(
    client: &mut MssqlClient,
    database: &str,
    table: &str,
) -> Result<TableRows, DriverError> {
    let sql = format!(
        "SELECT i.name, c.name, CASE WHEN i.is_unique = 1 THEN 0 ELSE 1 END, i.type_desc \
         FROM [{database}].sys.indexes i \
         JOIN [{database}].sys.tables t ON t.object_id = i.object_id \
         JOIN [{database}].sys.index_columns ic \
           ON ic.object_id = i.object_id AND ic.index_id = i.index_id \
         JOIN [{database}].sys.columns c \
           ON c.object_id = ic.object_id AND c.column_id = ic.column_id \
         WHERE t.name = {} AND i.name IS NOT NULL \
         ORDER BY i.name, ic.key_ordinal",
        quote_literal(table)
    );

    let mut out = vec![header_row(&INDEXES_HEADER)];
    out.extend(data_rows(client, &sql).await?);
    Ok(out)
}

pub(crate) async fn primary_key_columns(
    client: &mut MssqlClient,
    database: &str,
    table: &str,
) -> Result<Vec<String>, DriverError> {
    let sql = format!(
        "SELECT kcu.COLUMN_NAME \
         FROM [{database}].INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
         JOIN [{database}].INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu \
           ON kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME \
          AND kcu.TABLE_NAME = tc.TABLE_NAME \
         WHERE tc.CONSTRAINT_TYPE = 'PRIMARY KEY' AND tc.TABLE_NAME = {} \
         ORDER BY kcu.ORDINAL_POSITION",
        quote_literal(table)
    );
    first_column(client, &sql).await
}
