use mysql_async::Conn;
use mysql_async::prelude::Queryable;

use super::records::query_rows;
use crate::error::DriverError;
use crate::models::{INDEXES_HEADER, TableRows, header_row};
use crate::query_builder::quote_literal;

pub(crate) async fn databases(conn: &mut Conn) -> Result<Vec<String>, DriverError> {
    conn.query("SHOW DATABASES")
        .await
        .map_err(|e| DriverError::Query(format!("mysql catalog error: {e}")))
}

pub(crate) async fn tables(
    conn: &mut Conn,
    database: &str,
) -> Result<Vec<String>, DriverError> {
    conn.query(format!("SHOW TABLES FROM `{database}`"))
        .await
        .map_err(|e| DriverError::Query(format!("mysql catalog error: {e}")))
}

pub(crate) async fn table_columns(
    conn: &mut Conn,
    formatted_table: &str,
) -> Result<TableRows, DriverError> {
    query_rows(conn, &format!("DESCRIBE {formatted_table}")).await
}

/// Key-column usage for the table; the selected aliases match the fixed
/// constraints header exactly.
pub(crate) async fn constraints(
    conn: &mut Conn,
    database: &str,
    table: &str,
) -> Result<TableRows, DriverError> {
    let sql = format!(
        "SELECT CONSTRAINT_NAME, COLUMN_NAME, REFERENCED_TABLE_NAME, REFERENCED_COLUMN_NAME \
         FROM information_schema.KEY_COLUMN_USAGE \
         WHERE TABLE_SCHEMA = {} AND TABLE_NAME = {} \
         ORDER BY CONSTRAINT_NAME, ORDINAL_POSITION",
        quote_literal(database),
        quote_literal(table)
    );
    query_rows(conn, &sql).await
}

pub(crate) async fn foreign_keys(
    conn: &mut Conn,
    database: &str,
    table: &str,
) -> Result<TableRows, DriverError> {
    let sql = format!(
        "SELECT TABLE_NAME, COLUMN_NAME, CONSTRAINT_NAME, REFERENCED_COLUMN_NAME, REFERENCED_TABLE_NAME \
         FROM information_schema.KEY_COLUMN_USAGE \
         WHERE TABLE_SCHEMA = {} AND TABLE_NAME = {} AND REFERENCED_TABLE_NAME IS NOT NULL \
         ORDER BY CONSTRAINT_NAME, ORDINAL_POSITION",
        quote_literal(database),
        quote_literal(table)
    );
    query_rows(conn, &sql).await
}

/// `SHOW INDEXES` output remapped onto the fixed index header.
pub(crate) async fn indexes(
    conn: &mut Conn,
    formatted_table: &str,
) -> Result<TableRows, DriverError> {
    let raw = query_rows(conn, &format!("SHOW INDEXES FROM {formatted_table}")).await?;

    let mut out = vec![header_row(&INDEXES_HEADER)];
    let Some(raw_header) = raw.first() else {
        return Ok(out);
    };

    let position = |name: &str| raw_header.iter().position(|c| c == name);
    let (Some(key), Some(column), Some(non_unique), Some(kind)) = (
        position("Key_name"),
        position("Column_name"),
        position("Non_unique"),
        position("Index_type"),
    ) else {
        return Err(DriverError::Query(
            "unexpected SHOW INDEXES layout".to_string(),
        ));
    };

    for row in &raw[1..] {
        out.push(vec![
            row[key].clone(),
            row[column].clone(),
            row[non_unique].clone(),
            row[kind].clone(),
        ]);
    }
    Ok(out)
}

pub(crate) async fn primary_key_columns(
    conn: &mut Conn,
    database: &str,
    table: &str,
) -> Result<Vec<String>, DriverError> {
    let sql = format!(
        "SELECT COLUMN_NAME FROM information_schema.KEY_COLUMN_USAGE \
         WHERE TABLE_SCHEMA = {} AND TABLE_NAME = {} AND CONSTRAINT_NAME = 'PRIMARY' \
         ORDER BY ORDINAL_POSITION",
        quote_literal(database),
        quote_literal(table)
    );
    conn.query(sql)
        .await
        .map_err(|e| DriverError::Query(format!("mysql catalog error: {e}")))
}
