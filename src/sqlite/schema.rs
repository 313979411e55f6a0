use rusqlite::Connection;

use super::records::query_rows;
use crate::error::DriverError;
use crate::models::{
    CONSTRAINTS_HEADER, FOREIGN_KEYS_HEADER, INDEXES_HEADER, TableRows, header_row,
};
use crate::query_builder::quote_literal;

pub(crate) fn databases(conn: &Connection) -> Result<Vec<String>, DriverError> {
    collect_strings(conn, "SELECT name FROM pragma_database_list ORDER BY seq")
}

pub(crate) fn tables(conn: &Connection) -> Result<Vec<String>, DriverError> {
    collect_strings(
        conn,
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
}

pub(crate) fn table_columns(conn: &Connection, table: &str) -> Result<TableRows, DriverError> {
    let sql = format!(
        "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info({})",
        quote_literal(table)
    );
    query_rows(conn, &sql, rusqlite::params![])
}

/// Primary-key and unique constraints surfaced through `pragma_index_list`.
/// SQLite has no referenced-table metadata here, so those cells stay empty.
pub(crate) fn constraints(conn: &Connection, table: &str) -> Result<TableRows, DriverError> {
    let mut out = vec![header_row(&CONSTRAINTS_HEADER)];

    let list_sql = format!(
        "SELECT name FROM pragma_index_list({}) WHERE origin IN ('pk', 'u')",
        quote_literal(table)
    );
    for index_name in collect_strings(conn, &list_sql)? {
        for column in index_columns(conn, &index_name)? {
            out.push(vec![
                index_name.clone(),
                column,
                String::new(),
                String::new(),
            ]);
        }
    }
    Ok(out)
}

pub(crate) fn foreign_keys(conn: &Connection, table: &str) -> Result<TableRows, DriverError> {
    let mut out = vec![header_row(&FOREIGN_KEYS_HEADER)];

    let sql = format!(
        "SELECT id, \"table\", \"from\", \"to\" FROM pragma_foreign_key_list({})",
        quote_literal(table)
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| DriverError::Query(format!("sqlite prepare error: {e}")))?;
    let mut rows = stmt
        .query([])
        .map_err(|e| DriverError::Query(format!("sqlite query error: {e}")))?;

    while let Some(row) = rows
        .next()
        .map_err(|e| DriverError::Query(format!("sqlite row error: {e}")))?
    {
        let id: i64 = row.get(0).map_err(col_err)?;
        let referenced_table: String = row.get(1).map_err(col_err)?;
        let column: String = row.get(2).map_err(col_err)?;
        // "to" is NULL when the key references the target's primary key.
        let referenced_column: Option<String> = row.get(3).map_err(col_err)?;

        out.push(vec![
            table.to_string(),
            column,
            format!("fk_{id}"),
            referenced_column.unwrap_or_default(),
            referenced_table,
        ]);
    }
    Ok(out)
}

pub(crate) fn indexes(conn: &Connection, table: &str) -> Result<TableRows, DriverError> {
    let mut out = vec![header_row(&INDEXES_HEADER)];

    let sql = format!(
        "SELECT name, \"unique\", origin FROM pragma_index_list({})",
        quote_literal(table)
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| DriverError::Query(format!("sqlite prepare error: {e}")))?;
    let mut rows = stmt
        .query([])
        .map_err(|e| DriverError::Query(format!("sqlite query error: {e}")))?;

    while let Some(row) = rows
        .next()
        .map_err(|e| DriverError::Query(format!("sqlite row error: {e}")))?
    {
        let name: String = row.get(0).map_err(col_err)?;
        let unique: i64 = row.get(1).map_err(col_err)?;
        let origin: String = row.get(2).map_err(col_err)?;

        for column in index_columns(conn, &name)? {
            out.push(vec![
                name.clone(),
                column,
                (1 - unique).to_string(),
                origin.clone(),
            ]);
        }
    }
    Ok(out)
}

pub(crate) fn primary_key_columns(
    conn: &Connection,
    table: &str,
) -> Result<Vec<String>, DriverError> {
    let sql = format!(
        "SELECT name FROM pragma_table_info({}) WHERE pk > 0 ORDER BY pk",
        quote_literal(table)
    );
    collect_strings(conn, &sql)
}

fn index_columns(conn: &Connection, index: &str) -> Result<Vec<String>, DriverError> {
    let sql = format!(
        "SELECT name FROM pragma_index_info({}) ORDER BY seqno",
        quote_literal(index)
    );
    collect_strings(conn, &sql)
}

fn collect_strings(conn: &Connection, sql: &str) -> Result<Vec<String>, DriverError> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| DriverError::Query(format!("sqlite prepare error: {e}")))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| DriverError::Query(format!("sqlite query error: {e}")))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DriverError::Query(format!("sqlite row error: {e}")))?;
    Ok(names)
}

fn col_err(e: rusqlite::Error) -> DriverError {
    DriverError::Query(format!("sqlite column error: {e}"))
}
