use tokio_postgres::{Client, SimpleQueryMessage};

use crate::error::DriverError;
use crate::models::{DEFAULT_ROW_LIMIT, NULL_CELL, TableRows, text_cell};

/// Run a statement over the simple-query protocol and collect header + data
/// rows. The server renders every column as text; a missing value is SQL
/// NULL.
///
/// # Errors
/// Returns `DriverError::Query` if the server rejects the statement or a row
/// cannot be read.
pub(crate) async fn simple_rows(
    client: &Client,
    sql: &str,
) -> Result<TableRows, DriverError> {
    let messages = client
        .simple_query(sql)
        .await
        .map_err(|e| DriverError::Query(format!("postgres query error: {e}")))?;

    let mut out: TableRows = Vec::new();
    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(columns) => {
                if out.is_empty() {
                    out.push(columns.iter().map(|c| c.name().to_string()).collect());
                }
            }
            SimpleQueryMessage::Row(row) => {
                if out.is_empty() {
                    out.push(row.columns().iter().map(|c| c.name().to_string()).collect());
                }
                let mut cells = Vec::with_capacity(row.len());
                for idx in 0..row.len() {
                    let value = row.try_get(idx).map_err(|e| {
                        DriverError::Query(format!("postgres column error: {e}"))
                    })?;
                    cells.push(match value {
                        Some(text) => text_cell(text),
                        None => NULL_CELL.to_string(),
                    });
                }
                out.push(cells);
            }
            SimpleQueryMessage::CommandComplete(_) => {}
            _ => {}
        }
    }

    if out.is_empty() {
        out.push(Vec::new());
    }
    Ok(out)
}

/// Data rows only: `simple_rows` with the header stripped.
pub(crate) async fn data_rows(
    client: &Client,
    sql: &str,
) -> Result<Vec<Vec<String>>, DriverError> {
    let mut rows = simple_rows(client, sql).await?;
    rows.remove(0);
    Ok(rows)
}

/// First column of every data row.
pub(crate) async fn first_column(
    client: &Client,
    sql: &str,
) -> Result<Vec<String>, DriverError> {
    Ok(data_rows(client, sql)
        .await?
        .into_iter()
        .filter_map(|mut row| if row.is_empty() { None } else { Some(row.remove(0)) })
        .collect())
}

/// Paginated table read plus the table's total row count.
///
/// # Errors
/// Returns `DriverError::Query` if either the page or the count query fails.
pub(crate) async fn records(
    client: &Client,
    formatted_table: &str,
    where_clause: &str,
    sort_clause: &str,
    offset: usize,
    limit: usize,
) -> Result<(TableRows, usize), DriverError> {
    let limit = if limit == 0 { DEFAULT_ROW_LIMIT } else { limit };

    let mut sql = format!("SELECT * FROM {formatted_table}");
    if !where_clause.is_empty() {
        sql.push(' ');
        sql.push_str(where_clause);
    }
    if !sort_clause.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(sort_clause);
    }
    sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));

    let rows = simple_rows(client, &sql).await?;

    let count_sql = format!("SELECT COUNT(*) FROM {formatted_table}");
    let total = first_column(client, &count_sql)
        .await?
        .first()
        .and_then(|cell| cell.parse::<usize>().ok())
        .ok_or_else(|| {
            DriverError::Query("postgres count query returned no rows".to_string())
        })?;

    Ok((rows, total))
}
