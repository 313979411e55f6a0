use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Row, Value};

use crate::error::DriverError;
use crate::models::{DEFAULT_ROW_LIMIT, NULL_CELL, TableRows, text_cell};

/// Render one protocol value as a display cell.
///
/// Text-protocol results arrive as `Bytes`; the remaining arms cover values
/// a server may still send in binary form.
pub(crate) fn cell_from_value(value: &Value) -> String {
    match value {
        Value::NULL => NULL_CELL.to_string(),
        Value::Bytes(bytes) => text_cell(&String::from_utf8_lossy(bytes)),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(d) => d.to_string(),
        Value::Date(year, month, day, 0, 0, 0, 0) => {
            format!("{year:04}-{month:02}-{day:02}")
        }
        Value::Date(year, month, day, hour, minute, second, 0) => format!(
            "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
        ),
        Value::Date(year, month, day, hour, minute, second, micros) => format!(
            "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{micros:06}"
        ),
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            let sign = if *negative { "-" } else { "" };
            let hours = u32::from(*hours) + days * 24;
            if *micros == 0 {
                format!("{sign}{hours:02}:{minutes:02}:{seconds:02}")
            } else {
                format!("{sign}{hours:02}:{minutes:02}:{seconds:02}.{micros:06}")
            }
        }
    }
}

/// Run a query over the text protocol and collect header + data rows.
///
/// # Errors
/// Returns `DriverError::Query` if the server rejects the statement or a row
/// cannot be read.
pub(crate) async fn query_rows(conn: &mut Conn, sql: &str) -> Result<TableRows, DriverError> {
    let mut result = conn
        .query_iter(sql)
        .await
        .map_err(|e| DriverError::Query(format!("mysql query error: {e}")))?;

    let header: Vec<String> = result
        .columns()
        .map(|columns| {
            columns
                .iter()
                .map(|column| column.name_str().to_string())
                .collect()
        })
        .unwrap_or_default();

    let rows: Vec<Row> = result
        .collect()
        .await
        .map_err(|e| DriverError::Query(format!("mysql row error: {e}")))?;

    let mut out = Vec::with_capacity(rows.len() + 1);
    let column_count = header.len();
    out.push(header);

    for row in &rows {
        let mut cells = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            match row.as_ref(idx) {
                Some(value) => cells.push(cell_from_value(value)),
                None => cells.push(NULL_CELL.to_string()),
            }
        }
        out.push(cells);
    }

    Ok(out)
}

/// Paginated table read plus the table's total row count.
///
/// # Errors
/// Returns `DriverError::Query` if either the page or the count query fails.
pub(crate) async fn records(
    conn: &mut Conn,
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
    sql.push_str(&format!(" LIMIT {offset}, {limit}"));

    let rows = query_rows(conn, &sql).await?;

    let count_sql = format!("SELECT COUNT(*) FROM {formatted_table}");
    let total: Option<u64> = conn
        .query_first(count_sql)
        .await
        .map_err(|e| DriverError::Query(format!("mysql count error: {e}")))?;

    Ok((rows, total.unwrap_or(0) as usize))
}

/// Execute one write statement and return the affected-row count.
///
/// # Errors
/// Returns `DriverError::Query` if the server rejects the statement.
pub(crate) async fn execute_dml(conn: &mut Conn, sql: &str) -> Result<u64, DriverError> {
    let result = conn
        .query_iter(sql)
        .await
        .map_err(|e| DriverError::Query(format!("mysql execution error: {e}")))?;
    let affected = result.affected_rows();
    drop(result);
    Ok(affected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EMPTY_CELL;

    #[test]
    fn cells_use_null_and_empty_sentinels() {
        assert_eq!(cell_from_value(&Value::NULL), NULL_CELL);
        assert_eq!(cell_from_value(&Value::Bytes(Vec::new())), EMPTY_CELL);
        assert_eq!(cell_from_value(&Value::Bytes(b"ada".to_vec())), "ada");
        assert_eq!(cell_from_value(&Value::Int(-5)), "-5");
        assert_eq!(cell_from_value(&Value::UInt(7)), "7");
    }

    #[test]
    fn temporal_values_render_canonically() {
        assert_eq!(
            cell_from_value(&Value::Date(2024, 3, 9, 0, 0, 0, 0)),
            "2024-03-09"
        );
        assert_eq!(
            cell_from_value(&Value::Date(2024, 3, 9, 13, 5, 2, 0)),
            "2024-03-09 13:05:02"
        );
        assert_eq!(
            cell_from_value(&Value::Time(true, 1, 2, 3, 4, 0)),
            "-26:03:04"
        );
    }
}
