use tiberius::Row;
use tiberius::numeric::Numeric;

use super::connection::MssqlClient;
use crate::error::DriverError;
use crate::models::{DEFAULT_ROW_LIMIT, NULL_CELL, TableRows, text_cell};

fn render_opt<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| NULL_CELL.to_string(), |v| v.to_string())
}

/// Render one column value as a display cell.
///
/// `try_get` only succeeds for the column's actual TDS type, so the first
/// matching arm wins and a `None` there is a real SQL NULL.
pub(crate) fn cell_from_row(row: &Row, idx: usize) -> String {
    if let Ok(v) = row.try_get::<&str, _>(idx) {
        return v.map_or_else(|| NULL_CELL.to_string(), text_cell);
    }
    if let Ok(v) = row.try_get::<i32, _>(idx) {
        return render_opt(v);
    }
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return render_opt(v);
    }
    if let Ok(v) = row.try_get::<i16, _>(idx) {
        return render_opt(v);
    }
    if let Ok(v) = row.try_get::<u8, _>(idx) {
        return render_opt(v);
    }
    if let Ok(v) = row.try_get::<f64, _>(idx) {
        return render_opt(v);
    }
    if let Ok(v) = row.try_get::<f32, _>(idx) {
        return render_opt(v);
    }
    if let Ok(v) = row.try_get::<bool, _>(idx) {
        return render_opt(v);
    }
    if let Ok(v) = row.try_get::<Numeric, _>(idx) {
        return render_opt(v);
    }
    if let Ok(v) = row.try_get::<chrono::NaiveDateTime, _>(idx) {
        return v.map_or_else(
            || NULL_CELL.to_string(),
            |dt| dt.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
        );
    }
    if let Ok(v) = row.try_get::<chrono::NaiveDate, _>(idx) {
        return render_opt(v);
    }
    if let Ok(v) = row.try_get::<chrono::NaiveTime, _>(idx) {
        return render_opt(v);
    }
    if let Ok(v) = row.try_get::<tiberius::Uuid, _>(idx) {
        return render_opt(v);
    }
    if let Ok(v) = row.try_get::<&[u8], _>(idx) {
        return v.map_or_else(
            || NULL_CELL.to_string(),
            |bytes| text_cell(&String::from_utf8_lossy(bytes)),
        );
    }
    NULL_CELL.to_string()
}

/// Run a statement and collect header + data rows from its first result set.
///
/// # Errors
/// Returns `DriverError::Query` if the server rejects the statement or the
/// stream cannot be read.
pub(crate) async fn simple_rows(
    client: &mut MssqlClient,
    sql: &str,
) -> Result<TableRows, DriverError> {
    let mut stream = client
        .simple_query(sql)
        .await
        .map_err(|e| DriverError::Query(format!("sql server query error: {e}")))?;

    let header: Vec<String> = stream
        .columns()
        .await
        .map_err(|e| DriverError::Query(format!("sql server column fetch error: {e}")))?
        .map(|columns| columns.iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let rows = stream
        .into_first_result()
        .await
        .map_err(|e| DriverError::Query(format!("sql server row fetch error: {e}")))?;

    let column_count = header.len();
    let mut out = Vec::with_capacity(rows.len() + 1);
    out.push(header);
    for row in &rows {
        let mut cells = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            cells.push(cell_from_row(row, idx));
        }
        out.push(cells);
    }
    Ok(out)
}

/// Paginated table read plus the table's total row count.
///
/// OFFSET/FETCH requires an ORDER BY; without a caller-supplied sort the
/// placeholder ordering `(SELECT NULL)` keeps the server's natural order.
///
/// # Errors
/// Returns `DriverError::Query` if either the page or the count query fails.
pub(crate) async fn records(
    client: &mut MssqlClient,
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
    let order = if sort_clause.is_empty() {
        "(SELECT NULL)"
    } else {
        sort_clause
    };
    sql.push_str(&format!(
        " ORDER BY {order} OFFSET {offset} ROWS FETCH NEXT {limit} ROWS ONLY"
    ));

    let rows = simple_rows(client, &sql).await?;

    let count_sql = format!("SELECT COUNT(*) FROM {formatted_table}");
    let count_rows = simple_rows(client, &count_sql).await?;
    let total = count_rows
        .get(1)
        .and_then(|row| row.first())
        .and_then(|cell| cell.parse::<usize>().ok())
        .ok_or_else(|| {
            DriverError::Query("sql server count query returned no rows".to_string())
        })?;

    Ok((rows, total))
}

/// Execute one write statement and return the affected-row count.
///
/// # Errors
/// Returns `DriverError::Query` if the server rejects the statement.
pub(crate) async fn execute_dml(
    client: &mut MssqlClient,
    sql: &str,
) -> Result<u64, DriverError> {
    let result = client
        .execute(sql, &[])
        .await
        .map_err(|e| DriverError::Query(format!("sql server execution error: {e}")))?;
    Ok(result.rows_affected().iter().sum())
}
