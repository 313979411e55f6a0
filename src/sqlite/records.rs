use rusqlite::types::ValueRef;
use rusqlite::{Connection, Params};

use crate::error::DriverError;
use crate::models::{DEFAULT_ROW_LIMIT, NULL_CELL, TableRows, text_cell};

/// Render one column value as a display cell.
fn cell_from_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => NULL_CELL.to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => text_cell(&String::from_utf8_lossy(t)),
        ValueRef::Blob(b) => text_cell(&String::from_utf8_lossy(b)),
    }
}

/// Run a query and collect header + data rows.
///
/// # Errors
/// Returns `DriverError::Query` if preparation, binding, or stepping fails.
pub(crate) fn query_rows<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<TableRows, DriverError> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| DriverError::Query(format!("sqlite prepare error: {e}")))?;

    let header: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let column_count = header.len();

    let mut rows = stmt
        .query(params)
        .map_err(|e| DriverError::Query(format!("sqlite query error: {e}")))?;

    let mut out = vec![header];
    while let Some(row) = rows
        .next()
        .map_err(|e| DriverError::Query(format!("sqlite row error: {e}")))?
    {
        let mut cells = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            let value = row
                .get_ref(idx)
                .map_err(|e| DriverError::Query(format!("sqlite column error: {e}")))?;
            cells.push(cell_from_value(value));
        }
        out.push(cells);
    }

    Ok(out)
}

/// Paginated table read plus the table's total row count.
///
/// # Errors
/// Returns `DriverError::Query` if either the page or the count query fails;
/// a partial result is never returned.
pub(crate) fn records(
    conn: &Connection,
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
    sql.push_str(" LIMIT ?, ?");

    let rows = query_rows(conn, &sql, [offset as i64, limit as i64])?;

    let count_sql = format!("SELECT COUNT(*) FROM {formatted_table}");
    let total: i64 = conn
        .query_row(&count_sql, [], |row| row.get(0))
        .map_err(|e| DriverError::Query(format!("sqlite count error: {e}")))?;

    Ok((rows, total as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EMPTY_CELL;

    fn seeded() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, score REAL);
             INSERT INTO t VALUES (1, 'ada', 3.5), (2, '', NULL), (3, NULL, 2.0);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn cells_use_null_and_empty_sentinels() {
        let conn = seeded();
        let rows = query_rows(&conn, "SELECT name, score FROM t ORDER BY id", rusqlite::params![])
            .unwrap();
        assert_eq!(rows[0], vec!["name", "score"]);
        assert_eq!(rows[1], vec!["ada", "3.5"]);
        assert_eq!(rows[2], vec![EMPTY_CELL, NULL_CELL]);
        assert_eq!(rows[3], vec![NULL_CELL, "2"]);
    }

    #[test]
    fn records_page_and_count_both_report() {
        let conn = seeded();
        let (rows, total) = records(&conn, "`t`", "", "id DESC", 0, 2).unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows.len(), 3); // header + 2 data rows
        assert_eq!(rows[1][0], "3");
    }

    #[test]
    fn zero_limit_uses_the_default_page_size() {
        let conn = seeded();
        let (rows, total) = records(&conn, "`t`", "", "", 0, 0).unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows.len(), 4); // table is smaller than the default page
    }

    #[test]
    fn where_fragment_is_appended_verbatim() {
        let conn = seeded();
        let (rows, _) = records(&conn, "`t`", "WHERE id > 1", "", 0, 10).unwrap();
        assert_eq!(rows.len(), 3);
    }
}
