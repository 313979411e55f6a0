use clickhouse::Client;
use serde_json::Value as JsonValue;

use crate::error::DriverError;
use crate::models::{DEFAULT_ROW_LIMIT, NULL_CELL, TableRows, text_cell};

/// Response format for dynamic reads: line one is the column names, line two
/// the column types, then one JSON array per row. The server renders every
/// value (IPv4/IPv6 included) in its canonical text form.
const ROW_FORMAT: &str = "JSONCompactEachRowWithNamesAndTypes";

/// Render one JSON value as a display cell.
pub(crate) fn render_cell(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => NULL_CELL.to_string(),
        JsonValue::String(s) => text_cell(s),
        other => other.to_string(),
    }
}

/// Parse a `JSONCompactEachRowWithNamesAndTypes` response body into header +
/// data rows.
///
/// # Errors
/// Returns `DriverError::Query` when a line is not valid JSON.
pub(crate) fn parse_compact_rows(raw: &[u8]) -> Result<TableRows, DriverError> {
    let mut lines = raw.split(|b| *b == b'\n').filter(|line| !line.is_empty());

    let Some(names_line) = lines.next() else {
        return Ok(vec![Vec::new()]);
    };
    let header: Vec<String> = serde_json::from_slice(names_line)
        .map_err(|e| DriverError::Query(format!("clickhouse response decode error: {e}")))?;

    // The types line is not needed: values below are already canonical text.
    let _ = lines.next();

    let mut out = vec![header];
    for line in lines {
        let values: Vec<JsonValue> = serde_json::from_slice(line).map_err(|e| {
            DriverError::Query(format!("clickhouse response decode error: {e}"))
        })?;
        out.push(values.iter().map(render_cell).collect());
    }
    Ok(out)
}

/// Run a query and collect header + data rows.
///
/// # Errors
/// Returns `DriverError::Query` if the server rejects the statement or the
/// response cannot be decoded.
pub(crate) async fn fetch_rows(client: &Client, sql: &str) -> Result<TableRows, DriverError> {
    let mut cursor = client
        .query(sql)
        .fetch_bytes(ROW_FORMAT)
        .map_err(|e| DriverError::Query(format!("clickhouse query error: {e}")))?;

    let mut raw = Vec::new();
    while let Some(chunk) = cursor
        .next()
        .await
        .map_err(|e| DriverError::Query(format!("clickhouse fetch error: {e}")))?
    {
        raw.extend_from_slice(&chunk);
    }

    parse_compact_rows(&raw)
}

/// Execute a statement that returns no rows.
///
/// # Errors
/// Returns `DriverError::Query` if the server rejects the statement.
pub(crate) async fn execute(client: &Client, sql: &str) -> Result<(), DriverError> {
    client
        .query(sql)
        .execute()
        .await
        .map_err(|e| DriverError::Query(format!("clickhouse execution error: {e}")))
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
    sql.push_str(&format!(" LIMIT {offset}, {limit}"));

    let rows = fetch_rows(client, &sql).await?;

    let count_sql = format!("SELECT COUNT(*) FROM {formatted_table}");
    let count_rows = fetch_rows(client, &count_sql).await?;
    let total = count_rows
        .get(1)
        .and_then(|row| row.first())
        .and_then(|cell| cell.parse::<usize>().ok())
        .ok_or_else(|| {
            DriverError::Query("clickhouse count query returned no rows".to_string())
        })?;

    Ok((rows, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EMPTY_CELL;

    #[test]
    fn compact_rows_parse_names_types_then_data() {
        let raw = b"[\"id\",\"host\",\"note\"]\n[\"UInt32\",\"IPv4\",\"Nullable(String)\"]\n[1,\"10.0.0.1\",null]\n[2,\"10.0.0.2\",\"\"]\n";
        let rows = parse_compact_rows(raw).unwrap();
        assert_eq!(rows[0], vec!["id", "host", "note"]);
        assert_eq!(rows[1], vec!["1", "10.0.0.1", NULL_CELL]);
        assert_eq!(rows[2], vec!["2", "10.0.0.2", EMPTY_CELL]);
    }

    #[test]
    fn empty_response_yields_bare_header() {
        assert_eq!(parse_compact_rows(b"").unwrap(), vec![Vec::<String>::new()]);
    }

    #[test]
    fn cells_render_scalars_and_sentinels() {
        assert_eq!(render_cell(&JsonValue::Null), NULL_CELL);
        assert_eq!(render_cell(&JsonValue::String(String::new())), EMPTY_CELL);
        assert_eq!(render_cell(&serde_json::json!(3.5)), "3.5");
        assert_eq!(render_cell(&serde_json::json!(true)), "true");
    }
}
