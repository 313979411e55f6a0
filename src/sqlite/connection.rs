use rusqlite::Connection;

use crate::error::DriverError;

/// Resolve the database path out of a connection string.
///
/// Accepts `sqlite://PATH`, `sqlite:PATH`, `file:PATH`, or a bare filesystem
/// path; `:memory:` opens an in-memory database.
pub(crate) fn resolve_path(url: &str) -> Result<String, DriverError> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .or_else(|| url.strip_prefix("file://"))
        .or_else(|| url.strip_prefix("file:"))
        .unwrap_or(url);

    if path.is_empty() {
        return Err(DriverError::Connection(
            "sqlite connection string has no path".to_string(),
        ));
    }
    Ok(path.to_string())
}

/// Open the database and run a liveness check.
///
/// # Errors
/// Returns `DriverError::Connection` if the path is missing, the file cannot
/// be opened, or the liveness query fails.
pub(crate) fn open(url: &str) -> Result<Connection, DriverError> {
    let path = resolve_path(url)?;

    let conn = if path == ":memory:" {
        Connection::open_in_memory()
    } else {
        Connection::open(&path)
    }
    .map_err(|e| DriverError::Connection(format!("failed to open sqlite database: {e}")))?;

    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
        .map_err(|e| DriverError::Connection(format!("sqlite liveness check failed: {e}")))?;

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_resolve_from_all_accepted_forms() {
        assert_eq!(resolve_path("sqlite:///tmp/a.db").unwrap(), "/tmp/a.db");
        assert_eq!(resolve_path("sqlite:a.db").unwrap(), "a.db");
        assert_eq!(resolve_path("file:a.db").unwrap(), "a.db");
        assert_eq!(resolve_path("/tmp/a.db").unwrap(), "/tmp/a.db");
        assert_eq!(resolve_path("sqlite://:memory:").unwrap(), ":memory:");
        assert!(resolve_path("sqlite://").is_err());
    }

    #[test]
    fn in_memory_database_opens_and_pings() {
        let conn = open(":memory:").unwrap();
        let one: i64 = conn.query_row("SELECT 1", [], |r| r.get(0)).unwrap();
        assert_eq!(one, 1);
    }
}
