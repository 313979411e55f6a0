use rusqlite::Connection;

use crate::error::DriverError;
use crate::models::Query;

/// Execute built statements in order inside one transaction.
///
/// # Errors
/// Returns `DriverError::Transaction` on the first failing statement after
/// rolling the whole batch back; nothing is left applied.
pub(crate) fn apply_queries(
    conn: &mut Connection,
    queries: &[Query],
) -> Result<(), DriverError> {
    let tx = conn.transaction().map_err(|e| {
        DriverError::Transaction(format!("failed to begin sqlite transaction: {e}"))
    })?;

    for query in queries {
        if let Err(e) = tx.execute_batch(&query.statement) {
            let _ = tx.rollback();
            return Err(DriverError::Transaction(format!(
                "statement failed, batch rolled back: {e}"
            )));
        }
    }

    tx.commit().map_err(|e| {
        DriverError::Transaction(format!("failed to commit sqlite transaction: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
             INSERT INTO t VALUES (1, 'one');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn all_statements_commit_together() {
        let mut conn = seeded();
        let queries = vec![
            Query::new("INSERT INTO t VALUES (2, 'two')", vec![]),
            Query::new("UPDATE t SET name = 'uno' WHERE id = 1", vec![]),
        ];
        apply_queries(&mut conn, &queries).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn one_failure_rolls_back_everything() {
        let mut conn = seeded();
        let queries = vec![
            Query::new("INSERT INTO t VALUES (2, 'two')", vec![]),
            // NOT NULL violation
            Query::new("INSERT INTO t VALUES (3, NULL)", vec![]),
        ];
        let err = apply_queries(&mut conn, &queries).unwrap_err();
        assert!(err.is_rollback());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
