use mysql_async::prelude::Queryable;
use mysql_async::{Conn, TxOpts};

use crate::error::DriverError;
use crate::models::Query;

/// Execute built statements in order inside one transaction.
///
/// # Errors
/// Returns `DriverError::Transaction` on the first failing statement after
/// rolling the whole batch back.
pub(crate) async fn apply_queries(
    conn: &mut Conn,
    queries: &[Query],
) -> Result<(), DriverError> {
    let mut tx = conn
        .start_transaction(TxOpts::default())
        .await
        .map_err(|e| {
            DriverError::Transaction(format!("failed to begin mysql transaction: {e}"))
        })?;

    for query in queries {
        if let Err(e) = tx.query_drop(query.statement.as_str()).await {
            let failure = format!("statement failed, batch rolled back: {e}");
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!("mysql rollback failed: {rollback}");
            }
            return Err(DriverError::Transaction(failure));
        }
    }

    tx.commit().await.map_err(|e| {
        DriverError::Transaction(format!("failed to commit mysql transaction: {e}"))
    })
}
