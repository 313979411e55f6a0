use tokio_postgres::Client;

use crate::error::DriverError;
use crate::models::Query;

/// Execute built statements in order inside one transaction.
///
/// # Errors
/// Returns `DriverError::Transaction` on the first failing statement after
/// rolling the whole batch back.
pub(crate) async fn apply_queries(
    client: &mut Client,
    queries: &[Query],
) -> Result<(), DriverError> {
    let tx = client.transaction().await.map_err(|e| {
        DriverError::Transaction(format!("failed to begin postgres transaction: {e}"))
    })?;

    for query in queries {
        if let Err(e) = tx.batch_execute(&query.statement).await {
            let failure = format!("statement failed, batch rolled back: {e}");
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!("postgres rollback failed: {rollback}");
            }
            return Err(DriverError::Transaction(failure));
        }
    }

    tx.commit().await.map_err(|e| {
        DriverError::Transaction(format!("failed to commit postgres transaction: {e}"))
    })
}
