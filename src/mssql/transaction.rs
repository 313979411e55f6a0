use super::connection::MssqlClient;
use crate::error::DriverError;
use crate::models::Query;

/// Execute built statements in order inside one `BEGIN TRAN` block.
///
/// # Errors
/// Returns `DriverError::Transaction` on the first failing statement after
/// issuing `ROLLBACK TRAN`.
pub(crate) async fn apply_queries(
    client: &mut MssqlClient,
    queries: &[Query],
) -> Result<(), DriverError> {
    run(client, "BEGIN TRAN").await.map_err(|e| {
        DriverError::Transaction(format!("failed to begin sql server transaction: {e}"))
    })?;

    for query in queries {
        if let Err(e) = run(client, &query.statement).await {
            let failure = format!("statement failed, batch rolled back: {e}");
            if let Err(rollback) = run(client, "ROLLBACK TRAN").await {
                tracing::warn!("sql server rollback failed: {rollback}");
            }
            return Err(DriverError::Transaction(failure));
        }
    }

    run(client, "COMMIT TRAN").await.map_err(|e| {
        DriverError::Transaction(format!("failed to commit sql server transaction: {e}"))
    })
}

/// Run one statement and drain every result set it produces.
async fn run(client: &mut MssqlClient, sql: &str) -> Result<(), tiberius::error::Error> {
    client.simple_query(sql).await?.into_results().await?;
    Ok(())
}
