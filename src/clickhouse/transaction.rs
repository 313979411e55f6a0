use clickhouse::Client;

use super::records::execute;
use crate::error::DriverError;
use crate::models::Query;

/// Execute built statements in input order.
///
/// ClickHouse has no transactional mutations: statements that already ran
/// cannot be rolled back. The batch keeps the shared ordering/first-error
/// contract, and a failure aborts everything that has not run yet.
///
/// # Errors
/// Returns `DriverError::Transaction` for the first failing statement.
pub(crate) async fn apply_queries(
    client: &Client,
    queries: &[Query],
) -> Result<(), DriverError> {
    for query in queries {
        execute(client, &query.statement).await.map_err(|e| {
            DriverError::Transaction(format!("statement failed, batch aborted: {e}"))
        })?;
    }
    Ok(())
}
