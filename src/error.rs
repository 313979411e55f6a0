use thiserror::Error;

/// Error taxonomy shared by every driver.
///
/// Engine-native errors are classified at the call site: connect/ping
/// failures become `Connection`, rejected statements become `Query`, and any
/// failure inside a pending-changes batch becomes `Transaction` (which always
/// means the batch was rolled back in full).
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl DriverError {
    /// True when this error means a rolled-back pending-changes batch.
    #[must_use]
    pub fn is_rollback(&self) -> bool {
        matches!(self, DriverError::Transaction(_))
    }
}

/// Reject an empty required object name with a `Validation` error.
///
/// # Errors
/// Returns `DriverError::Validation` naming the missing object kind.
pub(crate) fn require_name(value: &str, what: &str) -> Result<(), DriverError> {
    if value.is_empty() {
        Err(DriverError::Validation(format!("{what} name is required")))
    } else {
        Ok(())
    }
}
