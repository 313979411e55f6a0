//! Convenient imports for common functionality.

pub use crate::driver::{Driver, connect, driver_for, provider_from_url};
pub use crate::error::DriverError;
pub use crate::models::{
    ArgValue, DEFAULT_ROW_LIMIT, DmlChange, DmlType, EMPTY_CELL, NULL_CELL, Provider,
    Query, TableRows,
};
pub use crate::query_builder::{MutationSyntax, QueryFormatter};

#[cfg(feature = "clickhouse")]
pub use crate::clickhouse::ClickhouseDriver;
#[cfg(feature = "mssql")]
pub use crate::mssql::MssqlDriver;
#[cfg(feature = "mysql")]
pub use crate::mysql::MysqlDriver;
#[cfg(feature = "postgres")]
pub use crate::postgres::PostgresDriver;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteDriver;
