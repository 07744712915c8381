//! Core Database Backend Traits
//!
//! The migration engine only needs a narrow slice of a database driver: run
//! verbatim SQL, read a scalar, read ledger rows and open one transaction.
//! These traits describe that slice so the ledger and runner stay independent
//! of the concrete driver.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::MigrationResult;
use crate::migrations::definitions::LedgerRow;

/// A single open database connection, exclusively owned by one caller
#[async_trait]
pub trait MigrationConnection: Send {
    /// SQL dialect spoken by this connection
    fn dialect(&self) -> SqlDialect;

    /// Execute SQL outside of any transaction and return affected rows.
    ///
    /// Without parameters the text is sent verbatim and may hold several
    /// statements.
    async fn execute(&mut self, sql: &str, params: &[DatabaseValue]) -> MigrationResult<u64>;

    /// Fetch a single nullable BIGINT value from the first row
    async fn fetch_optional_i64(&mut self, sql: &str) -> MigrationResult<Option<i64>>;

    /// Fetch `(version, created_at)` rows from the ledger table
    async fn fetch_ledger_rows(&mut self, sql: &str) -> MigrationResult<Vec<LedgerRow>>;

    /// Begin a transaction borrowing this connection
    async fn begin<'c>(&'c mut self) -> MigrationResult<Box<dyn MigrationTransaction + 'c>>;

    /// Round-trip to the server and report the latency
    async fn ping(&mut self) -> MigrationResult<Duration>;

    /// Close the connection gracefully
    async fn close(self: Box<Self>) -> MigrationResult<()>;
}

/// Abstract database transaction trait
#[async_trait]
pub trait MigrationTransaction: Send {
    /// SQL dialect of the underlying connection
    fn dialect(&self) -> SqlDialect;

    /// Execute SQL within the transaction; verbatim when `params` is empty
    async fn execute(&mut self, sql: &str, params: &[DatabaseValue]) -> MigrationResult<u64>;

    /// Commit the transaction
    async fn commit(self: Box<Self>) -> MigrationResult<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> MigrationResult<()>;
}

/// Database value enumeration for parameter binding
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseValue {
    Int64(i64),
}

impl From<i64> for DatabaseValue {
    fn from(value: i64) -> Self {
        DatabaseValue::Int64(value)
    }
}

/// SQL dialect enumeration for generating database-specific SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    PostgreSQL,
    SQLite,
}

impl SqlDialect {
    /// Get the parameter placeholder for the zero-based parameter `index`
    pub fn parameter_placeholder(&self, index: usize) -> String {
        match self {
            SqlDialect::PostgreSQL => format!("${}", index + 1),
            SqlDialect::SQLite => "?".to_string(),
        }
    }

    /// Get the current timestamp function for this dialect
    pub fn current_timestamp(&self) -> &'static str {
        match self {
            SqlDialect::PostgreSQL => "NOW()",
            SqlDialect::SQLite => "datetime('now')",
        }
    }
}
