//! Error types for the migration engine
//!
//! Every variant is terminal for the current run; nothing is retried.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Error types for migration operations
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The delimiter line is missing or appears more than once
    #[error("Malformed migration file {path}: expected exactly one delimiter line, found {occurrences}")]
    MalformedMigrationFile { path: PathBuf, occurrences: usize },

    /// The entry is not a migration file or its prefix is not a positive 64-bit integer
    #[error("Invalid migration file name '{file}': expected '<version>_<name>.sql' with a positive version")]
    InvalidVersionFormat { file: String },

    /// The migrations directory could not be read
    #[error("Failed to scan migrations directory {path}: {message}")]
    DirectoryScan { path: PathBuf, message: String },

    /// Two migration files share the same version
    #[error("Duplicate migration version {version}: '{first}' and '{second}'")]
    DuplicateVersion {
        version: i64,
        first: String,
        second: String,
    },

    /// The ledger table could not be created
    #[error("Failed to bootstrap schema ledger: {0}")]
    LedgerBootstrap(String),

    /// The ledger table could not be read
    #[error("Failed to query schema ledger: {0}")]
    LedgerQuery(String),

    /// Forward SQL was rejected by the database
    #[error("Migration {version} failed: {message}")]
    StatementExecution { version: i64, message: String },

    /// The ledger row for a migration could not be inserted
    #[error("Failed to record migration {version} in schema ledger: {message}")]
    LedgerRecord { version: i64, message: String },

    /// Beginning or rolling back a transaction failed
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// The batch transaction could not be committed
    #[error("Failed to commit migrations: {0}")]
    Commit(String),

    /// Connecting to or talking with the database failed
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A name cannot be used as a SQL identifier
    #[error("Invalid SQL identifier: '{0}'")]
    InvalidIdentifier(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MigrationError {
    /// Version of the migration that caused the failure, if any
    pub fn failed_version(&self) -> Option<i64> {
        match self {
            MigrationError::StatementExecution { version, .. }
            | MigrationError::LedgerRecord { version, .. }
            | MigrationError::DuplicateVersion { version, .. } => Some(*version),
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for MigrationError {
    fn from(err: serde_yaml::Error) -> Self {
        MigrationError::Configuration(err.to_string())
    }
}
