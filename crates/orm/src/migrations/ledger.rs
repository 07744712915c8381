//! Schema Ledger - the `schema_versions` table inside the target database
//!
//! A version is present in the ledger if and only if its forward SQL has been
//! committed. Rows are only ever appended, inside the same transaction as the
//! migration they describe.

use crate::backends::{MigrationConnection, MigrationTransaction};
use crate::error::{MigrationError, MigrationResult};
use super::definitions::LedgerRow;

/// Default ledger table name
pub const DEFAULT_LEDGER_TABLE: &str = "schema_versions";

/// Reads and appends to the schema ledger table
#[derive(Debug, Clone)]
pub struct SchemaLedger {
    table: String,
}

impl SchemaLedger {
    /// Ledger backed by the default `schema_versions` table
    pub fn new() -> Self {
        Self {
            table: DEFAULT_LEDGER_TABLE.to_string(),
        }
    }

    /// Ledger backed by a custom table; the name must be a plain SQL identifier
    /// optionally qualified by a schema (`audit.schema_versions`)
    pub fn with_table(table: &str) -> MigrationResult<Self> {
        if !is_valid_identifier(table) {
            return Err(MigrationError::InvalidIdentifier(table.to_string()));
        }

        Ok(Self {
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the ledger table if it does not exist.
    ///
    /// Safe to call on every run. An existing table is not checked for shape.
    pub async fn ensure_bootstrapped(&self, conn: &mut dyn MigrationConnection) -> MigrationResult<()> {
        conn.execute(&self.create_table_sql(), &[])
            .await
            .map_err(|e| MigrationError::LedgerBootstrap(e.to_string()))?;

        tracing::debug!("Schema ledger '{}' is ready", self.table);
        Ok(())
    }

    /// Greatest committed version, or `0` when the ledger is empty
    pub async fn high_water_mark(&self, conn: &mut dyn MigrationConnection) -> MigrationResult<i64> {
        let version = conn
            .fetch_optional_i64(&self.high_water_mark_sql())
            .await?
            .unwrap_or(0);

        tracing::info!("Current schema version is: {}", version);
        Ok(version)
    }

    /// Append `version` to the ledger inside `tx`.
    ///
    /// Must run in the transaction that executed the migration's forward SQL.
    pub async fn record(&self, tx: &mut dyn MigrationTransaction, version: i64) -> MigrationResult<()> {
        let sql = self.record_sql(tx.dialect());

        tx.execute(&sql, &[version.into()])
            .await
            .map_err(|e| MigrationError::LedgerRecord {
                version,
                message: e.to_string(),
            })?;

        Ok(())
    }

    /// All committed rows, ascending by version
    pub async fn applied_versions(&self, conn: &mut dyn MigrationConnection) -> MigrationResult<Vec<LedgerRow>> {
        conn.fetch_ledger_rows(&self.applied_versions_sql()).await
    }

    /// SQL to create the ledger table
    pub fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                version BIGINT PRIMARY KEY,\n    \
                created_at TIMESTAMP NOT NULL\n\
            );",
            self.table
        )
    }

    /// SQL to get the high-water mark
    pub fn high_water_mark_sql(&self) -> String {
        format!("SELECT MAX(version) FROM {}", self.table)
    }

    /// SQL to record a version as applied
    pub fn record_sql(&self, dialect: crate::backends::SqlDialect) -> String {
        format!(
            "INSERT INTO {} (version, created_at) VALUES ({}, {})",
            self.table,
            dialect.parameter_placeholder(0),
            dialect.current_timestamp()
        )
    }

    /// SQL to get applied versions
    pub fn applied_versions_sql(&self) -> String {
        format!(
            "SELECT version, created_at FROM {} ORDER BY version ASC",
            self.table
        )
    }
}

impl Default for SchemaLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn is_valid_identifier(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2
        && parts.iter().all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}
