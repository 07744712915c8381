//! Migration Runner - Executes migrations against the database
//!
//! One run is a linear pass: bootstrap the ledger, read the high-water mark,
//! load every newer migration, then apply the whole batch inside a single
//! transaction. Either every pending migration commits together with its
//! ledger row, or the transaction is rolled back and the ledger is left
//! exactly as it was.

use std::collections::HashMap;
use std::time::Instant;

use super::definitions::{Migration, MigrationRunResult, MigrationState, MigrationStatus};
use super::ledger::SchemaLedger;
use super::manager::MigrationManager;
use crate::backends::{MigrationConnection, MigrationTransaction};
use crate::error::{MigrationError, MigrationResult};

/// Migration runner that applies pending migrations to a connection
pub struct MigrationRunner {
    manager: MigrationManager,
    ledger: SchemaLedger,
}

impl MigrationRunner {
    /// Create a runner using the ledger table named in the manager's config
    pub fn new(manager: MigrationManager) -> MigrationResult<Self> {
        let ledger = SchemaLedger::with_table(&manager.config().ledger_table)?;
        Ok(Self::with_ledger(manager, ledger))
    }

    pub fn with_ledger(manager: MigrationManager, ledger: SchemaLedger) -> Self {
        Self { manager, ledger }
    }

    /// Get the migration manager
    pub fn manager(&self) -> &MigrationManager {
        &self.manager
    }

    pub fn ledger(&self) -> &SchemaLedger {
        &self.ledger
    }

    /// Apply every migration newer than the ledger's high-water mark.
    ///
    /// An empty pending set succeeds without opening a transaction. On failure
    /// the returned error names the migration that failed, and no migration
    /// of the batch is recorded.
    pub async fn run_pending(&self, conn: &mut dyn MigrationConnection) -> MigrationResult<MigrationRunResult> {
        let start_time = Instant::now();

        self.ledger.ensure_bootstrapped(conn).await?;
        let previous_version = self.ledger.high_water_mark(conn).await?;
        let pending = self.manager.load_pending_since(previous_version)?;

        if pending.is_empty() {
            tracing::info!("Schema is up to date at version {}", previous_version);
            return Ok(MigrationRunResult {
                applied_versions: Vec::new(),
                previous_version,
                current_version: previous_version,
                elapsed: start_time.elapsed(),
            });
        }

        tracing::info!("Applying {} pending migration(s)", pending.len());
        self.apply_batch(conn, &pending).await?;

        let applied_versions: Vec<i64> = pending.iter().map(|m| m.version).collect();
        let current_version = applied_versions.last().copied().unwrap_or(previous_version);

        tracing::info!(
            "Migrated schema from version {} to {}",
            previous_version,
            current_version
        );

        Ok(MigrationRunResult {
            applied_versions,
            previous_version,
            current_version,
            elapsed: start_time.elapsed(),
        })
    }

    /// Apply `pending` in order inside one transaction
    async fn apply_batch(&self, conn: &mut dyn MigrationConnection, pending: &[Migration]) -> MigrationResult<()> {
        let mut transaction = conn.begin().await?;

        for migration in pending {
            if let Err(err) = self.apply_migration(transaction.as_mut(), migration).await {
                tracing::error!("Migration {} failed, rolling back batch: {}", migration.version, err);

                if let Err(rollback_err) = transaction.rollback().await {
                    tracing::warn!("Rollback after failed migration {} also failed: {}", migration.version, rollback_err);
                }
                return Err(err);
            }
        }

        transaction.commit().await.map_err(|e| match e {
            MigrationError::Commit(_) => e,
            other => MigrationError::Commit(other.to_string()),
        })
    }

    /// Execute one migration's forward SQL and record it in the ledger
    async fn apply_migration(&self, transaction: &mut dyn MigrationTransaction, migration: &Migration) -> MigrationResult<()> {
        tracing::info!("Applying migration: {} - {}", migration.version, migration.name);

        if !migration.up_sql.trim().is_empty() {
            transaction
                .execute(&migration.up_sql, &[])
                .await
                .map_err(|e| MigrationError::StatementExecution {
                    version: migration.version,
                    message: database_message(e),
                })?;
        }

        self.ledger.record(transaction, migration.version).await
    }

    /// Report every migration file as applied or pending
    pub async fn status(&self, conn: &mut dyn MigrationConnection) -> MigrationResult<Vec<MigrationStatus>> {
        self.ledger.ensure_bootstrapped(conn).await?;

        let applied: HashMap<i64, _> = self
            .ledger
            .applied_versions(conn)
            .await?
            .into_iter()
            .map(|row| (row.version, row.created_at))
            .collect();

        let migrations = self.manager.load_all()?;

        Ok(migrations
            .into_iter()
            .map(|migration| {
                let state = match applied.get(&migration.version) {
                    Some(applied_at) => MigrationState::Applied {
                        applied_at: *applied_at,
                    },
                    None => MigrationState::Pending,
                };
                MigrationStatus {
                    version: migration.version,
                    name: migration.name,
                    state,
                }
            })
            .collect())
    }
}

/// Unwrap the driver message from a transaction-level error
fn database_message(err: MigrationError) -> String {
    match err {
        MigrationError::Transaction(message) => message,
        other => other.to_string(),
    }
}
