//! PostgreSQL Backend Implementation
//!
//! Implements the migration backend traits over a single `sqlx::PgConnection`.

use async_trait::async_trait;
use sqlx::{Connection, Executor, Postgres, Row as SqlxRow};
use std::time::{Duration, Instant};

use super::core::*;
use crate::error::{MigrationError, MigrationResult};
use crate::migrations::definitions::LedgerRow;

type PgQuery<'a> = sqlx::query::Query<'a, Postgres, sqlx::postgres::PgArguments>;

/// PostgreSQL connection implementation
pub struct PostgresConnection {
    conn: sqlx::PgConnection,
}

impl PostgresConnection {
    /// Open a connection from a `postgres://` URL
    pub async fn connect(database_url: &str) -> MigrationResult<Self> {
        let conn = sqlx::PgConnection::connect(database_url)
            .await
            .map_err(|e| MigrationError::Connection(format!("Failed to connect to PostgreSQL: {}", e)))?;

        Ok(Self::new(conn))
    }

    pub fn new(conn: sqlx::PgConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl MigrationConnection for PostgresConnection {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::PostgreSQL
    }

    async fn execute(&mut self, sql: &str, params: &[DatabaseValue]) -> MigrationResult<u64> {
        let result = if params.is_empty() {
            Executor::execute(&mut self.conn, sql).await
        } else {
            bind_all(sqlx::query(sql), params).execute(&mut self.conn).await
        };

        result
            .map(|r| r.rows_affected())
            .map_err(|e| MigrationError::Connection(e.to_string()))
    }

    async fn fetch_optional_i64(&mut self, sql: &str) -> MigrationResult<Option<i64>> {
        sqlx::query_scalar::<_, Option<i64>>(sql)
            .fetch_one(&mut self.conn)
            .await
            .map_err(|e| MigrationError::LedgerQuery(e.to_string()))
    }

    async fn fetch_ledger_rows(&mut self, sql: &str) -> MigrationResult<Vec<LedgerRow>> {
        let rows = sqlx::query(sql)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| MigrationError::LedgerQuery(e.to_string()))?;

        rows.iter()
            .map(|row| {
                Ok(LedgerRow {
                    version: row
                        .try_get("version")
                        .map_err(|e| MigrationError::LedgerQuery(format!("Failed to get version: {}", e)))?,
                    created_at: row
                        .try_get("created_at")
                        .map_err(|e| MigrationError::LedgerQuery(format!("Failed to get created_at: {}", e)))?,
                })
            })
            .collect()
    }

    async fn begin<'c>(&'c mut self) -> MigrationResult<Box<dyn MigrationTransaction + 'c>> {
        let tx = self
            .conn
            .begin()
            .await
            .map_err(|e| MigrationError::Transaction(format!("Failed to start transaction: {}", e)))?;

        Ok(Box::new(PostgresTransaction::new(tx)))
    }

    async fn ping(&mut self) -> MigrationResult<Duration> {
        let start = Instant::now();

        self.conn
            .ping()
            .await
            .map_err(|e| MigrationError::Connection(format!("Ping failed: {}", e)))?;

        Ok(start.elapsed())
    }

    async fn close(self: Box<Self>) -> MigrationResult<()> {
        let this = *self;
        this.conn
            .close()
            .await
            .map_err(|e| MigrationError::Connection(format!("Failed to close connection: {}", e)))
    }
}

/// PostgreSQL transaction implementation
pub struct PostgresTransaction<'c> {
    tx: Option<sqlx::Transaction<'c, Postgres>>,
}

impl<'c> PostgresTransaction<'c> {
    pub fn new(tx: sqlx::Transaction<'c, Postgres>) -> Self {
        Self { tx: Some(tx) }
    }
}

#[async_trait]
impl<'c> MigrationTransaction for PostgresTransaction<'c> {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::PostgreSQL
    }

    async fn execute(&mut self, sql: &str, params: &[DatabaseValue]) -> MigrationResult<u64> {
        let tx = self
            .tx
            .as_mut()
            .ok_or_else(|| MigrationError::Transaction("Transaction already completed".to_string()))?;

        let result = if params.is_empty() {
            Executor::execute(&mut **tx, sql).await
        } else {
            bind_all(sqlx::query(sql), params).execute(&mut **tx).await
        };

        // Callers attach the migration version to this message
        result
            .map(|r| r.rows_affected())
            .map_err(|e| MigrationError::Transaction(e.to_string()))
    }

    async fn commit(mut self: Box<Self>) -> MigrationResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| MigrationError::Transaction("Transaction already completed".to_string()))?;

        tx.commit().await.map_err(|e| MigrationError::Commit(e.to_string()))
    }

    async fn rollback(mut self: Box<Self>) -> MigrationResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| MigrationError::Transaction("Transaction already completed".to_string()))?;

        tx.rollback()
            .await
            .map_err(|e| MigrationError::Transaction(format!("Transaction rollback failed: {}", e)))
    }
}

/// Bind DatabaseValues to a sqlx query in order
fn bind_all<'a>(mut query: PgQuery<'a>, params: &[DatabaseValue]) -> PgQuery<'a> {
    for param in params {
        query = match param {
            DatabaseValue::Int64(i) => query.bind(*i),
        };
    }
    query
}
