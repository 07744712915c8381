//! # monarch-orm: Migration engine for monarch
//!
//! Reversible SQL migration files, a `schema_versions` ledger inside the
//! target database, and a runner that applies every pending migration in a
//! single transaction.
//!
//! ```no_run
//! use monarch_orm::{backends, MigrationManager, MigrationRunner};
//!
//! # async fn run() -> monarch_orm::MigrationResult<()> {
//! let mut conn = backends::connect("postgres://localhost/app").await?;
//! let runner = MigrationRunner::new(MigrationManager::new())?;
//! let result = runner.run_pending(conn.as_mut()).await?;
//! println!("applied {} migration(s)", result.applied_count());
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod error;
pub mod migrations;
pub mod naming;

// Re-export core types
pub use backends::{DatabaseBackendType, MigrationConnection, MigrationTransaction, SqlDialect};
pub use config::DatabaseConfig;
pub use error::*;
pub use migrations::*;
pub use naming::to_snake_case;
