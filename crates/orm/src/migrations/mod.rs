//! Migration System
//!
//! Migration files on disk, the schema ledger inside the target database,
//! and the runner that applies pending files in one transaction.

pub mod definitions;
pub mod generators;
pub mod ledger;
pub mod manager;
pub mod runner;
pub mod schema_builder;

pub use definitions::*;
pub use generators::MigrationBlueprint;
pub use ledger::{SchemaLedger, DEFAULT_LEDGER_TABLE};
pub use manager::MigrationManager;
pub use runner::MigrationRunner;
pub use schema_builder::{ColumnDef, ForeignKeyDef, SchemaBuilder, TableBuilder};
