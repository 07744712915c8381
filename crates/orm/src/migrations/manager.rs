//! Migration Manager - File system operations for migrations
//!
//! Handles creating, loading, and parsing migration files from the
//! migrations directory. Loading is all-or-nothing: one bad entry aborts the
//! whole scan so a subset of migrations is never applied by accident.

use chrono::Utc;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use super::definitions::{filename_version, Migration, MigrationConfig, MIGRATION_EXTENSION};
use super::generators::MigrationBlueprint;
use crate::error::{MigrationError, MigrationResult};

/// Migration manager for creating and loading migrations
pub struct MigrationManager {
    config: MigrationConfig,
}

impl MigrationManager {
    /// Create a new migration manager with default configuration
    pub fn new() -> Self {
        Self::with_config(MigrationConfig::default())
    }

    /// Create a new migration manager with custom configuration
    pub fn with_config(config: MigrationConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Load every migration with a version greater than `since`, ascending.
    ///
    /// Hidden entries (names starting with `.`) are ignored. Fails if the
    /// directory cannot be read, if any other entry is not a
    /// `<version>_<name>.sql` file with a positive version, if any retained
    /// file is malformed, or if two files share a version.
    pub fn load_pending_since(&self, since: i64) -> MigrationResult<Vec<Migration>> {
        let dir = &self.config.migrations_dir;
        let scan_error = |message: String| MigrationError::DirectoryScan {
            path: dir.clone(),
            message,
        };

        let entries = fs::read_dir(dir).map_err(|e| scan_error(e.to_string()))?;

        let mut candidates: Vec<(i64, PathBuf)> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| scan_error(e.to_string()))?;
            let path = entry.path();

            // Hidden entries such as .gitkeep are not migrations
            if entry.file_name().to_string_lossy().starts_with('.') {
                tracing::debug!("Skipping hidden entry: {}", path.display());
                continue;
            }

            let is_sql_file = path.is_file()
                && path.extension().map_or(false, |ext| ext == MIGRATION_EXTENSION);
            if !is_sql_file {
                return Err(MigrationError::InvalidVersionFormat {
                    file: entry.file_name().to_string_lossy().into_owned(),
                });
            }

            candidates.push((filename_version(&path)?, path));
        }

        check_unique_versions(&candidates)?;

        candidates.retain(|(version, _)| *version > since);
        candidates.sort_by_key(|(version, _)| *version);

        let mut migrations = Vec::with_capacity(candidates.len());
        for (version, path) in candidates {
            let migration = Migration::read_from(&path)?;
            tracing::debug!("Staged migration version: {} ({})", version, migration.name);
            migrations.push(migration);
        }

        Ok(migrations)
    }

    /// Load all migrations in the directory, ascending
    pub fn load_all(&self) -> MigrationResult<Vec<Migration>> {
        self.load_pending_since(i64::MIN)
    }

    /// Create a new migration file stamped with the current nanosecond time.
    ///
    /// The version is bumped past the newest existing file so a new migration
    /// always sorts last, even when the clock is behind.
    pub fn create_migration(
        &self,
        name: &str,
        up_sql: &str,
        down_sql: &str,
    ) -> MigrationResult<(Migration, PathBuf)> {
        let version = self.next_version()?;
        self.write_new(Migration::new(version, name, up_sql, down_sql))
    }

    /// Create a new migration file from a generator blueprint
    pub fn create_from_blueprint(&self, blueprint: &MigrationBlueprint) -> MigrationResult<(Migration, PathBuf)> {
        let version = self.next_version()?;
        self.write_new(blueprint.to_migration(version))
    }

    fn write_new(&self, migration: Migration) -> MigrationResult<(Migration, PathBuf)> {
        let path = migration.write_to(&self.config.migrations_dir)?;

        tracing::info!("Created migration: {}", path.display());
        Ok((migration, path))
    }

    /// Current nanosecond time, or one past the newest existing version
    fn next_version(&self) -> MigrationResult<i64> {
        let newest = self.newest_version()?;
        let now = Utc::now()
            .timestamp_nanos_opt()
            .ok_or_else(|| MigrationError::Configuration("System clock is out of range".to_string()))?;
        let version = match newest {
            Some(newest) if newest >= now => newest.checked_add(1).ok_or_else(|| {
                MigrationError::InvalidVersionFormat {
                    file: format!("{}_*.{}", newest, MIGRATION_EXTENSION),
                }
            })?,
            _ => now,
        };
        Ok(version)
    }

    /// Greatest version among files in the directory; a missing directory has none
    fn newest_version(&self) -> MigrationResult<Option<i64>> {
        let dir = &self.config.migrations_dir;
        if !dir.exists() {
            return Ok(None);
        }

        let entries = fs::read_dir(dir).map_err(|e| MigrationError::DirectoryScan {
            path: dir.clone(),
            message: e.to_string(),
        })?;

        Ok(entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| filename_version(&entry.path()).ok())
            .max())
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

fn check_unique_versions(candidates: &[(i64, PathBuf)]) -> MigrationResult<()> {
    let mut seen: HashMap<i64, &PathBuf> = HashMap::new();

    for (version, path) in candidates {
        if let Some(first) = seen.insert(*version, path) {
            let file_name = |p: &PathBuf| {
                p.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            };
            let (mut first, mut second) = (file_name(first), file_name(path));
            if second < first {
                std::mem::swap(&mut first, &mut second);
            }
            return Err(MigrationError::DuplicateVersion {
                version: *version,
                first,
                second,
            });
        }
    }

    Ok(())
}
