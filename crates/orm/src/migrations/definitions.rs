//! Migration Definitions - Core types and the on-disk migration format
//!
//! A migration lives in a single file named `<version>_<name>.sql`. The body
//! holds the forward ("up") SQL, a fixed delimiter line, then the reverse
//! ("down") SQL.

use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::ledger::DEFAULT_LEDGER_TABLE;
use crate::error::{MigrationError, MigrationResult};
use crate::naming::to_snake_case;

/// Line separating up SQL from down SQL in a migration file
pub const MIGRATION_DELIMITER: &str = "-- MIGRATION DELIMITER (DO NOT DELETE THIS COMMENT) --";

/// Extension of migration files
pub const MIGRATION_EXTENSION: &str = "sql";

/// Represents a database migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Normalized, human-readable name
    pub name: String,
    /// Nanosecond creation timestamp; orders migrations and keys the ledger
    pub version: i64,
    /// SQL statements to apply the migration
    pub up_sql: String,
    /// SQL statements that undo `up_sql`; stored, never executed by the runner
    pub down_sql: String,
}

impl Migration {
    /// Create a migration, normalizing `name` to snake_case
    pub fn new(
        version: i64,
        name: &str,
        up_sql: impl Into<String>,
        down_sql: impl Into<String>,
    ) -> Self {
        Self {
            name: to_snake_case(name),
            version,
            up_sql: up_sql.into(),
            down_sql: down_sql.into(),
        }
    }

    /// Prefix the up SQL with a single-line SQL comment.
    ///
    /// Surrounding whitespace and any leading `--` are stripped from `comment`
    /// before it is re-prefixed with `-- `.
    pub fn with_leading_comment(mut self, comment: &str) -> Self {
        let text = comment.trim().trim_start_matches("--").trim();
        self.up_sql = format!("-- {}\n\n{}", text, self.up_sql.trim());
        self
    }

    /// File name for this migration: `<version>_<name>.sql`
    pub fn file_name(&self) -> String {
        format!("{}_{}.{}", self.version, self.name, MIGRATION_EXTENSION)
    }

    /// Serialize to the on-disk file body
    pub fn encode(&self) -> String {
        [self.up_sql.trim(), MIGRATION_DELIMITER, self.down_sql.trim()].join("\n\n")
    }

    /// Rebuild a migration from a file body.
    ///
    /// Fails with `MalformedMigrationFile` unless the delimiter line appears
    /// exactly once.
    pub fn decode(version: i64, name: &str, raw: &str) -> MigrationResult<Self> {
        Self::decode_file(version, name, raw, Path::new(name))
    }

    fn decode_file(version: i64, name: &str, raw: &str, path: &Path) -> MigrationResult<Self> {
        let parts: Vec<&str> = raw.split(MIGRATION_DELIMITER).collect();
        if parts.len() != 2 {
            return Err(MigrationError::MalformedMigrationFile {
                path: path.to_path_buf(),
                occurrences: parts.len() - 1,
            });
        }

        Ok(Self::new(version, name, parts[0].trim(), parts[1].trim()))
    }

    /// Read and decode a migration file; version and name come from the file name
    pub fn read_from(path: &Path) -> MigrationResult<Self> {
        let version = filename_version(path)?;
        let name = filename_name(path);
        let raw = fs::read_to_string(path)?;

        Self::decode_file(version, &name, &raw, path)
    }

    /// Write the migration into `dir`, creating the directory when missing.
    ///
    /// An existing file with the same name is overwritten.
    pub fn write_to(&self, dir: &Path) -> MigrationResult<PathBuf> {
        fs::create_dir_all(dir)?;

        let path = dir.join(self.file_name());
        fs::write(&path, self.encode())?;

        Ok(path)
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Extract the version from a migration file name.
///
/// The text before the first `_` of the base name must be a positive `i64`
/// written exactly as [`Migration::file_name`] writes it: no sign, no leading
/// zeros.
pub fn filename_version(path: &Path) -> MigrationResult<i64> {
    let file = base_name(path);
    let invalid = || MigrationError::InvalidVersionFormat { file: file.clone() };

    let (prefix, _) = file.split_once('_').ok_or_else(invalid)?;
    let version = prefix.parse::<i64>().map_err(|_| invalid())?;
    if version <= 0 || version.to_string() != prefix {
        return Err(invalid());
    }
    Ok(version)
}

/// Extract the display name from a migration file name.
///
/// Everything after the first `_`, without the `.sql` suffix, normalized.
pub fn filename_name(path: &Path) -> String {
    let file = base_name(path);
    let rest = file.split_once('_').map(|(_, rest)| rest).unwrap_or("");
    let rest = rest
        .strip_suffix(&format!(".{}", MIGRATION_EXTENSION))
        .unwrap_or(rest);

    to_snake_case(rest)
}

/// Configuration for the migration system
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Directory where migration files are stored
    pub migrations_dir: PathBuf,
    /// Table name for the schema ledger
    pub ledger_table: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from("migrations"),
            ledger_table: DEFAULT_LEDGER_TABLE.to_string(),
        }
    }
}

/// A committed row of the schema ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    pub version: i64,
    pub created_at: NaiveDateTime,
}

/// Result of running migrations
#[derive(Debug, Clone)]
pub struct MigrationRunResult {
    /// Versions applied in this run, ascending
    pub applied_versions: Vec<i64>,
    /// High-water mark before the run
    pub previous_version: i64,
    /// High-water mark after the run
    pub current_version: i64,
    /// Total execution time
    pub elapsed: Duration,
}

impl MigrationRunResult {
    /// Number of migrations that were applied
    pub fn applied_count(&self) -> usize {
        self.applied_versions.len()
    }

    pub fn is_noop(&self) -> bool {
        self.applied_versions.is_empty()
    }
}

/// Migration state as seen from the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationState {
    /// Not yet applied
    Pending,
    /// Committed to the database
    Applied {
        /// When it was applied
        applied_at: NaiveDateTime,
    },
}

/// One line of a status report
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    pub version: i64,
    pub name: String,
    pub state: MigrationState,
}

impl MigrationStatus {
    pub fn is_applied(&self) -> bool {
        matches!(self.state, MigrationState::Applied { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::ledger::SchemaLedger;
    use tempfile::TempDir;

    fn sample() -> Migration {
        Migration::new(
            1_700_000_000_000_000_000,
            "CreateUsers",
            "CREATE TABLE users (id bigint NOT NULL);",
            "DROP TABLE users;",
        )
    }

    #[test]
    fn test_new_normalizes_name() {
        let m = sample();
        assert_eq!(m.name, "create_users");
        assert_eq!(m.file_name(), "1700000000000000000_create_users.sql");
    }

    #[test]
    fn test_encode_layout() {
        let m = Migration::new(1, "x", "  CREATE TABLE a (id int);\n", "\nDROP TABLE a;  ");
        assert_eq!(
            m.encode(),
            format!("CREATE TABLE a (id int);\n\n{}\n\nDROP TABLE a;", MIGRATION_DELIMITER)
        );
    }

    #[test]
    fn test_decode_encode_round_trip() {
        let m = sample();
        let decoded = Migration::decode(m.version, &m.name, &m.encode()).unwrap();
        assert_eq!(decoded, m);
    }

    #[test]
    fn test_round_trip_with_empty_sections() {
        let m = Migration::new(7, "empty", "", "");
        let decoded = Migration::decode(7, "empty", &m.encode()).unwrap();
        assert_eq!(decoded.up_sql, "");
        assert_eq!(decoded.down_sql, "");
    }

    #[test]
    fn test_decode_rejects_missing_delimiter() {
        let err = Migration::decode(1, "x", "CREATE TABLE a (id int);").unwrap_err();
        assert!(matches!(
            err,
            MigrationError::MalformedMigrationFile { occurrences: 0, .. }
        ));
    }

    #[test]
    fn test_decode_rejects_duplicate_delimiter() {
        let raw = format!("a\n{0}\nb\n{0}\nc", MIGRATION_DELIMITER);
        let err = Migration::decode(1, "x", &raw).unwrap_err();
        assert!(matches!(
            err,
            MigrationError::MalformedMigrationFile { occurrences: 2, .. }
        ));
    }

    #[test]
    fn test_filename_version() {
        let path = Path::new("migrations/1234567890_create_users.sql");
        assert_eq!(filename_version(path).unwrap(), 1234567890);

        let path = Path::new("/abs/dir/10000000000000000_x_y_z.sql");
        assert_eq!(filename_version(path).unwrap(), 10000000000000000);
    }

    #[test]
    fn test_filename_version_invalid() {
        for name in [
            "README.md",
            "abc_create.sql",
            "_create.sql",
            "99999999999999999999_x.sql",
            "0_init.sql",
            "-5_neg.sql",
            "+5_plus.sql",
            "005_padded.sql",
        ] {
            let err = filename_version(Path::new(name)).unwrap_err();
            assert!(
                matches!(err, MigrationError::InvalidVersionFormat { .. }),
                "name: {}",
                name
            );
        }
    }

    #[test]
    fn test_filename_name() {
        assert_eq!(
            filename_name(Path::new("migrations/123_create_table_users.sql")),
            "create_table_users"
        );
        assert_eq!(filename_name(Path::new("123_AddUserID.sql")), "add_user_id");
        assert_eq!(filename_name(Path::new("123")), "");
    }

    #[test]
    fn test_leading_comment() {
        let m = Migration::new(1, "x", "CREATE TABLE a (id int);", "")
            .with_leading_comment("  -- Create table a ");
        assert_eq!(m.up_sql, "-- Create table a\n\nCREATE TABLE a (id int);");
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested").join("migrations");
        let m = sample();

        let path = m.write_to(&dir).unwrap();
        assert_eq!(path, dir.join(m.file_name()));

        let read = Migration::read_from(&path).unwrap();
        assert_eq!(read, m);
    }

    #[test]
    fn test_write_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let mut m = sample();
        m.write_to(temp_dir.path()).unwrap();

        m.up_sql = "CREATE TABLE accounts (id bigint);".to_string();
        let path = m.write_to(temp_dir.path()).unwrap();

        let read = Migration::read_from(&path).unwrap();
        assert_eq!(read.up_sql, "CREATE TABLE accounts (id bigint);");
    }

    #[test]
    fn test_read_malformed_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("5_broken.sql");
        fs::write(&path, "CREATE TABLE a (id int);").unwrap();

        match Migration::read_from(&path).unwrap_err() {
            MigrationError::MalformedMigrationFile { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_default_config_uses_ledger_table() {
        let config = MigrationConfig::default();
        assert_eq!(config.ledger_table, DEFAULT_LEDGER_TABLE);
        assert_eq!(SchemaLedger::with_table(&config.ledger_table).unwrap().table(), "schema_versions");
    }
}
