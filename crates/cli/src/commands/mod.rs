pub mod db;
pub mod generate;
pub mod migrate;

use anyhow::Context;
use monarch_orm::{backends, DatabaseConfig, MigrationConnection, MigrationManager, MigrationRunner};
use std::path::{Path, PathBuf};

/// Resolved configuration shared by every command
pub struct Settings {
    pub config: DatabaseConfig,
}

impl Settings {
    /// Config file, then environment, then command-line flags
    pub fn load(
        config_path: Option<&Path>,
        environment: &str,
        migrations_dir: Option<PathBuf>,
        database_url: Option<String>,
    ) -> anyhow::Result<Self> {
        let mut config = DatabaseConfig::load(config_path, environment)
            .context("Failed to load database configuration")?;

        if let Some(dir) = migrations_dir {
            config.migrations_dir = dir;
        }
        if let Some(url) = database_url {
            config.url = Some(url);
        }

        Ok(Self { config })
    }

    pub fn manager(&self) -> MigrationManager {
        MigrationManager::with_config(self.config.migration_config())
    }

    pub fn runner(&self) -> anyhow::Result<MigrationRunner> {
        MigrationRunner::new(self.manager()).context("Invalid migration configuration")
    }

    /// Connect to the target database
    pub async fn connect(&self) -> anyhow::Result<Box<dyn MigrationConnection>> {
        let url = self.config.database_url()?;
        backends::connect(&url)
            .await
            .with_context(|| format!("Could not connect to {}", backends::redact_url(&url)))
    }

    /// Connect to the server's maintenance database
    pub async fn connect_server(&self) -> anyhow::Result<Box<dyn MigrationConnection>> {
        let url = self.config.server_url()?;
        backends::connect(&url)
            .await
            .with_context(|| format!("Could not connect to {}", backends::redact_url(&url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_flags_override_config_file() {
        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("MONARCH_MIGRATIONS_DIR");

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("database.yaml");
        fs::write(&path, "development:\n  database: app_dev\n  migrations_dir: db/migrations\n").unwrap();

        let settings = Settings::load(Some(&path), "development", None, None).unwrap();
        assert_eq!(settings.config.migrations_dir, PathBuf::from("db/migrations"));
        assert_eq!(
            settings.config.database_url().unwrap(),
            "postgres://postgres@localhost:5432/app_dev"
        );

        let settings = Settings::load(
            Some(&path),
            "development",
            Some(PathBuf::from("sql")),
            Some("sqlite::memory:".to_string()),
        )
        .unwrap();
        assert_eq!(settings.manager().config().migrations_dir, PathBuf::from("sql"));
        assert_eq!(settings.config.database_url().unwrap(), "sqlite::memory:");
    }

    #[test]
    #[serial]
    fn test_missing_config_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.yaml");
        assert!(Settings::load(Some(&missing), "development", None, None).is_err());
    }
}
