use anyhow::Context;
use monarch_orm::MigrationState;

use super::Settings;

/// Apply every pending migration
pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    let runner = settings.runner()?;
    let mut conn = settings.connect().await?;

    let outcome = runner.run_pending(conn.as_mut()).await;
    conn.close().await?;

    let result = outcome.context("Migration failed, no changes were applied")?;

    if result.is_noop() {
        println!("Schema is up to date at version {}.", result.current_version);
    } else {
        for version in &result.applied_versions {
            println!("  applied {}", version);
        }
        println!(
            "Migrated {} migration(s) from version {} to {}. Command completed in {:?}.",
            result.applied_count(),
            result.previous_version,
            result.current_version,
            result.elapsed
        );
    }

    Ok(())
}

/// Print every migration file with its applied state
pub async fn status(settings: &Settings) -> anyhow::Result<()> {
    let runner = settings.runner()?;
    let mut conn = settings.connect().await?;

    let outcome = runner.status(conn.as_mut()).await;
    conn.close().await?;
    let statuses = outcome.context("Failed to read migration status")?;

    println!("Migration Status:");
    println!("================");

    if statuses.is_empty() {
        println!("No migrations found in {}", settings.config.migrations_dir.display());
        return Ok(());
    }

    let mut pending = 0;
    for status in &statuses {
        match status.state {
            MigrationState::Applied { applied_at } => {
                println!("  applied  {}  {}  ({})", status.version, status.name, applied_at);
            }
            MigrationState::Pending => {
                pending += 1;
                println!("  pending  {}  {}", status.version, status.name);
            }
        }
    }

    println!();
    println!("{} applied, {} pending", statuses.len() - pending, pending);
    Ok(())
}
