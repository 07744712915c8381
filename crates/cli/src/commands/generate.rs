use anyhow::{bail, Context};
use monarch_orm::{generators, ColumnDef, MigrationBlueprint};

use super::Settings;

pub fn migration(name: &str) -> MigrationBlueprint {
    generators::empty(name)
}

pub fn table(name: &str, columns: &[String]) -> anyhow::Result<MigrationBlueprint> {
    Ok(generators::create_table(name, &parse_columns(columns)?))
}

pub fn drop_table(name: &str) -> MigrationBlueprint {
    generators::drop_table(name)
}

pub fn rename_table(name: &str, new_name: &str) -> MigrationBlueprint {
    generators::rename_table(name, new_name)
}

pub fn add_columns(table: &str, columns: &[String]) -> anyhow::Result<MigrationBlueprint> {
    Ok(generators::add_columns(table, &parse_columns(columns)?))
}

pub fn drop_columns(table: &str, columns: &[String]) -> MigrationBlueprint {
    let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
    generators::drop_columns(table, &columns)
}

pub fn rename_column(table: &str, column: &str, new_name: &str) -> MigrationBlueprint {
    generators::rename_column(table, column, new_name)
}

pub fn index(table: &str, column: &str) -> MigrationBlueprint {
    generators::create_index(table, column)
}

pub fn foreign_key(referencing: &str, referenced: &str, drop: bool) -> MigrationBlueprint {
    if drop {
        generators::drop_foreign_key(referencing, referenced)
    } else {
        generators::add_foreign_key(referencing, referenced)
    }
}

/// Write the blueprint as a new migration file
pub fn write(settings: &Settings, blueprint: &MigrationBlueprint) -> anyhow::Result<()> {
    let (migration, path) = settings
        .manager()
        .create_from_blueprint(blueprint)
        .with_context(|| format!("Failed to create migration '{}'", blueprint.name))?;

    println!("Created migration {}: {}", migration.version, path.display());
    Ok(())
}

fn parse_columns(columns: &[String]) -> anyhow::Result<Vec<ColumnDef>> {
    columns
        .iter()
        .map(|raw| match ColumnDef::parse(raw) {
            Some(column) => Ok(column),
            None => bail!("Invalid column '{}': expected name:type", raw),
        })
        .collect()
}
