//! Migration generators
//!
//! Each generator returns a [`MigrationBlueprint`]: the migration name plus
//! matching forward and reverse SQL. Writing the file is left to
//! [`MigrationManager::create_from_blueprint`](super::manager::MigrationManager::create_from_blueprint).

use super::definitions::Migration;
use super::schema_builder::{ColumnDef, SchemaBuilder};
use crate::naming::to_snake_case;

/// Name and SQL of a migration that has not been written yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationBlueprint {
    pub name: String,
    /// Written as the first line of the up SQL
    pub comment: Option<String>,
    pub up_sql: String,
    pub down_sql: String,
}

impl MigrationBlueprint {
    fn new(name: impl Into<String>, up: &SchemaBuilder, down: &SchemaBuilder) -> Self {
        Self {
            name: name.into(),
            comment: None,
            up_sql: up.build(),
            down_sql: down.build(),
        }
    }

    fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Build the migration record stamped with `version`
    pub fn to_migration(&self, version: i64) -> Migration {
        let migration = Migration::new(version, &self.name, self.up_sql.as_str(), self.down_sql.as_str());
        match &self.comment {
            Some(comment) => migration.with_leading_comment(comment),
            None => migration,
        }
    }
}

/// Empty migration for hand-written SQL
pub fn empty(name: &str) -> MigrationBlueprint {
    MigrationBlueprint {
        name: name.to_string(),
        comment: None,
        up_sql: String::new(),
        down_sql: String::new(),
    }
}

/// CREATE TABLE with an id primary key, the given columns and timestamps
pub fn create_table(table: &str, columns: &[ColumnDef]) -> MigrationBlueprint {
    let table = to_snake_case(table);

    let mut up = SchemaBuilder::new();
    up.create_table(&table, |t| {
        t.id();
        for column in columns {
            t.column(&column.name, &column.column_type);
        }
        t.timestamps();
    });

    let mut down = SchemaBuilder::new();
    down.drop_table(&table);

    MigrationBlueprint::new(format!("create_table_{}", table), &up, &down)
        .with_comment(format!("Table: {}", table))
}

/// DROP TABLE; the reverse is left for the author to fill in
pub fn drop_table(table: &str) -> MigrationBlueprint {
    let table = to_snake_case(table);

    let mut up = SchemaBuilder::new();
    up.drop_table(&table);

    let mut down = SchemaBuilder::new();
    down.raw(&format!("-- Recreate table {} here to make this migration reversible.", table));

    MigrationBlueprint::new(format!("drop_table_{}", table), &up, &down)
}

pub fn rename_table(table: &str, new_name: &str) -> MigrationBlueprint {
    let mut up = SchemaBuilder::new();
    up.rename_table(table, new_name);

    let mut down = SchemaBuilder::new();
    down.rename_table(new_name, table);

    MigrationBlueprint::new(format!("rename_table_{}", to_snake_case(table)), &up, &down)
}

pub fn add_columns(table: &str, columns: &[ColumnDef]) -> MigrationBlueprint {
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();

    let mut up = SchemaBuilder::new();
    up.add_columns(table, columns);

    let mut down = SchemaBuilder::new();
    down.drop_columns(table, &names);

    MigrationBlueprint::new(format!("add_columns_to_{}", to_snake_case(table)), &up, &down)
}

/// DROP COLUMN; column types are unknown, so the reverse is a comment
pub fn drop_columns(table: &str, columns: &[&str]) -> MigrationBlueprint {
    let mut up = SchemaBuilder::new();
    up.drop_columns(table, columns);

    let mut down = SchemaBuilder::new();
    down.raw(&format!(
        "-- Re-add columns {} to {} here to make this migration reversible.",
        columns
            .iter()
            .map(|c| to_snake_case(c))
            .collect::<Vec<_>>()
            .join(", "),
        to_snake_case(table)
    ));

    MigrationBlueprint::new(format!("drop_columns_from_{}", to_snake_case(table)), &up, &down)
}

pub fn rename_column(table: &str, column: &str, new_name: &str) -> MigrationBlueprint {
    let mut up = SchemaBuilder::new();
    up.rename_column(table, column, new_name);

    let mut down = SchemaBuilder::new();
    down.rename_column(table, new_name, column);

    MigrationBlueprint::new(
        format!("rename_column_{}_{}", to_snake_case(table), to_snake_case(column)),
        &up,
        &down,
    )
}

pub fn create_index(table: &str, column: &str) -> MigrationBlueprint {
    let mut up = SchemaBuilder::new();
    up.create_index(table, column);

    let mut down = SchemaBuilder::new();
    down.drop_index(table, column);

    MigrationBlueprint::new(
        format!("CreateIndexOn_{}_{}", to_snake_case(table), to_snake_case(column)),
        &up,
        &down,
    )
}

pub fn add_foreign_key(referencing: &str, referenced: &str) -> MigrationBlueprint {
    let mut up = SchemaBuilder::new();
    up.add_foreign_key(referencing, referenced);

    let mut down = SchemaBuilder::new();
    down.drop_foreign_key(referencing, referenced);

    MigrationBlueprint::new(
        format!("AddForeignKeyTo_{}", to_snake_case(referencing)),
        &up,
        &down,
    )
}

pub fn drop_foreign_key(referencing: &str, referenced: &str) -> MigrationBlueprint {
    let mut up = SchemaBuilder::new();
    up.drop_foreign_key(referencing, referenced);

    let mut down = SchemaBuilder::new();
    down.add_foreign_key(referencing, referenced);

    MigrationBlueprint::new(
        format!("DropForeignKeyFrom_{}", to_snake_case(referencing)),
        &up,
        &down,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_blueprint() {
        let columns = vec![ColumnDef::new("givenName", "varchar"), ColumnDef::new("familyName", "varchar")];
        let bp = create_table("Users", &columns);

        assert_eq!(bp.name, "create_table_users");
        assert_eq!(bp.comment.as_deref(), Some("Table: users"));
        assert_eq!(
            bp.up_sql,
            "CREATE TABLE users (\n    \
             id bigint NOT NULL,\n    \
             given_name varchar,\n    \
             family_name varchar,\n    \
             created_at timestamp(6) without time zone NOT NULL,\n    \
             updated_at timestamp(6) without time zone NOT NULL,\n    \
             CONSTRAINT users_pkey PRIMARY KEY (id)\n\
             );"
        );
        assert_eq!(bp.down_sql, "DROP TABLE users;");

        let migration = bp.to_migration(7);
        assert_eq!(migration.version, 7);
        assert!(migration.up_sql.starts_with("-- Table: users\n\nCREATE TABLE users ("));
        assert_eq!(migration.down_sql, "DROP TABLE users;");
    }

    #[test]
    fn test_rename_blueprints_reverse() {
        let bp = rename_table("people", "persons");
        assert_eq!(bp.up_sql, "ALTER TABLE people RENAME TO persons;");
        assert_eq!(bp.down_sql, "ALTER TABLE persons RENAME TO people;");

        let bp = rename_column("users", "givenName", "firstName");
        assert_eq!(bp.name, "rename_column_users_given_name");
        assert_eq!(bp.up_sql, "ALTER TABLE users RENAME COLUMN given_name TO first_name;");
        assert_eq!(bp.down_sql, "ALTER TABLE users RENAME COLUMN first_name TO given_name;");
    }

    #[test]
    fn test_column_blueprints() {
        let bp = add_columns("users", &[ColumnDef::new("age", "integer")]);
        assert_eq!(bp.name, "add_columns_to_users");
        assert_eq!(bp.up_sql, "ALTER TABLE users\nADD COLUMN age integer;");
        assert_eq!(bp.down_sql, "ALTER TABLE users\nDROP COLUMN age;");

        let bp = drop_columns("users", &["age", "nickName"]);
        assert_eq!(bp.name, "drop_columns_from_users");
        assert_eq!(bp.up_sql, "ALTER TABLE users\nDROP COLUMN age,\nDROP COLUMN nick_name;");
        assert!(bp.down_sql.starts_with("-- Re-add columns age, nick_name to users"));
    }

    #[test]
    fn test_index_and_foreign_key_names() {
        let bp = create_index("users", "email");
        assert_eq!(Migration::new(1, &bp.name, "", "").name, "create_index_on_users_email");
        assert!(bp.up_sql.contains("users_email_mnrk_idx"));

        let bp = add_foreign_key("posts", "users");
        assert_eq!(Migration::new(1, &bp.name, "", "").name, "add_foreign_key_to_posts");
        assert!(bp.up_sql.contains("posts_users_mnrk_fkc"));
        assert!(bp.down_sql.contains("DROP COLUMN IF EXISTS users_id"));

        let bp = drop_foreign_key("posts", "users");
        assert_eq!(Migration::new(1, &bp.name, "", "").name, "drop_foreign_key_from_posts");
        assert!(bp.down_sql.contains("ADD COLUMN users_id bigint"));
    }

    #[test]
    fn test_empty_blueprint() {
        let bp = empty("BackfillUsers");
        assert_eq!(bp.name, "BackfillUsers");
        assert!(bp.up_sql.is_empty() && bp.down_sql.is_empty());
        assert_eq!(bp.to_migration(1).up_sql, "");
    }
}
