//! Schema Builder - DSL for creating database schema changes
//!
//! Provides a fluent interface for building the SQL statements that
//! generated migrations contain. Identifiers passed in are normalized to
//! snake_case; column types are passed through untouched.

use crate::naming::to_snake_case;

/// Basic schema operations for migrations
pub struct SchemaBuilder {
    statements: Vec<String>,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        Self {
            statements: Vec::new(),
        }
    }

    /// Create a new table
    pub fn create_table<F>(&mut self, table_name: &str, callback: F) -> &mut Self
    where
        F: FnOnce(&mut TableBuilder),
    {
        let mut table_builder = TableBuilder::new(table_name);
        callback(&mut table_builder);

        let sql = table_builder.to_sql();
        self.statements.push(sql);
        self
    }

    /// Drop a table
    pub fn drop_table(&mut self, table_name: &str) -> &mut Self {
        self.statements
            .push(format!("DROP TABLE {};", to_snake_case(table_name)));
        self
    }

    /// Rename a table
    pub fn rename_table(&mut self, table_name: &str, new_name: &str) -> &mut Self {
        self.statements.push(format!(
            "ALTER TABLE {} RENAME TO {};",
            to_snake_case(table_name),
            to_snake_case(new_name)
        ));
        self
    }

    /// Add columns to an existing table in one statement
    pub fn add_columns(&mut self, table_name: &str, columns: &[ColumnDef]) -> &mut Self {
        let clauses: Vec<String> = columns
            .iter()
            .map(|c| format!("ADD COLUMN {} {}", c.name, c.column_type))
            .collect();
        self.alter_table(table_name, &clauses)
    }

    /// Drop columns from an existing table in one statement
    pub fn drop_columns(&mut self, table_name: &str, column_names: &[&str]) -> &mut Self {
        let clauses: Vec<String> = column_names
            .iter()
            .map(|c| format!("DROP COLUMN {}", to_snake_case(c)))
            .collect();
        self.alter_table(table_name, &clauses)
    }

    /// Rename a column
    pub fn rename_column(&mut self, table_name: &str, column_name: &str, new_name: &str) -> &mut Self {
        self.statements.push(format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {};",
            to_snake_case(table_name),
            to_snake_case(column_name),
            to_snake_case(new_name)
        ));
        self
    }

    fn alter_table(&mut self, table_name: &str, clauses: &[String]) -> &mut Self {
        self.statements.push(format!(
            "ALTER TABLE {}\n{};",
            to_snake_case(table_name),
            clauses.join(",\n")
        ));
        self
    }

    /// Create an index
    pub fn create_index(&mut self, table_name: &str, column_name: &str) -> &mut Self {
        let table = to_snake_case(table_name);
        let column = to_snake_case(column_name);
        self.statements.push(format!(
            "CREATE INDEX {} ON {} ({});",
            index_name(&table, &column),
            table,
            column
        ));
        self
    }

    /// Drop an index created by `create_index`
    pub fn drop_index(&mut self, table_name: &str, column_name: &str) -> &mut Self {
        let name = index_name(&to_snake_case(table_name), &to_snake_case(column_name));
        self.statements.push(format!("DROP INDEX IF EXISTS {};", name));
        self
    }

    /// Add a `<referenced>_id` column to `referencing` with a foreign key to `referenced (id)`
    pub fn add_foreign_key(&mut self, referencing: &str, referenced: &str) -> &mut Self {
        let fk = ForeignKeyDef::new(referencing, referenced);
        self.statements.push(format!(
            "ALTER TABLE {}\nADD COLUMN {} bigint,\nADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} (id);",
            fk.referencing,
            fk.column_name(),
            fk.constraint_name(),
            fk.column_name(),
            fk.referenced
        ));
        self
    }

    /// Drop a foreign key and its column added by `add_foreign_key`
    pub fn drop_foreign_key(&mut self, referencing: &str, referenced: &str) -> &mut Self {
        let fk = ForeignKeyDef::new(referencing, referenced);
        self.statements.push(format!(
            "ALTER TABLE {}\nDROP CONSTRAINT IF EXISTS {},\nDROP COLUMN IF EXISTS {};",
            fk.referencing,
            fk.constraint_name(),
            fk.column_name()
        ));
        self
    }

    /// Create a database owned by `owner`
    pub fn create_database(&mut self, name: &str, owner: Option<&str>) -> &mut Self {
        let sql = match owner {
            Some(owner) => format!("CREATE DATABASE {} WITH OWNER = {};", to_snake_case(name), owner),
            None => format!("CREATE DATABASE {};", to_snake_case(name)),
        };
        self.statements.push(sql);
        self
    }

    /// Drop a database
    pub fn drop_database(&mut self, name: &str) -> &mut Self {
        self.statements
            .push(format!("DROP DATABASE IF EXISTS {};", to_snake_case(name)));
        self
    }

    /// Append a raw SQL line, typically a comment
    pub fn raw(&mut self, sql: &str) -> &mut Self {
        self.statements.push(sql.to_string());
        self
    }

    /// Get all SQL statements
    pub fn to_sql(&self) -> Vec<String> {
        self.statements.clone()
    }

    /// All statements joined into one SQL string
    pub fn build(&self) -> String {
        self.statements.join("\n")
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn index_name(table: &str, column: &str) -> String {
    format!("{}_{}_mnrk_idx", table, column)
}

/// A column given on the command line as `name:type`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: String,
}

impl ColumnDef {
    pub fn new(name: &str, column_type: &str) -> Self {
        Self {
            name: to_snake_case(name),
            column_type: column_type.trim().to_string(),
        }
    }

    /// Parse `name:type`; the type may itself contain colons or spaces
    pub fn parse(raw: &str) -> Option<Self> {
        let (name, column_type) = raw.split_once(':')?;
        let column = Self::new(name, column_type);
        if column.name.is_empty() || column.column_type.is_empty() {
            return None;
        }
        Some(column)
    }
}

/// Names derived for a foreign key between two tables
#[derive(Debug, Clone)]
pub struct ForeignKeyDef {
    pub referencing: String,
    pub referenced: String,
}

impl ForeignKeyDef {
    pub fn new(referencing: &str, referenced: &str) -> Self {
        Self {
            referencing: to_snake_case(referencing),
            referenced: to_snake_case(referenced),
        }
    }

    pub fn column_name(&self) -> String {
        format!("{}_id", self.referenced)
    }

    pub fn constraint_name(&self) -> String {
        format!("{}_{}_mnrk_fkc", self.referencing, self.referenced)
    }
}

/// Table builder for CREATE TABLE statements
pub struct TableBuilder {
    table_name: String,
    columns: Vec<String>,
    constraints: Vec<String>,
}

impl TableBuilder {
    pub fn new(table_name: &str) -> Self {
        Self {
            table_name: to_snake_case(table_name),
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.table_name
    }

    /// Add a column
    pub fn column(&mut self, name: &str, column_type: &str) -> &mut Self {
        self.columns
            .push(format!("{} {}", to_snake_case(name), column_type));
        self
    }

    /// Add a `bigint NOT NULL` id column with a named primary key constraint
    pub fn id(&mut self) -> &mut Self {
        self.columns.push("id bigint NOT NULL".to_string());
        self.constraints.push(format!(
            "CONSTRAINT {}_pkey PRIMARY KEY (id)",
            self.table_name
        ));
        self
    }

    /// Add timestamp columns
    pub fn timestamps(&mut self) -> &mut Self {
        self.columns
            .push("created_at timestamp(6) without time zone NOT NULL".to_string());
        self.columns
            .push("updated_at timestamp(6) without time zone NOT NULL".to_string());
        self
    }

    /// Add a foreign key constraint
    pub fn foreign_key(
        &mut self,
        column: &str,
        references_table: &str,
        references_column: &str,
    ) -> &mut Self {
        self.constraints.push(format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            to_snake_case(column),
            to_snake_case(references_table),
            to_snake_case(references_column)
        ));
        self
    }

    /// Add a unique constraint
    pub fn unique(&mut self, columns: &[&str]) -> &mut Self {
        let columns: Vec<String> = columns.iter().map(|c| to_snake_case(c)).collect();
        self.constraints
            .push(format!("UNIQUE ({})", columns.join(", ")));
        self
    }

    /// Build the CREATE TABLE SQL
    pub fn to_sql(&self) -> String {
        let mut parts = self.columns.clone();
        parts.extend(self.constraints.clone());

        format!(
            "CREATE TABLE {} (\n    {}\n);",
            self.table_name,
            parts.join(",\n    ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_builder() {
        let mut builder = SchemaBuilder::new();
        builder.create_table("Users", |table| {
            table.id();
            table.column("name", "varchar(255)");
            table.column("emailAddress", "varchar(255)");
            table.timestamps();
            table.unique(&["emailAddress"]);
        });

        let sql = builder.build();
        assert!(sql.contains("CREATE TABLE users"));
        assert!(sql.contains("id bigint NOT NULL"));
        assert!(sql.contains("name varchar(255)"));
        assert!(sql.contains("email_address varchar(255)"));
        assert!(sql.contains("created_at timestamp(6) without time zone NOT NULL"));
        assert!(sql.contains("UNIQUE (email_address)"));
        assert!(sql.contains("CONSTRAINT users_pkey PRIMARY KEY (id)"));
    }

    #[test]
    fn test_table_builder() {
        let mut table = TableBuilder::new("BlogPosts");
        table.id();
        table.column("title", "text");
        table.column("user_id", "bigint");
        table.foreign_key("user_id", "users", "id");

        let sql = table.to_sql();
        assert_eq!(table.name(), "blog_posts");
        assert!(sql.starts_with("CREATE TABLE blog_posts (\n    id bigint NOT NULL,"));
        assert!(sql.contains("title text"));
        assert!(sql.contains("FOREIGN KEY (user_id) REFERENCES users (id)"));
        assert!(sql.ends_with("\n);"));
    }

    #[test]
    fn test_column_statements() {
        let columns = vec![
            ColumnDef::parse("firstName:text").unwrap(),
            ColumnDef::parse("balance:numeric(10,2)").unwrap(),
        ];
        let sql = SchemaBuilder::new().add_columns("Accounts", &columns).build();
        assert_eq!(
            sql,
            "ALTER TABLE accounts\nADD COLUMN first_name text,\nADD COLUMN balance numeric(10,2);"
        );

        let sql = SchemaBuilder::new()
            .drop_columns("accounts", &["firstName", "balance"])
            .build();
        assert_eq!(sql, "ALTER TABLE accounts\nDROP COLUMN first_name,\nDROP COLUMN balance;");

        let sql = SchemaBuilder::new().rename_column("accounts", "balance", "amountDue").build();
        assert_eq!(sql, "ALTER TABLE accounts RENAME COLUMN balance TO amount_due;");
    }

    #[test]
    fn test_column_def_parse() {
        assert_eq!(
            ColumnDef::parse("createdAt:timestamp with time zone"),
            Some(ColumnDef::new("created_at", "timestamp with time zone"))
        );
        assert_eq!(ColumnDef::parse("missing_type"), None);
        assert_eq!(ColumnDef::parse("name:"), None);
        assert_eq!(ColumnDef::parse(":text"), None);
    }

    #[test]
    fn test_index_statements() {
        let up = SchemaBuilder::new().create_index("Users", "emailAddress").build();
        assert_eq!(up, "CREATE INDEX users_email_address_mnrk_idx ON users (email_address);");

        let down = SchemaBuilder::new().drop_index("Users", "emailAddress").build();
        assert_eq!(down, "DROP INDEX IF EXISTS users_email_address_mnrk_idx;");
    }

    #[test]
    fn test_foreign_key_statements() {
        let up = SchemaBuilder::new().add_foreign_key("BlogPosts", "Users").build();
        assert_eq!(
            up,
            "ALTER TABLE blog_posts\nADD COLUMN users_id bigint,\n\
             ADD CONSTRAINT blog_posts_users_mnrk_fkc FOREIGN KEY (users_id) REFERENCES users (id);"
        );

        let down = SchemaBuilder::new().drop_foreign_key("BlogPosts", "Users").build();
        assert!(down.contains("DROP CONSTRAINT IF EXISTS blog_posts_users_mnrk_fkc"));
        assert!(down.contains("DROP COLUMN IF EXISTS users_id"));
    }

    #[test]
    fn test_database_statements() {
        let sql = SchemaBuilder::new().create_database("AppDev", Some("postgres")).build();
        assert_eq!(sql, "CREATE DATABASE app_dev WITH OWNER = postgres;");

        let sql = SchemaBuilder::new().drop_database("app_dev").build();
        assert_eq!(sql, "DROP DATABASE IF EXISTS app_dev;");
    }
}
