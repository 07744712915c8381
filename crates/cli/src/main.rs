mod commands;
mod logging;

use clap::{Parser, Subcommand};
use commands::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "monarch")]
#[command(about = "Generate reversible SQL migrations and apply them in a single transaction")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./database.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Environment block to read from the config file
    #[arg(long, global = true, default_value = monarch_orm::config::DEFAULT_ENVIRONMENT)]
    env: String,

    /// Directory holding migration files
    #[arg(long, global = true)]
    migrations_dir: Option<PathBuf>,

    /// Database URL; overrides the config file and DATABASE_URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate migration files
    Generate {
        #[command(subcommand)]
        generate_command: GenerateCommands,
    },

    /// Database management
    Db {
        #[command(subcommand)]
        db_command: DbCommands,
    },
}

#[derive(Subcommand)]
enum GenerateCommands {
    /// Empty migration for hand-written SQL
    Migration {
        /// Migration name (e.g., BackfillUserEmails)
        name: String,
    },

    /// Create a table with id and timestamp columns
    Table {
        /// Table name
        name: String,

        /// Extra columns as name:type (e.g., email:varchar(255))
        columns: Vec<String>,
    },

    /// Drop a table
    DropTable {
        name: String,
    },

    /// Rename a table
    RenameTable {
        name: String,
        new_name: String,
    },

    /// Add columns to a table
    AddColumn {
        table: String,

        /// Columns as name:type
        #[arg(required = true)]
        columns: Vec<String>,
    },

    /// Drop columns from a table
    DropColumn {
        table: String,

        #[arg(required = true)]
        columns: Vec<String>,
    },

    /// Rename a column
    RenameColumn {
        table: String,
        column: String,
        new_name: String,
    },

    /// Index a column
    Index {
        table: String,
        column: String,
    },

    /// Add a <referenced>_id column and foreign key to the referencing table
    ForeignKey {
        /// Table that holds the new column
        referencing: String,

        /// Table whose id is referenced
        referenced: String,

        /// Generate the migration that drops the foreign key instead
        #[arg(long)]
        drop: bool,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Apply every pending migration in one transaction
    Migrate,

    /// Show applied and pending migrations
    Status,

    /// Verify the database is reachable
    Ping,

    /// Create the configured database
    Create,

    /// Drop the configured database
    Drop,

    /// Drop and then create the configured database
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_handle = logging::init_logging(cli.verbose, cli.log_json)?;

    let settings = Settings::load(
        cli.config.as_deref(),
        &cli.env,
        cli.migrations_dir,
        cli.database_url,
    )?;
    log_handle.apply_config_level(&settings.config.log_level)?;

    match cli.command {
        Commands::Generate { generate_command } => {
            let blueprint = match generate_command {
                GenerateCommands::Migration { name } => generate::migration(&name),
                GenerateCommands::Table { name, columns } => generate::table(&name, &columns)?,
                GenerateCommands::DropTable { name } => generate::drop_table(&name),
                GenerateCommands::RenameTable { name, new_name } => {
                    generate::rename_table(&name, &new_name)
                }
                GenerateCommands::AddColumn { table, columns } => {
                    generate::add_columns(&table, &columns)?
                }
                GenerateCommands::DropColumn { table, columns } => {
                    generate::drop_columns(&table, &columns)
                }
                GenerateCommands::RenameColumn { table, column, new_name } => {
                    generate::rename_column(&table, &column, &new_name)
                }
                GenerateCommands::Index { table, column } => generate::index(&table, &column),
                GenerateCommands::ForeignKey { referencing, referenced, drop } => {
                    generate::foreign_key(&referencing, &referenced, drop)
                }
            };
            generate::write(&settings, &blueprint)?;
        }
        Commands::Db { db_command } => match db_command {
            DbCommands::Migrate => migrate::run(&settings).await?,
            DbCommands::Status => migrate::status(&settings).await?,
            DbCommands::Ping => db::ping(&settings).await?,
            DbCommands::Create => db::create(&settings).await?,
            DbCommands::Drop => db::drop(&settings).await?,
            DbCommands::Reset => db::reset(&settings).await?,
        },
    }

    Ok(())
}
