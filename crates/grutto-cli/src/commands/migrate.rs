//! Database migration commands.

use clap::{Args, Subcommand};

use grutto_core::error::AppError;

use crate::app::App;
use crate::output;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
}

/// Execute migration commands
pub async fn execute(args: &MigrateArgs, app: &App) -> Result<(), AppError> {
    match &args.command {
        MigrateCommand::Run => {
            let Some(pool) = &app.pool else {
                output::print_warning("The in-memory backend has no schema to migrate.");
                return Ok(());
            };
            println!("Running database migrations...");
            grutto_database::migration::run_migrations(pool.pool()).await?;
            output::print_success("All migrations applied successfully.");
        }
    }

    Ok(())
}
