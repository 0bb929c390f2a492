//! CLI command definitions and dispatch.

pub mod config;
pub mod file;
pub mod folder;
pub mod migrate;
pub mod notification;
pub mod profile;
pub mod share;
pub mod trash;
pub mod worker;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use grutto_core::config::AppConfig;
use grutto_core::error::AppError;

use crate::app::App;
use crate::output::OutputFormat;

/// Grutto Study: study file storage and sharing
#[derive(Debug, Parser)]
#[command(name = "grutto", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment (loads config/<env>.toml over config/default.toml)
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Username to act as
    #[arg(long = "as", global = true)]
    pub acting_user: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Configuration inspection
    Config(config::ConfigArgs),
    /// Profile management
    Profile(profile::ProfileArgs),
    /// Folder management
    Folder(folder::FolderArgs),
    /// File listing, upload and single-file operations
    File(file::FileArgs),
    /// Share grants
    Share(share::ShareArgs),
    /// Notification panel
    Notification(notification::NotificationArgs),
    /// Trash lifecycle
    Trash(trash::TrashArgs),
    /// Background worker
    Worker(worker::WorkerArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self, config: AppConfig) -> Result<(), AppError> {
        // Config inspection never touches the stores.
        if let Commands::Config(args) = &self.command {
            return config::execute(args, &config, self.format);
        }

        let app = App::connect(config).await?;
        let user = self.acting_user.as_deref();
        let result = match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &app).await,
            Commands::Config(_) => Ok(()),
            Commands::Profile(args) => profile::execute(args, &app, user, self.format).await,
            Commands::Folder(args) => folder::execute(args, &app, user, self.format).await,
            Commands::File(args) => file::execute(args, &app, user, self.format).await,
            Commands::Share(args) => share::execute(args, &app, user, self.format).await,
            Commands::Notification(args) => {
                notification::execute(args, &app, user, self.format).await
            }
            Commands::Trash(args) => trash::execute(args, &app, user, self.format).await,
            Commands::Worker(args) => worker::execute(args, &app, self.format).await,
        };
        app.close().await;
        result
    }
}

/// Parse a UUID argument.
pub fn parse_id(value: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value.trim())
        .map_err(|e| AppError::validation(format!("Invalid {what} ID '{value}': {e}")))
}

/// Parse an optional UUID argument; `root` also means none.
pub fn parse_optional_id(value: Option<&str>, what: &str) -> Result<Option<Uuid>, AppError> {
    match value {
        None | Some("root") => Ok(None),
        Some(v) => parse_id(v, what).map(Some),
    }
}
