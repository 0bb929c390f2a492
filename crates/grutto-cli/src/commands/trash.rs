//! Trash CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use grutto_core::error::AppError;
use grutto_entity::file::File;

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for trash commands
#[derive(Debug, Args)]
pub struct TrashArgs {
    /// Trash subcommand
    #[command(subcommand)]
    pub command: TrashCommand,
}

/// Trash subcommands
#[derive(Debug, Subcommand)]
pub enum TrashCommand {
    /// List trashed files
    List,
    /// Move a file to the trash
    Delete {
        /// File ID
        id: String,
    },
    /// Bring a trashed file back
    Recover {
        /// File ID
        id: String,
    },
    /// Permanently delete a trashed file
    Purge {
        /// File ID
        id: String,
    },
}

/// Trashed file display row
#[derive(Debug, Serialize, Tabled)]
struct TrashRow {
    /// File ID
    id: String,
    /// Name
    name: String,
    /// Size
    size: String,
    /// Trashed at
    trashed: String,
}

impl From<&File> for TrashRow {
    fn from(file: &File) -> Self {
        Self {
            id: file.id.to_string(),
            name: file.filename.clone(),
            size: output::human_bytes(file.file_size),
            trashed: file
                .deleted_at
                .as_ref()
                .map(output::short_time)
                .unwrap_or_default(),
        }
    }
}

/// Execute trash commands
pub async fn execute(
    args: &TrashArgs,
    app: &App,
    user: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = app.acting_as(user).await?;
    let trash = &app.services.trash;

    match &args.command {
        TrashCommand::List => {
            let files = trash.list(&ctx).await?;
            let rows: Vec<TrashRow> = files.iter().map(TrashRow::from).collect();
            output::print_list(&rows, format);
        }
        TrashCommand::Delete { id } => {
            let file = trash.trash(&ctx, super::parse_id(id, "file")?).await?;
            output::print_success(&format!("'{}' moved to the trash", file.filename));
        }
        TrashCommand::Recover { id } => {
            let file = trash.recover(&ctx, super::parse_id(id, "file")?).await?;
            output::print_success(&format!("'{}' recovered", file.filename));
        }
        TrashCommand::Purge { id } => {
            trash.purge(&ctx, super::parse_id(id, "file")?).await?;
            output::print_success("File permanently deleted");
        }
    }

    Ok(())
}
