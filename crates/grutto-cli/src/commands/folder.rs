//! Folder management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use grutto_core::error::AppError;
use grutto_entity::folder::FolderNode;
use grutto_service::file::FolderEntry;
use grutto_service::folder::CreateFolderRequest;

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for folder commands
#[derive(Debug, Args)]
pub struct FolderArgs {
    /// Folder subcommand
    #[command(subcommand)]
    pub command: FolderCommand,
}

/// Folder subcommands
#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    /// List folders under a parent (root if omitted)
    List {
        /// Parent folder ID
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// Show the whole folder tree with file counts
    Tree,
    /// Create a new folder
    Create {
        /// Folder name
        name: String,
        /// Hex color such as #6BC497
        #[arg(short, long)]
        color: Option<String>,
        /// Parent folder ID (omit for root)
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// Rename a folder
    Rename {
        /// Folder ID
        id: String,
        /// New name
        name: String,
    },
    /// Change a folder's color
    Color {
        /// Folder ID
        id: String,
        /// Hex color
        color: String,
    },
    /// Move a folder under another folder, or to root with `root`
    Move {
        /// Folder ID
        id: String,
        /// New parent folder ID or `root`
        parent: String,
    },
    /// Delete a folder; its files move to root
    Delete {
        /// Folder ID
        id: String,
    },
    /// Print the path from root to a folder
    Path {
        /// Folder ID
        id: String,
    },
}

/// Folder display row
#[derive(Debug, Serialize, Tabled)]
struct FolderRow {
    /// Folder ID
    id: String,
    /// Name
    name: String,
    /// Color
    color: String,
    /// Live files
    files: u64,
    /// Created at
    created_at: String,
}

impl From<&FolderEntry> for FolderRow {
    fn from(entry: &FolderEntry) -> Self {
        Self {
            id: entry.folder.id.to_string(),
            name: entry.folder.name.clone(),
            color: entry.folder.color.clone(),
            files: entry.file_count,
            created_at: output::short_time(&entry.folder.created_at),
        }
    }
}

/// Execute folder commands
pub async fn execute(
    args: &FolderArgs,
    app: &App,
    user: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = app.acting_as(user).await?;
    let folders = &app.services.folders;

    match &args.command {
        FolderCommand::List { parent } => {
            let parent_id = super::parse_optional_id(parent.as_deref(), "folder")?;
            let entries = app.services.query.list_folders(&ctx, parent_id).await?;
            let rows: Vec<FolderRow> = entries.iter().map(FolderRow::from).collect();
            output::print_list(&rows, format);
        }
        FolderCommand::Tree => {
            let tree = app.services.tree.get_tree(&ctx).await?;
            match format {
                OutputFormat::Json => output::print_item(&tree, format),
                OutputFormat::Table => {
                    println!("/ ({} folders)", tree.total_folders);
                    for node in &tree.roots {
                        print_node(node);
                    }
                }
            }
        }
        FolderCommand::Create {
            name,
            color,
            parent,
        } => {
            let parent_folder_id = super::parse_optional_id(parent.as_deref(), "folder")?;
            let folder = folders
                .create_folder(
                    &ctx,
                    CreateFolderRequest {
                        name: name.clone(),
                        color: color.clone(),
                        parent_folder_id,
                    },
                )
                .await?;
            output::print_success(&format!(
                "Folder '{}' created (id: {})",
                folder.name, folder.id
            ));
        }
        FolderCommand::Rename { id, name } => {
            let id = super::parse_id(id, "folder")?;
            let folder = folders.rename_folder(&ctx, id, name).await?;
            output::print_success(&format!("Folder renamed to '{}'", folder.name));
        }
        FolderCommand::Color { id, color } => {
            let id = super::parse_id(id, "folder")?;
            let folder = folders.recolor_folder(&ctx, id, color).await?;
            output::print_success(&format!("Folder '{}' is now {}", folder.name, folder.color));
        }
        FolderCommand::Move { id, parent } => {
            let id = super::parse_id(id, "folder")?;
            let parent_id = super::parse_optional_id(Some(parent), "folder")?;
            let folder = folders.move_folder(&ctx, id, parent_id).await?;
            output::print_success(&format!("Folder '{}' moved", folder.name));
        }
        FolderCommand::Delete { id } => {
            let id = super::parse_id(id, "folder")?;
            folders.delete_folder(&ctx, id).await?;
            output::print_success("Folder deleted; its files are now at root");
        }
        FolderCommand::Path { id } => {
            let id = super::parse_id(id, "folder")?;
            let trail = app.services.tree.get_breadcrumbs(&ctx, id).await?;
            match format {
                OutputFormat::Json => output::print_item(&trail, format),
                OutputFormat::Table => {
                    let names: Vec<&str> = trail.iter().map(|f| f.name.as_str()).collect();
                    println!("/{}", names.join("/"));
                }
            }
        }
    }

    Ok(())
}

fn print_node(node: &FolderNode) {
    let indent = "  ".repeat(node.depth as usize);
    println!("{indent}├── {}/ ({} files)", node.name, node.file_count);
    for child in &node.children {
        print_node(child);
    }
}
