//! Notification panel CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use grutto_core::error::AppError;
use grutto_service::notification::NotificationEntry;

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for notification commands
#[derive(Debug, Args)]
pub struct NotificationArgs {
    /// Notification subcommand
    #[command(subcommand)]
    pub command: NotificationCommand,
}

/// Notification subcommands
#[derive(Debug, Subcommand)]
pub enum NotificationCommand {
    /// List notifications, newest first
    List,
    /// Show the unread count
    Unread,
    /// Mark a notification read
    Read {
        /// Notification ID
        #[arg(required_unless_present = "all")]
        id: Option<String>,
        /// Mark every notification read
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },
    /// Delete a notification
    Delete {
        /// Notification ID
        id: String,
    },
}

/// Notification display row
#[derive(Debug, Serialize, Tabled)]
struct NotificationRow {
    /// Notification ID
    id: String,
    /// Type
    kind: String,
    /// From
    from: String,
    /// Message
    message: String,
    /// Unread marker
    new: String,
    /// Received at
    received: String,
}

impl From<&NotificationEntry> for NotificationRow {
    fn from(entry: &NotificationEntry) -> Self {
        let n = &entry.notification;
        Self {
            id: n.id.to_string(),
            kind: n.kind.to_string(),
            from: entry
                .sender
                .as_ref()
                .map(|s| s.display_name.clone().unwrap_or_else(|| s.username.clone()))
                .unwrap_or_default(),
            message: n.message.clone(),
            new: if n.read_status { "" } else { "•" }.to_string(),
            received: output::short_time(&n.created_at),
        }
    }
}

/// Execute notification commands
pub async fn execute(
    args: &NotificationArgs,
    app: &App,
    user: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = app.acting_as(user).await?;
    let notifications = &app.services.notifications;

    match &args.command {
        NotificationCommand::List => {
            let entries = notifications.list_notifications(&ctx).await?;
            match format {
                OutputFormat::Json => output::print_item(&entries, format),
                OutputFormat::Table => {
                    let rows: Vec<NotificationRow> =
                        entries.iter().map(NotificationRow::from).collect();
                    output::print_list(&rows, format);
                }
            }
        }
        NotificationCommand::Unread => {
            let count = notifications.unread_count(&ctx).await?;
            println!("{count}");
        }
        NotificationCommand::Read { id, all } => {
            if *all {
                let changed = notifications.mark_all_read(&ctx).await?;
                output::print_success(&format!("{changed} notification(s) marked read"));
            } else if let Some(id) = id {
                notifications
                    .mark_read(&ctx, super::parse_id(id, "notification")?)
                    .await?;
                output::print_success("Notification marked read");
            }
        }
        NotificationCommand::Delete { id } => {
            notifications
                .delete(&ctx, super::parse_id(id, "notification")?)
                .await?;
            output::print_success("Notification deleted");
        }
    }

    Ok(())
}
