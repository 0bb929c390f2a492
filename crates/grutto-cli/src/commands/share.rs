//! Share grant CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use grutto_core::error::AppError;
use grutto_service::share::ShareRecipient;

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for share commands
#[derive(Debug, Args)]
pub struct ShareArgs {
    /// Share subcommand
    #[command(subcommand)]
    pub command: ShareCommand,
}

/// Share subcommands
#[derive(Debug, Subcommand)]
pub enum ShareCommand {
    /// Share a file with one or more users
    Add {
        /// File ID
        file: String,
        /// Recipient usernames
        #[arg(required = true)]
        users: Vec<String>,
    },
    /// List who a file is shared with
    List {
        /// File ID
        file: String,
    },
    /// Withdraw a user's access to a file
    Revoke {
        /// File ID
        file: String,
        /// Recipient username
        user: String,
    },
}

/// Recipient display row
#[derive(Debug, Serialize, Tabled)]
struct RecipientRow {
    /// Recipient ID
    user_id: String,
    /// Username
    username: String,
    /// Display name
    display_name: String,
    /// Shared at
    shared: String,
}

impl From<&ShareRecipient> for RecipientRow {
    fn from(r: &ShareRecipient) -> Self {
        Self {
            user_id: r.share.shared_with_user_id.to_string(),
            username: r
                .recipient
                .as_ref()
                .map(|p| p.username.clone())
                .unwrap_or_else(|| "(deleted)".to_string()),
            display_name: r
                .recipient
                .as_ref()
                .and_then(|p| p.display_name.clone())
                .unwrap_or_default(),
            shared: output::short_time(&r.share.shared_date),
        }
    }
}

/// Execute share commands
pub async fn execute(
    args: &ShareArgs,
    app: &App,
    user: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let ctx = app.acting_as(user).await?;
    let shares = &app.services.shares;

    match &args.command {
        ShareCommand::Add { file, users } => {
            let file_id = super::parse_id(file, "file")?;
            let recipients = app.user_ids(users).await?;
            let outcome = shares.share_file(&ctx, file_id, &recipients).await?;
            match format {
                OutputFormat::Json => output::print_item(&outcome, format),
                OutputFormat::Table => {
                    output::print_success(&format!(
                        "Shared with {} new recipient(s), {} notified",
                        outcome.granted.len(),
                        outcome.notified
                    ));
                    if !outcome.already_shared.is_empty() {
                        output::print_warning(&format!(
                            "{} recipient(s) already had access",
                            outcome.already_shared.len()
                        ));
                    }
                }
            }
        }
        ShareCommand::List { file } => {
            let file_id = super::parse_id(file, "file")?;
            let recipients = shares.list_recipients(&ctx, file_id).await?;
            let rows: Vec<RecipientRow> = recipients.iter().map(RecipientRow::from).collect();
            output::print_list(&rows, format);
        }
        ShareCommand::Revoke { file, user } => {
            let file_id = super::parse_id(file, "file")?;
            let recipient = app.services.profiles.get_by_username(user).await?;
            shares.revoke(&ctx, file_id, recipient.id).await?;
            output::print_success(&format!("Access for '{}' revoked", recipient.username));
        }
    }

    Ok(())
}
