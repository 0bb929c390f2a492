//! Profile CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use grutto_core::error::AppError;
use grutto_entity::profile::{Profile, ProfileSummary};
use grutto_service::profile::RegisterProfile;

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for profile commands
#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Profile subcommand
    #[command(subcommand)]
    pub command: ProfileCommand,
}

/// Profile subcommands
#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Register a profile for an authenticated identity
    Register {
        /// Unique username
        username: String,
        /// Email address
        #[arg(short, long)]
        email: String,
        /// Display name
        #[arg(short, long)]
        display_name: Option<String>,
        /// Identity ID from the authentication provider (generated if omitted)
        #[arg(long)]
        id: Option<String>,
    },
    /// Show a profile (the acting user's if no username is given)
    Show {
        /// Username to look up
        username: Option<String>,
    },
    /// Set or clear the acting user's display name
    SetName {
        /// New display name; omit to clear
        name: Option<String>,
    },
    /// Set or clear the acting user's profile picture
    SetPicture {
        /// Picture URL; omit to clear
        url: Option<String>,
    },
    /// Search users to share a file with
    Search {
        /// Username prefix
        query: String,
        /// Exclude users who already have this file
        #[arg(long)]
        file: Option<String>,
    },
}

/// Profile display row
#[derive(Debug, Serialize, Tabled)]
struct ProfileRow {
    /// Profile ID
    id: String,
    /// Username
    username: String,
    /// Display name
    display_name: String,
}

impl From<&ProfileSummary> for ProfileRow {
    fn from(p: &ProfileSummary) -> Self {
        Self {
            id: p.id.to_string(),
            username: p.username.clone(),
            display_name: p.display_name.clone().unwrap_or_default(),
        }
    }
}

/// Execute profile commands
pub async fn execute(
    args: &ProfileArgs,
    app: &App,
    user: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let profiles = &app.services.profiles;

    match &args.command {
        ProfileCommand::Register {
            username,
            email,
            display_name,
            id,
        } => {
            let id = match id {
                Some(id) => super::parse_id(id, "identity")?,
                None => Uuid::new_v4(),
            };
            let profile = profiles
                .register(RegisterProfile {
                    id,
                    username: username.clone(),
                    display_name: display_name.clone(),
                    email: email.clone(),
                })
                .await?;
            output::print_success(&format!(
                "Profile '{}' registered (id: {})",
                profile.username, profile.id
            ));
        }
        ProfileCommand::Show { username } => {
            let profile = match username {
                Some(name) => profiles.get_by_username(name).await?,
                None => {
                    let ctx = app.acting_as(user).await?;
                    profiles.get(ctx.user_id).await?
                }
            };
            print_profile(&profile, format);
        }
        ProfileCommand::SetName { name } => {
            let ctx = app.acting_as(user).await?;
            let profile = profiles.update_display_name(&ctx, name.as_deref()).await?;
            output::print_success(&format!("Display name is now '{}'", profile.visible_name()));
        }
        ProfileCommand::SetPicture { url } => {
            let ctx = app.acting_as(user).await?;
            let profile = profiles.update_picture_url(&ctx, url.as_deref()).await?;
            match profile.profile_picture_url {
                Some(url) => output::print_success(&format!("Profile picture set to {url}")),
                None => output::print_success("Profile picture cleared"),
            }
        }
        ProfileCommand::Search { query, file } => {
            let ctx = app.acting_as(user).await?;
            let file_id = file.as_deref().map(|f| super::parse_id(f, "file")).transpose()?;
            let found = app
                .services
                .shares
                .search_recipients(&ctx, query, file_id, &[])
                .await?;
            let rows: Vec<ProfileRow> = found.iter().map(ProfileRow::from).collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}

fn print_profile(profile: &Profile, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_item(profile, format),
        OutputFormat::Table => {
            output::print_kv("id", &profile.id.to_string());
            output::print_kv("username", &profile.username);
            output::print_kv("display name", profile.visible_name());
            output::print_kv("email", &profile.email);
            output::print_kv(
                "picture",
                profile.profile_picture_url.as_deref().unwrap_or("-"),
            );
            output::print_kv("storage used", &output::human_bytes(profile.storage_used));
            output::print_kv("member since", &output::short_time(&profile.created_at));
        }
    }
}
