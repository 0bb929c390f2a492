//! Profile entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered student's public profile.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    /// Identifier shared with the authentication provider.
    pub id: Uuid,
    /// Unique login name.
    pub username: String,
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// Email address.
    pub email: String,
    /// Location of the avatar image, if one was uploaded.
    pub profile_picture_url: Option<String>,
    /// Total bytes of files owned by this profile.
    pub storage_used: i64,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// The name shown to other users: display name if set, else username.
    pub fn visible_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
    }

    /// Reduce to the fields used when enriching listings.
    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            id: self.id,
            username: self.username.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

/// The uploader/sender fields attached to file and notification listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    /// Profile ID.
    pub id: Uuid,
    /// Username.
    pub username: String,
    /// Display name.
    pub display_name: Option<String>,
}

/// Data required to register a profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfile {
    /// Identifier issued by the authentication provider.
    pub id: Uuid,
    /// Desired username.
    pub username: String,
    /// Display name (optional).
    pub display_name: Option<String>,
    /// Email address.
    pub email: String,
}
