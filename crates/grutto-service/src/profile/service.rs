//! Profile registration and self-service updates.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use grutto_core::error::AppError;
use grutto_core::result::AppResult;
use grutto_database::traits::ProfileStore;
use grutto_entity::profile::{CreateProfile, Profile};

use crate::context::RequestContext;

/// Longest accepted username.
const MAX_USERNAME_LEN: usize = 32;

/// Input for registering a profile against an authenticated identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterProfile {
    /// Identity from the authentication boundary.
    pub id: Uuid,
    /// Unique handle.
    pub username: String,
    /// Optional display name.
    pub display_name: Option<String>,
    /// Email address.
    pub email: String,
}

/// Manages user profiles.
#[derive(Clone)]
pub struct ProfileService {
    /// Profile store.
    profiles: Arc<dyn ProfileStore>,
}

impl std::fmt::Debug for ProfileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileService").finish()
    }
}

impl ProfileService {
    /// Creates a new profile service.
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }

    /// Registers a profile. A taken username is a `Conflict`.
    pub async fn register(&self, req: RegisterProfile) -> AppResult<Profile> {
        let username = validate_username(&req.username)?;
        let email = req.email.trim().to_string();
        if !email.contains('@') {
            return Err(AppError::validation(format!("Invalid email address '{email}'")));
        }

        let profile = self
            .profiles
            .create(&CreateProfile {
                id: req.id,
                username,
                display_name: normalize_optional(req.display_name.as_deref()),
                email,
            })
            .await?;

        info!(user_id = %profile.id, username = %profile.username, "Profile registered");
        Ok(profile)
    }

    /// Gets a profile by ID.
    pub async fn get(&self, user_id: Uuid) -> AppResult<Profile> {
        self.profiles
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Profile {user_id} not found")))
    }

    /// Gets a profile by username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<Profile> {
        self.profiles
            .find_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::not_found(format!("User '{username}' not found")))
    }

    /// Sets or clears the caller's display name.
    pub async fn update_display_name(
        &self,
        ctx: &RequestContext,
        display_name: Option<&str>,
    ) -> AppResult<Profile> {
        let display_name = normalize_optional(display_name);
        self.profiles
            .update_display_name(ctx.user_id, display_name.as_deref())
            .await
    }

    /// Sets or clears the caller's profile picture location.
    pub async fn update_picture_url(
        &self,
        ctx: &RequestContext,
        url: Option<&str>,
    ) -> AppResult<Profile> {
        let url = normalize_optional(url);
        self.profiles
            .update_picture_url(ctx.user_id, url.as_deref())
            .await
    }
}

fn validate_username(username: &str) -> AppResult<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::validation("Username cannot be empty"));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::validation(format!(
            "Username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(AppError::validation(
            "Username may only contain letters, digits, '_', '-' and '.'",
        ));
    }
    Ok(username.to_string())
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username(" ana_b ").unwrap(), "ana_b");
        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(33)).is_err());
    }

    #[test]
    fn test_blank_display_name_clears() {
        assert_eq!(normalize_optional(Some("   ")), None);
        assert_eq!(normalize_optional(Some(" Ana ")), Some("Ana".to_string()));
    }
}
