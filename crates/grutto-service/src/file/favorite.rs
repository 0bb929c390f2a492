//! Favorite toggling with optimistic local state.
//!
//! [`FavoriteState`] is the caller-side view of which files are starred.
//! A toggle flips the local value immediately and yields a
//! [`PendingToggle`]; the backend result then either confirms it or rolls
//! it back. [`FavoriteService::toggle`] runs that whole sequence.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use grutto_core::error::AppError;
use grutto_core::result::AppResult;
use grutto_database::traits::FileStore;
use grutto_entity::file::File;

use crate::access::load_owned_file;
use crate::context::RequestContext;

/// Locally known favorite flags, keyed by file.
#[derive(Debug, Clone, Default)]
pub struct FavoriteState {
    flags: HashMap<Uuid, bool>,
}

/// A local flip awaiting the backend's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a pending toggle must be confirmed or rolled back"]
pub struct PendingToggle {
    /// The file.
    pub file_id: Uuid,
    /// Value before the flip.
    pub previous: bool,
    /// Value shown now.
    pub desired: bool,
}

impl FavoriteState {
    /// Seed the state from listed files.
    pub fn from_files<'a>(files: impl IntoIterator<Item = &'a File>) -> Self {
        Self {
            flags: files.into_iter().map(|f| (f.id, f.is_favorite)).collect(),
        }
    }

    /// Current local value; unknown files are not favorites.
    pub fn is_favorite(&self, file_id: Uuid) -> bool {
        self.flags.get(&file_id).copied().unwrap_or(false)
    }

    /// Flip the local value now.
    pub fn begin_toggle(&mut self, file_id: Uuid) -> PendingToggle {
        let previous = self.is_favorite(file_id);
        self.flags.insert(file_id, !previous);
        PendingToggle {
            file_id,
            previous,
            desired: !previous,
        }
    }

    /// Adopt the value the backend stored.
    pub fn confirm(&mut self, pending: PendingToggle, stored: bool) {
        self.flags.insert(pending.file_id, stored);
    }

    /// Undo a flip the backend rejected.
    pub fn rollback(&mut self, pending: PendingToggle) {
        self.flags.insert(pending.file_id, pending.previous);
    }
}

/// Persists favorite flags.
#[derive(Clone)]
pub struct FavoriteService {
    /// File store.
    files: Arc<dyn FileStore>,
}

impl std::fmt::Debug for FavoriteService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoriteService").finish()
    }
}

impl FavoriteService {
    /// Creates a new favorite service.
    pub fn new(files: Arc<dyn FileStore>) -> Self {
        Self { files }
    }

    /// Stores a favorite flag on a live file the caller owns.
    pub async fn set_favorite(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        is_favorite: bool,
    ) -> AppResult<File> {
        let file = load_owned_file(self.files.as_ref(), ctx, file_id).await?;
        if file.is_trashed() {
            return Err(AppError::not_found(format!("File {file_id} not found")));
        }
        let updated = self.files.set_favorite(file_id, is_favorite).await?;
        info!(file_id = %file_id, is_favorite, "Favorite updated");
        Ok(updated)
    }

    /// Flips the flag in `state` at once, persists it, and reverts the
    /// local flip if persisting fails.
    pub async fn toggle(
        &self,
        ctx: &RequestContext,
        state: &mut FavoriteState,
        file_id: Uuid,
    ) -> AppResult<File> {
        let pending = state.begin_toggle(file_id);
        match self.set_favorite(ctx, file_id, pending.desired).await {
            Ok(file) => {
                state.confirm(pending, file.is_favorite);
                Ok(file)
            }
            Err(e) => {
                warn!(file_id = %file_id, error = %e, "Favorite toggle failed, rolling back");
                state.rollback(pending);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rollback_restores_previous() {
        let id = Uuid::new_v4();
        let mut state = FavoriteState::default();
        let pending = state.begin_toggle(id);
        assert!(state.is_favorite(id));
        state.rollback(pending);
        assert!(!state.is_favorite(id));
    }

    #[test]
    fn test_confirm_adopts_stored_value() {
        let id = Uuid::new_v4();
        let mut state = FavoriteState::default();
        let pending = state.begin_toggle(id);
        state.confirm(pending, true);
        assert!(state.is_favorite(id));
        let second = state.begin_toggle(id);
        assert_eq!(second.previous, true);
        assert_eq!(second.desired, false);
        state.confirm(second, false);
        assert!(!state.is_favorite(id));
    }
}
