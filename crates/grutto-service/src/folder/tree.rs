//! Folder tree building and breadcrumb resolution.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use grutto_core::result::AppResult;
use grutto_database::traits::FolderStore;
use grutto_entity::folder::{Folder, FolderTree};

use crate::access::load_owned_folder;
use crate::context::RequestContext;
use crate::retry::RetryPolicy;

/// Builds folder trees and breadcrumb trails.
#[derive(Clone)]
pub struct TreeService {
    /// Folder store.
    folders: Arc<dyn FolderStore>,
    /// Retry policy for reads.
    retry: RetryPolicy,
}

impl std::fmt::Debug for TreeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeService").finish()
    }
}

impl TreeService {
    /// Creates a new tree service.
    pub fn new(folders: Arc<dyn FolderStore>, retry: RetryPolicy) -> Self {
        Self { folders, retry }
    }

    /// Builds the caller's whole folder tree with per-folder file counts.
    pub async fn get_tree(&self, ctx: &RequestContext) -> AppResult<FolderTree> {
        let folders = self
            .retry
            .run("find_all_folders", || {
                self.folders.find_all_by_owner(ctx.user_id)
            })
            .await?;
        if folders.is_empty() {
            return Ok(FolderTree::empty());
        }

        let ids: Vec<Uuid> = folders.iter().map(|f| f.id).collect();
        let counts = self
            .retry
            .run("count_files", || self.folders.count_files(&ids))
            .await?;

        let tree = FolderTree::build(&folders, &counts);
        debug!(user_id = %ctx.user_id, total = tree.total_folders, "Folder tree built");
        Ok(tree)
    }

    /// Gets the breadcrumb trail from root down to the given folder.
    pub async fn get_breadcrumbs(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
    ) -> AppResult<Vec<Folder>> {
        let leaf = load_owned_folder(self.folders.as_ref(), ctx, folder_id).await?;

        let mut trail = vec![leaf];
        while let Some(parent_id) = trail.last().and_then(|f| f.parent_folder_id) {
            if trail.iter().any(|f| f.id == parent_id) {
                break;
            }
            match self.folders.find_by_id(parent_id).await? {
                Some(parent) if parent.owner_id == ctx.user_id => trail.push(parent),
                _ => break,
            }
        }

        trail.reverse();
        Ok(trail)
    }
}
