//! Folder tree structures for hierarchical display.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::Folder;

/// A node in a folder tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderNode {
    /// Folder ID.
    pub id: Uuid,
    /// Folder name.
    pub name: String,
    /// Folder color.
    pub color: String,
    /// Depth level (0 for root folders).
    pub depth: u32,
    /// Number of live files directly in this folder.
    pub file_count: u64,
    /// Child folder nodes, sorted by name.
    pub children: Vec<FolderNode>,
}

/// A user's complete folder tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderTree {
    /// The root node(s) of the tree.
    pub roots: Vec<FolderNode>,
    /// Total number of folders in the tree.
    pub total_folders: u64,
}

impl FolderTree {
    /// Create an empty folder tree.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Assemble a tree from a flat folder list and per-folder file counts.
    ///
    /// A folder whose parent is not in `folders` is placed at the root so
    /// it never disappears from the tree. Nodes are built recursively, one
    /// level per folder depth. Each folder is emitted at most once, so a
    /// corrupt parent cycle cannot recurse forever; folders caught in such
    /// a cycle are dropped.
    pub fn build(folders: &[Folder], counts: &HashMap<Uuid, u64>) -> Self {
        let ids: std::collections::HashSet<Uuid> = folders.iter().map(|f| f.id).collect();
        let mut children: HashMap<Option<Uuid>, Vec<&Folder>> = HashMap::new();
        for folder in folders {
            let parent = folder.parent_folder_id.filter(|p| ids.contains(p));
            children.entry(parent).or_default().push(folder);
        }
        for list in children.values_mut() {
            list.sort_by(|a, b| {
                a.name
                    .to_lowercase()
                    .cmp(&b.name.to_lowercase())
                    .then(a.id.cmp(&b.id))
            });
        }

        let mut total = 0u64;
        let mut visited = std::collections::HashSet::new();
        let roots = Self::nodes_for(None, 0, &children, counts, &mut visited, &mut total);
        Self {
            roots,
            total_folders: total,
        }
    }

    fn nodes_for(
        parent: Option<Uuid>,
        depth: u32,
        children: &HashMap<Option<Uuid>, Vec<&Folder>>,
        counts: &HashMap<Uuid, u64>,
        visited: &mut std::collections::HashSet<Uuid>,
        total: &mut u64,
    ) -> Vec<FolderNode> {
        let Some(list) = children.get(&parent) else {
            return Vec::new();
        };
        let mut nodes = Vec::with_capacity(list.len());
        for folder in list {
            if !visited.insert(folder.id) {
                continue;
            }
            *total += 1;
            nodes.push(FolderNode {
                id: folder.id,
                name: folder.name.clone(),
                color: folder.color.clone(),
                depth,
                file_count: counts.get(&folder.id).copied().unwrap_or(0),
                children: Self::nodes_for(
                    Some(folder.id),
                    depth + 1,
                    children,
                    counts,
                    visited,
                    total,
                ),
            });
        }
        nodes
    }

    /// Find a node anywhere in the tree.
    pub fn find(&self, id: Uuid) -> Option<&FolderNode> {
        let mut stack: Vec<&FolderNode> = self.roots.iter().collect();
        while let Some(node) = stack.pop() {
            if node.id == id {
                return Some(node);
            }
            stack.extend(node.children.iter());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn folder(name: &str, parent: Option<Uuid>) -> Folder {
        Folder {
            id: Uuid::new_v4(),
            name: name.to_string(),
            color: "#6BC497".to_string(),
            owner_id: Uuid::nil(),
            parent_folder_id: parent,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_build_nested() {
        let school = folder("School", None);
        let math = folder("math", Some(school.id));
        let art = folder("Art", Some(school.id));
        let personal = folder("Personal", None);
        let mut counts = HashMap::new();
        counts.insert(math.id, 3);

        let tree = FolderTree::build(
            &[math.clone(), school.clone(), personal.clone(), art.clone()],
            &counts,
        );
        assert_eq!(tree.total_folders, 4);
        assert_eq!(tree.roots.len(), 2);
        assert_eq!(tree.roots[0].name, "Personal");
        let school_node = &tree.roots[1];
        assert_eq!(school_node.children[0].name, "Art");
        assert_eq!(school_node.children[1].depth, 1);
        assert_eq!(tree.find(math.id).map(|n| n.file_count), Some(3));
    }

    #[test]
    fn test_missing_parent_is_root() {
        let orphan = folder("Orphan", Some(Uuid::new_v4()));
        let tree = FolderTree::build(&[orphan.clone()], &HashMap::new());
        assert_eq!(tree.roots.len(), 1);
        assert_eq!(tree.roots[0].id, orphan.id);
    }

    #[test]
    fn test_cycle_does_not_recurse() {
        let mut a = folder("A", None);
        let mut b = folder("B", None);
        a.parent_folder_id = Some(b.id);
        b.parent_folder_id = Some(a.id);
        let tree = FolderTree::build(&[a, b], &HashMap::new());
        assert_eq!(tree.total_folders, 0);
    }
}
