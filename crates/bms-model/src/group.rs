//! Group domain model.
//!
//! Groups are hierarchical: each group carries a slash-delimited path that
//! encodes its ancestry (e.g. `/parent/child`). The path is globally unique
//! and serves as a secondary key for role inheritance.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A hierarchical group of users.
///
/// A group's subgroups are the groups whose `parent_id` equals its id.
/// Deleting a group cascades over the whole descendant subtree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier.
    pub id: Uuid,
    /// Group name (unique within its level).
    pub name: String,
    /// Slash-delimited path from the root, e.g. `/parent/child`.
    pub path: String,
    /// Parent group id (`None` for top-level groups).
    pub parent_id: Option<Uuid>,
    /// When the group was created.
    pub created_at: DateTime<Utc>,
    /// When the group was last updated.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Group {
    /// Creates a new top-level group with path `/name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::now_v7(),
            path: format!("/{name}"),
            name,
            parent_id: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Creates a child of `parent`, deriving the path from the parent's path.
    #[must_use]
    pub fn new_child(parent: &Group, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: Uuid::now_v7(),
            path: child_path(&parent.path, &name),
            name,
            parent_id: Some(parent.id),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Checks if this is a top-level group.
    #[must_use]
    pub const fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Returns the depth of the group's path (number of segments).
    #[must_use]
    pub fn depth(&self) -> usize {
        GroupPath::parse(&self.path).depth()
    }
}

/// Computes the path of a child named `name` under `parent_path`.
///
/// The conceptual root path `/` yields `/name`; any other parent yields
/// `parent_path/name`.
#[must_use]
pub fn child_path(parent_path: &str, name: &str) -> String {
    if parent_path == "/" || parent_path.is_empty() {
        format!("/{name}")
    } else {
        format!("{parent_path}/{name}")
    }
}

/// Collects `root_id` and all of its descendants from a flat group slice,
/// ordered deepest path first.
///
/// The adjacency structure is built in memory from the slice, so callers can
/// feed it a single flat query result instead of issuing per-node lookups.
/// The deepest-first order satisfies parent/child referential constraints
/// when the result drives a cascading delete.
#[must_use]
pub fn collect_subtree(groups: &[Group], root_id: Uuid) -> Vec<Group> {
    let mut by_id: HashMap<Uuid, &Group> = HashMap::new();
    let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for group in groups {
        by_id.insert(group.id, group);
        if let Some(parent_id) = group.parent_id {
            children.entry(parent_id).or_default().push(group.id);
        }
    }

    let mut subtree = Vec::new();
    let mut stack = vec![root_id];
    while let Some(current) = stack.pop() {
        let Some(group) = by_id.get(&current) else {
            continue;
        };
        subtree.push((*group).clone());
        if let Some(child_ids) = children.get(&current) {
            stack.extend(child_ids);
        }
    }

    subtree.sort_by(|a, b| b.depth().cmp(&a.depth()));
    subtree
}

/// A group-to-role assignment.
///
/// Grants every member of the group the role without per-user assignment.
/// The (`group_id`, `role_id`) pair is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRole {
    /// Identifier of the group.
    pub group_id: Uuid,
    /// Identifier of the assigned role.
    pub role_id: Uuid,
    /// When the assignment was created.
    pub created_at: DateTime<Utc>,
}

impl GroupRole {
    /// Creates a new assignment stamped with the current time.
    #[must_use]
    pub fn new(group_id: Uuid, role_id: Uuid) -> Self {
        Self {
            group_id,
            role_id,
            created_at: Utc::now(),
        }
    }
}

/// A user-to-group membership.
///
/// The (`user_id`, `group_id`) pair is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserGroup {
    /// Subject identifier of the user.
    pub user_id: String,
    /// Identifier of the group.
    pub group_id: Uuid,
    /// When the membership was created.
    pub created_at: DateTime<Utc>,
}

impl UserGroup {
    /// Creates a new membership stamped with the current time.
    #[must_use]
    pub fn new(user_id: impl Into<String>, group_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            group_id,
            created_at: Utc::now(),
        }
    }
}

/// Parsed representation of a slash-delimited group path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPath {
    /// Path segments from root to leaf.
    pub segments: Vec<String>,
}

impl GroupPath {
    /// Parses a group path string (e.g. `/parent/child/grandchild`).
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let segments: Vec<String> = path
            .trim_start_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Self { segments }
    }

    /// Returns the path as a string; the empty path renders as `/`.
    #[must_use]
    pub fn to_path_string(&self) -> String {
        if self.segments.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", self.segments.join("/"))
        }
    }

    /// Returns the parent path, or `None` for top-level paths.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() <= 1 {
            None
        } else {
            Some(Self {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            })
        }
    }

    /// Returns the leaf (last segment).
    #[must_use]
    pub fn leaf(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns the depth (number of segments).
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.segments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_group_path() {
        let group = Group::new("admins");

        assert_eq!(group.path, "/admins");
        assert!(group.is_top_level());
        assert_eq!(group.depth(), 1);
    }

    #[test]
    fn child_group_path_derivation() {
        let parent = Group::new("org");
        let child = Group::new_child(&parent, "team");

        assert_eq!(child.path, "/org/team");
        assert_eq!(child.parent_id, Some(parent.id));

        let grandchild = Group::new_child(&child, "backend");
        assert_eq!(grandchild.path, "/org/team/backend");
    }

    #[test]
    fn child_path_handles_conceptual_root() {
        assert_eq!(child_path("/", "top"), "/top");
        assert_eq!(child_path("/a/b", "c"), "/a/b/c");
    }

    #[test]
    fn group_path_parsing() {
        let path = GroupPath::parse("/org/team/subteam");

        assert_eq!(path.segments, vec!["org", "team", "subteam"]);
        assert_eq!(path.to_path_string(), "/org/team/subteam");
        assert_eq!(path.leaf(), Some("subteam"));
        assert_eq!(path.depth(), 3);

        let parent = path.parent().unwrap();
        assert_eq!(parent.to_path_string(), "/org/team");
    }

    #[test]
    fn subtree_collection_is_deepest_first() {
        let root = Group::new("org");
        let child_a = Group::new_child(&root, "a");
        let child_b = Group::new_child(&root, "b");
        let grandchild = Group::new_child(&child_a, "deep");
        let sibling_tree = Group::new("other");

        let all = vec![
            root.clone(),
            child_a.clone(),
            child_b.clone(),
            grandchild.clone(),
            sibling_tree.clone(),
        ];

        let subtree = collect_subtree(&all, root.id);
        let ids: Vec<Uuid> = subtree.iter().map(|g| g.id).collect();

        assert_eq!(subtree.len(), 4);
        assert!(!ids.contains(&sibling_tree.id));
        // Deepest entry must come before its ancestors.
        assert_eq!(subtree.first().unwrap().id, grandchild.id);
        assert_eq!(subtree.last().unwrap().id, root.id);
    }

    #[test]
    fn subtree_of_unknown_root_is_empty() {
        let groups = vec![Group::new("org")];
        assert!(collect_subtree(&groups, Uuid::now_v7()).is_empty());
    }
}
