//! Folder tree reconstruction
//!
//! The object store is flat; the navigable hierarchy is rebuilt from the
//! folder-marker keys it returns. Ancestor nodes are synthesized even when
//! their own marker key is missing from the listing, and repeated or
//! out-of-order keys never produce duplicate nodes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{FolderPath, KeyRoot, StorageKey};

/// One folder in the reconstructed hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderNode {
    /// Display name of this folder
    pub name: String,
    /// '/'-joined chain of ancestor names down to and including this node
    pub path: String,
    /// Child folders in first-discovery order
    pub children: Vec<FolderNode>,
}

struct Slot {
    name: String,
    path: String,
    children: Vec<usize>,
}

/// Build the folder tree from a flat list of storage keys.
///
/// Keys outside `root` and keys that decode to an empty relative path are
/// skipped. Root ordering is first-discovery order, not sorted.
pub fn build_tree(keys: &[StorageKey], root: &KeyRoot) -> Vec<FolderNode> {
    let mut slots: Vec<Slot> = Vec::new();
    let mut by_path: HashMap<String, usize> = HashMap::new();
    let mut roots: Vec<usize> = Vec::new();

    for key in keys {
        let rel = root.relative_path(key);
        if rel.is_empty() {
            continue;
        }

        let mut cumulative = String::new();
        let mut parent: Option<usize> = None;
        for seg in rel.split('/').filter(|s| !s.is_empty()) {
            if cumulative.is_empty() {
                cumulative.push_str(seg);
            } else {
                cumulative.push('/');
                cumulative.push_str(seg);
            }

            let idx = match by_path.get(&cumulative) {
                Some(&idx) => idx,
                None => {
                    let idx = slots.len();
                    slots.push(Slot {
                        name: seg.to_string(),
                        path: cumulative.clone(),
                        children: Vec::new(),
                    });
                    by_path.insert(cumulative.clone(), idx);
                    match parent {
                        Some(p) => slots[p].children.push(idx),
                        None => roots.push(idx),
                    }
                    idx
                }
            };
            parent = Some(idx);
        }
    }

    roots.iter().map(|&idx| assemble(&slots, idx)).collect()
}

fn assemble(slots: &[Slot], idx: usize) -> FolderNode {
    let slot = &slots[idx];
    FolderNode {
        name: slot.name.clone(),
        path: slot.path.clone(),
        children: slot.children.iter().map(|&c| assemble(slots, c)).collect(),
    }
}

/// Locate the node at `path`, if any.
pub fn find_node<'a>(roots: &'a [FolderNode], path: &FolderPath) -> Option<&'a FolderNode> {
    let mut segments = path.segments().iter();
    let first = segments.next()?;
    let mut node = roots.iter().find(|n| n.name == *first)?;
    for seg in segments {
        node = node.children.iter().find(|n| n.name == *seg)?;
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> KeyRoot {
        KeyRoot::new("u", "video")
    }

    fn keys(raw: &[&str]) -> Vec<StorageKey> {
        raw.iter().map(|k| StorageKey::from(*k)).collect()
    }

    fn assert_path_invariant(node: &FolderNode, parent_path: Option<&str>) {
        match parent_path {
            Some(pp) => assert_eq!(node.path, format!("{}/{}", pp, node.name)),
            None => assert_eq!(node.path, node.name),
        }
        for child in &node.children {
            assert_path_invariant(child, Some(&node.path));
        }
    }

    #[test]
    fn test_basic_scenario() {
        let tree = build_tree(
            &keys(&["u/video/trips", "u/video/trips/paris", "u/video/family"]),
            &root(),
        );
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].name, "trips");
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].name, "paris");
        assert_eq!(tree[0].children[0].path, "trips/paris");
        assert_eq!(tree[1].name, "family");
        assert!(tree[1].children.is_empty());
    }

    #[test]
    fn test_ancestors_synthesized() {
        // The marker for "trips" itself never appears.
        let tree = build_tree(&keys(&["u/video/trips/paris/day1"]), &root());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "trips");
        assert_eq!(tree[0].children[0].name, "paris");
        assert_eq!(tree[0].children[0].children[0].path, "trips/paris/day1");
    }

    #[test]
    fn test_no_duplicates_regardless_of_order() {
        let tree = build_tree(
            &keys(&[
                "u/video/trips/paris",
                "u/video/trips",
                "u/video/trips/paris",
                "u/video/trips/rome",
            ]),
            &root(),
        );
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children.len(), 2);
        let names: Vec<_> = tree[0].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["paris", "rome"]);
    }

    #[test]
    fn test_foreign_and_malformed_keys_skipped() {
        let tree = build_tree(
            &keys(&["other-user/video/x", "u/image/y", "u/video/", "u/video/trips"]),
            &root(),
        );
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "trips");
    }

    #[test]
    fn test_path_invariant_holds() {
        let tree = build_tree(
            &keys(&[
                "u/video/a/b/c",
                "u/video/a/d",
                "u/video/e",
                "u/video/a/b",
            ]),
            &root(),
        );
        for node in &tree {
            assert_path_invariant(node, None);
        }
    }

    #[test]
    fn test_encoded_segments_decoded_for_display() {
        let tree = build_tree(&keys(&["u/video/letn%C3%AD%20v%C3%BDlety/"]), &root());
        assert_eq!(tree[0].name, "letní výlety");
        assert_eq!(tree[0].path, "letní výlety");
    }

    #[test]
    fn test_find_node() {
        let tree = build_tree(
            &keys(&["u/video/trips/paris", "u/video/family"]),
            &root(),
        );
        let node = find_node(&tree, &FolderPath::parse("trips/paris")).unwrap();
        assert_eq!(node.path, "trips/paris");
        assert!(find_node(&tree, &FolderPath::parse("trips/rome")).is_none());
        assert!(find_node(&tree, &FolderPath::root()).is_none());
    }
}
