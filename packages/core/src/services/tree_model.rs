//! Tree Model
//!
//! Read-only, in-memory view of the document forest as returned by
//! [`DocumentStore::get_tree`](crate::db::DocumentStore::get_tree).
//!
//! The model is never patched in place. Services build a new one from a
//! fresh snapshot after every mutation and swap it in, so a `TreeModel`
//! value always describes one consistent moment of the store.

use std::collections::HashMap;

use crate::models::{DocumentId, FlatEntry, TreeItem};

#[derive(Debug, Clone, Default)]
pub struct TreeModel {
    roots: Vec<TreeItem>,
    /// Depth-first preorder across all trees
    flat: Vec<FlatEntry>,
    /// Nesting depth of each `flat` entry, roots at 0
    depths: Vec<usize>,
    index: HashMap<DocumentId, usize>,
    /// Parent as given by the nesting, which the store guarantees to match
    /// `parent_id`
    parents: HashMap<DocumentId, Option<DocumentId>>,
}

impl TreeModel {
    /// Build the model from a forest snapshot
    pub fn from_forest(roots: Vec<TreeItem>) -> Self {
        let mut flat = Vec::new();
        let mut depths = Vec::new();
        let mut parents = HashMap::new();

        // Explicit stack keeps deep trees off the call stack
        let mut pending: Vec<(&TreeItem, Option<DocumentId>, usize)> =
            roots.iter().rev().map(|item| (item, None, 0)).collect();
        while let Some((item, parent, depth)) = pending.pop() {
            flat.push(FlatEntry {
                id: item.id,
                parent_id: parent,
                position: item.position,
            });
            depths.push(depth);
            parents.insert(item.id, parent);
            pending.extend(
                item.children
                    .iter()
                    .rev()
                    .map(|child| (child, Some(item.id), depth + 1)),
            );
        }

        let index = flat
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.id, idx))
            .collect();

        Self {
            roots,
            flat,
            depths,
            index,
            parents,
        }
    }

    pub fn roots(&self) -> &[TreeItem] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.flat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.index.contains_key(&id)
    }

    /// Placement of a document, if present
    pub fn find(&self, id: DocumentId) -> Option<FlatEntry> {
        self.index.get(&id).map(|&idx| self.flat[idx])
    }

    /// Depth-first preorder listing of every document
    pub fn flatten(&self) -> &[FlatEntry] {
        &self.flat
    }

    /// Nesting depth of a document, roots at 0
    pub fn depth(&self, id: DocumentId) -> Option<usize> {
        self.index.get(&id).map(|&idx| self.depths[idx])
    }

    /// Ancestor ids from the root down to the document's parent.
    ///
    /// Returns `None` when the document is not in the tree or its parent
    /// links loop, and an empty chain for roots.
    pub fn find_ancestor_chain(&self, id: DocumentId) -> Option<Vec<DocumentId>> {
        let mut current = *self.parents.get(&id)?;
        let mut chain = Vec::new();

        while let Some(parent) = current {
            if chain.len() >= self.parents.len() {
                tracing::warn!("Parent links above {} loop, snapshot is corrupt", id);
                return None;
            }
            chain.push(parent);
            current = self.parents.get(&parent).copied().flatten();
        }

        chain.reverse();
        Some(chain)
    }

    /// True when `descendant` sits anywhere inside the subtree of `ancestor`.
    ///
    /// A document is not its own descendant. Parent links that loop (only
    /// possible when a snapshot repeats an id) count as a match, so callers
    /// guarding against cycles refuse the operation.
    pub fn is_descendant(&self, ancestor: DocumentId, descendant: DocumentId) -> bool {
        if ancestor == descendant {
            return false;
        }

        // An acyclic chain has fewer links than there are documents
        let mut current = self.parents.get(&descendant).copied().flatten();
        for _ in 0..=self.parents.len() {
            match current {
                Some(id) if id == ancestor => return true,
                Some(id) => current = self.parents.get(&id).copied().flatten(),
                None => return false,
            }
        }

        tracing::warn!("Parent links above {} loop, snapshot is corrupt", descendant);
        true
    }

    /// Direct children of `parent` (`None` for the root group), in display order
    pub fn children_of(&self, parent: Option<DocumentId>) -> Vec<FlatEntry> {
        self.flat
            .iter()
            .filter(|entry| entry.parent_id == parent)
            .copied()
            .collect()
    }

    /// Every document below `id`, in preorder. Empty when `id` is unknown.
    pub fn descendants(&self, id: DocumentId) -> Vec<DocumentId> {
        let Some(&start) = self.index.get(&id) else {
            return Vec::new();
        };
        let depth = self.depths[start];

        // Preorder places a subtree right after its root, one level deeper
        self.flat[start + 1..]
            .iter()
            .zip(&self.depths[start + 1..])
            .take_while(|(_, &entry_depth)| entry_depth > depth)
            .map(|(entry, _)| entry.id)
            .collect()
    }
}
