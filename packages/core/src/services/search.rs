//! Search view over the tree
//!
//! Turns a search collaborator response into the two questions a collapsed
//! tree view asks for each row: should it be shown, and is it a hit.

use std::collections::HashSet;

use crate::models::{DocumentId, SearchResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchView {
    /// No query is active; every document is visible
    unfiltered: bool,
    matches: HashSet<DocumentId>,
    ancestors: HashSet<DocumentId>,
}

impl SearchView {
    /// View with no active query
    pub fn unfiltered() -> Self {
        Self {
            unfiltered: true,
            ..Self::default()
        }
    }

    pub fn from_result(result: SearchResult) -> Self {
        Self {
            unfiltered: false,
            matches: result.matches.into_iter().collect(),
            ancestors: result.ancestors.into_iter().collect(),
        }
    }

    pub fn is_filtered(&self) -> bool {
        !self.unfiltered
    }

    /// Matches are shown, and so are the ancestors needed to reach them
    pub fn is_visible(&self, id: DocumentId) -> bool {
        self.unfiltered || self.matches.contains(&id) || self.ancestors.contains(&id)
    }

    pub fn is_match(&self, id: DocumentId) -> bool {
        !self.unfiltered && self.matches.contains(&id)
    }

    /// Ancestors are shown expanded so that matches below them are reachable
    pub fn is_expanded(&self, id: DocumentId) -> bool {
        !self.unfiltered && self.ancestors.contains(&id)
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }
}
