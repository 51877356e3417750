//! Document Data Structures
//!
//! This module defines the `Document` struct and the related value types that
//! flow between the persistence collaborator and the notebook engine.
//!
//! # Architecture
//!
//! - **Forest**: documents form independent trees; a document without a
//!   `parent_id` is a root
//! - **Relative ordering**: `position` only orders siblings relative to each
//!   other; values may repeat or skip, ties are broken by `id`
//! - **Derived children**: `children` exist only on [`TreeItem`], the
//!   structural snapshot returned by the tree listing query
//!
//! # Examples
//!
//! ```rust
//! use notebook_core::models::{DocumentUpdate, NewDocument};
//!
//! let new_doc = NewDocument::new("Meeting notes")
//!     .with_content("<p>Agenda</p>")
//!     .with_parent(Some(3));
//! assert_eq!(new_doc.parent_id, Some(3));
//!
//! // Move to the root group without touching anything else
//! let update = DocumentUpdate::new().with_parent(None);
//! assert_eq!(update.parent_id, Some(None));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier assigned by the persistence collaborator at creation time.
pub type DocumentId = i64;

/// Validation errors for document fields
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Document title cannot be empty")]
    EmptyTitle,

    #[error("Invalid placement: {0}")]
    InvalidPlacement(String),
}

/// A document (or folder) in the notebook.
///
/// # Fields
///
/// - `id`: Unique identifier, immutable once assigned by the store
/// - `title`: Non-empty display string
/// - `content`: Rich-text markup, opaque to the tree logic
/// - `parent_id`: Parent document, `None` for roots
/// - `position`: Relative order among siblings sharing `parent_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub parent_id: Option<DocumentId>,
    #[serde(default)]
    pub position: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Returns true when the document sits in the root group.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Sibling ordering key: position first, id as the deterministic tiebreak.
    pub fn sort_key(&self) -> (i64, DocumentId) {
        (self.position, self.id)
    }
}

/// Check a title before it reaches the store.
///
/// Returns the trimmed title, or [`ValidationError::EmptyTitle`] when nothing
/// but whitespace is left.
pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// Parameters for creating a document
///
/// The store assigns the id. `position` defaults to 0, which places the new
/// document after existing position-0 siblings because ids grow monotonically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub parent_id: Option<DocumentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
}

impl NewDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_parent(mut self, parent_id: Option<DocumentId>) -> Self {
        self.parent_id = parent_id;
        self
    }

    pub fn at_position(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }
}

/// Accepts either `T` or `null` for a present field.
///
/// Maps three input formats to the double-Option pattern:
/// - Missing field → None (don't update)
/// - null → Some(None) (set to NULL)
/// - value → Some(Some(value))
fn deserialize_optional_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

/// Partial document update
///
/// Only provided fields are written. `parent_id` uses the double-Option
/// pattern:
///
/// - `None`: Don't change parent_id
/// - `Some(None)`: Move the document to the root group
/// - `Some(Some(id))`: Re-parent under `id`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub parent_id: Option<Option<DocumentId>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
}

impl DocumentUpdate {
    /// Create a new empty DocumentUpdate
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_parent(mut self, parent_id: Option<DocumentId>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_position(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    /// Check if update contains any changes
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.parent_id.is_none()
            && self.position.is_none()
    }
}

/// One node of the structural snapshot returned by the tree listing query.
///
/// Carries no content; `children` is already sorted by `(position, id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeItem {
    pub id: DocumentId,
    pub title: String,
    pub parent_id: Option<DocumentId>,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub children: Vec<TreeItem>,
}

impl TreeItem {
    pub fn leaf(document: &Document) -> Self {
        Self {
            id: document.id,
            title: document.title.clone(),
            parent_id: document.parent_id,
            position: document.position,
            children: Vec::new(),
        }
    }

    /// Number of items in this subtree, including the item itself.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(TreeItem::subtree_len).sum::<usize>()
    }
}

/// Flattened view of a tree item used to look up placement without a
/// second round-trip to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatEntry {
    pub id: DocumentId,
    pub parent_id: Option<DocumentId>,
    pub position: i64,
}

/// Where a dragged document lands relative to the drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Before,
    After,
    Inside,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Placement::Before => "before",
            Placement::After => "after",
            Placement::Inside => "inside",
        };
        f.write_str(name)
    }
}

impl FromStr for Placement {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before" => Ok(Placement::Before),
            "after" => Ok(Placement::After),
            "inside" => Ok(Placement::Inside),
            other => Err(ValidationError::InvalidPlacement(other.to_string())),
        }
    }
}

/// Result of a delete operation
///
/// `removed_ids` lists the deleted document and every descendant removed
/// with it, in preorder (the requested document first).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResult {
    pub removed_ids: Vec<DocumentId>,
}

impl DeleteResult {
    pub fn deleted_count(&self) -> usize {
        self.removed_ids.len()
    }

    pub fn removed(&self, id: DocumentId) -> bool {
        self.removed_ids.contains(&id)
    }
}

/// Response of the search collaborator.
///
/// `ancestors` holds the ids needed to keep every match visible in a
/// collapsed tree, excluding ids that are matches themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub matches: Vec<DocumentId>,
    pub ancestors: Vec<DocumentId>,
}

/// Orders two documents the way siblings are displayed.
pub fn sibling_order(a: &Document, b: &Document) -> Ordering {
    a.sort_key().cmp(&b.sort_key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_title_trims() {
        assert_eq!(validate_title("  Notes ").unwrap(), "Notes");
        assert_eq!(validate_title(" \t").unwrap_err(), ValidationError::EmptyTitle);
    }

    #[test]
    fn test_document_update_parent_double_option() {
        let missing: DocumentUpdate = serde_json::from_value(json!({"title": "x"})).unwrap();
        assert_eq!(missing.parent_id, None);

        let null: DocumentUpdate = serde_json::from_value(json!({"parent_id": null})).unwrap();
        assert_eq!(null.parent_id, Some(None));

        let set: DocumentUpdate = serde_json::from_value(json!({"parent_id": 7})).unwrap();
        assert_eq!(set.parent_id, Some(Some(7)));
    }

    #[test]
    fn test_document_update_is_empty() {
        assert!(DocumentUpdate::new().is_empty());
        assert!(!DocumentUpdate::new().with_position(2).is_empty());
        assert!(!DocumentUpdate::new().with_parent(None).is_empty());
    }

    #[test]
    fn test_placement_parsing() {
        assert_eq!("before".parse::<Placement>().unwrap(), Placement::Before);
        assert_eq!(" Inside ".parse::<Placement>().unwrap(), Placement::Inside);
        assert!("below".parse::<Placement>().is_err());
        assert_eq!(serde_json::to_value(Placement::After).unwrap(), json!("after"));
    }

    #[test]
    fn test_sibling_order_breaks_ties_by_id() {
        let now = Utc::now();
        let doc = |id, position| Document {
            id,
            title: format!("Doc {}", id),
            content: String::new(),
            parent_id: None,
            position,
            created_at: now,
            updated_at: None,
        };

        let mut docs = vec![doc(9, 1), doc(4, 1), doc(2, 3), doc(7, 0)];
        docs.sort_by(sibling_order);
        let ids: Vec<_> = docs.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![7, 4, 9, 2]);
    }

    #[test]
    fn test_subtree_len() {
        let item = TreeItem {
            id: 1,
            title: "A".into(),
            parent_id: None,
            position: 0,
            children: vec![TreeItem {
                id: 2,
                title: "B".into(),
                parent_id: Some(1),
                position: 0,
                children: vec![],
            }],
        };
        assert_eq!(item.subtree_len(), 2);
    }
}
