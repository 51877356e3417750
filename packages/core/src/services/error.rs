//! Service Layer Error Types
//!
//! This module defines the errors surfaced by notebook operations. Structural
//! rejections (`NotFound`, `CircularMove`) leave no partial state behind and
//! are meant to be shown to the user as a refused action. `HighlightEscape`
//! indicates a defect in the highlight engine and is never user-facing.

use crate::db::StoreError;
use crate::models::{DocumentId, ValidationError};
use thiserror::Error;

/// Notebook operation errors
#[derive(Error, Debug)]
pub enum NotebookError {
    /// Referenced document does not exist
    #[error("Document not found: {id}")]
    NotFound { id: DocumentId },

    /// Move would place a document inside its own subtree
    #[error("Cannot move document {dragged_id} into its own subtree (target {target_id})")]
    CircularMove {
        dragged_id: DocumentId,
        target_id: DocumentId,
    },

    /// Persistence rejected or could not complete a move
    #[error("Failed to move document {id}: {source}")]
    MoveFailed { id: DocumentId, source: StoreError },

    /// One import record could not be parsed or created
    #[error("Import record '{record}' failed: {reason}")]
    ImportParse { record: String, reason: String },

    /// Highlight query could not be turned into a literal matcher
    #[error("Highlight escaping failed: {0}")]
    HighlightEscape(String),

    /// Field validation failed
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration rejected at service construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unsupported or unreadable import source
    #[error("Invalid import source: {0}")]
    InvalidSource(String),

    /// Persistence operation failed
    #[error("Store operation failed: {0}")]
    Store(#[from] StoreError),

    /// Writing rendered HTML failed
    #[error("Rendering failed: {0}")]
    Render(#[from] std::fmt::Error),
}

impl NotebookError {
    /// Create a not found error
    pub fn not_found(id: DocumentId) -> Self {
        Self::NotFound { id }
    }

    /// Create a circular move error
    pub fn circular_move(dragged_id: DocumentId, target_id: DocumentId) -> Self {
        Self::CircularMove {
            dragged_id,
            target_id,
        }
    }

    /// Create a move failed error
    pub fn move_failed(id: DocumentId, source: StoreError) -> Self {
        Self::MoveFailed { id, source }
    }

    /// Create an import parse error
    pub fn import_parse(record: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ImportParse {
            record: record.into(),
            reason: reason.into(),
        }
    }

    /// Create a highlight escape error
    pub fn highlight_escape(msg: impl Into<String>) -> Self {
        Self::HighlightEscape(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an invalid source error
    pub fn invalid_source(msg: impl Into<String>) -> Self {
        Self::InvalidSource(msg.into())
    }

    /// Map a store error, turning a missing id into [`NotebookError::NotFound`]
    pub fn from_store(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { id } => Self::NotFound { id },
            other => Self::Store(other),
        }
    }

    /// True for rejections a user can act on; false for defects and
    /// infrastructure failures
    pub fn is_user_facing(&self) -> bool {
        match self {
            Self::NotFound { .. }
            | Self::CircularMove { .. }
            | Self::MoveFailed { .. }
            | Self::ImportParse { .. }
            | Self::Validation(_)
            | Self::InvalidSource(_) => true,
            Self::HighlightEscape(_)
            | Self::InvalidConfig(_)
            | Self::Store(_)
            | Self::Render(_) => false,
        }
    }
}
