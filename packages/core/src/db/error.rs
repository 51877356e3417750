//! Store Error Types
//!
//! This module defines error types for the persistence collaborator, keeping
//! "the id does not exist" apart from "the write was refused" and "the store
//! could not be reached" so the service layer can map each onto its own
//! user-facing outcome.

use crate::models::DocumentId;
use thiserror::Error;

/// Persistence operation errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Referenced document does not exist
    #[error("Document not found: {id}")]
    NotFound { id: DocumentId },

    /// The store refused the write (constraint or validation failure)
    #[error("Write rejected: {0}")]
    Rejected(String),

    /// The store could not be reached or timed out
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Internal lock was poisoned by a panicking writer
    #[error("Failed to acquire store lock")]
    LockPoisoned,

    /// Backend-specific failure
    #[error("Store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    /// Create a not found error
    pub fn not_found(id: DocumentId) -> Self {
        Self::NotFound { id }
    }

    /// Create a rejected write error
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
