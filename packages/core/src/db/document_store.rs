//! DocumentStore Trait - Persistence Collaborator Seam
//!
//! This module defines the `DocumentStore` and `SearchProvider` traits that
//! abstract the external services the notebook engine talks to. The engine
//! never assumes a particular backend: a SQL database, a remote HTTP API and
//! the bundled [`InMemoryStore`](crate::db::InMemoryStore) all fit behind the
//! same seam.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: every call is a request/response round-trip with a
//!    natural suspension point
//! 2. **Ownership Semantics**: payloads are taken by value, results returned owned
//! 3. **Typed Errors**: [`StoreError`] separates missing ids from rejected or
//!    unreachable writes
//! 4. **No Transactions**: the collaborator offers no multi-document
//!    transaction primitive; multi-step operations are not atomic
//!
//! # Examples
//!
//! ```rust,no_run
//! use notebook_core::db::{DocumentStore, InMemoryStore};
//! use notebook_core::models::NewDocument;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
//!     let created = store.create_document(NewDocument::new("Inbox")).await?;
//!     let forest = store.get_tree().await?;
//!     assert_eq!(forest[0].id, created.id);
//!     Ok(())
//! }
//! ```

use crate::db::StoreError;
use crate::models::{Document, DocumentId, DocumentUpdate, NewDocument, SearchResult, TreeItem};
use async_trait::async_trait;

/// Abstraction over document persistence
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so services holding an
/// `Arc<dyn DocumentStore>` can be shared across tasks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Full structural snapshot of the forest
    ///
    /// Roots and every `children` list are ordered by `(position, id)`.
    /// Documents whose parent does not exist are not part of the forest.
    async fn get_tree(&self) -> Result<Vec<TreeItem>, StoreError>;

    /// Get a document with its content
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no document has this id.
    async fn get_document(&self, id: DocumentId) -> Result<Document, StoreError>;

    /// Create a document and return it with its assigned id
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - `parent_id` references a document that does not exist
    /// - the store is unreachable
    async fn create_document(&self, document: NewDocument) -> Result<Document, StoreError>;

    /// Apply a sparse update and return the updated document
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - the document does not exist ([`StoreError::NotFound`])
    /// - the new parent does not exist or equals the document itself
    async fn update_document(
        &self,
        id: DocumentId,
        update: DocumentUpdate,
    ) -> Result<Document, StoreError>;

    /// Delete a document and its entire descendant subtree
    ///
    /// Returns `false` when the document did not exist.
    async fn delete_document(&self, id: DocumentId) -> Result<bool, StoreError>;

    /// Delete every document (notebook reset)
    async fn delete_all(&self) -> Result<(), StoreError>;

    /// Total number of stored documents
    async fn count(&self) -> Result<usize, StoreError>;
}

/// Abstraction over the search service
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Find documents whose title or content contains `query`
    ///
    /// An empty query yields an empty result.
    async fn search(&self, query: &str) -> Result<SearchResult, StoreError>;
}
