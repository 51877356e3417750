//! Document Service - Notebook Operations
//!
//! This module provides the business logic layer between the presentation
//! layer and the persistence collaborator:
//!
//! - CRUD operations (create, read, update, rename, delete)
//! - Tree snapshot management (refresh after every mutation)
//! - Delete previews and subtree cascade strategy
//! - Search with collapsed-tree visibility
//!
//! Structural moves live in [`structure`](crate::services::structure) and
//! imports in [`import`](crate::services::import); both operate through this
//! service so they share its tree snapshot and content cleaning.
//!
//! # Tree Snapshot
//!
//! The service keeps one [`TreeModel`] built from the latest
//! [`DocumentStore::get_tree`] result. Every mutating operation ends with a
//! refresh, so once an operation returns, [`DocumentService::tree`] reflects
//! it. Between issuing a write and its refresh the snapshot is stale.
//!
//! # Content Integrity
//!
//! Content passes through [`HighlightEngine::remove`] on every write, so
//! search markers shown in an editor can never reach the store.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::{DeleteCascade, NotebookConfig};
use crate::db::{DocumentStore, InMemoryStore, SearchProvider};
use crate::highlight::HighlightEngine;
use crate::models::{
    validate_title, DeleteResult, Document, DocumentId, DocumentUpdate, NewDocument, TreeItem,
};
use crate::services::error::NotebookError;
use crate::services::search::SearchView;
use crate::services::tree_model::TreeModel;

pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    search: Option<Arc<dyn SearchProvider>>,
    /// Latest structural snapshot, replaced wholesale on refresh
    tree: RwLock<Arc<TreeModel>>,
    config: NotebookConfig,
    highlighter: HighlightEngine,
}

impl DocumentService {
    /// Create a service over `store`
    ///
    /// # Errors
    ///
    /// [`NotebookError::InvalidConfig`] if the configuration does not validate.
    pub fn new(store: Arc<dyn DocumentStore>, config: NotebookConfig) -> Result<Self, NotebookError> {
        config.validate().map_err(NotebookError::invalid_config)?;

        Ok(Self {
            store,
            search: None,
            tree: RwLock::new(Arc::new(TreeModel::default())),
            highlighter: HighlightEngine::new(&config),
            config,
        })
    }

    /// Create a service backed by a fresh [`InMemoryStore`] that also
    /// answers searches
    pub fn in_memory(config: NotebookConfig) -> Result<Self, NotebookError> {
        let store = Arc::new(InMemoryStore::new());
        Ok(Self::new(store.clone(), config)?.with_search_provider(store))
    }

    pub fn with_search_provider(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(provider);
        self
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn config(&self) -> &NotebookConfig {
        &self.config
    }

    pub fn highlighter(&self) -> &HighlightEngine {
        &self.highlighter
    }

    /// Rebuild the tree snapshot from the store
    pub async fn refresh(&self) -> Result<Arc<TreeModel>, NotebookError> {
        let forest = self.store.get_tree().await?;
        let model = Arc::new(TreeModel::from_forest(forest));
        debug!("Refreshed tree: {} documents", model.len());

        *self.tree.write().await = Arc::clone(&model);
        Ok(model)
    }

    /// Current tree snapshot (as of the last refresh)
    pub async fn tree(&self) -> Arc<TreeModel> {
        Arc::clone(&*self.tree.read().await)
    }

    /// Fresh forest listing from the store
    pub async fn get_tree(&self) -> Result<Vec<TreeItem>, NotebookError> {
        Ok(self.refresh().await?.roots().to_vec())
    }

    /// Create a document
    ///
    /// A non-positive `parent_id` means the root group. The title is trimmed
    /// and must not be empty; highlight markers are stripped from content.
    pub async fn create_document(&self, mut document: NewDocument) -> Result<Document, NotebookError> {
        if matches!(document.parent_id, Some(parent) if parent <= 0) {
            document.parent_id = None;
        }
        document.title = validate_title(&document.title)?;
        document.content = self.highlighter.remove(&document.content);

        let created = self
            .store
            .create_document(document)
            .await
            .map_err(NotebookError::from_store)?;
        info!(
            "Created document {} under {:?} at {}",
            created.id, created.parent_id, created.position
        );

        self.refresh().await?;
        Ok(created)
    }

    /// Get a document with its content
    pub async fn get_document(&self, id: DocumentId) -> Result<Document, NotebookError> {
        self.store
            .get_document(id)
            .await
            .map_err(NotebookError::from_store)
    }

    /// Apply a partial update
    ///
    /// A document named as its own parent is moved to the root group instead.
    pub async fn update_document(
        &self,
        id: DocumentId,
        mut update: DocumentUpdate,
    ) -> Result<Document, NotebookError> {
        if update.parent_id == Some(Some(id)) {
            warn!("Document {} cannot be its own parent, moving to root", id);
            update.parent_id = Some(None);
        }
        if let Some(title) = update.title.as_deref() {
            update.title = Some(validate_title(title)?);
        }
        if let Some(content) = update.content.as_deref() {
            update.content = Some(self.highlighter.remove(content));
        }

        let updated = self
            .store
            .update_document(id, update)
            .await
            .map_err(NotebookError::from_store)?;

        self.refresh().await?;
        Ok(updated)
    }

    /// Change a document's title
    pub async fn rename(&self, id: DocumentId, title: &str) -> Result<Document, NotebookError> {
        let title = validate_title(title)?;
        self.update_document(id, DocumentUpdate::new().with_title(title))
            .await
    }

    /// Ids of every descendant a delete of `id` would also remove
    ///
    /// Callers show this to the user before confirming a delete.
    pub async fn delete_preview(&self, id: DocumentId) -> Result<Vec<DocumentId>, NotebookError> {
        let tree = self.refresh().await?;
        if !tree.contains(id) {
            return Err(NotebookError::not_found(id));
        }
        Ok(tree.descendants(id))
    }

    /// Delete a document and its whole subtree
    ///
    /// Deleting an absent document succeeds with an empty result.
    pub async fn delete_document(&self, id: DocumentId) -> Result<DeleteResult, NotebookError> {
        let tree = self.refresh().await?;
        let descendants = tree.descendants(id);

        if !descendants.is_empty() {
            warn!(
                "Deleting document {} removes {} descendant(s)",
                id,
                descendants.len()
            );
        }

        if self.config.delete_cascade == DeleteCascade::Engine {
            // Reverse preorder removes every child before its parent
            for &descendant in descendants.iter().rev() {
                self.store.delete_document(descendant).await?;
            }
        }

        let existed = self.store.delete_document(id).await?;
        self.refresh().await?;

        if !existed {
            debug!("Delete of missing document {} ignored", id);
            return Ok(DeleteResult::default());
        }

        info!("Deleted document {} and {} descendant(s)", id, descendants.len());
        let mut removed_ids = Vec::with_capacity(descendants.len() + 1);
        removed_ids.push(id);
        removed_ids.extend(descendants);
        Ok(DeleteResult { removed_ids })
    }

    /// Remove every document
    pub async fn delete_all(&self) -> Result<(), NotebookError> {
        self.store.delete_all().await?;
        info!("Deleted all documents");
        self.refresh().await?;
        Ok(())
    }

    pub async fn document_count(&self) -> Result<usize, NotebookError> {
        Ok(self.store.count().await?)
    }

    /// Search titles and content
    ///
    /// An empty query clears the filter and shows the whole tree.
    ///
    /// # Errors
    ///
    /// [`NotebookError::InvalidConfig`] when no search provider is attached.
    pub async fn search(&self, query: &str) -> Result<SearchView, NotebookError> {
        if query.is_empty() {
            return Ok(SearchView::unfiltered());
        }

        let provider = self
            .search
            .as_ref()
            .ok_or_else(|| NotebookError::invalid_config("no search provider attached"))?;
        let result = provider.search(query).await?;
        debug!(
            "Search '{}' matched {} document(s)",
            query,
            result.matches.len()
        );

        Ok(SearchView::from_result(result))
    }
}
