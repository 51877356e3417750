//! Editor session
//!
//! Holds the state of one editing surface: which document is selected, the
//! title and content as currently shown, and the active search query. The
//! selection is explicit session state rather than a process-wide global, so
//! several sessions can share one [`DocumentService`].
//!
//! Shown content may carry search highlight markers. They are stripped on
//! every save, so they never reach the store.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::{DeleteResult, Document, DocumentId, DocumentUpdate};
use crate::services::document_service::DocumentService;
use crate::services::error::NotebookError;

pub struct EditorSession {
    service: Arc<DocumentService>,
    selected: Option<DocumentId>,
    title: String,
    /// Content as shown, possibly highlighted
    content: String,
    search_query: String,
}

impl EditorSession {
    pub fn new(service: Arc<DocumentService>) -> Self {
        Self {
            service,
            selected: None,
            title: String::new(),
            content: String::new(),
            search_query: String::new(),
        }
    }

    pub fn selected_id(&self) -> Option<DocumentId> {
        self.selected
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Content as shown, including any highlight markers
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Show `document`, highlighted for the active query
    pub fn load(&mut self, document: &Document) -> Result<(), NotebookError> {
        self.content = self
            .service
            .highlighter()
            .apply(&document.content, &self.search_query)?;
        self.title = document.title.clone();
        self.selected = Some(document.id);
        Ok(())
    }

    /// Drop the selection and empty the surface
    pub fn clear(&mut self) {
        self.selected = None;
        self.title.clear();
        self.content.clear();
    }

    /// Select another document, saving the current one first
    ///
    /// If the current document was deleted elsewhere its unsaved edits are
    /// dropped and the new document is loaded anyway.
    pub async fn select(&mut self, id: DocumentId) -> Result<(), NotebookError> {
        if self.selected.is_some_and(|current| current != id) {
            match self.save().await {
                Ok(_) => {}
                Err(NotebookError::NotFound { id: gone }) => {
                    warn!("Document {} was already removed, discarding its edits", gone);
                    self.clear();
                }
                Err(e) => return Err(e),
            }
        }

        let document = self.service.get_document(id).await?;
        self.load(&document)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Replace the shown content (as edited by the user)
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Change the search query and re-highlight the shown content
    pub fn set_search_query(&mut self, query: impl Into<String>) -> Result<(), NotebookError> {
        self.search_query = query.into();
        self.content = self
            .service
            .highlighter()
            .apply(&self.content, &self.search_query)?;
        Ok(())
    }

    /// Shown content with every highlight marker removed
    pub fn content_for_save(&self) -> String {
        self.service.highlighter().remove(&self.content)
    }

    /// Write the title and cleaned content of the selected document.
    ///
    /// Returns `None` when nothing is selected, or when the title is blank
    /// (the store keeps its previous state).
    pub async fn save(&mut self) -> Result<Option<Document>, NotebookError> {
        let Some(id) = self.selected else {
            return Ok(None);
        };
        if self.title.trim().is_empty() {
            warn!("Not saving document {} with an empty title", id);
            return Ok(None);
        }

        let update = DocumentUpdate::new()
            .with_title(self.title.clone())
            .with_content(self.content_for_save());
        let saved = self.service.update_document(id, update).await?;
        debug!("Saved document {}", id);
        Ok(Some(saved))
    }

    /// Delete the selected document and its subtree, then clear the surface
    pub async fn delete_current(&mut self) -> Result<Option<DeleteResult>, NotebookError> {
        let Some(id) = self.selected else {
            return Ok(None);
        };

        let result = self.service.delete_document(id).await?;
        self.clear();
        Ok(Some(result))
    }

    /// Clear the surface if the selected document was removed by `result`
    pub fn forget_if_removed(&mut self, result: &DeleteResult) -> bool {
        match self.selected {
            Some(id) if result.removed(id) => {
                self.clear();
                true
            }
            _ => false,
        }
    }
}
