//! Shared test helpers

#![allow(dead_code)]

use async_trait::async_trait;
use notebook_core::db::{DocumentStore, InMemoryStore, SearchProvider, StoreError};
use notebook_core::models::{
    Document, DocumentId, DocumentUpdate, NewDocument, SearchResult, TreeItem,
};
use notebook_core::services::DocumentService;
use notebook_core::NotebookConfig;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Store wrapper that counts writes and fails on demand
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryStore,
    fail_updates: AtomicBool,
    /// Titles whose creation is refused
    fail_titles: Mutex<HashSet<String>>,
    pub update_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_title(&self, title: &str) {
        self.fail_titles.lock().unwrap().insert(title.to_string());
    }

    pub fn updates(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get_tree(&self) -> Result<Vec<TreeItem>, StoreError> {
        self.inner.get_tree().await
    }

    async fn get_document(&self, id: DocumentId) -> Result<Document, StoreError> {
        self.inner.get_document(id).await
    }

    async fn create_document(&self, document: NewDocument) -> Result<Document, StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_titles.lock().unwrap().contains(&document.title) {
            return Err(StoreError::unavailable("injected create failure"));
        }
        self.inner.create_document(document).await
    }

    async fn update_document(
        &self,
        id: DocumentId,
        update: DocumentUpdate,
    ) -> Result<Document, StoreError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("injected update failure"));
        }
        self.inner.update_document(id, update).await
    }

    async fn delete_document(&self, id: DocumentId) -> Result<bool, StoreError> {
        self.inner.delete_document(id).await
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        self.inner.delete_all().await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.inner.count().await
    }
}

#[async_trait]
impl SearchProvider for FlakyStore {
    async fn search(&self, query: &str) -> Result<SearchResult, StoreError> {
        self.inner.search(query).await
    }
}

/// Service over a fresh [`FlakyStore`]
pub fn flaky_service() -> (Arc<FlakyStore>, DocumentService) {
    let store = Arc::new(FlakyStore::new());
    let service = DocumentService::new(store.clone(), NotebookConfig::default())
        .unwrap()
        .with_search_provider(store.clone());
    (store, service)
}

/// Create a document under `parent` and return its id
pub async fn create(
    service: &DocumentService,
    title: &str,
    parent: Option<DocumentId>,
) -> DocumentId {
    service
        .create_document(NewDocument::new(title).with_parent(parent))
        .await
        .unwrap()
        .id
}

/// Titles of the forest in preorder, indented by depth
pub fn outline(items: &[TreeItem]) -> Vec<String> {
    fn walk(items: &[TreeItem], depth: usize, out: &mut Vec<String>) {
        for item in items {
            out.push(format!("{}{}", "  ".repeat(depth), item.title));
            walk(&item.children, depth + 1, out);
        }
    }
    let mut out = Vec::new();
    walk(items, 0, &mut out);
    out
}
