//! In-memory document store
//!
//! Reference implementation of [`DocumentStore`] and [`SearchProvider`] used
//! by the bundled binary, by tests and by hosts that keep the notebook in
//! process. It follows the collaborator contract exactly: ids are assigned
//! monotonically, deletes cascade to the subtree, and acyclicity is NOT
//! enforced here (that is the engine's job).

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::db::{DocumentStore, SearchProvider, StoreError};
use crate::markup::plain_text;
use crate::models::{
    sibling_order, Document, DocumentId, DocumentUpdate, NewDocument, SearchResult, TreeItem,
};

#[derive(Debug)]
struct StoreState {
    documents: BTreeMap<DocumentId, Document>,
    next_id: DocumentId,
}

/// Mutex-guarded map of documents keyed by id
#[derive(Debug)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                documents: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Seed the store with existing documents; new ids continue after the
    /// largest seeded id.
    pub fn with_documents(documents: Vec<Document>) -> Self {
        let next_id = documents.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        let documents = documents.into_iter().map(|d| (d.id, d)).collect();

        Self {
            state: Mutex::new(StoreState { documents, next_id }),
        }
    }

    /// Snapshot of every stored document ordered by id
    pub fn documents(&self) -> Result<Vec<Document>, StoreError> {
        let state = self.lock()?;
        Ok(state.documents.values().cloned().collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// parent_id → children sorted by `(position, id)`
fn children_index(
    documents: &BTreeMap<DocumentId, Document>,
) -> HashMap<Option<DocumentId>, Vec<&Document>> {
    let mut index: HashMap<Option<DocumentId>, Vec<&Document>> = HashMap::new();
    for document in documents.values() {
        index.entry(document.parent_id).or_default().push(document);
    }
    for children in index.values_mut() {
        children.sort_by(|a, b| sibling_order(a, b));
    }
    index
}

fn build_items(
    parent_id: Option<DocumentId>,
    index: &HashMap<Option<DocumentId>, Vec<&Document>>,
) -> Vec<TreeItem> {
    index
        .get(&parent_id)
        .map(|children| {
            children
                .iter()
                .map(|child| {
                    let mut item = TreeItem::leaf(child);
                    item.children = build_items(Some(child.id), index);
                    item
                })
                .collect()
        })
        .unwrap_or_default()
}

/// The document itself followed by its descendants, preorder
fn subtree_ids(documents: &BTreeMap<DocumentId, Document>, id: DocumentId) -> Vec<DocumentId> {
    let index = children_index(documents);
    let mut visited = HashSet::new();
    let mut ordered = Vec::new();
    let mut stack = vec![id];

    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        ordered.push(current);
        if let Some(children) = index.get(&Some(current)) {
            // Reverse so the first child is visited first
            stack.extend(children.iter().rev().map(|c| c.id));
        }
    }

    ordered
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get_tree(&self) -> Result<Vec<TreeItem>, StoreError> {
        let state = self.lock()?;
        let index = children_index(&state.documents);
        Ok(build_items(None, &index))
    }

    async fn get_document(&self, id: DocumentId) -> Result<Document, StoreError> {
        let state = self.lock()?;
        state
            .documents
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(id))
    }

    async fn create_document(&self, document: NewDocument) -> Result<Document, StoreError> {
        let mut state = self.lock()?;

        if let Some(parent_id) = document.parent_id {
            if !state.documents.contains_key(&parent_id) {
                return Err(StoreError::rejected(format!(
                    "parent {} does not exist",
                    parent_id
                )));
            }
        }

        let id = state.next_id;
        state.next_id += 1;

        let created = Document {
            id,
            title: document.title,
            content: document.content,
            parent_id: document.parent_id,
            position: document.position.unwrap_or(0),
            created_at: Utc::now(),
            updated_at: None,
        };
        state.documents.insert(id, created.clone());

        Ok(created)
    }

    async fn update_document(
        &self,
        id: DocumentId,
        update: DocumentUpdate,
    ) -> Result<Document, StoreError> {
        let mut state = self.lock()?;

        if !state.documents.contains_key(&id) {
            return Err(StoreError::not_found(id));
        }

        if let Some(Some(parent_id)) = update.parent_id {
            if parent_id == id {
                return Err(StoreError::rejected(format!(
                    "document {} cannot be its own parent",
                    id
                )));
            }
            if !state.documents.contains_key(&parent_id) {
                return Err(StoreError::rejected(format!(
                    "parent {} does not exist",
                    parent_id
                )));
            }
        }

        let document = state
            .documents
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(id))?;

        if let Some(title) = update.title {
            document.title = title;
        }
        if let Some(content) = update.content {
            document.content = content;
        }
        if let Some(parent_id) = update.parent_id {
            document.parent_id = parent_id;
        }
        if let Some(position) = update.position {
            document.position = position;
        }
        document.updated_at = Some(Utc::now());

        Ok(document.clone())
    }

    async fn delete_document(&self, id: DocumentId) -> Result<bool, StoreError> {
        let mut state = self.lock()?;

        if !state.documents.contains_key(&id) {
            return Ok(false);
        }

        for doomed in subtree_ids(&state.documents, id) {
            state.documents.remove(&doomed);
        }

        Ok(true)
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.documents.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let state = self.lock()?;
        Ok(state.documents.len())
    }
}

#[async_trait]
impl SearchProvider for InMemoryStore {
    async fn search(&self, query: &str) -> Result<SearchResult, StoreError> {
        if query.is_empty() {
            return Ok(SearchResult::default());
        }

        let state = self.lock()?;
        let needle = query.to_lowercase();

        let matches: BTreeSet<DocumentId> = state
            .documents
            .values()
            .filter(|doc| {
                doc.title.to_lowercase().contains(&needle)
                    || plain_text(&doc.content).to_lowercase().contains(&needle)
            })
            .map(|doc| doc.id)
            .collect();

        let mut ancestors = BTreeSet::new();
        for id in &matches {
            let mut visited = HashSet::new();
            let mut parent_id = state.documents.get(id).and_then(|d| d.parent_id);
            while let Some(current) = parent_id {
                if !visited.insert(current) {
                    break;
                }
                if !matches.contains(&current) {
                    ancestors.insert(current);
                }
                parent_id = state.documents.get(&current).and_then(|d| d.parent_id);
            }
        }

        Ok(SearchResult {
            matches: matches.into_iter().collect(),
            ancestors: ancestors.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Document;

    fn doc(id: DocumentId, parent_id: Option<DocumentId>, position: i64) -> Document {
        Document {
            id,
            title: format!("Doc {}", id),
            content: String::new(),
            parent_id,
            position,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_store_creation() {
        let store = InMemoryStore::new();
        assert!(store.get_tree().await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_assigns_monotonic_ids() {
        let store = InMemoryStore::with_documents(vec![doc(5, None, 0)]);
        let created = store.create_document(NewDocument::new("New")).await.unwrap();
        assert_eq!(created.id, 6);
        assert_eq!(created.position, 0);
        assert!(created.parent_id.is_none());
    }

    #[tokio::test]
    async fn test_create_with_missing_parent_is_rejected() {
        let store = InMemoryStore::new();
        let result = store
            .create_document(NewDocument::new("Child").with_parent(Some(42)))
            .await;
        assert!(matches!(result, Err(StoreError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_get_tree_orders_by_position_then_id() {
        let store = InMemoryStore::with_documents(vec![
            doc(1, None, 0),
            doc(2, Some(1), 2),
            doc(3, Some(1), 0),
            doc(4, Some(1), 2),
            doc(5, None, 0),
        ]);

        let forest = store.get_tree().await.unwrap();
        let roots: Vec<_> = forest.iter().map(|i| i.id).collect();
        assert_eq!(roots, vec![1, 5]);

        let children: Vec<_> = forest[0].children.iter().map(|i| i.id).collect();
        assert_eq!(children, vec![3, 2, 4]);
    }

    #[tokio::test]
    async fn test_get_tree_drops_orphans() {
        let store = InMemoryStore::with_documents(vec![doc(1, None, 0), doc(2, Some(99), 0)]);
        let forest = store.get_tree().await.unwrap();
        assert_eq!(forest.len(), 1);
        assert!(forest[0].children.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_document() {
        let store = InMemoryStore::new();
        let err = store.get_document(3).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_sparse_fields() {
        let store = InMemoryStore::with_documents(vec![doc(1, None, 0), doc(2, None, 1)]);

        let updated = store
            .update_document(2, DocumentUpdate::new().with_parent(Some(1)).with_position(4))
            .await
            .unwrap();
        assert_eq!(updated.parent_id, Some(1));
        assert_eq!(updated.position, 4);
        assert_eq!(updated.title, "Doc 2");
        assert!(updated.updated_at.is_some());

        let rooted = store
            .update_document(2, DocumentUpdate::new().with_parent(None))
            .await
            .unwrap();
        assert!(rooted.parent_id.is_none());
        assert_eq!(rooted.position, 4);
    }

    #[tokio::test]
    async fn test_update_rejects_self_parent() {
        let store = InMemoryStore::with_documents(vec![doc(1, None, 0)]);
        let result = store
            .update_document(1, DocumentUpdate::new().with_parent(Some(1)))
            .await;
        assert!(matches!(result, Err(StoreError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let store = InMemoryStore::new();
        let result = store
            .update_document(8, DocumentUpdate::new().with_title("x"))
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { id: 8 })));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_subtree() {
        let store = InMemoryStore::with_documents(vec![
            doc(1, None, 0),
            doc(2, Some(1), 0),
            doc(3, Some(2), 0),
            doc(4, None, 1),
        ]);

        assert!(store.delete_document(1).await.unwrap());
        let remaining: Vec<_> = store.documents().unwrap().iter().map(|d| d.id).collect();
        assert_eq!(remaining, vec![4]);
    }

    #[tokio::test]
    async fn test_delete_nonexistent_document() {
        let store = InMemoryStore::new();
        assert!(!store.delete_document(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_all() {
        let store = InMemoryStore::with_documents(vec![doc(1, None, 0), doc(2, Some(1), 0)]);
        store.delete_all().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_matches_title_and_plain_text() {
        let mut a = doc(1, None, 0);
        a.title = "Projects".into();
        let mut b = doc(2, Some(1), 0);
        b.content = "<p>Quarterly <b>Budget</b></p>".into();
        let mut c = doc(3, Some(2), 0);
        c.content = r#"<img src="budget.png">"#.into();
        let store = InMemoryStore::with_documents(vec![a, b, c]);

        let result = store.search("budget").await.unwrap();
        assert_eq!(result.matches, vec![2]);
        assert_eq!(result.ancestors, vec![1]);

        let result = store.search("PROJ").await.unwrap();
        assert_eq!(result.matches, vec![1]);
        assert!(result.ancestors.is_empty());
    }

    #[tokio::test]
    async fn test_search_ancestors_exclude_matches() {
        let mut a = doc(1, None, 0);
        a.title = "alpha".into();
        let mut b = doc(2, Some(1), 0);
        b.title = "alpha beta".into();
        let c = doc(3, Some(2), 0);
        let mut d = doc(4, Some(3), 0);
        d.title = "alpha gamma".into();
        let store = InMemoryStore::with_documents(vec![a, b, c, d]);

        let result = store.search("alpha").await.unwrap();
        assert_eq!(result.matches, vec![1, 2, 4]);
        assert_eq!(result.ancestors, vec![3]);
    }

    #[tokio::test]
    async fn test_search_empty_query() {
        let store = InMemoryStore::with_documents(vec![doc(1, None, 0)]);
        assert_eq!(store.search("").await.unwrap(), SearchResult::default());
    }
}
