//! Persistence Layer
//!
//! This module holds the seam between the notebook engine and its external
//! collaborators:
//!
//! - [`DocumentStore`] - CRUD over documents plus the tree listing query
//! - [`SearchProvider`] - matching ids and the ancestors needed to show them
//! - [`InMemoryStore`] - process-local implementation of both
//!
//! The store is the source of truth for structure. Services rebuild their
//! in-memory tree from [`DocumentStore::get_tree`] after every mutation rather
//! than patching local state.

mod document_store;
mod error;
mod memory_store;

pub use document_store::{DocumentStore, SearchProvider};
pub use error::StoreError;
pub use memory_store::InMemoryStore;
