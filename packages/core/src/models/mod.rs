//! Data Models
//!
//! This module contains the data structures exchanged between the notebook
//! engine and its collaborators:
//!
//! - `Document` - a document or folder with its content and placement
//! - `TreeItem` / `FlatEntry` - structural snapshots of the forest
//! - `NewDocument` / `DocumentUpdate` - create and partial-update payloads
//! - `SearchResult` / `DeleteResult` - collaborator responses

mod document;

pub use document::{
    sibling_order, validate_title, DeleteResult, Document, DocumentId, DocumentUpdate, FlatEntry,
    NewDocument, Placement, SearchResult, TreeItem, ValidationError,
};
