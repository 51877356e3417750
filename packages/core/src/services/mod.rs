//! Notebook Services
//!
//! This module contains the notebook engine:
//!
//! - `DocumentService` - CRUD, delete cascade, search and the tree snapshot
//! - `TreeModel` - read-only forest view (ancestors, descendants, flattening)
//! - `structure` - drag-and-drop moves with cycle prevention
//! - `import` - two-pass import with foreign id remapping
//! - `EditorSession` - selection and editing-surface state
//! - `export` - HTML export
//!
//! Services coordinate between the persistence collaborator and the
//! presentation layer. The store stays the source of truth for structure.

pub mod document_service;
pub mod editor;
pub mod error;
pub mod export;
pub mod import;
pub mod search;
pub mod structure;
pub mod tree_model;

pub use document_service::DocumentService;
pub use editor::EditorSession;
pub use error::NotebookError;
pub use export::{export_all_to_html, export_document_to_html};
pub use import::{
    records_from_levels, ImportRecord, ImportRecordError, ImportReport, ImportResolver,
    ImportSource, LeveledRecord, ParsedSource,
};
pub use search::SearchView;
pub use structure::{plan_move, MoveOutcome};
pub use tree_model::TreeModel;
