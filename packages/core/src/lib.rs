//! Notebook Core Logic Layer
//!
//! This crate provides the document tree engine of a hierarchical notebook:
//! documents form a forest, ordered among their siblings, with rich-text
//! content.
//!
//! # Architecture
//!
//! - **Store as source of truth**: structure lives behind the
//!   [`db::DocumentStore`] trait; the in-memory [`services::TreeModel`] is
//!   rebuilt from it after every mutation
//! - **Relative ordering**: `position` only orders siblings, ties break on id
//! - **Clean persistence**: search highlight markers are view-only and are
//!   stripped from content before every write
//!
//! # Modules
//!
//! - [`models`] - Data structures (Document, TreeItem, updates)
//! - [`db`] - Persistence collaborator traits and an in-memory store
//! - [`markup`] - Rich-text tokenizing, entities, plain text
//! - [`highlight`] - Search highlight overlay
//! - [`services`] - Tree model, CRUD, moves, import, editor session, export
//! - [`config`] - Engine configuration

pub mod config;
pub mod db;
pub mod highlight;
pub mod markup;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::{DeleteCascade, NotebookConfig};
pub use highlight::{apply_highlight, remove_highlight, HighlightEngine};
pub use models::*;
pub use services::*;
