//! Structural moves (drag-and-drop)
//!
//! A move places the dragged document before, after or inside a target.
//! Positions only encode relative order, so a move writes exactly one
//! document and never renumbers its new siblings: ties on `position` are
//! broken by id.

use tracing::{error, info};

use crate::models::{DocumentId, DocumentUpdate, Placement};
use crate::services::document_service::DocumentService;
use crate::services::error::NotebookError;
use crate::services::tree_model::TreeModel;

/// Outcome of a move request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Dragged onto itself; nothing was written
    NoOp,
    Moved {
        id: DocumentId,
        parent_id: Option<DocumentId>,
        position: i64,
    },
}

/// New `(parent_id, position)` for `dragged` dropped at `placement` of `target`
///
/// # Errors
///
/// - [`NotebookError::CircularMove`] if `target` lies inside the subtree of `dragged`
/// - [`NotebookError::NotFound`] if either document is missing from `tree`
pub fn plan_move(
    tree: &TreeModel,
    dragged: DocumentId,
    target: DocumentId,
    placement: Placement,
) -> Result<(Option<DocumentId>, i64), NotebookError> {
    if tree.is_descendant(dragged, target) {
        return Err(NotebookError::circular_move(dragged, target));
    }

    let target_entry = tree
        .find(target)
        .ok_or_else(|| NotebookError::not_found(target))?;
    if !tree.contains(dragged) {
        return Err(NotebookError::not_found(dragged));
    }

    Ok(match placement {
        Placement::Inside => (Some(target), 0),
        Placement::Before => (target_entry.parent_id, target_entry.position),
        Placement::After => (
            target_entry.parent_id,
            target_entry.position.saturating_add(1),
        ),
    })
}

impl DocumentService {
    /// Move `dragged` relative to `target`
    ///
    /// The tree is refreshed before deciding and again after the write. On a
    /// rejected write the service refreshes so the caller re-renders from the
    /// store rather than assuming the move happened.
    ///
    /// # Errors
    ///
    /// - [`NotebookError::CircularMove`] when `target` is inside `dragged`'s subtree
    /// - [`NotebookError::NotFound`] when either document is absent
    /// - [`NotebookError::MoveFailed`] when the store rejects the update
    pub async fn move_document(
        &self,
        dragged: DocumentId,
        target: DocumentId,
        placement: Placement,
    ) -> Result<MoveOutcome, NotebookError> {
        if dragged == target {
            return Ok(MoveOutcome::NoOp);
        }

        let tree = self.refresh().await?;
        let (parent_id, position) = plan_move(&tree, dragged, target, placement)?;

        let update = DocumentUpdate::new()
            .with_parent(parent_id)
            .with_position(position);
        if let Err(e) = self.store().update_document(dragged, update).await {
            error!("Failed to move document {}: {}", dragged, e);
            if let Err(refresh_err) = self.refresh().await {
                error!("Refresh after failed move also failed: {}", refresh_err);
            }
            return Err(NotebookError::move_failed(dragged, e));
        }

        info!(
            "Moved document {} {} {} (parent {:?}, position {})",
            dragged, placement, target, parent_id, position
        );
        self.refresh().await?;

        Ok(MoveOutcome::Moved {
            id: dragged,
            parent_id,
            position,
        })
    }
}
