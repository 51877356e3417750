//! Two-pass import resolver
//!
//! Pass 1 creates every record at the top level and maps its foreign id to
//! the id the store assigned. Pass 2 moves each created document under its
//! parent once every document of the batch exists, so creation order never
//! has to follow hierarchy order.
//!
//! The import is not transactional. A record that fails is skipped and
//! reported; documents already created stay in place, and children of a
//! failed record remain at the top level.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::models::{DocumentId, DocumentUpdate, NewDocument};
use crate::services::document_service::DocumentService;
use crate::services::error::NotebookError;
use crate::services::import::{
    ImportRecord, ImportRecordError, ImportReport, ImportSource, ParsedSource,
};

/// Where a created document should end up after pass 2
#[derive(Debug, Clone)]
enum ParentRef {
    /// Another record of the batch
    Foreign(String),
    /// An existing document the whole import is attached to
    Local(DocumentId),
}

struct PendingMove {
    id: DocumentId,
    foreign_id: String,
    parent: ParentRef,
}

pub struct ImportResolver<'a> {
    service: &'a DocumentService,
}

impl<'a> ImportResolver<'a> {
    pub fn new(service: &'a DocumentService) -> Self {
        Self { service }
    }

    /// Parse `source` and import it.
    ///
    /// Top-level records are placed under `attach_to` when given.
    ///
    /// # Errors
    ///
    /// Only source-level problems (unreadable JSON, unsupported format) and
    /// a failing final refresh abort the import. Per-record problems are
    /// collected in [`ImportReport::failures`].
    pub async fn import(
        &self,
        source: ImportSource,
        attach_to: Option<DocumentId>,
    ) -> Result<ImportReport, NotebookError> {
        let parsed = source.parse(&self.service.config().default_title)?;
        self.import_parsed(parsed, attach_to).await
    }

    pub async fn import_parsed(
        &self,
        parsed: ParsedSource,
        attach_to: Option<DocumentId>,
    ) -> Result<ImportReport, NotebookError> {
        let mut report = ImportReport {
            failures: parsed.failures,
            ..ImportReport::default()
        };

        let (id_map, pending) = self.create_all(parsed.records, attach_to, &mut report).await;
        self.reparent_all(&id_map, pending, &mut report).await;

        self.service.refresh().await?;
        info!(
            "Imported {} document(s): {} reparented, {} orphaned, {} failed",
            report.created(),
            report.reparented,
            report.orphaned.len(),
            report.failed()
        );

        Ok(report)
    }

    /// Pass 1: create every record at the top level
    async fn create_all(
        &self,
        records: Vec<ImportRecord>,
        attach_to: Option<DocumentId>,
        report: &mut ImportReport,
    ) -> (HashMap<String, DocumentId>, Vec<PendingMove>) {
        let config = self.service.config();
        let store = self.service.store();
        let mut id_map: HashMap<String, DocumentId> = HashMap::new();
        let mut pending = Vec::new();

        for (index, record) in records.into_iter().enumerate() {
            let skip_reason = if index >= config.max_import_records {
                Some(format!(
                    "import limit of {} records reached",
                    config.max_import_records
                ))
            } else if id_map.contains_key(&record.foreign_id) {
                Some("duplicate foreign id".to_string())
            } else {
                None
            };
            if let Some(reason) = skip_reason {
                warn!("Skipping import record '{}': {}", record.foreign_id, reason);
                report.failures.push(ImportRecordError {
                    error: NotebookError::import_parse(record.foreign_id.clone(), reason),
                    record: record.foreign_id,
                });
                continue;
            }

            let title = match record.title.trim() {
                "" => config.default_title.clone(),
                trimmed => trimmed.to_string(),
            };
            let document = NewDocument {
                title,
                content: self.service.highlighter().remove(&record.content),
                parent_id: None,
                position: record.position,
            };

            match store.create_document(document).await {
                Ok(created) => {
                    id_map.insert(record.foreign_id.clone(), created.id);
                    report.created_ids.push(created.id);

                    let parent = match record.foreign_parent_id {
                        Some(foreign_parent) => Some(ParentRef::Foreign(foreign_parent)),
                        None => attach_to.map(ParentRef::Local),
                    };
                    if let Some(parent) = parent {
                        pending.push(PendingMove {
                            id: created.id,
                            foreign_id: record.foreign_id,
                            parent,
                        });
                    }
                }
                Err(e) => {
                    warn!("Failed to create import record '{}': {}", record.foreign_id, e);
                    report.failures.push(ImportRecordError {
                        error: NotebookError::import_parse(record.foreign_id.clone(), e.to_string()),
                        record: record.foreign_id,
                    });
                }
            }
        }

        (id_map, pending)
    }

    /// Pass 2: move created documents under their resolved parents
    async fn reparent_all(
        &self,
        id_map: &HashMap<String, DocumentId>,
        pending: Vec<PendingMove>,
        report: &mut ImportReport,
    ) {
        let store = self.service.store();
        // Parents assigned so far in this pass, used to refuse cycles
        let mut assigned: HashMap<DocumentId, DocumentId> = HashMap::new();

        for task in pending {
            let resolved = match &task.parent {
                ParentRef::Foreign(foreign_parent) => id_map.get(foreign_parent).copied(),
                ParentRef::Local(id) => Some(*id),
            };

            let Some(parent_id) = resolved else {
                warn!(
                    "Parent {:?} of import record '{}' is not part of the batch, leaving it at the top level",
                    task.parent, task.foreign_id
                );
                report.orphaned.push(task.id);
                continue;
            };

            if creates_cycle(&assigned, task.id, parent_id) {
                warn!(
                    "Import record '{}' would become its own ancestor, leaving it at the top level",
                    task.foreign_id
                );
                report.orphaned.push(task.id);
                continue;
            }

            let update = DocumentUpdate::new().with_parent(Some(parent_id));
            match store.update_document(task.id, update).await {
                Ok(_) => {
                    assigned.insert(task.id, parent_id);
                    report.reparented += 1;
                }
                Err(e) => {
                    warn!("Failed to reparent import record '{}': {}", task.foreign_id, e);
                    report.orphaned.push(task.id);
                    report.failures.push(ImportRecordError {
                        error: NotebookError::import_parse(task.foreign_id.clone(), e.to_string()),
                        record: task.foreign_id,
                    });
                }
            }
        }
    }
}

/// True when `child` is `parent` or already an ancestor of it
///
/// `assigned` never holds a cycle, so the walk ends within
/// `assigned.len() + 1` steps.
fn creates_cycle(
    assigned: &HashMap<DocumentId, DocumentId>,
    child: DocumentId,
    parent: DocumentId,
) -> bool {
    let mut current = Some(parent);
    for _ in 0..=assigned.len() {
        match current {
            Some(id) if id == child => return true,
            Some(id) => current = assigned.get(&id).copied(),
            None => return false,
        }
    }
    true
}

impl DocumentService {
    /// Import `source`, placing its top-level records under `attach_to`
    pub async fn import(
        &self,
        source: ImportSource,
        attach_to: Option<DocumentId>,
    ) -> Result<ImportReport, NotebookError> {
        ImportResolver::new(self).import(source, attach_to).await
    }
}
