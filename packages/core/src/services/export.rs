//! HTML export
//!
//! [`export_all_to_html`] renders the whole forest as one standalone page.
//! Each document becomes a `.document` container carrying its id, parent id
//! and position as data attributes, with the title in an `<h1>`, the content
//! in a `<div>` and its children nested in a `.children` div. The HTML import
//! reads exactly this layout back.

use std::collections::HashMap;
use std::fmt::{self, Write as _};

use crate::markup::escape_html;
use crate::models::{Document, DocumentId, TreeItem};
use crate::services::document_service::DocumentService;
use crate::services::error::NotebookError;

const EXPORT_STYLE: &str = "\
body { font-family: sans-serif; line-height: 1.6; max-width: 900px; margin: 40px auto; padding: 20px; }
h1 { border-bottom: 2px solid #eee; padding-bottom: 10px; color: #333; }
.document { margin-bottom: 20px; }
.children { margin-left: 40px; padding-left: 20px; }
.doc-separator { margin: 30px 0; border-top: 1px dashed #ccc; }
img { max-width: 100%; height: auto; border-radius: 8px; }
.tree-indicator { display: none; }";

fn page_start(out: &mut String, title: &str) -> fmt::Result {
    write!(
        out,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{}\n</style>\n</head>\n<body>\n",
        escape_html(title),
        EXPORT_STYLE
    )
}

fn page_end(out: &mut String) {
    out.push_str("</body>\n</html>\n");
}

struct Renderer<'a> {
    documents: &'a HashMap<DocumentId, Document>,
    service: &'a DocumentService,
    out: String,
}

impl Renderer<'_> {
    fn page(&mut self, roots: &[TreeItem]) -> fmt::Result {
        page_start(&mut self.out, "All Documents Export")?;
        for root in roots {
            self.render(root, 0)?;
        }
        page_end(&mut self.out);
        Ok(())
    }

    fn render(&mut self, item: &TreeItem, depth: usize) -> fmt::Result {
        write!(
            self.out,
            "<div class='document' id='doc-{id}' data-id='{id}'",
            id = item.id
        )?;
        if let Some(parent_id) = item.parent_id {
            write!(self.out, " data-parent-id='{}'", parent_id)?;
        }
        write!(self.out, " data-position='{}'>", item.position)?;

        if depth > 0 {
            self.out.push_str("<div class='tree-indicator'>└── </div>");
        }
        write!(self.out, "<h1>{}</h1>", escape_html(&item.title))?;

        let content = self
            .documents
            .get(&item.id)
            .map(|doc| self.service.highlighter().remove(&doc.content))
            .unwrap_or_default();
        write!(self.out, "<div>{}</div>", content)?;

        if !item.children.is_empty() {
            self.out.push_str("<div class='children'>");
            for child in &item.children {
                self.render(child, depth + 1)?;
            }
            self.out.push_str("</div>");
        }

        self.out.push_str("</div>\n");
        if depth == 0 {
            self.out.push_str("<div class='doc-separator'></div>\n");
        }
        Ok(())
    }
}

/// Render every document as one HTML page
pub async fn export_all_to_html(service: &DocumentService) -> Result<String, NotebookError> {
    let tree = service.refresh().await?;

    let mut documents = HashMap::with_capacity(tree.len());
    for entry in tree.flatten() {
        let document = service.get_document(entry.id).await?;
        documents.insert(entry.id, document);
    }

    let mut renderer = Renderer {
        documents: &documents,
        service,
        out: String::new(),
    };
    renderer.page(tree.roots())?;

    tracing::info!("Exported {} document(s) to HTML", documents.len());
    Ok(renderer.out)
}

fn single_page(out: &mut String, document: &Document, service: &DocumentService) -> fmt::Result {
    page_start(out, &document.title)?;
    writeln!(out, "<h1>{}</h1>", escape_html(&document.title))?;
    out.push_str(&service.highlighter().remove(&document.content));
    out.push('\n');
    page_end(out);
    Ok(())
}

/// Render one document (title and content) as a standalone page
pub async fn export_document_to_html(
    service: &DocumentService,
    id: DocumentId,
) -> Result<String, NotebookError> {
    let document = service.get_document(id).await?;

    let mut out = String::new();
    single_page(&mut out, &document, service)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotebookConfig;
    use crate::models::NewDocument;

    #[tokio::test]
    async fn test_export_all_structure() {
        let service = DocumentService::in_memory(NotebookConfig::default()).unwrap();
        let root = service
            .create_document(NewDocument::new("R&D").with_content("<p>Lab</p>"))
            .await
            .unwrap();
        let child = service
            .create_document(
                NewDocument::new("Child")
                    .with_parent(Some(root.id))
                    .at_position(3),
            )
            .await
            .unwrap();

        let html = export_all_to_html(&service).await.unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(&format!(
            "<div class='document' id='doc-{id}' data-id='{id}' data-position='0'><h1>R&amp;D</h1><div><p>Lab</p></div><div class='children'>",
            id = root.id
        )));
        assert!(html.contains(&format!(
            "data-id='{}' data-parent-id='{}' data-position='3'>",
            child.id, root.id
        )));
        assert_eq!(html.matches("doc-separator'").count(), 1);
    }

    #[tokio::test]
    async fn test_export_single_document() {
        let service = DocumentService::in_memory(NotebookConfig::default()).unwrap();
        let doc = service
            .create_document(NewDocument::new("<Plan>").with_content("<p>Steps</p>"))
            .await
            .unwrap();

        let html = export_document_to_html(&service, doc.id).await.unwrap();
        assert!(html.contains("<title>&lt;Plan&gt;</title>"));
        assert!(html.contains("<h1>&lt;Plan&gt;</h1>\n<p>Steps</p>"));

        assert!(matches!(
            export_document_to_html(&service, 99).await,
            Err(NotebookError::NotFound { id: 99 })
        ));
    }
}
