//! HTML import sources
//!
//! Markup with `.document` containers is read as a bulk export: each
//! container carries its foreign id in `data-id`, its parent in
//! `data-parent-id`, its title in the first `<h1>` and its content in the
//! first direct child `<div>` that is not the nested `children` list.
//!
//! Markup without containers is a single page. Its title comes from the
//! first `<h1>` (which is then dropped from the content), else `<title>`,
//! else the file name.

use crate::markup::Fragment;
use crate::services::error::NotebookError;
use crate::services::import::{ImportRecord, ImportRecordError, ParsedSource};

/// Foreign id given to the record of a single-page import
const SINGLE_PAGE_ID: &str = "page";

pub(super) fn parse_html(markup: &str, fallback_title: &str) -> ParsedSource {
    let fragment = Fragment::parse(markup);
    let containers = fragment.find_all(|element| element.has_class("document"));

    if containers.is_empty() {
        ParsedSource::from_records(vec![parse_single_page(&fragment, fallback_title)])
    } else {
        parse_containers(&fragment, &containers)
    }
}

fn parse_containers(fragment: &Fragment<'_>, containers: &[usize]) -> ParsedSource {
    let mut parsed = ParsedSource::default();

    for (index, &container) in containers.iter().enumerate() {
        let element = fragment.element(container);

        let Some(foreign_id) = element
            .attribute("data-id")
            .map(str::trim)
            .filter(|id| !id.is_empty())
        else {
            let record = format!("#{}", index);
            tracing::warn!("Skipping document container {} without data-id", record);
            parsed.failures.push(ImportRecordError {
                error: NotebookError::import_parse(record.clone(), "missing data-id"),
                record,
            });
            continue;
        };

        let foreign_parent_id = element
            .attribute("data-parent-id")
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let title = fragment
            .first_descendant_by_name(container, "h1")
            .map(|h1| fragment.text_content(h1).trim().to_string())
            .unwrap_or_default();

        let content = fragment
            .children(container)
            .iter()
            .copied()
            .find(|&child| {
                let child = fragment.element(child);
                child.name == "div" && !child.has_class("tree-indicator") && !child.has_class("children")
            })
            .map(|div| fragment.inner_html(div).to_string())
            .unwrap_or_default();

        let position = element
            .attribute("data-position")
            .and_then(|raw| raw.trim().parse::<i64>().ok());

        parsed.records.push(ImportRecord {
            foreign_id: foreign_id.to_string(),
            foreign_parent_id,
            title,
            content,
            position,
        });
    }

    parsed
}

fn parse_single_page(fragment: &Fragment<'_>, fallback_title: &str) -> ImportRecord {
    let h1 = fragment.first_by_name("h1");

    let title = h1
        .map(|h1| fragment.text_content(h1).trim().to_string())
        .filter(|title| !title.is_empty())
        .or_else(|| {
            fragment
                .first_by_name("title")
                .map(|title| fragment.text_content(title).trim().to_string())
                .filter(|title| !title.is_empty())
        })
        .unwrap_or_else(|| fallback_title.to_string());

    let source = fragment.source();
    let body = fragment
        .first_by_name("body")
        .map(|body| fragment.element(body).inner.clone())
        .unwrap_or(0..source.len());

    let content = match h1.map(|h1| fragment.element(h1).outer.clone()) {
        Some(heading) if body.start <= heading.start && heading.end <= body.end => {
            format!(
                "{}{}",
                &source[body.start..heading.start],
                &source[heading.end..body.end]
            )
        }
        _ => source[body].to_string(),
    };

    ImportRecord {
        foreign_id: SINGLE_PAGE_ID.to_string(),
        foreign_parent_id: None,
        title,
        content: content.trim().to_string(),
        position: None,
    }
}
