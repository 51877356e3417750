//! Markdown outline import
//!
//! Top-level headings become documents nested by heading level. The text
//! between a heading and the next one is rendered to HTML and becomes that
//! document's content. Text before the first heading becomes a document of
//! its own, titled after the file, that contains every section.

use std::ops::Range;

use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};

use crate::services::import::{records_from_levels, ImportRecord, LeveledRecord};

struct Heading {
    level: usize,
    title: String,
    /// Source range of the heading line(s)
    span: Range<usize>,
}

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Headings outside of lists, quotes and other containers
fn top_level_headings(text: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut current: Option<Heading> = None;
    let mut depth = 0usize;

    for (event, range) in Parser::new_ext(text, options()).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) if depth == 0 => {
                current = Some(Heading {
                    level: level as usize,
                    title: String::new(),
                    span: range,
                });
                depth += 1;
            }
            Event::End(TagEnd::Heading(_)) if depth == 1 && current.is_some() => {
                depth -= 1;
                if let Some(mut heading) = current.take() {
                    heading.title = heading.title.trim().to_string();
                    headings.push(heading);
                }
            }
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Text(fragment) | Event::Code(fragment) => {
                if let Some(heading) = current.as_mut() {
                    heading.title.push_str(&fragment);
                }
            }
            _ => {}
        }
    }

    headings
}

fn render(markdown: &str) -> String {
    let mut rendered = String::new();
    html::push_html(&mut rendered, Parser::new_ext(markdown, options()));
    rendered.trim_end().to_string()
}

pub(super) fn parse_markdown(text: &str, fallback_title: &str) -> Vec<ImportRecord> {
    let headings = top_level_headings(text);
    let first_start = headings.first().map_or(text.len(), |h| h.span.start);

    let mut leveled = Vec::with_capacity(headings.len() + 1);

    let preamble = &text[..first_start];
    if !preamble.trim().is_empty() {
        leveled.push(LeveledRecord {
            level: 0,
            title: fallback_title.to_string(),
            content: render(preamble),
        });
    }

    for (index, heading) in headings.iter().enumerate() {
        let body_end = headings
            .get(index + 1)
            .map_or(text.len(), |next| next.span.start);
        leveled.push(LeveledRecord {
            level: heading.level,
            title: heading.title.clone(),
            content: render(&text[heading.span.end..body_end]),
        });
    }

    records_from_levels(leveled)
}
