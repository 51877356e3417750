//! Rich-text markup handling
//!
//! Document content is stored as HTML fragments produced by the editor. This
//! module provides the pieces every other layer needs to work with them
//! without a full HTML parser:
//!
//! - [`tokenize`] - lossless split into text, tags, comments and raw text
//! - [`DecodedText`] - entity-decoded text mapped back to raw offsets
//! - [`Fragment`] - element tree for structural queries during import
//! - [`plain_text`] - searchable text of a fragment

mod entities;
mod fragment;
mod tokenizer;

pub use entities::{decode_entities, escape_html, DecodedText};
pub use fragment::{Element, Fragment};
pub use tokenizer::{tokenize, Tag, TagKind, Token};

use regex::Regex;
use std::sync::LazyLock;

/// Inline image payloads, which would otherwise dominate the searchable text
static DATA_URI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"data:[^;]+;base64,[A-Za-z0-9+/=]+").expect("Invalid data URI pattern")
});

static WHITESPACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace pattern"));

/// Visible text of a markup fragment.
///
/// Tags become word breaks, character references are decoded, inline base64
/// payloads and the bodies of `script`/`style` are dropped and runs of
/// whitespace collapse to a single space. Case is preserved.
pub fn plain_text(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let joined = tokenize(html)
        .iter()
        .filter_map(|token| match token {
            Token::Text(raw) => Some(decode_entities(raw)),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ");

    let without_data = DATA_URI_PATTERN.replace_all(&joined, "");
    WHITESPACE_PATTERN
        .replace_all(&without_data, " ")
        .trim()
        .to_string()
}
