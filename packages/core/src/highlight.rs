//! Highlight Overlay Engine
//!
//! Wraps search matches inside rich-text content in removable markers and
//! unwraps them again. The markers are view-only: [`HighlightEngine::remove`]
//! restores the exact input of [`HighlightEngine::apply`], so content can be
//! cleaned right before it is written to the store.
//!
//! # Matching
//!
//! - Only text between tags is searched, never tag names, attribute values,
//!   comments or the bodies of `script`/`style`/`title`/`textarea`
//! - The query is a literal, case-insensitive substring
//! - Matching runs on entity-decoded text, so `&` finds `&amp;` and a marker
//!   never splits a character reference
//!
//! # Examples
//!
//! ```rust
//! use notebook_core::highlight::HighlightEngine;
//!
//! let engine = HighlightEngine::default();
//! let content = r#"<p>Budget <a href="budget.html">link</a></p>"#;
//!
//! let highlighted = engine.apply(content, "budget").unwrap();
//! assert_eq!(engine.count_markers(&highlighted), 1);
//! assert_eq!(engine.remove(&highlighted), content);
//! ```

use regex::{Regex, RegexBuilder};

use crate::config::NotebookConfig;
use crate::markup::{tokenize, DecodedText, Tag, Token};
use crate::services::NotebookError;

/// Applies and removes search highlight markers
#[derive(Debug, Clone)]
pub struct HighlightEngine {
    tag: String,
    attribute: String,
}

impl Default for HighlightEngine {
    fn default() -> Self {
        Self::new(&NotebookConfig::default())
    }
}

impl HighlightEngine {
    pub fn new(config: &NotebookConfig) -> Self {
        Self {
            tag: config.highlight_tag.to_ascii_lowercase(),
            attribute: config.highlight_attribute.to_ascii_lowercase(),
        }
    }

    fn open_marker(&self) -> String {
        format!("<{} {}=\"true\">", self.tag, self.attribute)
    }

    fn close_marker(&self) -> String {
        format!("</{}>", self.tag)
    }

    fn is_marker_open(&self, tag: &Tag<'_>) -> bool {
        tag.is_open() && tag.name == self.tag && tag.attribute(&self.attribute).is_some()
    }

    /// Wrap every occurrence of `query` in `content` with a marker.
    ///
    /// Existing markers are removed first, so applying twice with the same
    /// query equals applying once. An empty query only removes markers.
    ///
    /// # Errors
    ///
    /// [`NotebookError::HighlightEscape`] if the escaped query cannot be
    /// compiled. This indicates a defect rather than bad user input.
    pub fn apply(&self, content: &str, query: &str) -> Result<String, NotebookError> {
        let clean = self.remove(content);
        if query.is_empty() {
            return Ok(clean);
        }

        let matcher = literal_matcher(query)?;
        let open = self.open_marker();
        let close = self.close_marker();

        let mut output = String::with_capacity(clean.len() + 32);
        // Set once a text run holds a '<' that could still start a tag. The
        // tokenizer only leaves such a '<' as text when no '>' closes it later,
        // so any marker after it would supply that '>' and turn the text into
        // a tag. Everything from there on is copied untouched.
        let mut frozen = false;
        for token in tokenize(&clean) {
            match token {
                Token::Text(raw) if !frozen => {
                    let pending = pending_tag_start(raw);
                    frozen = pending.is_some();
                    let limit = pending.unwrap_or(raw.len());
                    self.wrap_matches(raw, limit, &matcher, &open, &close, &mut output);
                }
                other => output.push_str(other.raw()),
            }
        }

        Ok(output)
    }

    /// Wrap matches ending at or before `limit` within one text run
    fn wrap_matches(
        &self,
        raw: &str,
        limit: usize,
        matcher: &Regex,
        open: &str,
        close: &str,
        out: &mut String,
    ) {
        let decoded = DecodedText::new(raw);
        let mut copied = 0;

        for found in matcher.find_iter(&decoded.text) {
            let (Some(start), Some(end)) = (
                decoded.raw_offset(found.start()),
                decoded.raw_offset(found.end()),
            ) else {
                continue;
            };
            if end > limit {
                break;
            }

            out.push_str(&raw[copied..start]);
            out.push_str(open);
            out.push_str(&raw[start..end]);
            out.push_str(close);
            copied = end;
        }

        out.push_str(&raw[copied..]);
    }

    /// Unwrap every marker, keeping the text it wrapped.
    ///
    /// Elements that share the marker's tag name but lack its attribute are
    /// user content and are left alone, including when nested inside markers.
    pub fn remove(&self, content: &str) -> String {
        if !content.contains(&self.attribute) {
            return content.to_string();
        }

        let mut output = String::with_capacity(content.len());
        // One entry per open element named like the marker: true when it is a marker
        let mut open_same_name: Vec<bool> = Vec::new();

        for token in tokenize(content) {
            if let Token::Tag(tag) = &token {
                if tag.name == self.tag {
                    if tag.is_open() {
                        let is_marker = self.is_marker_open(tag);
                        open_same_name.push(is_marker);
                        if is_marker {
                            continue;
                        }
                    } else if tag.is_close() && open_same_name.pop() == Some(true) {
                        continue;
                    }
                }
            }
            output.push_str(token.raw());
        }

        output
    }

    /// True when `content` holds at least one marker
    pub fn contains_markers(&self, content: &str) -> bool {
        self.count_markers(content) > 0
    }

    /// Number of markers in `content`
    pub fn count_markers(&self, content: &str) -> usize {
        tokenize(content)
            .iter()
            .filter(|token| matches!(token, Token::Tag(tag) if self.is_marker_open(tag)))
            .count()
    }
}

/// Build a case-insensitive matcher for `query` taken literally
fn literal_matcher(query: &str) -> Result<Regex, NotebookError> {
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .map_err(|e| NotebookError::highlight_escape(e.to_string()))
}

/// Offset of the first '<' in a text run that would start a tag if a '>'
/// followed it.
fn pending_tag_start(raw: &str) -> Option<usize> {
    let bytes = raw.as_bytes();
    bytes.iter().enumerate().find_map(|(i, &b)| {
        if b != b'<' {
            return None;
        }
        match bytes.get(i + 1) {
            Some(next) if next.is_ascii_alphabetic() || matches!(next, b'/' | b'!' | b'?') => {
                Some(i)
            }
            _ => None,
        }
    })
}

/// Apply highlight markers with the default marker format.
pub fn apply_highlight(content: &str, query: &str) -> Result<String, NotebookError> {
    HighlightEngine::default().apply(content, query)
}

/// Remove highlight markers with the default marker format.
pub fn remove_highlight(content: &str) -> String {
    HighlightEngine::default().remove(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARK: &str = "<mark data-search-highlight=\"true\">";

    #[test]
    fn test_apply_wraps_text_matches() {
        let result = apply_highlight("<p>Hello world</p>", "world").unwrap();
        assert_eq!(result, format!("<p>Hello {}world</mark></p>", MARK));
    }

    #[test]
    fn test_apply_is_case_insensitive_and_keeps_original_case() {
        let result = apply_highlight("<p>Rust rust RUST</p>", "rust").unwrap();
        assert_eq!(
            result,
            format!(
                "<p>{m}Rust</mark> {m}rust</mark> {m}RUST</mark></p>",
                m = MARK
            )
        );
    }

    #[test]
    fn test_apply_skips_tags_and_attributes() {
        let content = r#"<a href="/budget" title="budget">Report</a><img src="budget.png">"#;
        let result = apply_highlight(content, "budget").unwrap();
        assert_eq!(result, content);

        let result = apply_highlight("<budget>x</budget>", "budget").unwrap();
        assert_eq!(result, "<budget>x</budget>");
    }

    #[test]
    fn test_apply_skips_comments_and_scripts() {
        let content = "<!-- plan --><script>let plan = 1;</script><p>plan</p>";
        let result = apply_highlight(content, "plan").unwrap();
        assert_eq!(
            result,
            format!("<!-- plan --><script>let plan = 1;</script><p>{}plan</mark></p>", MARK)
        );
    }

    #[test]
    fn test_query_is_literal() {
        let content = "<p>a.b (a+b)* axb</p>";
        let result = apply_highlight(content, "a.b").unwrap();
        assert_eq!(result.matches(MARK).count(), 1);

        let result = apply_highlight(content, "(a+b)*").unwrap();
        assert_eq!(result, format!("<p>a.b {}(a+b)*</mark> axb</p>", MARK));

        let result = apply_highlight(content, "[").unwrap();
        assert_eq!(result, content);
    }

    #[test]
    fn test_entities_are_matched_decoded_and_never_split() {
        let content = "<p>R&amp;D and Q&amp;A</p>";
        let result = apply_highlight(content, "&").unwrap();
        assert_eq!(
            result,
            format!("<p>R{m}&amp;</mark>D and Q{m}&amp;</mark>A</p>", m = MARK)
        );
        assert_eq!(remove_highlight(&result), content);

        // "amp" is not visible text
        assert_eq!(apply_highlight(content, "amp").unwrap(), content);
    }

    #[test]
    fn test_empty_query_removes_markers_only() {
        let content = "<p>note</p>";
        assert_eq!(apply_highlight(content, "").unwrap(), content);

        let highlighted = apply_highlight(content, "note").unwrap();
        assert_eq!(apply_highlight(&highlighted, "").unwrap(), content);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let content = "<ul><li>alpha beta</li><li>Alphabet</li></ul>";
        let once = apply_highlight(content, "alpha").unwrap();
        let twice = apply_highlight(&once, "alpha").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_requery_replaces_previous_markers() {
        let content = "<p>one two</p>";
        let first = apply_highlight(content, "one").unwrap();
        let second = apply_highlight(&first, "two").unwrap();
        assert_eq!(second, format!("<p>one {}two</mark></p>", MARK));
    }

    #[test]
    fn test_remove_is_inverse_of_apply() {
        let samples = [
            "",
            "plain text without tags",
            "<p>Hello <b>World</b> hello</p>",
            "<p>1 < 2 and 3 > 2</p>",
            "<p>x &lt;mark&gt; y</p>",
            "<p>caf\u{e9} CAF\u{c9}</p>",
            "<p>unclosed <mark>user mark</mark> mark</p>",
            "trailing a<bx",
            "<p>see <img src=\"data:image/png;base64,AAAA\"> a</p>",
            // Unterminated tag starts whose quote closes in a later text run
            "<mark><amp'</p>'amp",
            "<p>a <b x=\"</i>\" a</p> a",
            "x <em title='</em>' mark a",
            "<i>a</i> <q a=\"<br>\" x a",
        ];
        let queries = ["a", "mark", "<", "x", "caf\u{e9}", " ", "hello"];

        for content in samples {
            for query in queries {
                let highlighted = apply_highlight(content, query).unwrap();
                assert_eq!(
                    remove_highlight(&highlighted),
                    content,
                    "content {:?} query {:?}",
                    content,
                    query
                );
            }
        }
    }

    #[test]
    fn test_remove_leaves_user_marks() {
        let content = "<p><mark>keep</mark> this</p>";
        let highlighted = apply_highlight(content, "kee").unwrap();
        assert_eq!(
            highlighted,
            format!("<p><mark>{}kee</mark>p</mark> this</p>", MARK)
        );
        assert_eq!(remove_highlight(&highlighted), content);
    }

    #[test]
    fn test_marker_counting() {
        let engine = HighlightEngine::default();
        let highlighted = engine.apply("<p>aa ba</p>", "a").unwrap();
        assert_eq!(engine.count_markers(&highlighted), 3);
        assert!(engine.contains_markers(&highlighted));
        assert!(!engine.contains_markers("<p><mark>a</mark></p>"));
    }

    #[test]
    fn test_custom_marker_configuration() {
        let config = NotebookConfig {
            highlight_tag: "span".to_string(),
            highlight_attribute: "data-hit".to_string(),
            ..NotebookConfig::default()
        };
        let engine = HighlightEngine::new(&config);
        let content = "<p><span class=\"x\">find</span> me</p>";
        let highlighted = engine.apply(content, "find").unwrap();
        assert_eq!(
            highlighted,
            "<p><span class=\"x\"><span data-hit=\"true\">find</span></span> me</p>"
        );
        assert_eq!(engine.remove(&highlighted), content);
    }

    #[test]
    fn test_no_markers_after_an_unterminated_tag_start() {
        // "<amp'" never closes, but a '>' from a later marker would close it
        let content = "<mark><amp'</p>'amp";
        assert_eq!(apply_highlight(content, "a").unwrap(), content);

        // Text before the pending '<' is still highlighted
        let content = "<p>a</p> b <q x='</p>' a";
        let highlighted = apply_highlight(content, "a").unwrap();
        assert_eq!(
            highlighted,
            format!("<p>{}a</mark></p> b <q x='</p>' a", MARK)
        );
        assert_eq!(remove_highlight(&highlighted), content);
    }

    #[test]
    fn test_pending_tag_start() {
        assert_eq!(pending_tag_start("1 < 2"), None);
        assert_eq!(pending_tag_start("a<bx"), Some(1));
        assert_eq!(pending_tag_start("plain"), None);
    }
}
