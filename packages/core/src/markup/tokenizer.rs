//! Lossless markup tokenizer
//!
//! Splits rich-text markup into text, tags, comments and raw-text bodies.
//! Concatenating the `raw()` of every token always reproduces the input
//! byte-for-byte, which is what lets the highlight engine promise an exact
//! inverse.
//!
//! The tokenizer is forgiving in the way browsers are: a `<` that does not
//! start a well-formed tag is plain text, an unterminated comment runs to the
//! end of input, and the bodies of `script`, `style`, `textarea` and `title`
//! are never scanned for tags.

use crate::markup::entities::decode_entities;

/// Elements whose body is raw text rather than markup
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Elements that never have a closing tag
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Open,
    Close,
    SelfClosing,
    /// `<!doctype ...>` or `<?xml ...?>`
    Declaration,
}

/// A single tag with its original text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
    pub raw: &'a str,
    /// Lowercased element name (empty for declarations)
    pub name: String,
    pub kind: TagKind,
}

impl<'a> Tag<'a> {
    pub fn is_open(&self) -> bool {
        self.kind == TagKind::Open
    }

    pub fn is_close(&self) -> bool {
        self.kind == TagKind::Close
    }

    /// Open tags of void elements never get a matching close tag.
    pub fn is_void(&self) -> bool {
        self.kind == TagKind::SelfClosing
            || (self.kind == TagKind::Open && VOID_ELEMENTS.contains(&self.name.as_str()))
    }

    /// Attribute name/value pairs in source order, names lowercased and
    /// values entity-decoded. Valueless attributes get an empty string.
    pub fn attributes(&self) -> Vec<(String, String)> {
        if !matches!(self.kind, TagKind::Open | TagKind::SelfClosing) {
            return Vec::new();
        }

        // Skip "<name", drop the trailing ">" or "/>"
        let body = &self.raw[1 + self.name.len()..self.raw.len() - 1];
        let body = body.strip_suffix('/').unwrap_or(body);
        parse_attributes(body)
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.attributes()
            .into_iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .map(|classes| classes.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    Tag(Tag<'a>),
    Comment(&'a str),
    RawText(&'a str),
}

impl<'a> Token<'a> {
    /// Original source text of the token
    pub fn raw(&self) -> &'a str {
        match self {
            Token::Text(raw) | Token::Comment(raw) | Token::RawText(raw) => raw,
            Token::Tag(tag) => tag.raw,
        }
    }
}

/// Tokenize markup. See the module docs for the lossless guarantee.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }

        let Some((end, token)) = scan_markup(input, i) else {
            i += 1;
            continue;
        };

        if text_start < i {
            tokens.push(Token::Text(&input[text_start..i]));
        }

        let raw_text_element = match &token {
            Token::Tag(tag) if tag.is_open() && RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) => {
                Some(tag.name.clone())
            }
            _ => None,
        };
        tokens.push(token);
        i = end;

        if let Some(name) = raw_text_element {
            let close = find_closing_tag(input, end, &name);
            if close > end {
                tokens.push(Token::RawText(&input[end..close]));
            }
            i = close;
        }

        text_start = i;
    }

    if text_start < bytes.len() {
        tokens.push(Token::Text(&input[text_start..]));
    }

    tokens
}

/// Try to read a comment, tag or declaration starting at `start` (a `<`).
fn scan_markup(input: &str, start: usize) -> Option<(usize, Token<'_>)> {
    let rest = &input[start..];

    if rest.starts_with("<!--") {
        let end = rest[4..]
            .find("-->")
            .map(|pos| start + 4 + pos + 3)
            .unwrap_or(input.len());
        return Some((end, Token::Comment(&input[start..end])));
    }

    let bytes = rest.as_bytes();
    let next = *bytes.get(1)?;

    let (kind, name_start) = match next {
        b'/' if bytes.get(2).is_some_and(u8::is_ascii_alphabetic) => (TagKind::Close, 2),
        b'!' | b'?' => (TagKind::Declaration, 2),
        c if c.is_ascii_alphabetic() => (TagKind::Open, 1),
        _ => return None,
    };

    let end = find_tag_end(bytes, name_start)?;
    let raw = &rest[..end];

    let name = if kind == TagKind::Declaration {
        String::new()
    } else {
        raw[name_start..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == ':')
            .collect::<String>()
            .to_ascii_lowercase()
    };

    let kind = if kind == TagKind::Open && raw.ends_with("/>") {
        TagKind::SelfClosing
    } else {
        kind
    };

    Some((start + end, Token::Tag(Tag { raw, name, kind })))
}

/// Index one past the closing `>`, skipping quoted attribute values.
fn find_tag_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (offset, &b) in bytes.iter().enumerate().skip(from) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(offset + 1),
            None => {}
        }
    }
    None
}

/// Start of `</name` (case-insensitive) at or after `from`, or the input length.
fn find_closing_tag(input: &str, from: usize, name: &str) -> usize {
    let lowered = input[from..].to_ascii_lowercase();
    let needle = format!("</{}", name);
    let mut search_from = 0;

    while let Some(pos) = lowered[search_from..].find(&needle) {
        let at = search_from + pos;
        let after = lowered.as_bytes().get(at + needle.len()).copied();
        match after {
            None | Some(b'>') | Some(b'/') => return from + at,
            Some(b) if b.is_ascii_whitespace() => return from + at,
            _ => search_from = at + needle.len(),
        }
    }

    input.len()
}

fn parse_attributes(body: &str) -> Vec<(String, String)> {
    let bytes = body.as_bytes();
    let mut attributes = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        let name_start = i;
        while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'=' {
            i += 1;
        }
        let name = body[name_start..i].to_ascii_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }

            let value = if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let quote = bytes[i];
                let value_start = i + 1;
                let value_end = body[value_start..]
                    .bytes()
                    .position(|b| b == quote)
                    .map(|pos| value_start + pos)
                    .unwrap_or(body.len());
                i = (value_end + 1).min(body.len());
                &body[value_start..value_end]
            } else {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                &body[value_start..i]
            };

            attributes.push((name, decode_entities(value)));
        } else if !name.is_empty() {
            attributes.push((name, String::new()));
        }
    }

    attributes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassemble(tokens: &[Token<'_>]) -> String {
        tokens.iter().map(Token::raw).collect()
    }

    #[test]
    fn test_tokenize_is_lossless() {
        let inputs = [
            "<p>Hello <b>World</b></p>",
            "a < b and c > d",
            "<img src=\"x>y.png\" alt='1 > 0'> tail",
            "<!-- note --><p>x</p><!-- unterminated",
            "<script>if (a<b) { x = '</p>'; }</script>after",
            "<!DOCTYPE html><html><body>&amp; &lt;tag&gt;</body></html>",
            "<p unterminated=\"quote>text",
            "",
        ];

        for input in inputs {
            assert_eq!(reassemble(&tokenize(input)), input, "input: {}", input);
        }
    }

    #[test]
    fn test_tokenize_kinds() {
        let tokens = tokenize("<p class=\"x\">Hi<br/></p>");
        assert_eq!(tokens.len(), 4);
        match &tokens[0] {
            Token::Tag(tag) => {
                assert_eq!(tag.name, "p");
                assert_eq!(tag.kind, TagKind::Open);
                assert_eq!(tag.attribute("class").as_deref(), Some("x"));
            }
            other => panic!("Expected tag, got {:?}", other),
        }
        assert_eq!(tokens[1], Token::Text("Hi"));
        match &tokens[2] {
            Token::Tag(tag) => assert_eq!(tag.kind, TagKind::SelfClosing),
            other => panic!("Expected tag, got {:?}", other),
        }
        match &tokens[3] {
            Token::Tag(tag) => assert!(tag.is_close()),
            other => panic!("Expected tag, got {:?}", other),
        }
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        let tokens = tokenize("1 < 2");
        assert_eq!(tokens, vec![Token::Text("1 < 2")]);
    }

    #[test]
    fn test_raw_text_elements_are_not_scanned() {
        let tokens = tokenize("<style>p > b { }</style><p>x</p>");
        assert_eq!(tokens[1], Token::RawText("p > b { }"));
        match &tokens[2] {
            Token::Tag(tag) => assert_eq!(tag.name, "style"),
            other => panic!("Expected tag, got {:?}", other),
        }
    }

    #[test]
    fn test_attribute_parsing() {
        let tokens = tokenize("<div class='document root' data-id=12 hidden data-title=\"a &amp; b\">");
        let Token::Tag(tag) = &tokens[0] else {
            panic!("Expected tag");
        };
        assert!(tag.has_class("document"));
        assert!(tag.has_class("root"));
        assert!(!tag.has_class("doc"));
        assert_eq!(tag.attribute("data-id").as_deref(), Some("12"));
        assert_eq!(tag.attribute("hidden").as_deref(), Some(""));
        assert_eq!(tag.attribute("DATA-TITLE").as_deref(), Some("a & b"));
        assert_eq!(tag.attribute("missing"), None);
    }

    #[test]
    fn test_void_detection() {
        let tokens = tokenize("<img src=a><br><p>");
        let voids: Vec<bool> = tokens
            .iter()
            .map(|t| match t {
                Token::Tag(tag) => tag.is_void(),
                _ => false,
            })
            .collect();
        assert_eq!(voids, vec![true, true, false]);
    }
}
