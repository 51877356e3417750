//! Element structure over a token stream
//!
//! Builds just enough of an element tree to answer the questions the import
//! parsers ask: "which elements carry this class", "what is the first `h1`
//! inside this container", "what is the inner markup of that div". Recovery
//! is deliberately simple: a close tag closes the nearest open element of the
//! same name (implicitly closing anything opened after it) and stray close
//! tags are ignored.

use std::ops::Range;

use crate::markup::entities::decode_entities;
use crate::markup::tokenizer::{tokenize, Token};

#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Byte range of the element including its tags
    pub outer: Range<usize>,
    /// Byte range between the open and close tags
    pub inner: Range<usize>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .map(|classes| classes.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

/// Parsed markup with elements indexed in document order
#[derive(Debug)]
pub struct Fragment<'a> {
    source: &'a str,
    tokens: Vec<(usize, Token<'a>)>,
    elements: Vec<Element>,
}

impl<'a> Fragment<'a> {
    pub fn parse(source: &'a str) -> Self {
        let mut offset = 0;
        let tokens: Vec<(usize, Token<'a>)> = tokenize(source)
            .into_iter()
            .map(|token| {
                let start = offset;
                offset += token.raw().len();
                (start, token)
            })
            .collect();

        let mut elements: Vec<Element> = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        for (start, token) in &tokens {
            let Token::Tag(tag) = token else {
                continue;
            };
            let end = start + tag.raw.len();

            if tag.is_open() || tag.is_void() {
                let index = elements.len();
                let parent = open.last().copied();
                let (outer, inner) = if tag.is_void() {
                    (*start..end, end..end)
                } else {
                    // Ends are patched when the element closes
                    (*start..source.len(), end..source.len())
                };

                elements.push(Element {
                    name: tag.name.clone(),
                    attributes: tag.attributes(),
                    outer,
                    inner,
                    parent,
                    children: Vec::new(),
                });
                if let Some(parent) = parent {
                    elements[parent].children.push(index);
                }
                if !tag.is_void() {
                    open.push(index);
                }
            } else if tag.is_close() {
                let Some(depth) = open.iter().rposition(|&idx| elements[idx].name == tag.name)
                else {
                    continue;
                };

                for &implicit in &open[depth + 1..] {
                    elements[implicit].inner.end = *start;
                    elements[implicit].outer.end = *start;
                }
                let matched = open[depth];
                elements[matched].inner.end = *start;
                elements[matched].outer.end = end;
                open.truncate(depth);
            }
        }

        Self {
            source,
            tokens,
            elements,
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn element(&self, index: usize) -> &Element {
        &self.elements[index]
    }

    /// Indices of all elements matching `predicate`, in document order
    pub fn find_all(&self, predicate: impl Fn(&Element) -> bool) -> Vec<usize> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, element)| predicate(element))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn first_by_name(&self, name: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.name == name)
    }

    /// First element named `name` anywhere below `ancestor`
    pub fn first_descendant_by_name(&self, ancestor: usize, name: &str) -> Option<usize> {
        (ancestor + 1..self.elements.len())
            .take_while(|&idx| self.is_descendant(ancestor, idx))
            .find(|&idx| self.elements[idx].name == name)
    }

    /// True when `candidate` sits somewhere below `ancestor`
    pub fn is_descendant(&self, ancestor: usize, candidate: usize) -> bool {
        let mut current = self.elements[candidate].parent;
        while let Some(idx) = current {
            if idx == ancestor {
                return true;
            }
            current = self.elements[idx].parent;
        }
        false
    }

    pub fn children(&self, index: usize) -> &[usize] {
        &self.elements[index].children
    }

    pub fn inner_html(&self, index: usize) -> &'a str {
        &self.source[self.elements[index].inner.clone()]
    }

    pub fn outer_html(&self, index: usize) -> &'a str {
        &self.source[self.elements[index].outer.clone()]
    }

    /// Decoded text of every text and raw-text token inside the element
    pub fn text_content(&self, index: usize) -> String {
        let range = &self.elements[index].inner;
        self.tokens
            .iter()
            .filter(|(start, _)| range.contains(start))
            .filter_map(|(_, token)| match token {
                Token::Text(raw) | Token::RawText(raw) => Some(decode_entities(raw)),
                _ => None,
            })
            .collect()
    }
}
