//! Character reference decoding and escaping
//!
//! Only the references that rich-text editors actually emit are decoded:
//! the five XML entities, `&nbsp;`, and numeric references. Anything else is
//! left verbatim. Every recognised reference decodes to exactly one char,
//! which keeps decoded offsets mappable back onto the raw text.

/// Decode a single reference at the start of `s` (which begins with `&`).
///
/// Returns the decoded char and the byte length of the reference.
fn parse_reference(s: &str) -> Option<(char, usize)> {
    let semi = s.as_bytes().iter().take(32).position(|&b| b == b';')?;
    let name = &s[1..semi];

    let decoded = if let Some(numeric) = name.strip_prefix('#') {
        let hex = numeric
            .strip_prefix('x')
            .or_else(|| numeric.strip_prefix('X'));
        let code = match hex {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        char::from_u32(code)?
    } else {
        match name {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            "nbsp" => '\u{a0}',
            _ => return None,
        }
    };

    Some((decoded, semi + 1))
}

/// Decode character references in text or attribute values.
pub fn decode_entities(raw: &str) -> String {
    DecodedText::new(raw).text
}

/// Escape text for safe inclusion in markup (text or quoted attribute).
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Decoded text with a map back onto raw byte offsets.
///
/// Each decoded char is one unit: a literal char of the raw text or a whole
/// character reference. Any char boundary of `text` therefore maps onto a
/// unit boundary of the raw text, so a span found in decoded text can never
/// split a reference in two.
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    /// `(decoded_offset, raw_offset)` at the start of every unit, plus an
    /// end sentinel
    boundaries: Vec<(usize, usize)>,
}

impl DecodedText {
    pub fn new(raw: &str) -> Self {
        let mut text = String::with_capacity(raw.len());
        let mut boundaries = Vec::new();
        let mut i = 0;

        while let Some(c) = raw[i..].chars().next() {
            boundaries.push((text.len(), i));

            if c == '&' {
                if let Some((decoded, len)) = parse_reference(&raw[i..]) {
                    text.push(decoded);
                    i += len;
                    continue;
                }
            }

            text.push(c);
            i += c.len_utf8();
        }
        boundaries.push((text.len(), raw.len()));

        Self { text, boundaries }
    }

    /// Raw offset for a decoded char boundary, `None` for offsets that fall
    /// inside a decoded char.
    pub fn raw_offset(&self, decoded: usize) -> Option<usize> {
        self.boundaries
            .binary_search_by_key(&decoded, |(d, _)| *d)
            .ok()
            .map(|idx| self.boundaries[idx].1)
    }
}
