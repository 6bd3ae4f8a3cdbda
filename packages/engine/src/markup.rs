//! # Markup Helpers
//!
//! Text-level view of a WordprocessingML part.
//!
//! The engine never parses the document grammar. It only recognises the
//! boundaries of text fragments (`<w:t>` elements) and decodes their payloads:
//!
//! ```text
//! <w:r><w:t xml:space="preserve">Cap &amp; Amount</w:t></w:r>
//!      └──────── element ──────────────────────────┘
//!                                └─ payload ──┘
//! text: "Cap & Amount"
//! ```
//!
//! Each fragment keeps a map from decoded byte offsets back to raw offsets so
//! a match found in decoded text can be spliced into the raw content without
//! touching any other byte.

use regex::Regex;
use std::ops::Range;

/// Boundary of a `<w:t>` element with a plain-text payload.
const FRAGMENT_PATTERN: &str = r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>";

/// Contiguous run of plain text extracted from markup
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    /// Byte range of the whole element, tags included
    pub element: Range<usize>,

    /// Byte range of the raw payload between the tags
    pub payload: Range<usize>,

    /// Decoded payload
    pub text: String,

    /// Raw payload offset for every decoded byte, plus one entry past the end
    offsets: Vec<usize>,
}

impl TextFragment {
    /// Absolute content offset of a byte offset into the decoded text
    pub fn content_offset(&self, text_offset: usize) -> usize {
        self.payload.start + self.offsets[text_offset]
    }

    /// Opening tag, attributes included
    pub fn open_tag<'a>(&self, content: &'a str) -> &'a str {
        &content[self.element.start..self.payload.start]
    }

    /// Closing tag
    pub fn close_tag<'a>(&self, content: &'a str) -> &'a str {
        &content[self.payload.end..self.element.end]
    }
}

/// Recognises text fragments in document content
#[derive(Debug, Clone)]
pub struct FragmentScanner {
    pattern: Regex,
}

impl FragmentScanner {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(FRAGMENT_PATTERN).expect("fragment pattern is a valid regex"),
        }
    }

    /// All text fragments in document order
    pub fn fragments(&self, content: &str) -> Vec<TextFragment> {
        self.pattern
            .captures_iter(content)
            .filter_map(|caps| {
                let element = caps.get(0)?;
                let payload = caps.get(1)?;
                let (text, offsets) = decode_with_offsets(payload.as_str());
                Some(TextFragment {
                    element: element.range(),
                    payload: payload.range(),
                    text,
                    offsets,
                })
            })
            .collect()
    }

    /// Concatenated text of every fragment, in document order
    pub fn plain_text(&self, content: &str) -> String {
        self.fragments(content)
            .into_iter()
            .map(|fragment| fragment.text)
            .collect()
    }
}

impl Default for FragmentScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain text of a document part
pub fn plain_text(content: &str) -> String {
    FragmentScanner::new().plain_text(content)
}

/// Escape literal text for embedding in markup.
///
/// With `typographic_apostrophes` set, `'` becomes a right single quotation
/// mark (U+2019) to match the curly quotes used by word processors.
pub fn escape_text(text: &str, typographic_apostrophes: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' if typographic_apostrophes => escaped.push_str("&#x2019;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Decode character references in a text payload
pub fn unescape_text(raw: &str) -> String {
    decode_with_offsets(raw).0
}

fn decode_with_offsets(raw: &str) -> (String, Vec<usize>) {
    let mut text = String::with_capacity(raw.len());
    let mut offsets = Vec::with_capacity(raw.len() + 1);
    let mut pos = 0;

    while pos < raw.len() {
        let rest = &raw[pos..];
        let (ch, consumed) = match rest.strip_prefix('&').and_then(parse_reference) {
            Some((ch, len)) => (ch, len + 1),
            // Not a reference we understand: keep the ampersand literally
            None => {
                let ch = rest.chars().next().unwrap_or('&');
                (ch, ch.len_utf8())
            }
        };
        for _ in 0..ch.len_utf8() {
            offsets.push(pos);
        }
        text.push(ch);
        pos += consumed;
    }
    offsets.push(raw.len());

    (text, offsets)
}

/// Parse the body of a reference following `&`; returns the character and
/// the number of bytes consumed including the trailing `;`.
fn parse_reference(body: &str) -> Option<(char, usize)> {
    let end = body.find(';')?;
    let name = &body[..end];
    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)?
        }
    };
    Some((ch, end + 1))
}
