//! Markup-to-text conversion for message bodies.
//!
//! Bodies in the export are HTML fragments. The classifier only needs
//! readable text with the line structure intact (contact forms put one
//! field per line), so block elements become line breaks and everything
//! else collapses to single spaces.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Node};
use tracing::debug;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

static BLOCK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)</?(p|div|br|li|ul|ol|tr|table|h[1-6]|blockquote|pre|hr|section|article|header|footer)\b[^>]*>",
    )
    .unwrap()
});

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Elements whose text never reaches the reader.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "head", "title"];

/// Convert an HTML body to plain text. Never fails.
///
/// Bodies without any tags keep their own line breaks; entities are decoded
/// either way.
pub fn strip_markup(body: &str) -> String {
    if body.trim().is_empty() {
        return String::new();
    }
    if !TAG_RE.is_match(body) {
        return normalize_whitespace(&visible_text(body));
    }

    let text = markup_text(body);
    if !text.is_empty() {
        return text;
    }

    let fallback = naive_strip(body);
    if !fallback.is_empty() {
        debug!(
            body_len = body.len(),
            "Markup extraction produced no text, falling back to tag stripping"
        );
    }
    fallback
}

/// Mark block elements as line breaks, then collect visible text.
fn markup_text(body: &str) -> String {
    // Source formatting whitespace carries no meaning in HTML; line breaks
    // come only from block elements.
    let flattened = WHITESPACE_RE.replace_all(body, " ");
    let marked = BLOCK_TAG_RE.replace_all(&flattened, "\n$0");
    normalize_whitespace(&visible_text(&marked))
}

/// Text nodes outside hidden elements, entities decoded by the parser.
fn visible_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    for node in fragment.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            out.push_str(text);
        }
    }
    out
}

/// Regex tag stripping with basic entity decoding.
pub fn naive_strip(body: &str) -> String {
    let text = TAG_RE.replace_all(body, " ");
    normalize_whitespace(&decode_entities(&text))
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// First `max_chars` characters of `text` (not bytes).
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Collapse spaces within each line, trim lines, and keep at most one blank
/// line between paragraphs.
pub fn normalize_whitespace(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() && lines.last().is_none_or(|l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
