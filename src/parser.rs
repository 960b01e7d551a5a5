//! Single-pass markdown scanner for the vaultmark dialect.
//!
//! Only three constructs are recognized: wikilinks (`[[target]]`,
//! `[[target|alias]]`), the leading YAML frontmatter block, and the `tags:`
//! array inside it. Everything else in a note is plain text as far as the
//! server is concerned. Every extracted token carries an LSP range so
//! navigation, diagnostics, and rename can edit the exact span.

use std::ops::Deref;

use once_cell::sync::Lazy;
use regex::Regex;
use ropey::Rope;
use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::Position;

/// A wrapper around `tower_lsp::lsp_types::Range` built from byte offsets.
///
/// The regex scanner reports byte ranges; LSP wants line/character pairs.
/// Conversion goes through a rope so multi-byte characters land on the
/// right column.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct TextRange(pub tower_lsp::lsp_types::Range);

impl TextRange {
    pub fn from_byte_range(rope: &Rope, range: std::ops::Range<usize>) -> TextRange {
        let char_start = rope.byte_to_char(range.start);
        let char_end = rope.byte_to_char(range.end);

        let start_line = rope.char_to_line(char_start);
        let start_offset = char_start - rope.line_to_char(start_line);

        let end_line = rope.char_to_line(char_end);
        let end_offset = char_end - rope.line_to_char(end_line);

        tower_lsp::lsp_types::Range {
            start: Position {
                line: start_line as u32,
                character: start_offset as u32,
            },
            end: Position {
                line: end_line as u32,
                character: end_offset as u32,
            },
        }
        .into()
    }

    pub fn on_line(line: u32, start_character: u32, end_character: u32) -> TextRange {
        tower_lsp::lsp_types::Range {
            start: Position {
                line,
                character: start_character,
            },
            end: Position {
                line,
                character: end_character,
            },
        }
        .into()
    }
}

impl std::hash::Hash for TextRange {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.start.line.hash(state);
        self.0.start.character.hash(state);
        self.0.end.line.hash(state);
        self.0.end.character.hash(state);
    }
}

impl Deref for TextRange {
    type Target = tower_lsp::lsp_types::Range;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<tower_lsp::lsp_types::Range> for TextRange {
    fn from(range: tower_lsp::lsp_types::Range) -> Self {
        TextRange(range)
    }
}

/// Trait for parsed tokens that span a region of the document.
pub trait Ranged {
    fn range(&self) -> &TextRange;

    fn includes_position(&self, position: Position) -> bool {
        let range = self.range();
        (range.start.line < position.line
            || (range.start.line == position.line && range.start.character <= position.character))
            && (range.end.line > position.line
                || (range.end.line == position.line && range.end.character >= position.character))
    }
}

/// A `[[target]]` or `[[target|alias]]` reference.
///
/// `range` covers the whole link including both bracket pairs;
/// `target_range` covers only the raw target span, i.e. the text between
/// `[[` and the `|` (when present) or the closing `]]`. Rename edits are
/// emitted over `target_range`.
#[derive(Debug, Default, PartialEq, Eq, Clone, Hash)]
pub struct Wikilink {
    pub target: String,
    pub alias: Option<String>,
    pub range: TextRange,
    pub target_range: TextRange,
}

impl Ranged for Wikilink {
    fn range(&self) -> &TextRange {
        &self.range
    }
}

/// One entry of the frontmatter `tags` array. `range` covers only the tag
/// token, not the surrounding punctuation.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct Tag {
    pub name: String,
    pub range: TextRange,
}

impl Ranged for Tag {
    fn range(&self) -> &TextRange {
        &self.range
    }
}

/// The leading YAML block delimited by `---` lines.
///
/// Contents are treated line-oriented: `key: value` pairs, anything else is
/// skipped. Only the `tags` array is extracted with ranges; other fields are
/// kept as raw strings.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Frontmatter {
    /// Zero-based line index of the closing `---` delimiter.
    pub end_line: u32,
    pub fields: Vec<(String, String)>,
}

impl Frontmatter {
    /// True when the given line lies within the delimiters (inclusive).
    pub fn contains_line(&self, line: u32) -> bool {
        line <= self.end_line
    }
}

/// Line info for the cursor sitting on a `tags: [ … ]` line.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TagsLineInfo {
    pub line_content: String,
    /// Character column just past the opening `[`.
    pub tags_array_start_column: u32,
}

static WIKILINK_RE: Lazy<Regex> = Lazy::new(|| {
    // No brackets or pipes in the target, no newline anywhere inside: an
    // unmatched or line-spanning `[[` never produces a link.
    Regex::new(r"\[\[(?<target>[^\[\]\|\r\n]+)(\|(?<alias>[^\[\]\r\n]*))?\]\]").unwrap()
});

static TAGS_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*tags\s*:\s*\[").unwrap());

static TAGS_ARRAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*tags\s*:\s*\[(?<list>[^\]\r\n]*)\]").unwrap());

/// Scan a document for wikilinks, in document order.
///
/// Links inside the frontmatter block are not reported.
pub fn parse_wikilinks(text: &str) -> Vec<Wikilink> {
    let rope = Rope::from_str(text);
    let frontmatter = parse_frontmatter(text);

    WIKILINK_RE
        .captures_iter(text)
        .filter_map(|captures| {
            let full = captures.get(0)?;
            let raw_target = captures.name("target")?;

            let target = raw_target.as_str().trim();
            if target.is_empty() {
                return None;
            }

            let alias = captures
                .name("alias")
                .map(|alias| alias.as_str().trim())
                .filter(|alias| !alias.is_empty())
                .map(String::from);

            // The capture is greedy, so it always ends right before the
            // `|` or the closing `]]`.
            Some(Wikilink {
                target: target.to_string(),
                alias,
                range: TextRange::from_byte_range(&rope, full.range()),
                target_range: TextRange::from_byte_range(&rope, raw_target.range()),
            })
        })
        .filter(|link| {
            frontmatter
                .as_ref()
                .map(|fm| !fm.contains_line(link.range.start.line))
                .unwrap_or(true)
        })
        .collect()
}

/// Parse the leading frontmatter block, if any.
///
/// Present iff the file begins with a `---` line and a later `---` line.
/// Malformed lines inside the block are skipped, never an error.
pub fn parse_frontmatter(text: &str) -> Option<Frontmatter> {
    let mut lines = text.lines().enumerate();

    let (_, first) = lines.next()?;
    if first.trim_end() != "---" {
        return None;
    }

    let mut fields = Vec::new();
    for (index, line) in lines {
        if line.trim_end() == "---" {
            return Some(Frontmatter {
                end_line: index as u32,
                fields,
            });
        }
        if let Some((key, value)) = line.split_once(':') {
            fields.push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    None
}

/// Extract the frontmatter `tags` array with per-token ranges.
///
/// Returns an empty vec when there is no frontmatter or no `tags:` key.
/// When the key appears more than once, the first occurrence wins.
pub fn parse_tags(text: &str) -> Vec<Tag> {
    let Some(frontmatter) = parse_frontmatter(text) else {
        return Vec::new();
    };

    for (index, line) in text.lines().enumerate().skip(1) {
        let line_nr = index as u32;
        if line_nr >= frontmatter.end_line {
            break;
        }

        let Some(captures) = TAGS_ARRAY_RE.captures(line) else {
            continue;
        };
        let Some(list) = captures.name("list") else {
            continue;
        };

        return split_tag_list(line, line_nr, list.start(), list.as_str());
    }

    Vec::new()
}

/// Split the bracket interior on commas, producing trimmed tokens with
/// precise column ranges. Empty tokens are skipped.
fn split_tag_list(line: &str, line_nr: u32, list_start: usize, list: &str) -> Vec<Tag> {
    let mut tags = Vec::new();
    let mut offset = 0usize;

    for piece in list.split(',') {
        let leading = piece.len() - piece.trim_start().len();
        let token = piece.trim();

        if !token.is_empty() {
            let start_byte = list_start + offset + leading;
            let end_byte = start_byte + token.len();
            tags.push(Tag {
                name: token.to_string(),
                range: TextRange::on_line(
                    line_nr,
                    byte_to_column(line, start_byte),
                    byte_to_column(line, end_byte),
                ),
            });
        }

        offset += piece.len() + 1; // account for the comma
    }

    tags
}

fn byte_to_column(line: &str, byte: usize) -> u32 {
    line[..byte].chars().count() as u32
}

/// Locate the `tags: [ … ]` line under the cursor, for completion.
///
/// Unlike [`parse_tags`] this is deliberately lenient: while the user is
/// typing, the closing `]` and even the frontmatter delimiters may not
/// exist yet, so only the cursor line itself is inspected.
pub fn find_tags_line_info(text: &str, position: Position) -> Option<TagsLineInfo> {
    let line = text.lines().nth(position.line as usize)?;
    let open = TAGS_LINE_RE.find(line)?;

    Some(TagsLineInfo {
        line_content: line.to_string(),
        tags_array_start_column: byte_to_column(line, open.end()),
    })
}
