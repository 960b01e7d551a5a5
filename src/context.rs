//! Cursor-context discriminator.
//!
//! Classifies a (document, cursor) pair into one of three completion and
//! rename contexts: inside an unclosed `[[…` wikilink, inside the
//! frontmatter `tags: [ … ]` array, or neither. Both completers and the
//! rename planner consult this before doing anything else.

use tower_lsp::lsp_types::Position;

use crate::parser;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum CursorContext {
    /// Cursor sits after an unclosed `[[`.
    Wikilink {
        /// Text between `[[` and the cursor, truncated at the first `|`.
        query: String,
        /// Character column of the first `[` of the opening bracket pair.
        open_column: u32,
    },
    /// Cursor sits inside the frontmatter tags array.
    Tag {
        /// Text between the last `,` or `[` and the cursor, trimmed.
        prefix: String,
        /// Character column where the current token begins.
        token_column: u32,
    },
}

/// Classify the cursor position within the document text.
pub fn cursor_context(text: &str, position: Position) -> Option<CursorContext> {
    let line = text.lines().nth(position.line as usize)?;
    let before: String = line.chars().take(position.character as usize).collect();

    if let Some(open) = before.rfind("[[") {
        // An intervening `]]` means the pair closed before the cursor.
        if !before[open..].contains("]]") {
            let interior = &before[open + 2..];
            let query = interior.split('|').next().unwrap_or("").to_string();
            return Some(CursorContext::Wikilink {
                query,
                open_column: before[..open].chars().count() as u32,
            });
        }
    }

    let info = parser::find_tags_line_info(text, position)?;
    let bracket = info.tags_array_start_column as usize;
    let cursor = position.character as usize;
    if cursor < bracket {
        return None;
    }

    let interior: String = info
        .line_content
        .chars()
        .skip(bracket)
        .take(cursor - bracket)
        .collect();
    // A `]` strictly before the cursor closes the array; on the `]` itself
    // the cursor still counts as inside.
    if interior.contains(']') {
        return None;
    }

    let token_start = interior.rfind(',').map(|i| i + 1).unwrap_or(0);
    let token = &interior[token_start..];
    let leading_ws = token.len() - token.trim_start().len();
    let token_column = bracket + interior[..token_start + leading_ws].chars().count();

    Some(CursorContext::Tag {
        prefix: token.trim().to_string(),
        token_column: token_column as u32,
    })
}
