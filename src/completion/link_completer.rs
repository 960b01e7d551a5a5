//! Filename completion inside an unclosed `[[…` wikilink.

use std::collections::HashSet;
use std::path::Path;

use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionTextEdit, Position, Range, TextEdit,
};

use crate::context::{self, CursorContext};
use crate::vault::Vault;

use super::{
    matcher::{fuzzy_match, Matchable},
    Completer, Context,
};

pub struct WikilinkCompleter<'a> {
    /// Text between `[[` and the cursor, truncated at the first `|`.
    query: String,
    /// Character column of the opening `[`.
    open_column: u32,
    position: Position,
    vault: &'a Vault,
    path: &'a Path,
}

struct FileCandidate {
    /// Basename with extension, e.g. `alpha.md`.
    basename: String,
}

impl Matchable for FileCandidate {
    fn match_string(&self) -> &str {
        &self.basename
    }
}

impl<'a> Completer<'a> for WikilinkCompleter<'a> {
    fn construct(context: Context<'a>, position: Position) -> Option<Self> {
        let document = context.docs.get(context.uri)?;

        match context::cursor_context(&document.content, position)? {
            CursorContext::Wikilink { query, open_column } => Some(WikilinkCompleter {
                query,
                open_column,
                position,
                vault: context.vault,
                path: context.path,
            }),
            CursorContext::Tag { .. } => None,
        }
    }

    fn completions(&self) -> Vec<CompletionItem> {
        // Every indexed file except the current document, deduplicated by
        // basename (first occurrence wins).
        let mut seen: HashSet<String> = HashSet::new();
        let candidates: Vec<FileCandidate> = self
            .vault
            .file_index
            .records()
            .into_iter()
            .filter(|record| record.path != self.path)
            .filter_map(|record| {
                let basename = record.path.file_name()?.to_str()?.to_string();
                seen.insert(basename.clone()).then_some(FileCandidate { basename })
            })
            .collect();

        // The edit replaces everything from the opening bracket through the
        // cursor and always appends the closing `]]`.
        let edit_range = Range {
            start: Position {
                line: self.position.line,
                character: self.open_column,
            },
            end: self.position,
        };

        fuzzy_match(&self.query, candidates)
            .into_iter()
            .map(|(candidate, _score)| CompletionItem {
                label: candidate.basename.clone(),
                kind: Some(CompletionItemKind::FILE),
                filter_text: Some(candidate.basename.clone()),
                text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                    range: edit_range,
                    new_text: format!("{}]]", candidate.basename),
                })),
                ..Default::default()
            })
            .collect()
    }
}
