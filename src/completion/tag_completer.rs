//! Tag completion inside the frontmatter `tags: [ … ]` array.

use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, Position};

use crate::context::{self, CursorContext};
use crate::vault::Vault;

use super::{
    matcher::{fuzzy_match, Matchable},
    Completer, Context,
};

pub struct TagCompleter<'a> {
    /// Text between the last `,` or `[` and the cursor, trimmed.
    prefix: String,
    vault: &'a Vault,
}

struct TagCandidate {
    name: String,
    file_count: usize,
}

impl Matchable for TagCandidate {
    fn match_string(&self) -> &str {
        &self.name
    }
}

impl<'a> Completer<'a> for TagCompleter<'a> {
    fn construct(context: Context<'a>, position: Position) -> Option<Self> {
        let document = context.docs.get(context.uri)?;

        match context::cursor_context(&document.content, position)? {
            CursorContext::Tag { prefix, .. } => Some(TagCompleter {
                prefix,
                vault: context.vault,
            }),
            CursorContext::Wikilink { .. } => None,
        }
    }

    fn completions(&self) -> Vec<CompletionItem> {
        let candidates: Vec<TagCandidate> = self
            .vault
            .tag_index
            .all_tags()
            .into_iter()
            .map(|name| TagCandidate {
                file_count: self.vault.tag_index.tag_count(&name),
                name,
            })
            .collect();

        fuzzy_match(&self.prefix, candidates)
            .into_iter()
            .map(|(candidate, _score)| CompletionItem {
                label: candidate.name.clone(),
                kind: Some(CompletionItemKind::KEYWORD),
                detail: Some(format!("Used in {} files", candidate.file_count)),
                insert_text: Some(candidate.name),
                ..Default::default()
            })
            .collect()
    }
}
