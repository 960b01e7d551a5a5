use pathdiff::diff_paths;
use tower_lsp::lsp_types::{
    DocumentSymbol, DocumentSymbolParams, DocumentSymbolResponse, SymbolKind,
};

use crate::docs::DocumentStore;
use crate::parser;
use crate::vault::Vault;

/// Flat, line-ordered outline of a document: its wikilinks and its
/// frontmatter tags. Links that resolve carry the workspace-relative
/// target path as detail.
pub fn document_symbol(
    vault: &Vault,
    docs: &DocumentStore,
    params: &DocumentSymbolParams,
) -> Option<DocumentSymbolResponse> {
    let document = docs.get(&params.text_document.uri)?;

    let mut symbols: Vec<DocumentSymbol> = Vec::new();

    for link in &document.links {
        let detail = vault
            .resolve(&link.target)
            .and_then(|path| diff_paths(path, vault.root_dir()))
            .and_then(|rel| rel.to_str().map(String::from));

        #[allow(deprecated)] // `deprecated` field kept for client compat
        symbols.push(DocumentSymbol {
            name: link.target.clone(),
            detail,
            kind: SymbolKind::FILE,
            tags: None,
            deprecated: None,
            range: *link.range,
            selection_range: *link.target_range,
            children: None,
        });
    }

    for tag in parser::parse_tags(&document.content) {
        #[allow(deprecated)]
        symbols.push(DocumentSymbol {
            name: tag.name.clone(),
            detail: Some("tag".to_string()),
            kind: SymbolKind::KEY,
            tags: None,
            deprecated: None,
            range: *tag.range,
            selection_range: *tag.range,
            children: None,
        });
    }

    symbols.sort_by_key(|s| (s.range.start.line, s.range.start.character));

    Some(DocumentSymbolResponse::Nested(symbols))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_vault_dir;
    use std::fs;
    use tower_lsp::lsp_types::{
        PartialResultParams, TextDocumentIdentifier, Url, WorkDoneProgressParams,
    };

    #[test]
    fn test_document_symbols_flat_and_ordered() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        fs::write(vault_dir.join("alpha.md"), "target").unwrap();
        let vault = Vault::construct_vault(&vault_dir).unwrap();

        let text = "---\ntags: [project]\n---\nsee [[alpha]] and [[ghost]]\n";
        let mut docs = DocumentStore::new();
        let uri = Url::from_file_path(vault_dir.join("note.md")).unwrap();
        docs.did_open(uri.clone(), text.to_string(), 1);

        let params = DocumentSymbolParams {
            text_document: TextDocumentIdentifier { uri },
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        };

        let Some(DocumentSymbolResponse::Nested(symbols)) =
            document_symbol(&vault, &docs, &params)
        else {
            panic!("expected nested symbols");
        };

        assert_eq!(symbols.len(), 3);
        assert_eq!(symbols[0].name, "project");
        assert_eq!(symbols[0].kind, SymbolKind::KEY);
        assert_eq!(symbols[1].name, "alpha");
        assert_eq!(symbols[1].kind, SymbolKind::FILE);
        assert_eq!(symbols[1].detail.as_deref(), Some("alpha.md"));
        assert_eq!(symbols[2].name, "ghost");
        assert_eq!(symbols[2].detail, None);
    }
}
