//! Hover previews for wikilinks.
//!
//! Hovering a link shows the target note: a bold title header, a
//! truncation hint when the file is longer than the excerpt, a rule, then
//! the first kilobyte of raw content.

use tower_lsp::lsp_types::{Hover, HoverContents, HoverParams, MarkupContent, MarkupKind};

use crate::config::Settings;
use crate::docs::DocumentStore;
use crate::vault::Vault;

/// Maximum number of raw bytes shown in the preview body.
const PREVIEW_BYTES: usize = 1024;

pub fn hover(
    vault: &Vault,
    docs: &DocumentStore,
    params: &HoverParams,
    settings: &Settings,
) -> Option<Hover> {
    if !settings.hover {
        return None;
    }

    let uri = &params.text_document_position_params.text_document.uri;
    let cursor_position = params.text_document_position_params.position;

    let link = docs.wikilink_at(uri, cursor_position)?;
    let target = vault.resolve(&link.target)?;
    let content = std::fs::read_to_string(&target).ok()?;

    let title = target.file_stem()?.to_str()?;

    let mut value = format!("**{}**\n", title);
    if content.len() > PREVIEW_BYTES {
        value.push_str(&format!(
            "*showing first {} of {} bytes*\n",
            PREVIEW_BYTES,
            content.len()
        ));
    }
    value.push_str("\n---\n\n");
    value.push_str(excerpt(&content));

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }),
        range: Some(*link.range),
    })
}

/// First `PREVIEW_BYTES` bytes, backed off to a char boundary.
fn excerpt(content: &str) -> &str {
    if content.len() <= PREVIEW_BYTES {
        return content;
    }

    let mut end = PREVIEW_BYTES;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_vault_dir, hover_params};
    use std::fs;
    use tower_lsp::lsp_types::Url;

    #[test]
    fn test_hover_short_file() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        fs::write(vault_dir.join("alpha.md"), "# Alpha\n\nSome text.\n").unwrap();

        let vault = Vault::construct_vault(&vault_dir).unwrap();

        let mut docs = DocumentStore::new();
        let uri = Url::from_file_path(vault_dir.join("notes.md")).unwrap();
        docs.did_open(uri.clone(), "see [[alpha]]".to_string(), 1);

        let hover = hover(
            &vault,
            &docs,
            &hover_params(&uri, 0, 7),
            &Settings::default(),
        )
        .expect("hover on a resolved link");

        let HoverContents::Markup(markup) = hover.contents else {
            panic!("expected markup contents");
        };
        assert_eq!(markup.kind, MarkupKind::Markdown);
        assert!(markup.value.starts_with("**alpha**\n"));
        assert!(markup.value.contains("\n---\n"));
        assert!(markup.value.ends_with("# Alpha\n\nSome text.\n"));
        assert!(!markup.value.contains("showing first"));
    }

    #[test]
    fn test_hover_long_file_truncated_with_hint() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        let body = "x".repeat(5000);
        fs::write(vault_dir.join("big.md"), &body).unwrap();

        let vault = Vault::construct_vault(&vault_dir).unwrap();

        let mut docs = DocumentStore::new();
        let uri = Url::from_file_path(vault_dir.join("notes.md")).unwrap();
        docs.did_open(uri.clone(), "[[big]]".to_string(), 1);

        let hover = hover(
            &vault,
            &docs,
            &hover_params(&uri, 0, 3),
            &Settings::default(),
        )
        .unwrap();

        let HoverContents::Markup(markup) = hover.contents else {
            panic!("expected markup contents");
        };
        assert!(markup.value.contains("showing first 1024 of 5000 bytes"));
        let shown = markup.value.split("---\n\n").nth(1).unwrap();
        assert_eq!(shown.len(), 1024);
    }

    #[test]
    fn test_hover_disabled_by_setting() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        fs::write(vault_dir.join("alpha.md"), "x").unwrap();
        let vault = Vault::construct_vault(&vault_dir).unwrap();

        let mut docs = DocumentStore::new();
        let uri = Url::from_file_path(vault_dir.join("notes.md")).unwrap();
        docs.did_open(uri.clone(), "[[alpha]]".to_string(), 1);

        let settings = Settings {
            hover: false,
            ..Settings::default()
        };
        assert!(hover(&vault, &docs, &hover_params(&uri, 0, 3), &settings).is_none());
    }

    #[test]
    fn test_hover_unresolved_is_none() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        let vault = Vault::construct_vault(&vault_dir).unwrap();

        let mut docs = DocumentStore::new();
        let uri = Url::from_file_path(vault_dir.join("notes.md")).unwrap();
        docs.did_open(uri.clone(), "[[ghost]]".to_string(), 1);

        assert!(hover(
            &vault,
            &docs,
            &hover_params(&uri, 0, 3),
            &Settings::default()
        )
        .is_none());
    }
}
