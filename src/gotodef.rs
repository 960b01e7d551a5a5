use tower_lsp::lsp_types::{Location, Position, Range, Url};

use crate::docs::DocumentStore;
use crate::vault::Vault;

/// Resolve the wikilink under the cursor to its target file.
///
/// The location points at the top of the target file; an unresolved target
/// yields no result rather than an error.
pub fn goto_definition(
    vault: &Vault,
    docs: &DocumentStore,
    uri: &Url,
    cursor_position: Position,
) -> Option<Location> {
    let link = docs.wikilink_at(uri, cursor_position)?;
    let target = vault.resolve(&link.target)?;

    Some(Location {
        uri: Url::from_file_path(target).ok()?,
        range: Range {
            start: Position::new(0, 0),
            end: Position::new(0, 0),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_vault_dir;
    use std::fs;

    #[test]
    fn test_goto_definition_on_aliased_link() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        fs::write(vault_dir.join("alpha.md"), "# Alpha\n").unwrap();

        let vault = Vault::construct_vault(&vault_dir).unwrap();

        let mut docs = DocumentStore::new();
        let uri = Url::from_file_path(vault_dir.join("notes.md")).unwrap();
        docs.did_open(uri.clone(), "intro [[alpha|the start]]".to_string(), 1);

        let location = goto_definition(&vault, &docs, &uri, Position::new(0, 12))
            .expect("cursor inside the target should resolve");

        assert_eq!(
            location.uri,
            Url::from_file_path(vault_dir.join("alpha.md")).unwrap()
        );
        assert_eq!(location.range.start, Position::new(0, 0));
        assert_eq!(location.range.end, Position::new(0, 0));
    }

    #[test]
    fn test_goto_definition_unresolved_is_none() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        let vault = Vault::construct_vault(&vault_dir).unwrap();

        let mut docs = DocumentStore::new();
        let uri = Url::from_file_path(vault_dir.join("notes.md")).unwrap();
        docs.did_open(uri.clone(), "[[ghost]]".to_string(), 1);

        assert!(goto_definition(&vault, &docs, &uri, Position::new(0, 4)).is_none());
    }

    #[test]
    fn test_goto_definition_outside_link_is_none() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        fs::write(vault_dir.join("alpha.md"), "x").unwrap();
        let vault = Vault::construct_vault(&vault_dir).unwrap();

        let mut docs = DocumentStore::new();
        let uri = Url::from_file_path(vault_dir.join("notes.md")).unwrap();
        docs.did_open(uri.clone(), "text [[alpha]]".to_string(), 1);

        assert!(goto_definition(&vault, &docs, &uri, Position::new(0, 2)).is_none());
    }
}
