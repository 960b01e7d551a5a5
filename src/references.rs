use itertools::Itertools;
use tower_lsp::lsp_types::{Location, Position, Url};

use crate::docs::DocumentStore;
use crate::parser::{self, Ranged};
use crate::vault::Vault;

/// Cross-workspace reference search.
///
/// With the cursor on a wikilink, returns every wikilink in the vault that
/// resolves to the same file; with the cursor on a frontmatter tag token,
/// returns every occurrence of that tag.
pub fn references(
    vault: &Vault,
    docs: &DocumentStore,
    uri: &Url,
    cursor_position: Position,
) -> Option<Vec<Location>> {
    let document = docs.get(uri)?;

    if let Some(link) = document.wikilink_at(cursor_position) {
        let target = vault.resolve(&link.target);
        let folded = link.target.to_lowercase();

        return Some(
            vault
                .select_links(None)
                .into_iter()
                .filter(|(_, other)| match &target {
                    Some(path) => vault.resolve(&other.target).as_deref() == Some(path.as_path()),
                    None => other.target.to_lowercase() == folded,
                })
                .filter_map(|(path, other)| {
                    Some(Location {
                        uri: Url::from_file_path(path).ok()?,
                        range: *other.range,
                    })
                })
                .collect_vec(),
        );
    }

    let tags = parser::parse_tags(&document.content);
    let tag = tags.iter().find(|tag| tag.includes_position(cursor_position))?;

    Some(
        vault
            .select_tags(None)
            .into_iter()
            .filter(|(_, other)| other.name == tag.name)
            .filter_map(|(path, other)| {
                Some(Location {
                    uri: Url::from_file_path(path).ok()?,
                    range: *other.range,
                })
            })
            .collect_vec(),
    )
}
