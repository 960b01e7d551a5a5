//! Workspace-wide rename planner.
//!
//! Two modes, chosen by what sits under the cursor: renaming a frontmatter
//! tag rewrites every occurrence of the tag across the vault; renaming a
//! wikilink target rewrites every link to the file *and* moves the file
//! itself through a rename resource operation. Either way the result is a
//! single `WorkspaceEdit` the editor applies as one undo unit; the server
//! never touches user files directly.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tower_lsp::lsp_types::{
    DocumentChangeOperation, DocumentChanges, OneOf, OptionalVersionedTextDocumentIdentifier,
    Position, Range, RenameFile, RenameParams, ResourceOp, TextDocumentEdit, TextEdit, Url,
    WorkspaceEdit,
};
use tracing::warn;

use crate::docs::Document;
use crate::parser::{self, Ranged, Tag, Wikilink};
use crate::vault::Vault;

enum RenameTarget {
    Wikilink(Wikilink),
    Tag(Tag),
}

fn target_at(document: &Document, position: Position) -> Option<RenameTarget> {
    if let Some(link) = document.wikilink_at(position) {
        return Some(RenameTarget::Wikilink(link.clone()));
    }

    parser::parse_tags(&document.content)
        .into_iter()
        .find(|tag| tag.includes_position(position))
        .map(RenameTarget::Tag)
}

/// The span the editor should select when the user triggers a rename:
/// the wikilink's target text or the tag token.
pub fn prepare_rename(document: &Document, position: Position) -> Option<Range> {
    match target_at(document, position)? {
        RenameTarget::Wikilink(link) => Some(*link.target_range),
        RenameTarget::Tag(tag) => Some(*tag.range),
    }
}

/// Build the workspace edit for a rename request and update the indices so
/// subsequent requests see the new world.
pub fn rename(
    vault: &mut Vault,
    document: &Document,
    params: &RenameParams,
) -> Option<WorkspaceEdit> {
    let new_name = params.new_name.trim();
    if new_name.is_empty() {
        return None;
    }

    let position = params.text_document_position.position;

    match target_at(document, position)? {
        RenameTarget::Tag(tag) => rename_tag(vault, &tag.name, new_name),
        RenameTarget::Wikilink(link) => rename_wikilink(vault, &link.target, new_name),
    }
}

/// Rewrite every occurrence of `old` in a `tags:` array across the vault.
/// Edits are grouped per file URI.
fn rename_tag(vault: &mut Vault, old: &str, new: &str) -> Option<WorkspaceEdit> {
    let mut changes: HashMap<Url, Vec<TextEdit>> = HashMap::new();

    for path in vault.graph.files_referencing_tag(old) {
        // an unreadable file is omitted from the descriptor, with a trace
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                warn!("failed to read {path:?}: {err}");
                continue;
            }
        };
        let edits: Vec<TextEdit> = parser::parse_tags(&text)
            .into_iter()
            .filter(|tag| tag.name == old)
            .map(|tag| TextEdit {
                range: *tag.range,
                new_text: new.to_string(),
            })
            .collect();

        if edits.is_empty() {
            continue;
        }
        let uri = Url::from_file_path(&path).ok()?;
        changes.insert(uri, edits);
    }

    vault.rename_tag(old, new);

    Some(WorkspaceEdit {
        changes: Some(changes),
        ..Default::default()
    })
}

/// Rename a wikilink target: one file-rename resource operation plus a
/// text edit over the target span of every link to the file. When the old
/// target resolves to nothing, only text references are rewritten.
fn rename_wikilink(vault: &mut Vault, old_target: &str, new_target: &str) -> Option<WorkspaceEdit> {
    let old_path = vault.resolve(old_target);
    let new_path = old_path
        .as_ref()
        .map(|old| new_file_path(old, new_target));

    let folded_old = old_target.to_lowercase();
    let matches_old = |target: &str| match &old_path {
        Some(path) => vault.resolve(target).as_deref() == Some(path.as_path()),
        None => target.to_lowercase() == folded_old,
    };

    let mut operations: Vec<DocumentChangeOperation> = Vec::new();

    // The file move leads the descriptor; the text edits follow it.
    if let (Some(old), Some(new)) = (&old_path, &new_path) {
        operations.push(DocumentChangeOperation::Op(ResourceOp::Rename(RenameFile {
            old_uri: Url::from_file_path(old).ok()?,
            new_uri: Url::from_file_path(new).ok()?,
            options: None,
            annotation_id: None,
        })));
    }

    for path in vault.note_paths() {
        // an unreadable file is omitted from the descriptor, with a trace
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                warn!("failed to read {path:?}: {err}");
                continue;
            }
        };
        let edits: Vec<OneOf<TextEdit, tower_lsp::lsp_types::AnnotatedTextEdit>> =
            parser::parse_wikilinks(&text)
                .into_iter()
                .filter(|link| matches_old(&link.target))
                .map(|link| {
                    OneOf::Left(TextEdit {
                        range: *link.target_range,
                        new_text: replacement_target(&link.target, new_target),
                    })
                })
                .collect();

        if edits.is_empty() {
            continue;
        }
        operations.push(DocumentChangeOperation::Edit(TextDocumentEdit {
            text_document: OptionalVersionedTextDocumentIdentifier {
                uri: Url::from_file_path(&path).ok()?,
                version: None,
            },
            edits,
        }));
    }

    if let (Some(old), Some(new)) = (old_path, new_path) {
        vault.rename_note(&old, &new);
    }

    Some(WorkspaceEdit {
        document_changes: Some(DocumentChanges::Operations(operations)),
        ..Default::default()
    })
}

/// New on-disk path: keep the old directory; use `new_target` verbatim when
/// it carries an extension, else inherit the old file's.
fn new_file_path(old_path: &Path, new_target: &str) -> PathBuf {
    let file_name = if Path::new(new_target).extension().is_some() {
        new_target.to_string()
    } else {
        match old_path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => format!("{}.{}", new_target, ext),
            None => new_target.to_string(),
        }
    };

    old_path.with_file_name(file_name)
}

/// Target string written into an edited link, preserving that link's own
/// has-extension form.
fn replacement_target(old_link_target: &str, new_target: &str) -> String {
    let old_has_ext = old_link_target.contains('.');
    let new_has_ext = new_target.contains('.');

    match (old_has_ext, new_has_ext) {
        (true, true) | (false, false) => new_target.to_string(),
        (true, false) => match old_link_target.rfind('.') {
            Some(dot) => format!("{}{}", new_target, &old_link_target[dot..]),
            None => new_target.to_string(),
        },
        (false, true) => Path::new(new_target)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(new_target)
            .to_string(),
    }
}
