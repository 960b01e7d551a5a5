//! Broken-wikilink diagnostics for open documents.

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity};
use tower_lsp::Client;

use crate::config::Settings;
use crate::docs::Document;
use crate::vault::Vault;

/// Stable source identifier attached to every published diagnostic.
pub const DIAGNOSTIC_SOURCE: &str = "vaultmark";

/// One Error diagnostic per wikilink whose target does not resolve.
pub fn broken_links(vault: &Vault, document: &Document, settings: &Settings) -> Vec<Diagnostic> {
    if !settings.broken_link_diagnostics {
        return Vec::new();
    }

    document
        .links
        .iter()
        .filter(|link| vault.resolve(&link.target).is_none())
        .map(|link| Diagnostic {
            range: *link.range,
            severity: Some(DiagnosticSeverity::ERROR),
            source: Some(DIAGNOSTIC_SOURCE.into()),
            message: format!("Broken wikilink: target file '{}' not found", link.target),
            ..Default::default()
        })
        .collect()
}

/// Publish diagnostics for a document, clearing the previous set first so
/// clients never accumulate stale entries.
pub async fn publish(client: &Client, vault: &Vault, document: &Document, settings: &Settings) {
    let diags = broken_links(vault, document, settings);

    client
        .publish_diagnostics(document.uri.clone(), Vec::new(), None)
        .await;
    client
        .publish_diagnostics(document.uri.clone(), diags, Some(document.version))
        .await;
}
