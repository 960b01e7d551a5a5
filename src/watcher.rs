//! Poll-based file-system change detection.
//!
//! Every poll period the workspace is rediscovered; a changed markdown
//! file count triggers a full vault rebuild, after which every open
//! document is revalidated and its diagnostics republished. Same-count
//! churn is healed by the next didOpen/didChange/didSave reparse.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tower_lsp::Client;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::diagnostics;
use crate::docs::DocumentStore;
use crate::vault::{self, Vault};

/// Watch loop; runs as a spawned task for the lifetime of the server.
pub async fn run(
    client: Client,
    vault: Arc<RwLock<Option<Vault>>>,
    docs: Arc<RwLock<DocumentStore>>,
    settings: Settings,
    root_dir: PathBuf,
) {
    let period = Duration::from_secs(settings.poll_interval_seconds.max(2));

    loop {
        tokio::time::sleep(period).await;

        let discovered = vault::discover_note_files(&root_dir).len();
        let indexed = match vault.read().await.as_ref() {
            Some(vault) => vault.note_count(),
            None => continue,
        };

        if discovered == indexed {
            continue;
        }

        debug!(discovered, indexed, "file count changed, rebuilding index");
        let rebuilt = match Vault::construct_vault(&root_dir) {
            Ok(rebuilt) => rebuilt,
            Err(err) => {
                warn!("workspace rescan failed: {err}");
                continue;
            }
        };

        {
            let mut guard = vault.write().await;
            *guard = Some(rebuilt);
        }
        info!(count = discovered, "index rebuilt");

        let vault_guard = vault.read().await;
        let Some(vault_ref) = vault_guard.as_ref() else {
            continue;
        };
        let docs_guard = docs.read().await;
        for document in docs_guard.open_documents() {
            diagnostics::publish(&client, vault_ref, document, &settings).await;
        }
    }
}
