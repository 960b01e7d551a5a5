//! The LSP backend: capability advertisement and request dispatch.
//!
//! Handlers are thin: they take the appropriate lock on the shared state
//! and delegate to the feature modules. All index mutation goes through
//! the single writer lock; reads run concurrently.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{info, warn};

use crate::completion;
use crate::config::Settings;
use crate::diagnostics;
use crate::docs::DocumentStore;
use crate::gotodef;
use crate::hover;
use crate::references;
use crate::rename;
use crate::symbol;
use crate::vault::Vault;
use crate::watcher;

pub struct Backend {
    client: Client,
    vault: Arc<RwLock<Option<Vault>>>,
    docs: Arc<RwLock<DocumentStore>>,
    settings: Arc<RwLock<Settings>>,
    root_dir: Arc<RwLock<Option<PathBuf>>>,
}

impl Backend {
    pub fn new(client: Client) -> Backend {
        Backend {
            client,
            vault: Arc::new(RwLock::new(None)),
            docs: Arc::new(RwLock::new(DocumentStore::new())),
            settings: Arc::new(RwLock::new(Settings::default())),
            root_dir: Arc::new(RwLock::new(None)),
        }
    }

    /// `file://` URIs map straight to paths; anything relative resolves
    /// against the workspace root.
    async fn uri_to_path(&self, uri: &Url) -> Option<PathBuf> {
        if let Ok(path) = uri.to_file_path() {
            return Some(path);
        }

        let root = self.root_dir.read().await.clone()?;
        Some(root.join(uri.path().trim_start_matches('/')))
    }

    /// Replace the shadow buffer, then republish diagnostics for it.
    async fn on_change(&self, uri: Url, text: String, version: i32) {
        {
            let mut docs = self.docs.write().await;
            docs.did_change(uri.clone(), text, version);
        }
        self.publish_for(&uri).await;
    }

    async fn publish_for(&self, uri: &Url) {
        let vault = self.vault.read().await;
        let Some(vault) = vault.as_ref() else {
            return;
        };
        let docs = self.docs.read().await;
        let Some(document) = docs.get(uri) else {
            return;
        };
        let settings = self.settings.read().await;

        diagnostics::publish(&self.client, vault, document, &settings).await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        #[allow(deprecated)] // root_uri is what mainstream clients still send
        let root_dir = params
            .root_uri
            .as_ref()
            .and_then(|uri| uri.to_file_path().ok())
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        match Settings::new(&root_dir) {
            Ok(settings) => *self.settings.write().await = settings,
            Err(err) => warn!("settings unreadable, using defaults: {err}"),
        }
        *self.root_dir.write().await = Some(root_dir);

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "vaultmark".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(true),
                        })),
                        ..Default::default()
                    },
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec!["[".to_string(), ",".to_string()]),
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                rename_provider: Some(OneOf::Right(RenameOptions {
                    prepare_provider: Some(true),
                    work_done_progress_options: Default::default(),
                })),
                ..Default::default()
            },
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        let Some(root_dir) = self.root_dir.read().await.clone() else {
            return;
        };

        match Vault::construct_vault(&root_dir) {
            Ok(vault) => {
                let count = vault.note_count();
                *self.vault.write().await = Some(vault);
                info!(count, "workspace indexed");
                self.client
                    .log_message(MessageType::INFO, format!("vaultmark indexed {count} files"))
                    .await;
            }
            Err(err) => {
                warn!("workspace indexing failed: {err}");
                self.client
                    .log_message(MessageType::ERROR, format!("indexing failed: {err}"))
                    .await;
            }
        }

        let settings = self.settings.read().await.clone();
        tokio::spawn(watcher::run(
            self.client.clone(),
            self.vault.clone(),
            self.docs.clone(),
            settings,
            root_dir,
        ));
    }

    async fn shutdown(&self) -> Result<()> {
        info!("shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.on_change(
            params.text_document.uri,
            params.text_document.text,
            params.text_document.version,
        )
        .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full-text sync: the last change carries the whole document.
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        self.on_change(
            params.text_document.uri,
            change.text,
            params.text_document.version,
        )
        .await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        // The file on disk now matches the buffer; refresh the vault's
        // parse artifacts for it.
        if let Some(text) = params.text {
            if let Some(path) = self.uri_to_path(&params.text_document.uri).await {
                let mut vault = self.vault.write().await;
                if let Some(vault) = vault.as_mut() {
                    vault.update_file(&path, &text);
                }
            }
        }
        self.publish_for(&params.text_document.uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        {
            let mut docs = self.docs.write().await;
            docs.did_close(&params.text_document.uri);
        }
        self.client
            .publish_diagnostics(params.text_document.uri, Vec::new(), None)
            .await;
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let vault = self.vault.read().await;
        let Some(vault) = vault.as_ref() else {
            return Ok(None);
        };
        let docs = self.docs.read().await;

        Ok(gotodef::goto_definition(vault, &docs, uri, position)
            .map(GotoDefinitionResponse::Scalar))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let Some(path) = self
            .uri_to_path(&params.text_document_position.text_document.uri)
            .await
        else {
            return Ok(None);
        };

        let vault = self.vault.read().await;
        let Some(vault) = vault.as_ref() else {
            return Ok(None);
        };
        let docs = self.docs.read().await;

        Ok(completion::get_completions(vault, &docs, &params, &path))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let vault = self.vault.read().await;
        let Some(vault) = vault.as_ref() else {
            return Ok(None);
        };
        let docs = self.docs.read().await;
        let settings = self.settings.read().await;

        Ok(hover::hover(vault, &docs, &params, &settings))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        let vault = self.vault.read().await;
        let Some(vault) = vault.as_ref() else {
            return Ok(None);
        };
        let docs = self.docs.read().await;

        Ok(references::references(vault, &docs, uri, position))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let vault = self.vault.read().await;
        let Some(vault) = vault.as_ref() else {
            return Ok(None);
        };
        let docs = self.docs.read().await;

        Ok(symbol::document_symbol(vault, &docs, &params))
    }

    async fn prepare_rename(
        &self,
        params: TextDocumentPositionParams,
    ) -> Result<Option<PrepareRenameResponse>> {
        let docs = self.docs.read().await;
        let Some(document) = docs.get(&params.text_document.uri) else {
            return Ok(None);
        };

        Ok(rename::prepare_rename(document, params.position).map(PrepareRenameResponse::Range))
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let document = {
            let docs = self.docs.read().await;
            docs.get(&params.text_document_position.text_document.uri)
                .cloned()
        };
        let Some(document) = document else {
            return Ok(None);
        };

        let mut vault = self.vault.write().await;
        let Some(vault) = vault.as_mut() else {
            return Ok(None);
        };

        Ok(rename::rename(vault, &document, &params))
    }
}
