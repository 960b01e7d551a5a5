//! Shared test fixtures.
//!
//! Vault construction filters hidden directories, and temp dirs often live
//! under dot-prefixed paths, so fixtures nest a plain `vault` directory
//! inside the temp dir.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use tower_lsp::lsp_types::{
    CompletionParams, HoverParams, PartialResultParams, Position, RenameParams,
    TextDocumentIdentifier, TextDocumentPositionParams, Url, WorkDoneProgressParams,
};

/// A temp directory with a non-hidden `vault` subdirectory to index. Keep
/// the `TempDir` alive for the duration of the test.
pub fn create_test_vault_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create temp directory");
    let vault_dir = temp_dir.path().join("vault");
    fs::create_dir(&vault_dir).expect("failed to create vault subdirectory");
    (temp_dir, vault_dir)
}

pub fn completion_params(uri: &Url, line: u32, character: u32) -> CompletionParams {
    CompletionParams {
        text_document_position: TextDocumentPositionParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
            position: Position { line, character },
        },
        work_done_progress_params: WorkDoneProgressParams::default(),
        partial_result_params: PartialResultParams::default(),
        context: None,
    }
}

pub fn hover_params(uri: &Url, line: u32, character: u32) -> HoverParams {
    HoverParams {
        text_document_position_params: TextDocumentPositionParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
            position: Position { line, character },
        },
        work_done_progress_params: WorkDoneProgressParams::default(),
    }
}

pub fn rename_params(uri: &Url, line: u32, character: u32, new_name: &str) -> RenameParams {
    RenameParams {
        text_document_position: TextDocumentPositionParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
            position: Position { line, character },
        },
        new_name: new_name.to_string(),
        work_done_progress_params: WorkDoneProgressParams::default(),
    }
}
