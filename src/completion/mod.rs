use std::path::Path;

use tower_lsp::lsp_types::{
    CompletionItem, CompletionList, CompletionParams, CompletionResponse, Position, Url,
};

use crate::{docs::DocumentStore, vault::Vault};

use self::{link_completer::WikilinkCompleter, tag_completer::TagCompleter};

mod link_completer;
pub mod matcher;
mod tag_completer;

/// Maximum number of items a completer may return.
const COMPLETION_LIMIT: usize = 20;

#[derive(Clone, Copy)]
pub struct Context<'a> {
    vault: &'a Vault,
    docs: &'a DocumentStore,
    uri: &'a Url,
    path: &'a Path,
}

pub trait Completer<'a>: Sized {
    fn construct(context: Context<'a>, position: Position) -> Option<Self>;

    fn completions(&self) -> Vec<CompletionItem>;
}

pub fn get_completions(
    vault: &Vault,
    docs: &DocumentStore,
    params: &CompletionParams,
    path: &Path,
) -> Option<CompletionResponse> {
    let context = Context {
        vault,
        docs,
        uri: &params.text_document_position.text_document.uri,
        path,
    };
    let position = params.text_document_position.position;

    run_completer::<WikilinkCompleter>(context, position)
        .or_else(|| run_completer::<TagCompleter>(context, position))
}

fn run_completer<'a, T: Completer<'a>>(
    context: Context<'a>,
    position: Position,
) -> Option<CompletionResponse> {
    let completer = T::construct(context, position)?;

    let items = completer
        .completions()
        .into_iter()
        .take(COMPLETION_LIMIT)
        .collect::<Vec<CompletionItem>>();

    Some(CompletionResponse::List(CompletionList {
        is_incomplete: false,
        items,
    }))
}
