//! Shadow store for open editor buffers.
//!
//! The editor's buffer is the source of truth while a file is open; the
//! store keeps the last full text pushed by the client together with its
//! parsed wikilinks. Sync is full-text only, so a change simply replaces
//! the document wholesale.

use std::collections::HashMap;

use tower_lsp::lsp_types::{Position, Url};

use crate::parser::{self, Ranged, Wikilink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub uri: Url,
    pub content: String,
    pub version: i32,
    pub links: Vec<Wikilink>,
}

impl Document {
    fn new(uri: Url, content: String, version: i32) -> Document {
        let links = parser::parse_wikilinks(&content);
        Document {
            uri,
            content,
            version,
            links,
        }
    }

    /// The wikilink whose range contains the position, if any.
    pub fn wikilink_at(&self, position: Position) -> Option<&Wikilink> {
        self.links.iter().find(|link| link.includes_position(position))
    }
}

#[derive(Debug, Default, Clone)]
pub struct DocumentStore {
    docs: HashMap<Url, Document>,
}

impl DocumentStore {
    pub fn new() -> DocumentStore {
        DocumentStore::default()
    }

    pub fn did_open(&mut self, uri: Url, text: String, version: i32) {
        self.docs.insert(uri.clone(), Document::new(uri, text, version));
    }

    /// Full-text replacement only; range-based partial edits are not
    /// accepted by this server.
    pub fn did_change(&mut self, uri: Url, text: String, version: i32) {
        self.docs.insert(uri.clone(), Document::new(uri, text, version));
    }

    pub fn did_close(&mut self, uri: &Url) {
        self.docs.remove(uri);
    }

    pub fn get(&self, uri: &Url) -> Option<&Document> {
        self.docs.get(uri)
    }

    pub fn wikilink_at(&self, uri: &Url, position: Position) -> Option<&Wikilink> {
        self.get(uri)?.wikilink_at(position)
    }

    pub fn open_documents(&self) -> Vec<&Document> {
        let mut docs: Vec<&Document> = self.docs.values().collect();
        docs.sort_by(|a, b| a.uri.as_str().cmp(b.uri.as_str()));
        docs
    }
}
