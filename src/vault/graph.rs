//! Directed reference graph over the vault.
//!
//! Nodes are canonical file paths; an edge A → B exists iff A contains a
//! wikilink whose target resolved to B through the file index at parse
//! time. Tag membership rides alongside as a plain map since tags are not
//! files. The graph is cheap to rebuild and is recomputed from scratch
//! whenever parse artifacts change.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use petgraph::prelude::*;

#[derive(Debug, Default, Clone)]
pub struct LinkGraph {
    graph: DiGraph<PathBuf, ()>,
    nodes: HashMap<PathBuf, NodeIndex>,
    tag_files: HashMap<String, BTreeSet<PathBuf>>,
}

impl LinkGraph {
    pub fn new() -> LinkGraph {
        LinkGraph::default()
    }

    pub fn clear(&mut self) {
        self.graph.clear();
        self.nodes.clear();
        self.tag_files.clear();
    }

    fn node(&mut self, path: &Path) -> NodeIndex {
        if let Some(index) = self.nodes.get(path) {
            return *index;
        }
        let index = self.graph.add_node(path.to_path_buf());
        self.nodes.insert(path.to_path_buf(), index);
        index
    }

    pub fn add_link(&mut self, from: &Path, to: &Path) {
        let from = self.node(from);
        let to = self.node(to);
        self.graph.update_edge(from, to, ());
    }

    pub fn add_tag_usage(&mut self, file: &Path, tag: &str) {
        self.tag_files
            .entry(tag.to_string())
            .or_default()
            .insert(file.to_path_buf());
    }

    /// Files with an outgoing edge to `path`, sorted.
    pub fn files_referencing_file(&self, path: &Path) -> Vec<PathBuf> {
        let Some(index) = self.nodes.get(path) else {
            return Vec::new();
        };

        let mut files: Vec<PathBuf> = self
            .graph
            .neighbors_directed(*index, Direction::Incoming)
            .map(|n| self.graph[n].clone())
            .collect();
        files.sort();
        files.dedup();
        files
    }

    /// Files `path` links out to, sorted.
    pub fn files_referenced_by(&self, path: &Path) -> Vec<PathBuf> {
        let Some(index) = self.nodes.get(path) else {
            return Vec::new();
        };

        let mut files: Vec<PathBuf> = self
            .graph
            .neighbors_directed(*index, Direction::Outgoing)
            .map(|n| self.graph[n].clone())
            .collect();
        files.sort();
        files.dedup();
        files
    }

    pub fn files_referencing_tag(&self, tag: &str) -> Vec<PathBuf> {
        self.tag_files
            .get(tag)
            .map(|files| files.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(name: &str) -> PathBuf {
        PathBuf::from(format!("/vault/{name}"))
    }

    #[test]
    fn test_incoming_edges() {
        let mut graph = LinkGraph::new();
        graph.add_link(&path("a.md"), &path("target.md"));
        graph.add_link(&path("b.md"), &path("target.md"));
        graph.add_link(&path("a.md"), &path("other.md"));

        assert_eq!(
            graph.files_referencing_file(&path("target.md")),
            vec![path("a.md"), path("b.md")]
        );
        assert_eq!(
            graph.files_referenced_by(&path("a.md")),
            vec![path("other.md"), path("target.md")]
        );
        assert!(graph.files_referencing_file(&path("a.md")).is_empty());
    }

    #[test]
    fn test_duplicate_links_collapse() {
        let mut graph = LinkGraph::new();
        graph.add_link(&path("a.md"), &path("b.md"));
        graph.add_link(&path("a.md"), &path("b.md"));

        assert_eq!(graph.files_referencing_file(&path("b.md")), vec![path("a.md")]);
    }

    #[test]
    fn test_tag_usage() {
        let mut graph = LinkGraph::new();
        graph.add_tag_usage(&path("a.md"), "project");
        graph.add_tag_usage(&path("b.md"), "project");

        assert_eq!(
            graph.files_referencing_tag("project"),
            vec![path("a.md"), path("b.md")]
        );
        assert!(graph.files_referencing_tag("ghost").is_empty());
    }

    #[test]
    fn test_clear() {
        let mut graph = LinkGraph::new();
        graph.add_link(&path("a.md"), &path("b.md"));
        graph.add_tag_usage(&path("a.md"), "t");
        graph.clear();

        assert!(graph.files_referencing_file(&path("b.md")).is_empty());
        assert!(graph.files_referencing_tag("t").is_empty());
    }
}
