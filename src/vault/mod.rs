mod file_index;
mod graph;
mod tag_index;

pub use file_index::{FileIndex, FileRecord};
pub use graph::LinkGraph;
pub use tag_index::TagIndex;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use rayon::prelude::*;
use tracing::warn;
use walkdir::WalkDir;

use crate::parser::{self, Tag, Wikilink};

/// Parse artifacts for one markdown file on disk.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct NoteFile {
    pub path: PathBuf,
    pub links: Vec<Wikilink>,
    pub tags: Vec<Tag>,
}

impl NoteFile {
    fn new(text: &str, path: PathBuf) -> NoteFile {
        NoteFile {
            links: parser::parse_wikilinks(text),
            tags: parser::parse_tags(text),
            path,
        }
    }

    pub fn stem(&self) -> Option<&str> {
        self.path.file_stem()?.to_str()
    }
}

/// The in-memory model of the workspace.
///
/// Owns the parse artifacts of every markdown file plus the three indices
/// derived from them. Methods only select data; interpretation is up to the
/// feature modules. All keys are owned paths, so the cyclic file ↔ tag ↔
/// file relationships never need shared references.
#[derive(Debug, Default, Clone)]
pub struct Vault {
    notes: HashMap<PathBuf, NoteFile>,
    pub file_index: FileIndex,
    pub tag_index: TagIndex,
    pub graph: LinkGraph,
    root_dir: PathBuf,
}

/// Walk the workspace for markdown files, skipping hidden entries.
pub fn discover_note_files(root_dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(root_dir)
        .into_iter()
        .filter_entry(|e| {
            !e.file_name()
                .to_str()
                .map(|s| s.starts_with('.'))
                .unwrap_or(false)
        })
        .flatten()
        .filter(|e| e.path().extension().and_then(|ext| ext.to_str()) == Some("md"))
        .map(|e| e.path().to_path_buf())
        .collect_vec()
}

impl Vault {
    /// Walk the workspace, parse every file once, and populate all indices.
    pub fn construct_vault(root_dir: &Path) -> Result<Vault, std::io::Error> {
        let note_paths = discover_note_files(root_dir);

        let notes: HashMap<PathBuf, NoteFile> = note_paths
            .par_iter()
            .flat_map(|path| {
                // unreadable files are omitted from the index, with a trace
                let text = std::fs::read_to_string(path).map_err(|err| {
                    warn!("failed to read {path:?}: {err}");
                    err
                })?;
                let note = NoteFile::new(&text, path.clone());

                Ok::<(PathBuf, NoteFile), std::io::Error>((path.clone(), note))
            })
            .collect();

        let mut vault = Vault {
            notes,
            file_index: FileIndex::new(),
            tag_index: TagIndex::new(),
            graph: LinkGraph::new(),
            root_dir: root_dir.to_path_buf(),
        };

        for path in vault.notes.keys().cloned().collect_vec() {
            vault.file_index.add(&path);
        }
        for (path, tags) in vault
            .notes
            .values()
            .map(|note| (note.path.clone(), note.tag_names()))
            .collect_vec()
        {
            vault.tag_index.upsert_tags_for(&path, tags);
        }
        vault.rebuild_graph();

        Ok(vault)
    }

    /// Reparse one file from new text and refresh every index.
    pub fn update_file(&mut self, path: &Path, text: &str) {
        let note = NoteFile::new(text, path.to_path_buf());
        let tags = note.tag_names();

        self.notes.insert(path.to_path_buf(), note);
        self.file_index.add(path);
        self.tag_index.upsert_tags_for(path, tags);
        self.rebuild_graph();
    }

    pub fn remove_file(&mut self, path: &Path) {
        self.notes.remove(path);
        self.file_index.remove(path);
        self.tag_index.remove_file(path);
        self.rebuild_graph();
    }

    /// Re-key a note after a file rename so subsequent requests see the
    /// new world. The note's parse artifacts are kept; link targets inside
    /// other files are the rename planner's business.
    pub fn rename_note(&mut self, old: &Path, new: &Path) {
        if let Some(mut note) = self.notes.remove(old) {
            note.path = new.to_path_buf();
            self.notes.insert(new.to_path_buf(), note);
        }
        let tags = self.tag_index.tags_for_file(old);
        self.tag_index.remove_file(old);
        self.tag_index.upsert_tags_for(new, tags);
        self.file_index.rename(old, new);
        self.rebuild_graph();
    }

    /// Move every file carrying `old` over to `new` in the tag indices.
    ///
    /// Token ranges inside the stored parse artifacts are left alone; the
    /// next reparse of each edited file refreshes them.
    pub fn rename_tag(&mut self, old: &str, new: &str) {
        for note in self.notes.values_mut() {
            for tag in note.tags.iter_mut().filter(|tag| tag.name == old) {
                tag.name = new.to_string();
            }
        }

        for (path, tags) in self
            .notes
            .values()
            .map(|note| (note.path.clone(), note.tag_names()))
            .collect_vec()
        {
            self.tag_index.upsert_tags_for(&path, tags);
        }
        self.rebuild_graph();
    }

    /// Drop and rebuild all graph edges from the current parse artifacts.
    pub fn rebuild_graph(&mut self) {
        self.graph.clear();

        let edges = self
            .notes
            .values()
            .flat_map(|note| {
                note.links
                    .iter()
                    .filter_map(|link| self.file_index.resolve(&link.target))
                    .map(|target| (note.path.clone(), target))
                    .collect_vec()
            })
            .collect_vec();
        let usages = self
            .notes
            .values()
            .flat_map(|note| {
                note.tags
                    .iter()
                    .map(|tag| (note.path.clone(), tag.name.clone()))
                    .collect_vec()
            })
            .collect_vec();

        for (from, to) in edges {
            self.graph.add_link(&from, &to);
        }
        for (file, tag) in usages {
            self.graph.add_tag_usage(&file, &tag);
        }
    }

    /// Select all wikilinks in a file if path is Some, else all in the vault.
    pub fn select_links<'a>(&'a self, path: Option<&'a Path>) -> Vec<(&'a Path, &'a Wikilink)> {
        match path {
            Some(path) => self
                .notes
                .get(path)
                .map(|note| note.links.iter().map(|l| (path, l)).collect())
                .unwrap_or_default(),
            None => self
                .notes
                .values()
                .sorted_by(|a, b| a.path.cmp(&b.path))
                .flat_map(|note| note.links.iter().map(|l| (note.path.as_path(), l)))
                .collect(),
        }
    }

    /// Select all frontmatter tags in a file if path is Some, else all in
    /// the vault.
    pub fn select_tags<'a>(&'a self, path: Option<&'a Path>) -> Vec<(&'a Path, &'a Tag)> {
        match path {
            Some(path) => self
                .notes
                .get(path)
                .map(|note| note.tags.iter().map(|t| (path, t)).collect())
                .unwrap_or_default(),
            None => self
                .notes
                .values()
                .sorted_by(|a, b| a.path.cmp(&b.path))
                .flat_map(|note| note.tags.iter().map(|t| (note.path.as_path(), t)))
                .collect(),
        }
    }

    pub fn note(&self, path: &Path) -> Option<&NoteFile> {
        self.notes.get(path)
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn note_paths(&self) -> Vec<PathBuf> {
        self.notes.keys().sorted().cloned().collect()
    }

    pub fn resolve(&self, target: &str) -> Option<PathBuf> {
        self.file_index.resolve(target)
    }

    pub fn root_dir(&self) -> &PathBuf {
        &self.root_dir
    }
}

impl NoteFile {
    fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|tag| tag.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_vault_dir;
    use std::fs;

    #[test]
    fn test_construct_vault_populates_indices() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        fs::write(
            vault_dir.join("alpha.md"),
            "---\ntags: [project]\n---\nlinks to [[beta]]\n",
        )
        .unwrap();
        fs::write(vault_dir.join("beta.md"), "plain\n").unwrap();

        let vault = Vault::construct_vault(&vault_dir).unwrap();

        assert_eq!(vault.note_count(), 2);
        assert_eq!(
            vault.resolve("beta").as_deref(),
            Some(vault_dir.join("beta.md").as_path())
        );
        assert_eq!(vault.tag_index.files_for("project"), vec![vault_dir.join("alpha.md")]);
        assert_eq!(
            vault.graph.files_referencing_file(&vault_dir.join("beta.md")),
            vec![vault_dir.join("alpha.md")]
        );

        let alpha = vault_dir.join("alpha.md");
        let links = vault.select_links(Some(&alpha));
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].1.target, "beta");
        let tags = vault.select_tags(Some(&alpha));
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].1.name, "project");
        assert!(vault.select_links(Some(&vault_dir.join("beta.md"))).is_empty());
    }

    #[test]
    fn test_hidden_directories_skipped() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        let hidden = vault_dir.join(".obsidian");
        fs::create_dir(&hidden).unwrap();
        fs::write(hidden.join("secret.md"), "x").unwrap();
        fs::write(vault_dir.join("visible.md"), "x").unwrap();

        let vault = Vault::construct_vault(&vault_dir).unwrap();

        assert_eq!(vault.note_count(), 1);
    }

    #[test]
    fn test_update_file_refreshes_tags_and_edges() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        fs::write(vault_dir.join("a.md"), "---\ntags: [old]\n---\n[[b]]\n").unwrap();
        fs::write(vault_dir.join("b.md"), "x").unwrap();

        let mut vault = Vault::construct_vault(&vault_dir).unwrap();
        vault.update_file(&vault_dir.join("a.md"), "---\ntags: [new]\n---\nno links\n");

        assert!(vault.tag_index.files_for("old").is_empty());
        assert_eq!(vault.tag_index.files_for("new"), vec![vault_dir.join("a.md")]);
        assert!(vault
            .graph
            .files_referencing_file(&vault_dir.join("b.md"))
            .is_empty());
    }

    #[test]
    fn test_remove_file_purges_everywhere() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        fs::write(vault_dir.join("a.md"), "---\ntags: [t]\n---\n[[b]]\n").unwrap();
        fs::write(vault_dir.join("b.md"), "x").unwrap();

        let mut vault = Vault::construct_vault(&vault_dir).unwrap();
        vault.remove_file(&vault_dir.join("a.md"));

        assert!(vault.note(&vault_dir.join("a.md")).is_none());
        assert!(vault.resolve("a").is_none());
        assert!(vault.tag_index.files_for("t").is_empty());
        assert!(vault
            .graph
            .files_referencing_file(&vault_dir.join("b.md"))
            .is_empty());
    }

    #[test]
    fn test_rename_note_moves_every_index() {
        let (_temp_dir, vault_dir) = create_test_vault_dir();
        fs::write(vault_dir.join("old.md"), "---\ntags: [keep]\n---\n").unwrap();

        let mut vault = Vault::construct_vault(&vault_dir).unwrap();

        let new = vault_dir.join("new.md");
        fs::rename(vault_dir.join("old.md"), &new).unwrap();
        vault.rename_note(&vault_dir.join("old.md"), &new);

        assert!(vault.resolve("old").is_none());
        assert_eq!(vault.resolve("new").as_deref(), Some(new.as_path()));
        assert_eq!(vault.tag_index.files_for("keep"), vec![new]);
    }
}
