//! Bidirectional tag ↔ files index.
//!
//! Both halves are kept in lockstep: every `(tag, file)` pair present in
//! one map is present in the other, and a tag whose file set drains is
//! deleted outright so `all_tags` never reports ghosts.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagIndex {
    tag_to_files: BTreeMap<String, BTreeSet<PathBuf>>,
    file_to_tags: BTreeMap<PathBuf, BTreeSet<String>>,
}

impl TagIndex {
    pub fn new() -> TagIndex {
        TagIndex::default()
    }

    /// Atomically replace the tag set recorded for a file.
    pub fn upsert_tags_for(&mut self, path: &Path, tags: Vec<String>) {
        self.remove_file(path);

        if tags.is_empty() {
            return;
        }

        for tag in &tags {
            self.tag_to_files
                .entry(tag.clone())
                .or_default()
                .insert(path.to_path_buf());
        }
        self.file_to_tags
            .insert(path.to_path_buf(), tags.into_iter().collect());
    }

    /// Purge a file from both halves of the map.
    pub fn remove_file(&mut self, path: &Path) {
        let Some(tags) = self.file_to_tags.remove(path) else {
            return;
        };

        for tag in tags {
            if let Some(files) = self.tag_to_files.get_mut(&tag) {
                files.remove(path);
                if files.is_empty() {
                    self.tag_to_files.remove(&tag);
                }
            }
        }
    }

    pub fn tags_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.tag_to_files
            .keys()
            .filter(|tag| tag.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn files_for(&self, tag: &str) -> Vec<PathBuf> {
        self.tag_to_files
            .get(tag)
            .map(|files| files.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn tag_count(&self, tag: &str) -> usize {
        self.tag_to_files.get(tag).map(|files| files.len()).unwrap_or(0)
    }

    pub fn tags_for_file(&self, path: &Path) -> Vec<String> {
        self.file_to_tags
            .get(path)
            .map(|tags| tags.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn all_tags(&self) -> Vec<String> {
        self.tag_to_files.keys().cloned().collect()
    }
}
