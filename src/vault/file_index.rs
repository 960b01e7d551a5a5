//! Stem-to-path index for wikilink target resolution.
//!
//! Wikilink targets name files by basename, case-insensitively and with or
//! without the `.md` extension. The index keeps one record per canonical
//! path plus a folded-stem lookup map.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Metadata for one indexed markdown file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    /// Display basename, extension stripped.
    pub stem: String,
    /// Lowercase-folded stem, the lookup key.
    pub folded: String,
    pub modified: SystemTime,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FileIndex {
    records: HashMap<PathBuf, FileRecord>,
    by_stem: HashMap<String, PathBuf>,
}

impl FileIndex {
    pub fn new() -> FileIndex {
        FileIndex::default()
    }

    /// Index a file. Stats the path for its mtime; a file that cannot be
    /// stat'ed is simply omitted. On a folded-stem collision the last
    /// writer wins, but the record stays reachable by its canonical path.
    pub fn add(&mut self, path: &Path) {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return;
        };
        let Ok(modified) = std::fs::metadata(path).and_then(|meta| meta.modified()) else {
            return;
        };

        let record = FileRecord {
            path: path.to_path_buf(),
            stem: stem.to_string(),
            folded: stem.to_lowercase(),
            modified,
        };

        self.by_stem.insert(record.folded.clone(), record.path.clone());
        self.records.insert(record.path.clone(), record);
    }

    /// Resolve a wikilink target to a canonical path.
    ///
    /// One trailing `.md` is stripped (case-insensitively) before the
    /// case-folded lookup, so `Foo`, `foo`, `foo.md`, and `FOO.MD` all hit
    /// the same record.
    pub fn resolve(&self, target: &str) -> Option<PathBuf> {
        let target = target.trim();
        let folded = target.to_lowercase();
        let key = folded.strip_suffix(".md").unwrap_or(&folded);

        self.by_stem.get(key).cloned()
    }

    pub fn remove(&mut self, path: &Path) {
        if let Some(record) = self.records.remove(path) {
            // Only drop the stem entry if it still points at us; a
            // collision may have overwritten it.
            if self.by_stem.get(&record.folded) == Some(&record.path) {
                self.by_stem.remove(&record.folded);
            }
        }
    }

    /// Remove-then-add. Not atomic internally, but only observable between
    /// the two calls. The new path may not exist on disk yet (the editor
    /// applies the actual file move); in that case the old record's mtime
    /// is carried over so the name resolves immediately.
    pub fn rename(&mut self, old: &Path, new: &Path) {
        let previous_mtime = self.get(old).map(|record| record.modified);
        self.remove(old);
        self.add(new);

        if self.get(new).is_some() {
            return;
        }
        let (Some(modified), Some(stem)) =
            (previous_mtime, new.file_stem().and_then(|s| s.to_str()))
        else {
            return;
        };

        let record = FileRecord {
            path: new.to_path_buf(),
            stem: stem.to_string(),
            folded: stem.to_lowercase(),
            modified,
        };
        self.by_stem.insert(record.folded.clone(), record.path.clone());
        self.records.insert(record.path.clone(), record);
    }

    pub fn get(&self, path: &Path) -> Option<&FileRecord> {
        self.records.get(path)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records sorted by path, so downstream consumers (completion
    /// candidate lists) see a deterministic order.
    pub fn records(&self) -> Vec<&FileRecord> {
        let mut records: Vec<&FileRecord> = self.records.values().collect();
        records.sort_by(|a, b| a.path.cmp(&b.path));
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn index_with(files: &[&str]) -> (TempDir, FileIndex) {
        let tmp = TempDir::new().unwrap();
        let mut index = FileIndex::new();
        for name in files {
            let path = tmp.path().join(name);
            fs::write(&path, "content").unwrap();
            index.add(&path);
        }
        (tmp, index)
    }

    #[test]
    fn test_resolve_case_and_extension_insensitive() {
        let (tmp, index) = index_with(&["Foo.md"]);
        let expected = tmp.path().join("Foo.md");

        for query in ["Foo", "foo", "foo.md", "FOO.MD", "Foo.md"] {
            assert_eq!(index.resolve(query).as_deref(), Some(expected.as_path()), "{query}");
        }

        let record = index.get(&expected).unwrap();
        assert_eq!(record.stem, "Foo");
        assert_eq!(record.folded, "foo");
    }

    #[test]
    fn test_resolve_strips_single_md_suffix() {
        let (tmp, index) = index_with(&["note.md.md"]);

        // one strip: "note.md.md" -> "note.md" matches the stem "note.md"
        assert_eq!(
            index.resolve("note.md.md").as_deref(),
            Some(tmp.path().join("note.md.md").as_path())
        );
    }

    #[test]
    fn test_resolve_missing() {
        let (_tmp, index) = index_with(&["alpha.md"]);
        assert!(index.resolve("ghost").is_none());
    }

    #[test]
    fn test_collision_last_writer_wins() {
        let tmp = TempDir::new().unwrap();
        let sub = tmp.path().join("sub");
        fs::create_dir(&sub).unwrap();

        let first = tmp.path().join("Note.md");
        let second = sub.join("note.md");
        fs::write(&first, "a").unwrap();
        fs::write(&second, "b").unwrap();

        let mut index = FileIndex::new();
        index.add(&first);
        index.add(&second);

        assert_eq!(index.resolve("note").as_deref(), Some(second.as_path()));
        // both records stay reachable by canonical path
        assert!(index.get(&first).is_some());
        assert!(index.get(&second).is_some());
    }

    #[test]
    fn test_missing_file_is_omitted() {
        let tmp = TempDir::new().unwrap();
        let mut index = FileIndex::new();
        index.add(&tmp.path().join("nope.md"));

        assert!(index.is_empty());
    }

    #[test]
    fn test_remove_purges_both_maps() {
        let (tmp, mut index) = index_with(&["alpha.md"]);
        index.remove(&tmp.path().join("alpha.md"));

        assert!(index.is_empty());
        assert!(index.resolve("alpha").is_none());
    }

    #[test]
    fn test_rename() {
        let (tmp, mut index) = index_with(&["old.md"]);
        let new = tmp.path().join("new.md");
        fs::write(&new, "moved").unwrap();

        index.rename(&tmp.path().join("old.md"), &new);

        assert!(index.resolve("old").is_none());
        assert_eq!(index.resolve("new").as_deref(), Some(new.as_path()));
    }

    #[test]
    fn test_rename_before_the_file_moves_on_disk() {
        let (tmp, mut index) = index_with(&["old.md"]);
        let new = tmp.path().join("new.md");

        // destination not written yet
        index.rename(&tmp.path().join("old.md"), &new);

        assert!(index.resolve("old").is_none());
        assert_eq!(index.resolve("new").as_deref(), Some(new.as_path()));
    }
}
