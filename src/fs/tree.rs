use crate::fs::path::{self, SEPARATOR};

use indexmap::{IndexMap, IndexSet};

/// Identifies a file within its partition. Stable across moves.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub(crate) struct FileId(pub(crate) u64);

/// Namespace of a partition: the directories and the files they contain.
///
/// Paths are partition-relative and clean. The root directory `/` always
/// exists. Directories are created implicitly for every ancestor of an
/// inserted file.
pub(crate) struct Tree {
    dirs: IndexSet<String>,
    files: IndexMap<String, FileId>,
}

impl Tree {
    pub(crate) fn new() -> Tree {
        let mut dirs = IndexSet::new();
        dirs.insert("/".to_string());

        Tree {
            dirs,
            files: IndexMap::new(),
        }
    }

    pub(crate) fn file(&self, path: &str) -> Option<FileId> {
        self.files.get(path).copied()
    }

    pub(crate) fn is_dir(&self, path: &str) -> bool {
        self.dirs.contains(path)
    }

    pub(crate) fn num_files(&self) -> usize {
        self.files.len()
    }

    /// Whether some ancestor of `path` is a file, which makes `path`
    /// unusable as either a file or a directory.
    pub(crate) fn has_file_ancestor(&self, path: &str) -> bool {
        ancestors(path).any(|ancestor| self.files.contains_key(ancestor))
    }

    pub(crate) fn insert_file(&mut self, path: &str, id: FileId) {
        self.create_dir(path::split(path).0);
        self.files.insert(path.to_string(), id);
    }

    pub(crate) fn remove_file(&mut self, path: &str) -> Option<FileId> {
        self.files.shift_remove(path)
    }

    pub(crate) fn path_of(&self, id: FileId) -> Option<&str> {
        self.files
            .iter()
            .find(|(_, file)| **file == id)
            .map(|(path, _)| path.as_str())
    }

    /// Create `path` and all of its missing ancestors.
    pub(crate) fn create_dir(&mut self, path: &str) {
        let missing: Vec<String> = std::iter::once(path)
            .chain(ancestors(path))
            .take_while(|dir| !self.dirs.contains(*dir))
            .map(str::to_string)
            .collect();

        for dir in missing.into_iter().rev() {
            self.dirs.insert(dir);
        }
    }

    /// Files strictly below `dir`, at any depth.
    pub(crate) fn files_under(&self, dir: &str) -> Vec<(String, FileId)> {
        self.files
            .iter()
            .filter(|(file, _)| path::is_ancestor(dir, file))
            .map(|(file, id)| (file.clone(), *id))
            .collect()
    }

    /// Names of the files directly inside `dir`, sorted.
    pub(crate) fn file_names_in(&self, dir: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .files
            .keys()
            .filter(|file| path::split(file).0 == dir)
            .map(|file| path::split(file).1.to_string())
            .collect();
        names.sort();
        names
    }

    /// Remove `dir`, its subdirectories and every file below it. Returns the
    /// removed files.
    pub(crate) fn remove_dir(&mut self, dir: &str) -> Vec<FileId> {
        let removed = self.files_under(dir);
        for (file, _) in &removed {
            self.files.shift_remove(file);
        }

        self.dirs
            .retain(|other| other != dir && !path::is_ancestor(dir, other));

        removed.into_iter().map(|(_, id)| id).collect()
    }
}

/// Strict ancestors of a clean path, nearest first, `/` excluded.
fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(Some(path), |p| {
        p.rfind(SEPARATOR).filter(|idx| *idx > 0).map(|idx| &p[..idx])
    })
    .skip(1)
}
