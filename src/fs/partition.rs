use crate::fs::path;
use crate::fs::storage::Storage;
use crate::fs::tree::{FileId, Tree};
use crate::fs::{FsError, FsResult};
use crate::TRACING_TARGET;

use indexmap::{IndexMap, IndexSet};
use std::cell::RefCell;
use std::fmt;
use std::time::Duration;

/// Policy selecting which resident file to remove to make room for a new
/// one.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum CachingScheme {
    /// Never evict. Creating a file that does not fit fails.
    #[default]
    None,

    /// Evict the oldest created files first
    Fifo,

    /// Evict the least recently accessed files first. Opening, reading and
    /// writing a file are accesses.
    Lru,
}

impl fmt::Display for CachingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CachingScheme::None => "NONE",
            CachingScheme::Fifo => "FIFO",
            CachingScheme::Lru => "LRU",
        };
        f.write_str(name)
    }
}

/// Per-file bookkeeping.
#[derive(Clone, Debug)]
pub(crate) struct FileMetadata {
    /// Size including every completed write
    pub(crate) size: u64,

    /// Size including the extents reserved by in-flight writes. This is what
    /// the file occupies on the partition.
    pub(crate) future_size: u64,

    pub(crate) modified: Duration,
    pub(crate) accessed: Duration,

    /// Open handles on the file
    pub(crate) refcount: usize,

    pub(crate) evictable: bool,

    /// In-flight writes: write id -> end offset of the written extent
    ongoing_writes: IndexMap<u64, u64>,
}

impl FileMetadata {
    fn new(size: u64, now: Duration) -> FileMetadata {
        FileMetadata {
            size,
            future_size: size,
            modified: now,
            accessed: now,
            refcount: 0,
            evictable: true,
            ongoing_writes: IndexMap::new(),
        }
    }

    fn in_use(&self) -> bool {
        self.refcount > 0 || !self.ongoing_writes.is_empty()
    }

    fn reserved_size(&self) -> u64 {
        self.ongoing_writes
            .values()
            .copied()
            .fold(self.size, u64::max)
    }
}

/// A capacity-bounded namespace mounted at a path prefix of a
/// [`FileSystem`], backed by one [`Storage`].
///
/// All paths taken by partition methods are relative to the mount point.
///
/// [`FileSystem`]: crate::fs::FileSystem
pub struct Partition {
    /// Mount point, which doubles as the partition name
    name: String,

    storage: Storage,

    /// Capacity in bytes
    size: u64,

    scheme: CachingScheme,

    state: RefCell<State>,
}

struct State {
    free: u64,

    tree: Tree,

    files: IndexMap<FileId, FileMetadata>,

    /// Eviction order, next victim first: creation order for FIFO, access
    /// order for LRU.
    order: IndexSet<FileId>,

    next_file: u64,

    next_write: u64,
}

impl Partition {
    pub(crate) fn new(name: String, storage: Storage, size: u64, scheme: CachingScheme) -> Partition {
        Partition {
            name,
            storage,
            size,
            scheme,
            state: RefCell::new(State {
                free: size,
                tree: Tree::new(),
                files: IndexMap::new(),
                order: IndexSet::new(),
                next_file: 0,
                next_write: 0,
            }),
        }
    }

    /// The mount point of the partition.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn free_space(&self) -> u64 {
        self.state.borrow().free
    }

    pub fn num_files(&self) -> usize {
        self.state.borrow().tree.num_files()
    }

    pub fn caching_scheme(&self) -> CachingScheme {
        self.scheme
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Create a file of `size` bytes, evicting files per the caching scheme
    /// if it does not fit.
    pub fn create_file(&self, path: &str, size: u64) -> FsResult<()> {
        self.create(&path::simplify(path), size, crate::clock()).map(|_| ())
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.state.borrow().tree.file(&path::simplify(path)).is_some()
    }

    pub fn directory_exists(&self, path: &str) -> bool {
        self.state.borrow().tree.is_dir(&path::simplify(path))
    }

    /// Allow or forbid the eviction of a file. The file keeps its position
    /// in the eviction order.
    pub fn make_file_evictable(&self, path: &str, evictable: bool) -> FsResult<()> {
        let mut state = self.state.borrow_mut();
        let id = self.find(&state, &path::simplify(path))?;
        state.meta_mut(id).evictable = evictable;
        Ok(())
    }

    pub(crate) fn create(&self, path: &str, size: u64, now: Duration) -> FsResult<FileId> {
        let mut state = self.state.borrow_mut();

        if path == "/" || state.tree.is_dir(path) || state.tree.has_file_ancestor(path) {
            return Err(FsError::InvalidPath(self.full_path(path)));
        }

        if state.tree.file(path).is_some() {
            return Err(FsError::FileAlreadyExists(self.full_path(path)));
        }

        self.make_room(&mut state, size)?;

        let id = FileId(state.next_file);
        state.next_file += 1;
        state.tree.insert_file(path, id);
        state.files.insert(id, FileMetadata::new(size, now));
        state.order.insert(id);
        state.free -= size;

        tracing::debug!(target: TRACING_TARGET, partition = %self.name, path, size, "Create file");

        Ok(id)
    }

    /// Free at least `needed` bytes, or nothing at all.
    fn make_room(&self, state: &mut State, needed: u64) -> FsResult<()> {
        if needed <= state.free {
            return Ok(());
        }

        let not_enough = || {
            FsError::NotEnoughSpace(format!(
                "{} bytes requested on {} ({} bytes free)",
                needed, self.name, state.free
            ))
        };

        if self.scheme == CachingScheme::None || needed > self.size {
            return Err(not_enough());
        }

        let mut victims = Vec::new();
        let mut available = state.free;

        for id in &state.order {
            if available >= needed {
                break;
            }

            let meta = &state.files[id];
            if !meta.evictable || meta.in_use() {
                continue;
            }

            victims.push(*id);
            available += meta.future_size;
        }

        if available < needed {
            return Err(not_enough());
        }

        for id in victims {
            let path = state.tree.path_of(id).map(str::to_string);
            if let Some(path) = &path {
                state.tree.remove_file(path);
            }
            state.forget(id);

            tracing::debug!(target: TRACING_TARGET, partition = %self.name, path = path.as_deref().unwrap_or_default(), "Evict file");
        }

        Ok(())
    }

    pub(crate) fn lookup(&self, path: &str) -> FsResult<FileId> {
        self.find(&self.state.borrow(), path)
    }

    fn find(&self, state: &State, path: &str) -> FsResult<FileId> {
        state
            .tree
            .file(path)
            .ok_or_else(|| FsError::FileNotFound(self.full_path(path)))
    }

    pub(crate) fn metadata(&self, id: FileId) -> Option<FileMetadata> {
        self.state.borrow().files.get(&id).cloned()
    }

    pub(crate) fn file_names_in(&self, dir: &str) -> FsResult<Vec<String>> {
        let state = self.state.borrow();
        if !state.tree.is_dir(dir) {
            return Err(FsError::DirectoryDoesNotExist(self.full_path(dir)));
        }
        Ok(state.tree.file_names_in(dir))
    }

    pub(crate) fn create_directory(&self, dir: &str) -> FsResult<()> {
        let mut state = self.state.borrow_mut();

        if state.tree.is_dir(dir) {
            return Err(FsError::DirectoryAlreadyExists(self.full_path(dir)));
        }

        if state.tree.file(dir).is_some() || state.tree.has_file_ancestor(dir) {
            return Err(FsError::InvalidPath(self.full_path(dir)));
        }

        state.tree.create_dir(dir);
        tracing::debug!(target: TRACING_TARGET, partition = %self.name, dir, "Create directory");

        Ok(())
    }

    pub(crate) fn unlink_file(&self, path: &str) -> FsResult<()> {
        let mut state = self.state.borrow_mut();
        let id = self.find(&state, path)?;

        if state.meta_mut(id).refcount > 0 {
            return Err(FsError::FileIsOpen(self.full_path(path)));
        }

        state.tree.remove_file(path);
        state.forget(id);
        tracing::debug!(target: TRACING_TARGET, partition = %self.name, path, "Unlink file");

        Ok(())
    }

    pub(crate) fn unlink_directory(&self, dir: &str) -> FsResult<()> {
        let mut state = self.state.borrow_mut();

        if dir == "/" {
            return Err(FsError::InvalidPath(format!(
                "cannot unlink the root of {}",
                self.name
            )));
        }

        if !state.tree.is_dir(dir) {
            return Err(FsError::DirectoryDoesNotExist(self.full_path(dir)));
        }

        let files = state.tree.files_under(dir);
        if let Some((path, _)) = files.iter().find(|(_, id)| state.files[id].refcount > 0) {
            return Err(FsError::FileIsOpen(self.full_path(path)));
        }

        for id in state.tree.remove_dir(dir) {
            state.forget(id);
        }
        tracing::debug!(target: TRACING_TARGET, partition = %self.name, dir, files = files.len(), "Unlink directory");

        Ok(())
    }

    /// Rename `src` to `dst`, replacing `dst` if it names a file. The bytes of
    /// a replaced file are reclaimed.
    pub(crate) fn move_file(&self, src: &str, dst: &str) -> FsResult<()> {
        let mut state = self.state.borrow_mut();
        let id = self.find(&state, src)?;

        if dst == "/" || state.tree.is_dir(dst) || state.tree.has_file_ancestor(dst) {
            return Err(FsError::InvalidPath(self.full_path(dst)));
        }

        if state.meta_mut(id).refcount > 0 {
            return Err(FsError::FileIsOpen(self.full_path(src)));
        }

        let replaced = state.tree.file(dst);
        if let Some(replaced) = replaced {
            if state.meta_mut(replaced).refcount > 0 {
                return Err(FsError::FileIsOpen(self.full_path(dst)));
            }
        }

        if let Some(replaced) = replaced {
            state.tree.remove_file(dst);
            state.forget(replaced);
        }

        state.tree.remove_file(src);
        state.tree.insert_file(dst, id);
        tracing::debug!(target: TRACING_TARGET, partition = %self.name, src, dst, replaced = replaced.is_some(), "Move file");

        Ok(())
    }

    /// Set the size of a closed file, consuming or freeing partition space.
    pub(crate) fn truncate_file(&self, path: &str, size: u64, now: Duration) -> FsResult<()> {
        let mut state = self.state.borrow_mut();
        let id = self.find(&state, path)?;

        if state.meta_mut(id).refcount > 0 {
            return Err(FsError::InvalidTruncate(self.full_path(path)));
        }

        state.resize(id, size, &self.name)?;
        state.meta_mut(id).modified = now;
        tracing::debug!(target: TRACING_TARGET, partition = %self.name, path, size, "Truncate file");

        Ok(())
    }

    /// Register a new open handle on a file.
    ///
    /// With `truncate` the file is emptied first, which always succeeds.
    pub(crate) fn open(&self, id: FileId, truncate: bool, now: Duration) -> FsResult<u64> {
        let mut state = self.state.borrow_mut();

        if truncate {
            state.resize(id, 0, &self.name)?;
            state.meta_mut(id).modified = now;
        }

        let meta = state.meta_mut(id);
        meta.refcount += 1;
        meta.accessed = now;
        let size = meta.size;

        self.touch(&mut state, id);

        Ok(size)
    }

    pub(crate) fn close(&self, id: FileId) {
        let mut state = self.state.borrow_mut();
        if let Some(meta) = state.files.get_mut(&id) {
            meta.refcount = meta.refcount.saturating_sub(1);
        }
    }

    /// Record an access, moving the file to the back of the LRU order.
    pub(crate) fn record_access(&self, id: FileId, now: Duration) {
        let mut state = self.state.borrow_mut();
        if let Some(meta) = state.files.get_mut(&id) {
            meta.accessed = now;
            self.touch(&mut state, id);
        }
    }

    fn touch(&self, state: &mut State, id: FileId) {
        if self.scheme == CachingScheme::Lru && state.order.shift_remove(&id) {
            state.order.insert(id);
        }
    }

    /// Reserve the extent `[position, position + bytes)` of a file for an
    /// upcoming write. Returns the id of the write.
    pub(crate) fn begin_write(&self, id: FileId, position: u64, bytes: u64) -> FsResult<u64> {
        let mut state = self.state.borrow_mut();
        let end = position.checked_add(bytes).ok_or_else(|| {
            FsError::NotEnoughSpace(format!(
                "{bytes} bytes at offset {position} overflow the file on {}",
                self.name
            ))
        })?;
        let reserved = state.meta_mut(id).future_size;
        let extra = end.saturating_sub(reserved);

        if extra > state.free {
            return Err(FsError::NotEnoughSpace(format!(
                "{} bytes requested on {} ({} bytes free)",
                extra, self.name, state.free
            )));
        }

        let write = state.next_write;
        state.next_write += 1;
        state.free -= extra;

        let meta = state.meta_mut(id);
        meta.future_size = meta.future_size.max(end);
        meta.ongoing_writes.insert(write, end);

        self.touch(&mut state, id);

        Ok(write)
    }

    /// A write completed: grow the file over the written extent.
    pub(crate) fn commit_write(&self, id: FileId, write: u64, now: Duration) {
        let mut state = self.state.borrow_mut();

        // The file may have been unlinked while the write was in flight
        let Some(meta) = state.files.get_mut(&id) else {
            return;
        };
        let Some(end) = meta.ongoing_writes.shift_remove(&write) else {
            return;
        };

        meta.size = meta.size.max(end);
        meta.modified = now;
        meta.accessed = now;

        self.touch(&mut state, id);
    }

    /// A write failed: release what it reserved.
    pub(crate) fn abort_write(&self, id: FileId, write: u64) {
        let mut state = self.state.borrow_mut();

        let Some(meta) = state.files.get_mut(&id) else {
            return;
        };
        if meta.ongoing_writes.shift_remove(&write).is_none() {
            return;
        }

        let reserved = meta.reserved_size();
        let released = meta.future_size - reserved;
        meta.future_size = reserved;
        state.free += released;
    }

    fn full_path(&self, path: &str) -> String {
        if self.name == "/" {
            path.to_string()
        } else if path == "/" {
            self.name.clone()
        } else {
            format!("{}{}", self.name, path)
        }
    }
}

impl fmt::Debug for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Partition")
            .field("name", &self.name)
            .field("storage", &self.storage.name())
            .field("size", &self.size)
            .field("free", &self.free_space())
            .field("scheme", &self.scheme)
            .finish()
    }
}

impl State {
    fn meta_mut(&mut self, id: FileId) -> &mut FileMetadata {
        self.files.get_mut(&id).expect("file metadata missing")
    }

    /// Drop the metadata of a file already removed from the tree, reclaiming
    /// its bytes.
    fn forget(&mut self, id: FileId) {
        if let Some(meta) = self.files.shift_remove(&id) {
            self.free += meta.future_size;
        }
        self.order.shift_remove(&id);
    }

    fn resize(&mut self, id: FileId, size: u64, partition: &str) -> FsResult<()> {
        let free = self.free;
        let meta = self.meta_mut(id);
        let before = meta.future_size;
        let after = meta.ongoing_writes.values().copied().fold(size, u64::max);

        if after > before && after - before > free {
            return Err(FsError::NotEnoughSpace(format!(
                "{} bytes requested on {} ({} bytes free)",
                after - before,
                partition,
                free
            )));
        }

        meta.size = size;
        meta.future_size = after;
        self.free = free + before - after;

        Ok(())
    }
}
