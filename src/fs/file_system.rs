use crate::fs::file::{File, OpenMode};
use crate::fs::partition::{CachingScheme, Partition};
use crate::fs::path;
use crate::fs::storage::Storage;
use crate::fs::{FsError, FsResult};
use crate::TRACING_TARGET;

use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// A file system: a set of partitions mounted at distinct path prefixes.
///
/// Paths given to file system methods are absolute paths in the global
/// namespace; the partition they fall in is found by mount point.
pub struct FileSystem {
    name: String,

    /// Bound on simultaneously open handles, if any
    max_open_files: Option<usize>,

    /// Partitions, keyed by mount point
    partitions: RefCell<IndexMap<String, Rc<Partition>>>,

    open_files: Cell<usize>,
}

impl FileSystem {
    /// Create a file system with no bound on open files.
    pub fn create(name: impl Into<String>) -> Rc<FileSystem> {
        Rc::new(FileSystem::new(name.into(), None))
    }

    /// Create a file system allowing at most `max_open_files` open handles.
    pub fn with_max_open_files(name: impl Into<String>, max_open_files: usize) -> Rc<FileSystem> {
        Rc::new(FileSystem::new(name.into(), Some(max_open_files)))
    }

    fn new(name: String, max_open_files: Option<usize>) -> FileSystem {
        FileSystem {
            name,
            max_open_files,
            partitions: RefCell::new(IndexMap::new()),
            open_files: Cell::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_open_files(&self) -> Option<usize> {
        self.max_open_files
    }

    pub fn num_open_files(&self) -> usize {
        self.open_files.get()
    }

    /// Mount a new partition of `size` bytes at `mount_point`.
    ///
    /// The mount point must be absolute and clean; a trailing separator is
    /// tolerated. It may neither equal nor nest with an existing mount point.
    pub fn mount_partition(
        &self,
        mount_point: &str,
        storage: impl Into<Storage>,
        size: u64,
        scheme: CachingScheme,
    ) -> FsResult<()> {
        let mount = path::clean_mount(mount_point)?;
        let mut partitions = self.partitions.borrow_mut();

        if let Some(existing) = partitions
            .keys()
            .find(|m| *m == mount || path::is_ancestor(m, mount) || path::is_ancestor(mount, m))
        {
            return Err(FsError::InvalidArgument(format!(
                "mount point {mount} collides with {existing}"
            )));
        }

        let storage = storage.into();
        tracing::debug!(target: TRACING_TARGET, fs = %self.name, mount, storage = storage.name(), size, %scheme, "Mount partition");

        partitions.insert(
            mount.to_string(),
            Rc::new(Partition::new(mount.to_string(), storage, size, scheme)),
        );

        Ok(())
    }

    /// The partition mounted exactly at `name`.
    pub fn partition_by_name(&self, name: &str) -> FsResult<Rc<Partition>> {
        path::clean_mount(name)
            .ok()
            .and_then(|mount| self.partitions.borrow().get(mount).cloned())
            .ok_or_else(|| FsError::PartitionNotFound(name.to_string()))
    }

    /// The partition `path` falls in, if any.
    pub fn partition_for_path(&self, path: &str) -> Option<Rc<Partition>> {
        let path = path::simplify(path);
        self.partitions
            .borrow()
            .iter()
            .filter(|(mount, _)| **mount == path || path::is_ancestor(mount, &path))
            .max_by_key(|(mount, _)| mount.len())
            .map(|(_, partition)| partition.clone())
    }

    /// Every partition, in mount order.
    pub fn partitions(&self) -> Vec<Rc<Partition>> {
        self.partitions.borrow().values().cloned().collect()
    }

    /// Find the partition of `path` and the path relative to its mount point.
    fn locate(&self, path: &str) -> FsResult<(Rc<Partition>, String)> {
        let partition = self
            .partition_for_path(path)
            .ok_or_else(|| FsError::InvalidPath(format!("no partition for {path}")))?;
        let relative = path::resolve_at_mount(path, partition.name())?;
        Ok((partition, relative))
    }

    /// Like `locate`, for a path that must designate a file.
    fn locate_file(&self, path: &str) -> FsResult<(Rc<Partition>, String)> {
        if path::is_directory_like(path) {
            return Err(FsError::InvalidPath(format!("{path} is not a file path")));
        }
        self.locate(path)
    }

    /// Create a file of `size` bytes, evicting files if the partition's
    /// caching scheme allows it and the file does not fit.
    pub fn create_file(&self, path: &str, size: u64) -> FsResult<()> {
        let (partition, relative) = self.locate_file(path)?;
        partition.create(&relative, size, crate::clock())?;
        Ok(())
    }

    /// Open a file. `mode` is one of `r`, `w`, `a` and `r+`.
    pub fn open(self: &Rc<Self>, path: &str, mode: &str) -> FsResult<File> {
        let mode: OpenMode = mode.parse()?;

        if let Some(max) = self.max_open_files {
            if self.open_files.get() >= max {
                return Err(FsError::TooManyOpenFiles(self.name.clone()));
            }
        }

        let (partition, relative) = self.locate_file(path)?;
        let now = crate::clock();

        let id = match (partition.lookup(&relative), mode) {
            (Ok(id), _) => id,
            (Err(FsError::FileNotFound(_)), OpenMode::Write | OpenMode::Append) => {
                partition.create(&relative, 0, now)?
            }
            (Err(e), _) => return Err(e),
        };

        let size = partition.open(id, mode == OpenMode::Write, now)?;
        let position = match mode {
            OpenMode::Append => size,
            _ => 0,
        };

        self.open_files.set(self.open_files.get() + 1);

        Ok(File::new(
            self.clone(),
            partition,
            path::simplify(path),
            id,
            mode,
            position,
        ))
    }

    pub(crate) fn release_open_file(&self) {
        self.open_files.set(self.open_files.get().saturating_sub(1));
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.locate(path)
            .map(|(partition, relative)| partition.file_exists(&relative))
            .unwrap_or(false)
    }

    pub fn directory_exists(&self, path: &str) -> bool {
        self.locate(path)
            .map(|(partition, relative)| partition.directory_exists(&relative))
            .unwrap_or(false)
    }

    pub fn file_size(&self, path: &str) -> FsResult<u64> {
        let (partition, relative) = self.locate_file(path)?;
        let id = partition.lookup(&relative)?;
        partition
            .metadata(id)
            .map(|meta| meta.size)
            .ok_or_else(|| FsError::FileNotFound(path.to_string()))
    }

    /// Free space of the partition `path` falls in.
    pub fn free_space_at_path(&self, path: &str) -> FsResult<u64> {
        let (partition, _) = self.locate(path)?;
        Ok(partition.free_space())
    }

    pub fn create_directory(&self, path: &str) -> FsResult<()> {
        let (partition, relative) = self.locate(path)?;
        partition.create_directory(&relative)
    }

    /// Names of the files directly inside a directory, sorted.
    pub fn files_in_directory(&self, path: &str) -> FsResult<Vec<String>> {
        let (partition, relative) = self.locate(path)?;
        partition.file_names_in(&relative)
    }

    pub fn make_file_evictable(&self, path: &str, evictable: bool) -> FsResult<()> {
        let (partition, relative) = self.locate_file(path)?;
        partition.make_file_evictable(&relative, evictable)
    }

    /// Remove a closed file.
    pub fn unlink_file(&self, path: &str) -> FsResult<()> {
        let (partition, relative) = self.locate_file(path)?;
        partition.unlink_file(&relative)
    }

    /// Remove a directory and everything below it. Fails if any file below
    /// it is open.
    pub fn unlink_directory(&self, path: &str) -> FsResult<()> {
        let (partition, relative) = self.locate(path)?;
        partition.unlink_directory(&relative)
    }

    /// Rename a file within its partition, replacing the destination if it
    /// exists. Neither file may be open.
    pub fn move_file(&self, src: &str, dst: &str) -> FsResult<()> {
        let (src_partition, src_relative) = self.locate_file(src)?;
        src_partition.lookup(&src_relative)?;

        if path::simplify(src) == path::simplify(dst) {
            return Ok(());
        }

        let (dst_partition, dst_relative) = self.locate_file(dst)?;
        if !Rc::ptr_eq(&src_partition, &dst_partition) {
            return Err(FsError::InvalidMove {
                src: src.to_string(),
                dst: dst.to_string(),
            });
        }

        src_partition.move_file(&src_relative, &dst_relative)
    }

    /// Set the size of a closed file.
    pub fn truncate_file(&self, path: &str, size: u64) -> FsResult<()> {
        let (partition, relative) = self.locate_file(path)?;
        partition.truncate_file(&relative, size, crate::clock())
    }
}

impl fmt::Debug for FileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystem")
            .field("name", &self.name)
            .field("partitions", &self.partitions.borrow().keys().collect::<Vec<_>>())
            .field("open_files", &self.open_files.get())
            .finish()
    }
}
