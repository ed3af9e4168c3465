//! Simulated file systems.
//!
//! A [`FileSystem`] is a set of [`Partition`]s, each mounted at a path prefix
//! and backed by a [`Storage`]. Partitions track files, directories and free
//! space; those with a [`CachingScheme`] evict files to make room for new
//! ones, in creation order (FIFO) or access order (LRU).
//!
//! File contents are not simulated, only sizes. Reading or writing a
//! [`File`] asks its storage how long the operation takes on the simulated
//! platform and waits that long in virtual time. Operations can be waited on
//! right away, or started as an [`Io`] and waited on later.
//!
//! Paths are `/`-separated and absolute. They are simplified before use:
//! `.` and `..` components are resolved and repeated separators collapsed.
//!
//! # Storages
//!
//! - [`OneDiskStorage`]: a single disk, read and written in place.
//! - [`OneRemoteDiskStorage`]: a single disk whose data crosses the network
//!   when the issuing actor runs on another host.
//! - [`JbodStorage`]: several disks of one host combined in a [`Raid`] array.

mod error;
pub use error::{ErrorKind, FsError, FsResult};

mod file;
pub use file::{File, FileStat, OpenMode};

mod file_system;
pub use file_system::FileSystem;

mod io;
pub use io::{Io, IoSet};

mod partition;
pub use partition::{CachingScheme, Partition};

pub mod path;

mod registry;
pub(crate) use registry::Registry;

mod storage;
pub use storage::{JbodStorage, OneDiskStorage, OneRemoteDiskStorage, Raid, Storage};

mod tree;
