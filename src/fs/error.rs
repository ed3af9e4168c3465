//! Error types for file system operations.

use thiserror::Error;

/// Errors that can occur during file system operations.
///
/// Every failing operation leaves the file tree and the partition accounting
/// exactly as they were before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FsError {
    /// Bad argument: malformed mount point, unknown access mode, bad RAID
    /// disk count, unsupported RAID level...
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Path not covered by any partition, or naming a directory where a file
    /// is expected (and vice versa)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Directory does not exist: {0}")]
    DirectoryDoesNotExist(String),

    #[error("Partition not found: {0}")]
    PartitionNotFound(String),

    #[error("File already exists: {0}")]
    FileAlreadyExists(String),

    #[error("Directory already exists: {0}")]
    DirectoryAlreadyExists(String),

    /// The operation requires the file to be closed
    #[error("File is open: {0}")]
    FileIsOpen(String),

    /// Source and destination live on different partitions
    #[error("Cannot move {src} to {dst}: not on the same partition")]
    InvalidMove { src: String, dst: String },

    #[error("Cannot truncate an open file: {0}")]
    InvalidTruncate(String),

    #[error("Invalid seek: {0}")]
    InvalidSeek(String),

    #[error("Not enough space: {0}")]
    NotEnoughSpace(String),

    #[error("Too many open files on {0}")]
    TooManyOpenFiles(String),

    /// The handle has been closed
    #[error("File is closed: {0}")]
    FileClosed(String),

    /// A disk taking part in the operation was turned off
    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

/// Coarse classification of [`FsError`]s.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    /// Exclusivity or placement conflict: open files, cross-partition moves
    Conflict,
    Capacity,
    ResourceExhausted,
    DeviceFailure,
}

impl FsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::InvalidArgument(_) | FsError::InvalidPath(_) | FsError::InvalidSeek(_) => {
                ErrorKind::InvalidArgument
            }
            FsError::FileNotFound(_)
            | FsError::DirectoryDoesNotExist(_)
            | FsError::PartitionNotFound(_)
            | FsError::FileClosed(_) => ErrorKind::NotFound,
            FsError::FileAlreadyExists(_) | FsError::DirectoryAlreadyExists(_) => {
                ErrorKind::AlreadyExists
            }
            FsError::FileIsOpen(_) | FsError::InvalidMove { .. } | FsError::InvalidTruncate(_) => {
                ErrorKind::Conflict
            }
            FsError::NotEnoughSpace(_) => ErrorKind::Capacity,
            FsError::TooManyOpenFiles(_) => ErrorKind::ResourceExhausted,
            FsError::StorageFailure(_) => ErrorKind::DeviceFailure,
        }
    }
}

/// Result type for file system operations.
pub type FsResult<T> = Result<T, FsError>;
