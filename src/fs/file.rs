use crate::fs::io::Io;
use crate::fs::partition::Partition;
use crate::fs::tree::FileId;
use crate::fs::{FileSystem, FsError, FsResult};

use std::fmt;
use std::io::SeekFrom;
use std::rc::Rc;
use std::str::FromStr;
use std::time::Duration;

/// How a file is opened.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OpenMode {
    /// `r`: read only, from the start. The file must exist.
    Read,
    /// `w`: write only. The file is created, or emptied if it exists.
    Write,
    /// `a`: write only, from the end. The file is created if missing.
    Append,
    /// `r+`: read and write, from the start. The file must exist.
    ReadWrite,
}

impl OpenMode {
    pub fn can_read(self) -> bool {
        matches!(self, OpenMode::Read | OpenMode::ReadWrite)
    }

    pub fn can_write(self) -> bool {
        !matches!(self, OpenMode::Read)
    }
}

impl FromStr for OpenMode {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" => Ok(OpenMode::Read),
            "w" => Ok(OpenMode::Write),
            "a" => Ok(OpenMode::Append),
            "r+" => Ok(OpenMode::ReadWrite),
            _ => Err(FsError::InvalidArgument(format!("unsupported access mode {s:?}"))),
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self {
            OpenMode::Read => "r",
            OpenMode::Write => "w",
            OpenMode::Append => "a",
            OpenMode::ReadWrite => "r+",
        };
        f.write_str(mode)
    }
}

/// Snapshot of a file's metadata.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileStat {
    pub size_in_bytes: u64,
    pub last_modification_date: Duration,
    pub last_access_date: Duration,
    /// Number of open handles on the file
    pub refcount: usize,
}

/// An open file.
///
/// Reads and writes go through the storage of the partition the file lives
/// on and take simulated time. Dropping a `File` closes it.
pub struct File {
    fs: Rc<FileSystem>,
    partition: Rc<Partition>,
    path: String,
    id: FileId,
    mode: OpenMode,
    position: u64,
    closed: bool,
}

impl File {
    pub(crate) fn new(
        fs: Rc<FileSystem>,
        partition: Rc<Partition>,
        path: String,
        id: FileId,
        mode: OpenMode,
        position: u64,
    ) -> File {
        File {
            fs,
            partition,
            path,
            id,
            mode,
            position,
            closed: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn access_mode(&self) -> OpenMode {
        self.mode
    }

    pub fn file_system(&self) -> &Rc<FileSystem> {
        &self.fs
    }

    pub fn partition(&self) -> &Rc<Partition> {
        &self.partition
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Read up to `bytes` from the current position, returning how many
    /// were read. Reads stop at the end of the file.
    ///
    /// The position is left untouched if the read fails.
    pub async fn read(&mut self, bytes: u64) -> FsResult<u64> {
        let position = self.position;
        let result = self.read_async(bytes)?.wait().await;
        if result.is_err() {
            self.position = position;
        }
        result
    }

    /// Write `bytes` at the current position, growing the file if needed.
    ///
    /// The position is left untouched if the write fails.
    pub async fn write(&mut self, bytes: u64) -> FsResult<u64> {
        let position = self.position;
        let result = self.write_async(bytes)?.wait().await;
        if result.is_err() {
            self.position = position;
        }
        result
    }

    /// Start a read. The position advances right away and is not moved
    /// back if the read fails.
    pub fn read_async(&mut self, bytes: u64) -> FsResult<Io> {
        self.start_read(bytes, false)
    }

    /// Start a write. The position advances and the written extent is
    /// reserved right away; the file grows once the write completes. A
    /// failure releases the reservation but does not move the position
    /// back.
    pub fn write_async(&mut self, bytes: u64) -> FsResult<Io> {
        self.start_write(bytes, false)
    }

    /// Like [`File::read_async`], for a read nobody has to wait on.
    pub fn read_detached(&mut self, bytes: u64) -> FsResult<Io> {
        self.start_read(bytes, true)
    }

    /// Like [`File::write_async`], for a write nobody has to wait on.
    pub fn write_detached(&mut self, bytes: u64) -> FsResult<Io> {
        self.start_write(bytes, true)
    }

    fn start_read(&mut self, bytes: u64, detached: bool) -> FsResult<Io> {
        self.check_open()?;

        if !self.mode.can_read() {
            return Err(FsError::InvalidArgument(format!(
                "cannot read {} opened in mode {}",
                self.path, self.mode
            )));
        }

        let size = self.size()?;
        let bytes = bytes.min(size.saturating_sub(self.position));
        if bytes == 0 {
            return Ok(Io::ready(0, detached));
        }

        self.position += bytes;

        // Background tasks run outside of the actor, capture its host now
        let partition = self.partition.clone();
        let issuer = partition.storage().issuer();
        let id = self.id;

        Ok(Io::spawn(detached, async move {
            partition.storage().read_as(issuer, bytes).await?;
            partition.record_access(id, crate::clock());
            Ok(bytes)
        }))
    }

    fn start_write(&mut self, bytes: u64, detached: bool) -> FsResult<Io> {
        self.check_open()?;

        if !self.mode.can_write() {
            return Err(FsError::InvalidArgument(format!(
                "cannot write {} opened in mode {}",
                self.path, self.mode
            )));
        }

        if bytes == 0 {
            return Ok(Io::ready(0, detached));
        }

        let write = self.partition.begin_write(self.id, self.position, bytes)?;
        self.position += bytes;

        let partition = self.partition.clone();
        let issuer = partition.storage().issuer();
        let id = self.id;

        Ok(Io::spawn(detached, async move {
            match partition.storage().write_as(issuer, bytes).await {
                Ok(_) => {
                    partition.commit_write(id, write, crate::clock());
                    Ok(bytes)
                }
                Err(e) => {
                    partition.abort_write(id, write);
                    Err(e)
                }
            }
        }))
    }

    /// Move the position. Positions past the end of the file are allowed,
    /// negative ones are not.
    pub fn seek(&mut self, pos: SeekFrom) -> FsResult<u64> {
        self.check_open()?;

        let (base, offset) = match pos {
            SeekFrom::Start(offset) => (0, i128::from(offset)),
            SeekFrom::Current(offset) => (self.position, i128::from(offset)),
            SeekFrom::End(offset) => (self.size()?, i128::from(offset)),
        };

        let target = i128::from(base) + offset;
        let position = u64::try_from(target)
            .map_err(|_| FsError::InvalidSeek(format!("{pos:?} in {} leads to {target}", self.path)))?;

        self.position = position;
        Ok(position)
    }

    pub fn tell(&self) -> u64 {
        self.position
    }

    pub fn stat(&self) -> FsResult<FileStat> {
        self.check_open()?;

        let meta = self
            .partition
            .metadata(self.id)
            .ok_or_else(|| FsError::FileNotFound(self.path.clone()))?;

        Ok(FileStat {
            size_in_bytes: meta.size,
            last_modification_date: meta.modified,
            last_access_date: meta.accessed,
            refcount: meta.refcount,
        })
    }

    /// Close the handle. In-flight operations keep going.
    pub fn close(&mut self) -> FsResult<()> {
        self.check_open()?;

        self.closed = true;
        self.partition.close(self.id);
        self.fs.release_open_file();

        Ok(())
    }

    fn size(&self) -> FsResult<u64> {
        self.partition
            .metadata(self.id)
            .map(|meta| meta.size)
            .ok_or_else(|| FsError::FileNotFound(self.path.clone()))
    }

    fn check_open(&self) -> FsResult<()> {
        if self.closed {
            return Err(FsError::FileClosed(self.path.clone()));
        }
        Ok(())
    }
}

impl Drop for File {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.close();
        }
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("position", &self.position)
            .field("closed", &self.closed)
            .finish()
    }
}
