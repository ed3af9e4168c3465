use crate::fs::{FsError, FsResult};
use crate::world::World;
use crate::TRACING_TARGET;

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;
use tokio::task::JoinHandle;

/// An in-flight read or write.
///
/// The operation starts as soon as the `Io` is created and makes progress
/// whether or not anyone waits on it. An *attached* `Io` is meant to be
/// waited on; dropping it unwaited logs a warning (the operation still
/// completes). A *detached* `Io` is fire-and-forget.
///
/// Either way the simulation does not complete before the operation does.
pub struct Io {
    /// Bytes moved, set once the operation completed
    done: Rc<Cell<u64>>,

    task: Option<JoinHandle<FsResult<u64>>>,

    /// Cached outcome, once waited on
    outcome: Option<FsResult<u64>>,

    detached: bool,
}

impl Io {
    /// Start `op` in the background.
    pub(crate) fn spawn<F>(detached: bool, op: F) -> Io
    where
        F: Future<Output = FsResult<u64>> + 'static,
    {
        let done = Rc::new(Cell::new(0));
        let activity = World::current(|world| world.track_activity());

        let task = tokio::task::spawn_local({
            let done = done.clone();
            async move {
                let res = op.await;
                if let Ok(bytes) = &res {
                    done.set(*bytes);
                }
                World::current(|world| world.untrack_activity(activity));
                res
            }
        });

        Io {
            done,
            task: Some(task),
            outcome: None,
            detached,
        }
    }

    /// An operation that completed on the spot.
    pub(crate) fn ready(bytes: u64, detached: bool) -> Io {
        Io {
            done: Rc::new(Cell::new(bytes)),
            task: None,
            outcome: Some(Ok(bytes)),
            detached,
        }
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Whether the operation completed, successfully or not.
    pub fn is_done(&self) -> bool {
        match &self.task {
            Some(task) => task.is_finished(),
            None => true,
        }
    }

    /// Bytes moved so far: zero while the operation is in flight, the full
    /// count once it completed.
    pub fn bytes_done(&self) -> u64 {
        self.done.get()
    }

    /// Wait for the operation to complete, returning the number of bytes
    /// moved. Waiting again returns the same outcome.
    pub async fn wait(&mut self) -> FsResult<u64> {
        if let Some(task) = self.task.take() {
            let res = match task.await {
                Ok(res) => res,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => Err(FsError::StorageFailure(e.to_string())),
            };
            self.outcome = Some(res);
        }

        self.outcome
            .clone()
            .unwrap_or_else(|| Err(FsError::StorageFailure("I/O outcome lost".to_string())))
    }
}

impl Drop for Io {
    fn drop(&mut self) {
        let unwaited = self.task.as_ref().is_some_and(|task| !task.is_finished());
        if !self.detached && unwaited {
            tracing::warn!(target: TRACING_TARGET, "Dropped an attached I/O activity without waiting on it");
        }
    }
}

impl std::fmt::Debug for Io {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Io")
            .field("detached", &self.detached)
            .field("done", &self.is_done())
            .field("bytes_done", &self.bytes_done())
            .finish()
    }
}

/// A group of in-flight operations.
#[derive(Debug, Default)]
pub struct IoSet {
    ios: Vec<Io>,
}

impl IoSet {
    pub fn new() -> IoSet {
        IoSet::default()
    }

    pub fn push(&mut self, io: Io) {
        self.ios.push(io);
    }

    pub fn len(&self) -> usize {
        self.ios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ios.is_empty()
    }

    /// Total bytes moved by the completed operations.
    pub fn bytes_done(&self) -> u64 {
        self.ios.iter().map(Io::bytes_done).sum()
    }

    /// Wait for every operation, in order. Returns the byte count of each, or
    /// the first error once all of them completed.
    pub async fn wait_all(&mut self) -> FsResult<Vec<u64>> {
        let mut counts = Vec::with_capacity(self.ios.len());
        let mut first_err = None;

        for io in &mut self.ios {
            match io.wait().await {
                Ok(bytes) => counts.push(bytes),
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(counts),
        }
    }
}

impl FromIterator<Io> for IoSet {
    fn from_iter<T: IntoIterator<Item = Io>>(iter: T) -> Self {
        IoSet {
            ios: iter.into_iter().collect(),
        }
    }
}
