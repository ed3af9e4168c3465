//! Simulated storages partitions are backed by.
//!
//! A storage turns a read or a write of N bytes into an I/O plan: the network
//! transfers, parity computations and disk operations that realize it. The
//! plan is then executed against the simulated platform, which is what makes
//! simulated time pass.

mod jbod;
pub use jbod::{JbodStorage, Raid};

mod one_disk;
pub use one_disk::OneDiskStorage;

mod remote;
pub use remote::OneRemoteDiskStorage;

use crate::fs::FsResult;
use crate::kernel::Plan;
use crate::{DiskId, HostId};

use std::rc::Rc;
use std::time::Duration;

/// One of the storage variants.
///
/// Cloning a storage is cheap and yields a handle to the same device: RAID
/// state, for instance, is shared by every clone of a [`JbodStorage`].
#[derive(Clone, Debug)]
pub enum Storage {
    OneDisk(Rc<OneDiskStorage>),
    OneRemoteDisk(Rc<OneRemoteDiskStorage>),
    Jbod(Rc<JbodStorage>),
}

impl Storage {
    pub fn name(&self) -> &str {
        match self {
            Storage::OneDisk(s) => s.name(),
            Storage::OneRemoteDisk(s) => s.name(),
            Storage::Jbod(s) => s.name(),
        }
    }

    /// The host the disks of the storage are attached to.
    pub fn controller_host(&self) -> HostId {
        match self {
            Storage::OneDisk(s) => s.disk().host(),
            Storage::OneRemoteDisk(s) => s.disk().host(),
            Storage::Jbod(s) => s.controller_host(),
        }
    }

    pub fn disks(&self) -> Vec<DiskId> {
        match self {
            Storage::OneDisk(s) => vec![s.disk()],
            Storage::OneRemoteDisk(s) => vec![s.disk()],
            Storage::Jbod(s) => s.disks().to_vec(),
        }
    }

    /// Read `bytes` on behalf of the current actor, returning the simulated
    /// time it took.
    ///
    /// Must be called from within a simfs simulation.
    pub async fn read(&self, bytes: u64) -> FsResult<Duration> {
        self.read_as(self.issuer(), bytes).await
    }

    /// Write `bytes` on behalf of the current actor, returning the simulated
    /// time it took.
    ///
    /// Must be called from within a simfs simulation.
    pub async fn write(&self, bytes: u64) -> FsResult<Duration> {
        self.write_as(self.issuer(), bytes).await
    }

    pub(crate) async fn read_as(&self, issuer: HostId, bytes: u64) -> FsResult<Duration> {
        let plan = self.plan_read(issuer, bytes)?;
        plan.execute(self.name()).await
    }

    pub(crate) async fn write_as(&self, issuer: HostId, bytes: u64) -> FsResult<Duration> {
        let plan = self.plan_write(issuer, bytes)?;
        plan.execute(self.name()).await
    }

    pub(crate) fn plan_read(&self, issuer: HostId, bytes: u64) -> FsResult<Plan> {
        match self {
            Storage::OneDisk(s) => Ok(s.plan_read(bytes)),
            Storage::OneRemoteDisk(s) => Ok(s.plan_read(issuer, bytes)),
            Storage::Jbod(s) => s.plan_read(issuer, bytes),
        }
    }

    pub(crate) fn plan_write(&self, issuer: HostId, bytes: u64) -> FsResult<Plan> {
        match self {
            Storage::OneDisk(s) => Ok(s.plan_write(bytes)),
            Storage::OneRemoteDisk(s) => Ok(s.plan_write(issuer, bytes)),
            Storage::Jbod(s) => s.plan_write(issuer, bytes),
        }
    }

    /// Host issuing the I/O: the current actor's, or the controller's when
    /// running outside of an actor.
    pub(crate) fn issuer(&self) -> HostId {
        crate::current_host().unwrap_or_else(|| self.controller_host())
    }
}

impl From<Rc<OneDiskStorage>> for Storage {
    fn from(storage: Rc<OneDiskStorage>) -> Self {
        Storage::OneDisk(storage)
    }
}

impl From<Rc<OneRemoteDiskStorage>> for Storage {
    fn from(storage: Rc<OneRemoteDiskStorage>) -> Self {
        Storage::OneRemoteDisk(storage)
    }
}

impl From<Rc<JbodStorage>> for Storage {
    fn from(storage: Rc<JbodStorage>) -> Self {
        Storage::Jbod(storage)
    }
}

impl From<&Rc<OneDiskStorage>> for Storage {
    fn from(storage: &Rc<OneDiskStorage>) -> Self {
        Storage::OneDisk(storage.clone())
    }
}

impl From<&Rc<OneRemoteDiskStorage>> for Storage {
    fn from(storage: &Rc<OneRemoteDiskStorage>) -> Self {
        Storage::OneRemoteDisk(storage.clone())
    }
}

impl From<&Rc<JbodStorage>> for Storage {
    fn from(storage: &Rc<JbodStorage>) -> Self {
        Storage::Jbod(storage.clone())
    }
}
