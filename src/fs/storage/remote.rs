use crate::kernel::{DeviceOp, Direction, Phase, Plan};
use crate::{DiskId, HostId};

use std::rc::Rc;

/// A storage made of a single disk that may sit on another host than the
/// actors using it.
///
/// Writes ship the data to the disk host, then write it. Reads read the data
/// on the disk host, then ship it back. When the actor runs on the disk host
/// itself there is nothing to ship.
#[derive(Debug)]
pub struct OneRemoteDiskStorage {
    name: String,
    disk: DiskId,
}

impl OneRemoteDiskStorage {
    pub fn create(name: impl Into<String>, disk: DiskId) -> Rc<OneRemoteDiskStorage> {
        Rc::new(OneRemoteDiskStorage {
            name: name.into(),
            disk,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn disk(&self) -> DiskId {
        self.disk
    }

    pub(crate) fn plan_read(&self, issuer: HostId, bytes: u64) -> Plan {
        let plan = Plan::new().then(self.device(Direction::Read, bytes));
        match self.transfer(self.disk.host(), issuer, bytes) {
            Some(transfer) => plan.then(transfer),
            None => plan,
        }
    }

    pub(crate) fn plan_write(&self, issuer: HostId, bytes: u64) -> Plan {
        let plan = match self.transfer(issuer, self.disk.host(), bytes) {
            Some(transfer) => Plan::new().then(transfer),
            None => Plan::new(),
        };
        plan.then(self.device(Direction::Write, bytes))
    }

    fn transfer(&self, src: HostId, dst: HostId, bytes: u64) -> Option<Phase> {
        (src != dst).then_some(Phase::Transfer { src, dst, bytes })
    }

    fn device(&self, direction: Direction, bytes: u64) -> Phase {
        Phase::Device(vec![DeviceOp {
            disk: self.disk,
            direction,
            bytes,
        }])
    }
}
