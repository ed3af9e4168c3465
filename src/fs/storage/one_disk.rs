use crate::kernel::{DeviceOp, Direction, Phase, Plan};
use crate::DiskId;

use std::rc::Rc;

/// A storage made of a single disk, local to the actors using it.
///
/// Reading or writing N bytes takes as long as the disk needs to move N
/// bytes at its read or write bandwidth.
#[derive(Debug)]
pub struct OneDiskStorage {
    name: String,
    disk: DiskId,
}

impl OneDiskStorage {
    pub fn create(name: impl Into<String>, disk: DiskId) -> Rc<OneDiskStorage> {
        Rc::new(OneDiskStorage {
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

    pub(crate) fn plan_read(&self, bytes: u64) -> Plan {
        Plan::new().then(self.device(Direction::Read, bytes))
    }

    pub(crate) fn plan_write(&self, bytes: u64) -> Plan {
        Plan::new().then(self.device(Direction::Write, bytes))
    }

    fn device(&self, direction: Direction, bytes: u64) -> Phase {
        Phase::Device(vec![DeviceOp {
            disk: self.disk,
            direction,
            bytes,
        }])
    }
}
