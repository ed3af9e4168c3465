use crate::{ZoneId, TRACING_TARGET};

use std::rc::Rc;
use tokio::sync::Notify;

/// Identifies a host in the simulated platform.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct HostId(pub(crate) usize);

/// Identifies a disk attached to a simulated host.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct DiskId {
    pub(crate) index: usize,
    pub(crate) host: HostId,
}

impl DiskId {
    /// The host this disk is attached to.
    pub fn host(&self) -> HostId {
        self.host
    }
}

/// A compute node of the simulated platform.
pub(crate) struct Host {
    pub(crate) name: String,

    /// Zone the host was created in
    pub(crate) zone: ZoneId,

    /// Compute speed, in flops per second
    pub(crate) speed: f64,

    /// Disks attached to this host, in creation order
    pub(crate) disks: Vec<DiskId>,
}

impl Host {
    pub(crate) fn new(name: String, zone: ZoneId, speed: f64) -> Host {
        assert!(speed > 0.0, "host speed must be positive");

        Host {
            name,
            zone,
            speed,
            disks: Vec::new(),
        }
    }
}

/// A simulated block device.
///
/// Disks can be turned off and back on. Operations that are running on a
/// disk when it goes down fail; the generation counter lets an operation
/// detect an off/on cycle that happened while it was sleeping.
pub(crate) struct Disk {
    pub(crate) name: String,

    /// Bytes per second
    pub(crate) read_bandwidth: f64,

    /// Bytes per second
    pub(crate) write_bandwidth: f64,

    on: bool,

    /// Incremented every time the disk is turned off
    generation: u64,

    /// Signaled when the disk is turned off
    failure: Rc<Notify>,
}

impl Disk {
    pub(crate) fn new(name: String, read_bandwidth: f64, write_bandwidth: f64) -> Disk {
        assert!(
            read_bandwidth > 0.0 && write_bandwidth > 0.0,
            "disk bandwidth must be positive"
        );

        Disk {
            name,
            read_bandwidth,
            write_bandwidth,
            on: true,
            generation: 0,
            failure: Rc::new(Notify::new()),
        }
    }

    pub(crate) fn is_on(&self) -> bool {
        self.on
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn failure(&self) -> Rc<Notify> {
        self.failure.clone()
    }

    pub(crate) fn turn_off(&mut self) {
        if !self.on {
            return;
        }

        tracing::warn!(target: TRACING_TARGET, disk = %self.name, "Turned off");

        self.on = false;
        self.generation += 1;
        self.failure.notify_waiters();
    }

    pub(crate) fn turn_on(&mut self) {
        if self.on {
            return;
        }

        tracing::debug!(target: TRACING_TARGET, disk = %self.name, "Turned on");
        self.on = true;
    }
}
