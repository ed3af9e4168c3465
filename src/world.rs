use crate::fs::Registry;
use crate::host::{Disk, Host};
use crate::zone::Zones;
use crate::{config, DiskId, HostId, Topology, ZoneId};

use indexmap::IndexSet;
use scoped_tls::scoped_thread_local;
use std::cell::RefCell;
use std::time::Duration;
use tokio::time::Instant;

/// Tracks all the state for the simulated world.
pub(crate) struct World {
    /// The zone hierarchy hosts live in
    pub(crate) zones: Zones,

    /// Tracks all individual hosts
    pub(crate) hosts: Vec<Host>,

    /// Tracks every disk, across all hosts
    pub(crate) disks: Vec<Disk>,

    /// Tracks how each host is connected to each other.
    pub(crate) topology: Topology,

    /// File systems registered against zones
    pub(crate) registry: Registry,

    /// I/O activities that have been issued and have not completed yet.
    activities: IndexSet<u64>,

    next_activity: u64,

    /// Instant the simulation started at.
    epoch: Instant,
}

scoped_thread_local!(static CURRENT: RefCell<World>);

impl World {
    /// Initialize a new world
    pub(crate) fn new(link: config::Link, epoch: Instant) -> World {
        World {
            zones: Zones::new(),
            hosts: Vec::new(),
            disks: Vec::new(),
            topology: Topology::new(link),
            registry: Registry::new(),
            activities: IndexSet::new(),
            next_activity: 0,
            epoch,
        }
    }

    /// Run a function with the current world.
    ///
    /// # Panics
    ///
    /// Panics if called outside a running simulation.
    pub(crate) fn current<R>(f: impl FnOnce(&mut World) -> R) -> R {
        CURRENT.with(|current| {
            let mut current = current.borrow_mut();
            f(&mut current)
        })
    }

    /// Like [`World::current`], returning `None` outside a running simulation.
    pub(crate) fn try_current<R>(f: impl FnOnce(&mut World) -> R) -> Option<R> {
        if CURRENT.is_set() {
            Some(Self::current(f))
        } else {
            None
        }
    }

    pub(crate) fn enter<R>(world: &RefCell<World>, f: impl FnOnce() -> R) -> R {
        CURRENT.set(world, f)
    }

    /// How long the simulation has been running. Only meaningful from
    /// within the simulation runtime.
    pub(crate) fn elapsed(&self) -> Duration {
        Instant::now().saturating_duration_since(self.epoch)
    }

    pub(crate) fn epoch(&self) -> Instant {
        self.epoch
    }

    pub(crate) fn host(&self, id: HostId) -> &Host {
        self.hosts.get(id.0).expect("host missing")
    }

    pub(crate) fn disk(&self, id: DiskId) -> &Disk {
        self.disks.get(id.index).expect("disk missing")
    }

    pub(crate) fn disk_mut(&mut self, id: DiskId) -> &mut Disk {
        self.disks.get_mut(id.index).expect("disk missing")
    }

    pub(crate) fn add_host(&mut self, name: String, zone: ZoneId, speed: f64) -> HostId {
        assert!(
            self.host_by_name(&name).is_none(),
            "host {name} is already registered"
        );
        assert!(
            self.zones.iter().any(|z| z == zone),
            "unknown zone {zone:?}"
        );

        self.hosts.push(Host::new(name, zone, speed));
        HostId(self.hosts.len() - 1)
    }

    pub(crate) fn add_disk(
        &mut self,
        host: HostId,
        name: String,
        read_bandwidth: f64,
        write_bandwidth: f64,
    ) -> DiskId {
        let id = DiskId {
            index: self.disks.len(),
            host,
        };
        let disks = &self.hosts.get(host.0).expect("host missing").disks;
        assert!(
            disks.iter().all(|d| self.disks[d.index].name != name),
            "disk {name} is already attached to host {host:?}"
        );

        self.disks.push(Disk::new(name, read_bandwidth, write_bandwidth));
        self.hosts[host.0].disks.push(id);

        id
    }

    pub(crate) fn host_by_name(&self, name: &str) -> Option<HostId> {
        self.hosts.iter().position(|h| h.name == name).map(HostId)
    }

    /// Start tracking a new I/O activity, returning its identifier.
    pub(crate) fn track_activity(&mut self) -> u64 {
        let id = self.next_activity;
        self.next_activity += 1;
        self.activities.insert(id);
        id
    }

    pub(crate) fn untrack_activity(&mut self, id: u64) {
        self.activities.swap_remove(&id);
    }

    pub(crate) fn pending_activities(&self) -> usize {
        self.activities.len()
    }
}
