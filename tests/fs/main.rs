//! Tests for simulated file systems.
//!
//! Test modules:
//! - `caching`: FIFO and LRU eviction
//! - `directories`: Directory operations and moves
//! - `failures`: Disks turned off under running I/O
//! - `files`: Opening, reading, writing, seeking and truncating files
//! - `io`: Asynchronous and detached operations
//! - `jbod`: RAID arrays
//! - `register`: File system registration against zones
//! - `remote`: Disks accessed over the network

use simfs::fs::{CachingScheme, FileSystem, OneDiskStorage};
use simfs::units::MB;
use simfs::{DiskId, HostId, Sim};
use std::rc::Rc;

mod directories;
mod failures;
mod io;
mod jbod;
mod register;

/// A host with a single disk reading at 2MB/s and writing at 1MB/s.
struct OneDisk {
    sim: Sim,
    host: HostId,
    disk: DiskId,
}

fn one_disk() -> OneDisk {
    let mut sim = simfs::Builder::new().build();
    let zone = sim.zone("zone", sim.root_zone());
    let host = sim.host("host", zone, 100e9);
    let disk = sim.disk(host, "disk", 2e6, 1e6);

    OneDisk { sim, host, disk }
}

/// A file system with a single partition of `size` bytes mounted at
/// `/dev/a` on top of `disk`.
fn mounted(disk: DiskId, size: u64, scheme: CachingScheme) -> simfs::Result<Rc<FileSystem>> {
    let storage = OneDiskStorage::create("storage", disk);
    let fs = FileSystem::create("fs");
    fs.mount_partition("/dev/a", storage, size, scheme)?;
    Ok(fs)
}

fn default_fs(disk: DiskId) -> simfs::Result<Rc<FileSystem>> {
    mounted(disk, 100 * MB, CachingScheme::None)
}
