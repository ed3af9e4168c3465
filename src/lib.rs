//! simfs is a framework for simulating file systems on top of simulated
//! storage hardware. It provides deterministic execution by running every
//! simulated application task (an *actor*) within a single thread, against a
//! virtual clock. Reads and writes take exactly as long as the simulated
//! disks, links and hosts behind them dictate.
//!
//! # Platform and actors
//!
//! A simulation is comprised of a platform and actors. The platform is a tree
//! of zones containing hosts; hosts have a compute speed and may carry disks.
//! Hosts talk over links with a bandwidth and a latency.
//!
//! Actors are `Future`s bound to a host. The simulation completes when every
//! actor has returned and every I/O it issued has finished.
//!
//! ```
//! use simfs::fs::{CachingScheme, FileSystem, OneDiskStorage};
//! use simfs::units::{KB, MB};
//!
//! let mut sim = simfs::Builder::new().build();
//!
//! // describe the platform
//! let zone = sim.zone("zone", sim.root_zone());
//! let host = sim.host("my_host", zone, 100e9);
//! let disk = sim.disk(host, "disk", 2e6, 1e6);
//!
//! // build a file system on top of it
//! let storage = OneDiskStorage::create("my_storage", disk);
//! let fs = FileSystem::create("my_fs");
//! fs.mount_partition("/dev/a", storage, 100 * MB, CachingScheme::None)?;
//!
//! // define the application
//! sim.actor(host, "app", async move {
//!     fs.create_file("/dev/a/foo.txt", 10 * KB)?;
//!
//!     let mut file = fs.open("/dev/a/foo.txt", "r")?;
//!     assert_eq!(file.read(100 * KB).await?, 10 * KB);
//!     file.close()?;
//!
//!     Ok(())
//! });
//!
//! // run the simulation and handle the result
//! sim.run()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # File systems
//!
//! The [`fs`] module contains the file system layer: file systems, their
//! partitions and caching policies, files, and the storages (single disks,
//! remote disks and RAID arrays) partitions are backed by.
//!
//! # Tracing
//!
//! The `tracing` crate is used to emit important events during the lifetime of
//! a simulation. To enable traces, your tests must install a
//! [`tracing-subscriber`](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/).
//! The log level of simfs can be configured using `RUST_LOG=simfs=debug`.
//! `RUST_LOG=simfs=trace` shows every phase of every I/O plan.

mod actor;
pub use actor::Actor;

mod builder;
pub use builder::Builder;

mod config;

mod error;
pub use error::Result;

pub mod fs;

mod host;
pub use host::{DiskId, HostId};

mod kernel;

mod rt;
use rt::Rt;

mod sim;
pub use sim::Sim;

mod top;
use top::Topology;

pub mod units;

mod world;
use world::World;

mod zone;
pub use zone::ZoneId;

use fs::{FileSystem, FsResult};
use indexmap::IndexMap;
use std::rc::Rc;
use std::time::Duration;

const TRACING_TARGET: &str = "simfs";

/// Returns how long the simulation has been executing for in virtual time.
///
/// Must be called from within a simfs simulation.
pub fn elapsed() -> Duration {
    World::current(|world| world.elapsed())
}

/// Returns how long the simulation has been executing for in virtual time.
///
/// Will return None when called outside a running simulation.
pub fn sim_elapsed() -> Option<Duration> {
    World::try_current(|world| world.elapsed())
}

/// Simulated clock used to timestamp file metadata. Reads zero while the
/// simulation is not running, e.g. while the platform is being set up.
pub(crate) fn clock() -> Duration {
    sim_elapsed().unwrap_or_default()
}

/// The actor executing the calling code, if any.
pub fn current_actor() -> Option<Actor> {
    Actor::current()
}

/// The host of the actor executing the calling code, if any.
pub fn current_host() -> Option<HostId> {
    Actor::current().map(|actor| actor.host())
}

/// Name of a host.
///
/// Must be called from within a simfs simulation.
pub fn host_name(host: HostId) -> String {
    World::current(|world| world.host(host).name.clone())
}

/// Turn a disk off. Every operation running on it fails with a storage
/// failure, and new operations fail until it is turned back on.
///
/// Must be called from within a simfs simulation.
pub fn turn_off_disk(disk: DiskId) {
    World::current(|world| world.disk_mut(disk).turn_off())
}

/// The opposite of [`turn_off_disk`].
///
/// Must be called from within a simfs simulation.
pub fn turn_on_disk(disk: DiskId) {
    World::current(|world| world.disk_mut(disk).turn_on())
}

/// Must be called from within a simfs simulation.
pub fn is_disk_on(disk: DiskId) -> bool {
    World::current(|world| world.disk(disk).is_on())
}

/// Register a file system on `zone`, or on the root zone if `None`.
///
/// Must be called from within a simfs simulation. Use
/// [`Sim::register_file_system`] while setting the simulation up.
pub fn register_file_system(zone: Option<ZoneId>, fs: &Rc<FileSystem>) -> FsResult<()> {
    World::current(|world| {
        let zone = zone.unwrap_or_else(|| world.zones.root());
        world.registry.register(zone, fs)
    })
}

/// Every file system reachable by `actor`: those registered on the zone of
/// its host and on all the ancestors of that zone. Without an actor only the
/// file systems registered on the root zone are reachable.
///
/// Must be called from within a simfs simulation.
pub fn file_systems_by_actor(actor: Option<&Actor>) -> IndexMap<String, Rc<FileSystem>> {
    World::current(|world| {
        let zone = match actor {
            Some(actor) => world.host(actor.host()).zone,
            None => world.zones.root(),
        };

        world.registry.reachable_from(&world.zones, zone)
    })
}

/// File systems registered directly on `zone`, keyed by name.
///
/// Must be called from within a simfs simulation.
pub fn file_systems_by_zone(zone: ZoneId) -> IndexMap<String, Rc<FileSystem>> {
    World::current(|world| world.registry.by_zone(zone))
}
