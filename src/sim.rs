use crate::fs::{FileSystem, FsResult};
use crate::{config::Config, config::Link, Actor, DiskId, HostId, Result, Rt, World, ZoneId};
use crate::TRACING_TARGET;

use indexmap::IndexMap;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A simulation of hosts, disks and the file systems built on top of them.
///
/// The platform (zones, hosts, disks, links) is declared up front, then
/// actors are spawned on hosts and [`Sim::run`] drives everything to
/// completion in simulated time.
pub struct Sim {
    /// Configuration for the simulation
    config: Config,

    /// Tracks the simulated world state
    ///
    /// This is what is stored in the thread-local
    world: RefCell<World>,

    /// Runtime shared by every actor
    rt: Rt,

    /// Handles to running actors, keyed by actor name. Consumed when the
    /// actor finishes to check for errors.
    actors: IndexMap<Arc<str>, Option<JoinHandle<Result>>>,

    /// Simulation elapsed time
    elapsed: Duration,

    steps: usize,
}

impl Sim {
    pub(crate) fn new(config: Config, link: Link) -> Sim {
        let rt = Rt::new();
        let world = World::new(link, rt.now());

        Sim {
            config,
            world: RefCell::new(world),
            rt,
            actors: IndexMap::new(),
            elapsed: Duration::ZERO,
            steps: 0,
        }
    }

    /// The zone every other zone descends from.
    pub fn root_zone(&self) -> ZoneId {
        self.world.borrow().zones.root()
    }

    /// Create a new zone under `parent`.
    ///
    /// # Panics
    ///
    /// Panics if a zone with the same name already exists.
    pub fn zone(&mut self, name: impl Into<String>, parent: ZoneId) -> ZoneId {
        self.world.get_mut().zones.add(name.into(), parent)
    }

    /// Look up a zone by name.
    pub fn zone_by_name(&self, name: &str) -> Option<ZoneId> {
        self.world.borrow().zones.by_name(name)
    }

    /// Every zone of the platform, the root first.
    pub fn zones(&self) -> Vec<ZoneId> {
        self.world.borrow().zones.iter().collect()
    }

    pub fn zone_name(&self, zone: ZoneId) -> String {
        self.world.borrow().zones.name(zone).to_string()
    }

    /// Create a host in `zone` computing at `speed` flops per second.
    pub fn host(&mut self, name: impl Into<String>, zone: ZoneId, speed: f64) -> HostId {
        self.world.get_mut().add_host(name.into(), zone, speed)
    }

    /// Look up a host by name.
    pub fn host_by_name(&self, name: &str) -> Option<HostId> {
        self.world.borrow().host_by_name(name)
    }

    /// Attach a disk to `host`. Bandwidths are in bytes per second.
    pub fn disk(
        &mut self,
        host: HostId,
        name: impl Into<String>,
        read_bandwidth: f64,
        write_bandwidth: f64,
    ) -> DiskId {
        self.world
            .get_mut()
            .add_disk(host, name.into(), read_bandwidth, write_bandwidth)
    }

    /// Connect two hosts with a dedicated link, overriding the default one.
    /// `bandwidth` is in bytes per second.
    pub fn link(&mut self, a: HostId, b: HostId, bandwidth: f64, latency: Duration) {
        self.world
            .get_mut()
            .topology
            .register(a, b, Link { bandwidth, latency });
    }

    /// Turn a disk off. Operations running on it fail.
    pub fn turn_off_disk(&mut self, disk: DiskId) {
        self.world.get_mut().disk_mut(disk).turn_off();
    }

    pub fn turn_on_disk(&mut self, disk: DiskId) {
        self.world.get_mut().disk_mut(disk).turn_on();
    }

    pub fn is_disk_on(&self, disk: DiskId) -> bool {
        self.world.borrow().disk(disk).is_on()
    }

    /// Register a file system on `zone`, or on the root zone if `None`.
    pub fn register_file_system(
        &mut self,
        zone: Option<ZoneId>,
        fs: &Rc<FileSystem>,
    ) -> FsResult<()> {
        let world = self.world.get_mut();
        let zone = zone.unwrap_or_else(|| world.zones.root());
        world.registry.register(zone, fs)
    }

    /// File systems registered directly on `zone`, keyed by name.
    pub fn file_systems_by_zone(&self, zone: ZoneId) -> IndexMap<String, Rc<FileSystem>> {
        self.world.borrow().registry.by_zone(zone)
    }

    /// Spawn an actor on `host`.
    ///
    /// The simulation completes once every actor has returned. An actor
    /// returning an error fails the simulation.
    ///
    /// # Panics
    ///
    /// Panics if an actor with the same name already exists.
    pub fn actor<F>(&mut self, host: HostId, name: impl Into<String>, actor: F)
    where
        F: Future<Output = Result> + 'static,
    {
        let name: Arc<str> = name.into().into();
        assert!(
            !self.actors.contains_key(&name),
            "actor {name} is already registered"
        );
        // validate the host before it is captured by the actor
        let _ = self.world.borrow().host(host);

        let ctx = Actor::new(name.clone(), host);
        let handle = World::enter(&self.world, || {
            self.rt.spawn(ctx.scope(async move {
                tracing::debug!(target: TRACING_TARGET, "Actor started");
                let res = actor.await;
                tracing::debug!(target: TRACING_TARGET, ok = res.is_ok(), "Actor finished");
                res
            }))
        });

        self.actors.insert(name, Some(handle));
    }

    /// How long the simulation has been running in virtual time.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Whether the named actor has returned.
    ///
    /// # Panics
    ///
    /// Panics if no actor has this name.
    pub fn is_actor_finished(&self, name: &str) -> bool {
        match self.actors.get(name) {
            Some(handle) => handle.is_none(),
            None => panic!("actor {name} is not registered"),
        }
    }

    /// Run the simulation to completion.
    ///
    /// Executes a simple event loop that calls [step](#method.step) each
    /// iteration, returning early if any actor errors. The simulation is done
    /// once every actor has returned and every I/O activity, detached ones
    /// included, has completed.
    pub fn run(&mut self) -> Result {
        loop {
            let is_finished = self.step()?;

            if is_finished {
                return Ok(());
            }
        }
    }

    /// Step the simulation.
    ///
    /// Runs every task scheduled within one tick of simulated time, then
    /// collects the actors that finished. Returns whether the simulation is
    /// done.
    ///
    /// Returns an error if an actor failed, or if the configured simulation
    /// duration elapsed before completion.
    pub fn step(&mut self) -> Result<bool> {
        tracing::trace!(target: TRACING_TARGET, "step {}", self.steps);

        let world = &self.world;
        let rt = &self.rt;

        World::enter(world, || rt.tick(self.config.tick));
        self.elapsed = rt.now().saturating_duration_since(world.borrow().epoch());
        self.steps += 1;

        for (name, slot) in self.actors.iter_mut() {
            let finished = slot.as_ref().is_some_and(|handle| handle.is_finished());
            if !finished {
                continue;
            }

            let Some(handle) = slot.take() else { continue };
            match World::enter(world, || rt.join(handle)) {
                Ok(res) => {
                    if let Err(e) = res {
                        tracing::error!(target: TRACING_TARGET, actor = %name, error = %e, "Actor failed");
                        return Err(e);
                    }
                }
                Err(je) if je.is_panic() => std::panic::resume_unwind(je.into_panic()),
                Err(je) => return Err(je.into()),
            }
        }

        let is_finished = self.actors.values().all(Option::is_none)
            && world.borrow().pending_activities() == 0;

        if !is_finished && self.elapsed >= self.config.duration {
            return Err(format!(
                "Ran for duration: {:?} steps: {} without completing",
                self.config.duration, self.steps,
            )
            .into());
        }

        Ok(is_finished)
    }
}
