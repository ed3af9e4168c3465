//! Execution of simulated I/O plans.
//!
//! Storages describe an operation as a [`Plan`]: a sequence of network
//! transfers, computations and device operations. The kernel turns each
//! phase into simulated time against the current [`World`] and watches the
//! participating disks for failures.

use crate::fs::{FsError, FsResult};
use crate::world::World;
use crate::{DiskId, HostId, TRACING_TARGET};

use futures::future::{select_all, FutureExt};
use std::time::Duration;
use tokio::time::sleep;

/// Direction of a device operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Direction {
    Read,
    Write,
}

/// One disk taking part in a device phase.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DeviceOp {
    pub(crate) disk: DiskId,
    pub(crate) direction: Direction,
    pub(crate) bytes: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Phase {
    /// Move bytes over the link between two hosts
    Transfer { src: HostId, dst: HostId, bytes: u64 },

    /// Run a computation on a host
    Compute { host: HostId, flops: f64 },

    /// Disks operating in parallel; the phase lasts as long as the slowest
    Device(Vec<DeviceOp>),
}

/// What a storage has to do to serve a read or a write.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Plan {
    pub(crate) phases: Vec<Phase>,
}

impl Plan {
    pub(crate) fn new() -> Plan {
        Plan::default()
    }

    pub(crate) fn then(mut self, phase: Phase) -> Plan {
        self.phases.push(phase);
        self
    }

    /// Run every phase in order, returning the simulated time it took.
    pub(crate) async fn execute(&self, storage: &str) -> FsResult<Duration> {
        let start = World::current(|world| world.elapsed());

        for phase in &self.phases {
            match phase {
                Phase::Device(ops) => device(storage, ops).await?,
                _ => {
                    let duration = World::current(|world| phase_duration(world, phase));
                    tracing::trace!(target: TRACING_TARGET, ?phase, ?duration, storage, "Execute");

                    if !duration.is_zero() {
                        sleep(duration).await;
                    }
                }
            }
        }

        Ok(World::current(|world| world.elapsed()) - start)
    }
}

/// Convert seconds to a [`Duration`], rounded to the closest nanosecond so
/// that floating point noise does not leak into the simulated clock.
pub(crate) fn secs(value: f64) -> Duration {
    Duration::from_nanos((value * 1e9).round() as u64)
}

fn phase_duration(world: &World, phase: &Phase) -> Duration {
    match phase {
        Phase::Transfer { src, dst, bytes } => world.topology.transfer_time(*src, *dst, *bytes),
        Phase::Compute { host, flops } => secs(flops / world.host(*host).speed),
        Phase::Device(ops) => device_phase_time(world, ops),
    }
}

fn device_phase_time(world: &World, ops: &[DeviceOp]) -> Duration {
    ops.iter()
        .map(|op| device_time(world, op))
        .max()
        .unwrap_or_default()
}

fn device_time(world: &World, op: &DeviceOp) -> Duration {
    let disk = world.disk(op.disk);
    let bandwidth = match op.direction {
        Direction::Read => disk.read_bandwidth,
        Direction::Write => disk.write_bandwidth,
    };

    secs(op.bytes as f64 / bandwidth)
}

async fn device(storage: &str, ops: &[DeviceOp]) -> FsResult<()> {
    let (duration, watched) = World::current(|world| {
        let mut watched = Vec::with_capacity(ops.len());

        for op in ops {
            let disk = world.disk(op.disk);
            if !disk.is_on() {
                return Err(failure(storage, &disk.name));
            }
            watched.push((op.disk, disk.generation(), disk.failure()));
        }

        Ok((device_phase_time(world, ops), watched))
    })?;

    tracing::trace!(target: TRACING_TARGET, ?ops, ?duration, storage, "Execute");

    if !duration.is_zero() && !watched.is_empty() {
        let failures = select_all(
            watched
                .iter()
                .map(|(_, _, notify)| notify.notified().boxed_local()),
        );

        tokio::select! {
            _ = sleep(duration) => {}
            _ = failures => {}
        }
    }

    // A disk that went down, even briefly, while the phase was running
    // invalidates the whole operation.
    World::current(|world| {
        for (id, generation, _) in &watched {
            let disk = world.disk(*id);
            if !disk.is_on() || disk.generation() != *generation {
                return Err(failure(storage, &disk.name));
            }
        }
        Ok(())
    })
}

fn failure(storage: &str, disk: &str) -> FsError {
    tracing::warn!(target: TRACING_TARGET, storage, disk, "Storage failure");
    FsError::StorageFailure(format!("{storage} (disk {disk})"))
}
