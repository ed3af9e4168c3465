use crate::fs::{FsError, FsResult};
use crate::kernel::{DeviceOp, Direction, Phase, Plan};
use crate::{DiskId, HostId, TRACING_TARGET};

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// RAID levels a [`JbodStorage`] can be configured with.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Raid {
    /// Striping, no redundancy
    Raid0,
    /// Mirroring
    Raid1,
    /// Not supported: accepted by [`JbodStorage::set_raid_level`], but I/O
    /// fails.
    Raid2,
    /// Not supported, see [`Raid::Raid2`].
    Raid3,
    /// Striping with a dedicated parity disk, the last one
    Raid4,
    /// Striping with one rotating parity disk
    Raid5,
    /// Striping with two rotating parity disks
    Raid6,
}

impl Raid {
    fn min_disks(self) -> usize {
        match self {
            Raid::Raid0 | Raid::Raid1 => 2,
            Raid::Raid2 | Raid::Raid3 => 0,
            Raid::Raid4 | Raid::Raid5 => 3,
            Raid::Raid6 => 4,
        }
    }
}

impl fmt::Display for Raid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            Raid::Raid0 => 0,
            Raid::Raid1 => 1,
            Raid::Raid2 => 2,
            Raid::Raid3 => 3,
            Raid::Raid4 => 4,
            Raid::Raid5 => 5,
            Raid::Raid6 => 6,
        };
        write!(f, "RAID{level}")
    }
}

/// Just a bunch of disks on a single host, exposed as one storage.
///
/// The disks all operate in parallel: an operation lasts as long as the
/// slowest disk involved. With RAID4/5/6, writes also pay for the parity
/// computation on the host the disks are attached to. With RAID5/6 the
/// parity disks rotate, write after write, and reads route around them.
///
/// ```
/// use simfs::fs::{JbodStorage, Raid};
///
/// let mut sim = simfs::Builder::new().build();
/// let server = sim.host("server", sim.root_zone(), 200e6);
/// let disks = (0..4)
///     .map(|i| sim.disk(server, format!("disk{i}"), 2e6, 1e6))
///     .collect();
///
/// let jbod = JbodStorage::create("my_storage", disks)?;
/// assert_eq!(jbod.raid_level(), Raid::Raid0);
///
/// jbod.set_raid_level(Raid::Raid6)?;
/// assert_eq!(jbod.parity_disks().len(), 2);
/// # Ok::<(), simfs::fs::FsError>(())
/// ```
pub struct JbodStorage {
    name: String,

    disks: Vec<DiskId>,

    level: Cell<Raid>,

    /// Index of the current parity disk for RAID5, of the first of the two
    /// for RAID6
    parity: Cell<usize>,

    /// Next mirror to read from for RAID1
    mirror: Cell<usize>,

    /// Cost of the parity computation
    flops_per_byte: Cell<f64>,
}

impl JbodStorage {
    /// Create a RAID0 array out of `disks`, which must all be attached to the
    /// same host.
    pub fn create(name: impl Into<String>, disks: Vec<DiskId>) -> FsResult<Rc<JbodStorage>> {
        let name = name.into();

        let Some(first) = disks.first() else {
            return Err(FsError::InvalidArgument(format!("{name}: no disks")));
        };

        if disks.iter().any(|disk| disk.host() != first.host()) {
            return Err(FsError::InvalidArgument(format!(
                "{name}: disks must all be attached to the same host"
            )));
        }

        let storage = JbodStorage {
            name,
            parity: Cell::new(disks.len() - 1),
            disks,
            level: Cell::new(Raid::Raid0),
            mirror: Cell::new(0),
            flops_per_byte: Cell::new(1.0),
        };
        storage.check_disks(Raid::Raid0)?;

        Ok(Rc::new(storage))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn disks(&self) -> &[DiskId] {
        &self.disks
    }

    pub fn controller_host(&self) -> HostId {
        self.disks[0].host()
    }

    pub fn raid_level(&self) -> Raid {
        self.level.get()
    }

    /// Change the RAID level for every subsequent operation.
    pub fn set_raid_level(&self, level: Raid) -> FsResult<()> {
        self.check_disks(level)?;
        self.level.set(level);
        Ok(())
    }

    /// Flops spent per byte of parity, per parity disk. Defaults to 1.
    pub fn set_parity_flops_per_byte(&self, flops: f64) -> FsResult<()> {
        if !(flops.is_finite() && flops >= 0.0) {
            return Err(FsError::InvalidArgument(format!(
                "{}: invalid parity cost {flops}",
                self.name
            )));
        }
        self.flops_per_byte.set(flops);
        Ok(())
    }

    pub fn parity_flops_per_byte(&self) -> f64 {
        self.flops_per_byte.get()
    }

    /// The disks currently holding parity.
    pub fn parity_disks(&self) -> Vec<DiskId> {
        self.parity_indices()
            .into_iter()
            .map(|idx| self.disks[idx])
            .collect()
    }

    fn parity_indices(&self) -> Vec<usize> {
        let n = self.disks.len();
        let idx = self.parity.get();

        match self.level.get() {
            Raid::Raid4 => vec![n - 1],
            Raid::Raid5 => vec![idx],
            Raid::Raid6 => vec![idx, (idx + 1) % n],
            _ => vec![],
        }
    }

    fn check_disks(&self, level: Raid) -> FsResult<()> {
        if self.disks.len() < level.min_disks() {
            return Err(FsError::InvalidArgument(format!(
                "{}: {level} needs at least {} disks, got {}",
                self.name,
                level.min_disks(),
                self.disks.len()
            )));
        }
        Ok(())
    }

    /// Number of disks holding data, and number holding parity.
    fn layout(&self) -> FsResult<(usize, usize)> {
        let n = self.disks.len();

        match self.level.get() {
            Raid::Raid0 => Ok((n, 0)),
            Raid::Raid1 => Ok((1, 0)),
            Raid::Raid4 | Raid::Raid5 => Ok((n - 1, 1)),
            Raid::Raid6 => Ok((n - 2, 2)),
            level @ (Raid::Raid2 | Raid::Raid3) => Err(FsError::InvalidArgument(format!(
                "{}: {level} is not supported",
                self.name
            ))),
        }
    }

    pub(crate) fn plan_write(&self, issuer: HostId, bytes: u64) -> FsResult<Plan> {
        let level = self.level.get();
        let (data_disks, parity_disks) = self.layout()?;

        if matches!(level, Raid::Raid5 | Raid::Raid6) {
            let n = self.disks.len();
            self.parity.set((self.parity.get() + n - 1) % n);
        }

        let mut plan = Plan::new();
        let controller = self.controller_host();

        if issuer != controller {
            plan = plan.then(Phase::Transfer {
                src: issuer,
                dst: controller,
                bytes,
            });
        }

        if parity_disks > 0 {
            let flops = bytes as f64 / data_disks as f64
                * parity_disks as f64
                * self.flops_per_byte.get();
            plan = plan.then(Phase::Compute {
                host: controller,
                flops,
            });
        }

        // Mirrors receive the whole payload; everything else a stripe
        let stripe = bytes.div_ceil(data_disks as u64);
        let ops = self
            .disks
            .iter()
            .map(|disk| DeviceOp {
                disk: *disk,
                direction: Direction::Write,
                bytes: stripe,
            })
            .collect();

        Ok(plan.then(Phase::Device(ops)))
    }

    pub(crate) fn plan_read(&self, issuer: HostId, bytes: u64) -> FsResult<Plan> {
        let n = self.disks.len();
        let (data_disks, _) = self.layout()?;
        let stripe = bytes.div_ceil(data_disks as u64);

        let sources: Vec<usize> = match self.level.get() {
            Raid::Raid1 => {
                let mirror = self.mirror.get();
                self.mirror.set((mirror + 1) % n);
                vec![mirror]
            }
            Raid::Raid0 => (0..n).collect(),
            _ => {
                let parity = self.parity_indices();
                let sources: Vec<usize> = (0..n).filter(|idx| !parity.contains(idx)).collect();

                tracing::debug!(
                    target: TRACING_TARGET,
                    storage = %self.name,
                    "Parity disks are {}. Reading from: {}",
                    list(&parity, " and "),
                    list(&sources, " "),
                );

                sources
            }
        };

        let ops = sources
            .into_iter()
            .map(|idx| DeviceOp {
                disk: self.disks[idx],
                direction: Direction::Read,
                bytes: stripe,
            })
            .collect();

        let mut plan = Plan::new().then(Phase::Device(ops));
        let controller = self.controller_host();

        if issuer != controller {
            plan = plan.then(Phase::Transfer {
                src: controller,
                dst: issuer,
                bytes,
            });
        }

        Ok(plan)
    }
}

fn list(indices: &[usize], separator: &str) -> String {
    indices
        .iter()
        .map(|idx| format!("#{idx}"))
        .collect::<Vec<_>>()
        .join(separator)
}

impl fmt::Debug for JbodStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JbodStorage")
            .field("name", &self.name)
            .field("disks", &self.disks)
            .field("level", &self.level.get())
            .field("parity", &self.parity_indices())
            .finish()
    }
}
