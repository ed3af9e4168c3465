use crate::fs::{FileSystem, FsError, FsResult};
use crate::zone::Zones;
use crate::{ZoneId, TRACING_TARGET};

use indexmap::IndexMap;
use std::rc::Rc;

/// File systems registered against zones of the platform.
///
/// An actor reaches the file systems of its host's zone and of every
/// ancestor of that zone.
pub(crate) struct Registry {
    zones: IndexMap<ZoneId, IndexMap<String, Rc<FileSystem>>>,
}

impl Registry {
    pub(crate) fn new() -> Registry {
        Registry {
            zones: IndexMap::new(),
        }
    }

    /// Names are unique per zone.
    pub(crate) fn register(&mut self, zone: ZoneId, fs: &Rc<FileSystem>) -> FsResult<()> {
        let registered = self.zones.entry(zone).or_default();

        if registered.contains_key(fs.name()) {
            return Err(FsError::InvalidArgument(format!(
                "a file system named {} is already registered on zone {zone:?}",
                fs.name()
            )));
        }

        tracing::debug!(target: TRACING_TARGET, fs = fs.name(), ?zone, "Register file system");
        registered.insert(fs.name().to_string(), fs.clone());

        Ok(())
    }

    pub(crate) fn by_zone(&self, zone: ZoneId) -> IndexMap<String, Rc<FileSystem>> {
        self.zones.get(&zone).cloned().unwrap_or_default()
    }

    /// File systems visible from `zone`. When the same name is registered on
    /// several ancestors the nearest one wins.
    pub(crate) fn reachable_from(
        &self,
        zones: &Zones,
        zone: ZoneId,
    ) -> IndexMap<String, Rc<FileSystem>> {
        let mut reachable = IndexMap::new();

        for ancestor in zones.ancestors(zone) {
            let Some(registered) = self.zones.get(&ancestor) else {
                continue;
            };

            for (name, fs) in registered {
                reachable.entry(name.clone()).or_insert_with(|| fs.clone());
            }
        }

        reachable
    }
}
