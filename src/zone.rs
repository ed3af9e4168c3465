/// Identifies a zone of the simulated platform.
///
/// Zones form a tree rooted at [`Sim::root_zone`]. Hosts live in exactly one
/// zone, and file systems are registered against zones to control which
/// actors can reach them.
///
/// [`Sim::root_zone`]: crate::Sim::root_zone
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct ZoneId(pub(crate) usize);

pub(crate) const ROOT_ZONE_NAME: &str = "world";

struct Zone {
    name: String,
    parent: Option<ZoneId>,
}

/// The zone hierarchy.
pub(crate) struct Zones {
    zones: Vec<Zone>,
}

impl Zones {
    pub(crate) fn new() -> Zones {
        Zones {
            zones: vec![Zone {
                name: ROOT_ZONE_NAME.to_string(),
                parent: None,
            }],
        }
    }

    pub(crate) fn root(&self) -> ZoneId {
        ZoneId(0)
    }

    pub(crate) fn add(&mut self, name: String, parent: ZoneId) -> ZoneId {
        assert!(parent.0 < self.zones.len(), "unknown parent zone {parent:?}");
        assert!(
            self.by_name(&name).is_none(),
            "zone {name} is already registered"
        );

        self.zones.push(Zone {
            name,
            parent: Some(parent),
        });

        ZoneId(self.zones.len() - 1)
    }

    pub(crate) fn name(&self, zone: ZoneId) -> &str {
        &self.zones[zone.0].name
    }

    pub(crate) fn by_name(&self, name: &str) -> Option<ZoneId> {
        self.zones
            .iter()
            .position(|zone| zone.name == name)
            .map(ZoneId)
    }

    /// Walk from `zone` up to the root, `zone` included.
    pub(crate) fn ancestors(&self, zone: ZoneId) -> impl Iterator<Item = ZoneId> + '_ {
        std::iter::successors(Some(zone), |z| self.zones[z.0].parent)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = ZoneId> {
        (0..self.zones.len()).map(ZoneId)
    }
}
