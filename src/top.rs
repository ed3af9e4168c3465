use crate::{config, HostId};

use indexmap::IndexMap;
use std::time::Duration;

/// Describes the network topology
pub(crate) struct Topology {
    /// Used for every pair of hosts without an explicit link.
    config: config::Link,

    /// Specific configuration overrides between specific hosts.
    links: IndexMap<Pair, config::Link>,
}

#[derive(Debug, Hash, Eq, PartialEq)]
struct Pair(HostId, HostId);

impl Pair {
    fn new(a: HostId, b: HostId) -> Pair {
        assert_ne!(a, b);

        if a < b {
            Pair(a, b)
        } else {
            Pair(b, a)
        }
    }
}

impl Topology {
    pub(crate) fn new(config: config::Link) -> Topology {
        Topology {
            config,
            links: IndexMap::new(),
        }
    }

    /// Register a link between two hosts, replacing any previous one.
    pub(crate) fn register(&mut self, a: HostId, b: HostId, link: config::Link) {
        assert!(link.bandwidth > 0.0, "link bandwidth must be positive");
        self.links.insert(Pair::new(a, b), link);
    }

    fn link(&self, a: HostId, b: HostId) -> &config::Link {
        self.links.get(&Pair::new(a, b)).unwrap_or(&self.config)
    }

    /// How long moving `bytes` from `src` to `dst` takes. Transfers within a
    /// host are free.
    pub(crate) fn transfer_time(&self, src: HostId, dst: HostId, bytes: u64) -> Duration {
        if src == dst {
            return Duration::ZERO;
        }

        let link = self.link(src, dst);
        link.latency + crate::kernel::secs(bytes as f64 / link.bandwidth)
    }
}
