use std::time::Duration;

use crate::config::{Config, Link};
use crate::Sim;

/// A builder that can be used to configure the simulation.
///
/// The Builder allows you to set a number of options when creating a simfs
/// simulation, see the available methods for documentation of each of these
/// options.
///
/// ## Examples
///
/// You can use the builder to initialize a sim with default configuration:
///
/// ```
/// let sim = simfs::Builder::new().build();
/// ```
///
/// If you want to vary factors of the simulation, you can use the
/// respective Builder methods:
///
/// ```
/// use std::time::Duration;
///
/// let sim = simfs::Builder::new()
///     .simulation_duration(Duration::from_secs(120))
///     .link_bandwidth(1e9)
///     .link_latency(Duration::from_millis(1))
///     .build();
/// ```
///
/// If you create a builder with a set of options you can then repeatedly
/// call `build` to get a sim with the same settings:
///
/// ```
/// use std::time::Duration;
///
/// // Create a persistent builder
/// let mut builder = simfs::Builder::new();
///
/// // Apply a chain of options to that builder
/// builder.simulation_duration(Duration::from_secs(45))
///     .link_bandwidth(10e6);
///
/// let sim_one = builder.build();
/// let sim_two = builder.build();
/// ```
///
/// Every simulation starts with an empty platform and an empty file system
/// registry; nothing is shared between two sims built from the same builder.
pub struct Builder {
    config: Config,
    link: Link,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            link: Link::default(),
        }
    }

    /// How long the test may run for in simulated time before it is
    /// considered stuck.
    ///
    /// Default: 60s
    pub fn simulation_duration(&mut self, value: Duration) -> &mut Self {
        self.config.duration = value;
        self
    }

    /// How much simulated time should elapse each tick.
    ///
    /// Timers fire at their exact deadline regardless of the tick; the tick
    /// only controls how often the simulation checks for completion.
    ///
    /// Default: 1ms
    pub fn tick_duration(&mut self, value: Duration) -> &mut Self {
        self.config.tick = value;
        self
    }

    /// Bandwidth, in bytes per second, of the links between hosts that are
    /// not explicitly connected with [`Sim::link`].
    ///
    /// Default: 125MB/s
    pub fn link_bandwidth(&mut self, value: f64) -> &mut Self {
        self.link.bandwidth = value;
        self
    }

    /// Latency of the links between hosts that are not explicitly connected
    /// with [`Sim::link`].
    ///
    /// Default: 0
    pub fn link_latency(&mut self, value: Duration) -> &mut Self {
        self.link.latency = value;
        self
    }

    /// Build a simulation with the settings from the builder.
    pub fn build(&self) -> Sim {
        if self.link.bandwidth <= 0.0 {
            panic!("Link bandwidth must be positive.");
        }

        if self.config.tick.is_zero() {
            panic!("Tick duration must be positive.");
        }

        Sim::new(self.config.clone(), self.link.clone())
    }
}
