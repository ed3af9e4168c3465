use std::time::Duration;

#[derive(Clone)]
pub(crate) struct Config {
    /// How long the simulation may run before it is considered stuck
    pub(crate) duration: Duration,

    /// How much simulated time should elapse each tick
    pub(crate) tick: Duration,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            duration: Duration::from_secs(60),
            tick: Duration::from_millis(1),
        }
    }
}

/// Characteristics of a network link between two hosts.
///
/// Hosts that were never explicitly connected communicate over a link with
/// the builder's default configuration.
#[derive(Clone, Debug)]
pub(crate) struct Link {
    /// Bytes per second
    pub(crate) bandwidth: f64,

    /// Fixed delay paid by every transfer over the link
    pub(crate) latency: Duration,
}

impl Default for Link {
    fn default() -> Self {
        Self {
            bandwidth: 125e6,
            latency: Duration::ZERO,
        }
    }
}
