use crate::HostId;

use std::future::Future;
use std::sync::Arc;

tokio::task_local! {
    static ACTOR: Actor;
}

/// A simulated application task, bound to the host it runs on.
///
/// Actors are spawned with [`Sim::actor`]. Code running inside an actor can
/// retrieve its identity with [`current_actor`].
///
/// [`Sim::actor`]: crate::Sim::actor
/// [`current_actor`]: crate::current_actor
#[derive(Clone, Debug)]
pub struct Actor {
    name: Arc<str>,
    host: HostId,
}

impl Actor {
    pub(crate) fn new(name: Arc<str>, host: HostId) -> Actor {
        Actor { name, host }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The host this actor runs on.
    pub fn host(&self) -> HostId {
        self.host
    }

    /// The actor executing the current task, if any.
    pub(crate) fn current() -> Option<Actor> {
        ACTOR.try_with(|actor| actor.clone()).ok()
    }

    /// Run `fut` with this actor as its execution context.
    pub(crate) fn scope<F: Future>(self, fut: F) -> impl Future<Output = F::Output> {
        ACTOR.scope(self, fut)
    }
}
