use std::future::Future;

use tokio::runtime::Runtime;
use tokio::task::{JoinError, JoinHandle, LocalSet};
use tokio::time::{sleep, Duration, Instant};

/// The simulated runtime.
///
/// The tokio runtime is paused (see [`Builder::start_paused`]), which gives us
/// control over when and how to advance time. In particular, see [`Rt::tick`],
/// which lets the runtime do a bit more work. All actors and the I/O
/// activities they issue share one runtime, hence one clock.
///
/// [`Builder::start_paused`]: tokio::runtime::Builder::start_paused
pub(crate) struct Rt {
    /// Handle to the Tokio runtime driving the simulation.
    tokio: Runtime,

    /// Local task set used for running !Send tasks.
    local: LocalSet,
}

impl Rt {
    pub(crate) fn new() -> Self {
        let (tokio, local) = init();

        Self { tokio, local }
    }

    pub(crate) fn now(&self) -> Instant {
        let _guard = self.tokio.enter();
        Instant::now()
    }

    /// Spawn a task on the local set. The task does not run until the next
    /// [`Rt::tick`].
    pub(crate) fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        with(&self.tokio, &self.local, || tokio::task::spawn_local(task))
    }

    // This method is called by [`Sim::step`]. The magic of this method is
    // described in the documentation for [`LocalSet::run_until`], but it may
    // not be entirely obvious how things fit together.
    //
    // A [`LocalSet`] tracks the tasks to run, which may in turn spawn more
    // tasks. `run_until` drives a top level task to completion, but not its
    // children. The task we run here just sleeps and has no children! However,
    // it's the _same `LocalSet`_ that is used to run the actors.
    //
    // In this way, every time `tick` is called, the following unfolds:
    //
    // 1. Time advances on the runtime
    // 2. We schedule a new task that simply sleeps
    // 3. Other tasks on the `LocalSet` get a chance to run
    // 4. The sleep finishes
    // 5. The runtime pauses
    //
    // Timers of other tasks that expire within the tick fire at their exact
    // deadline, as the paused clock auto-advances to the next pending timer.
    pub(crate) fn tick(&self, duration: Duration) {
        self.tokio.block_on(async {
            self.local
                .run_until(async {
                    sleep(duration).await;
                })
                .await
        });
    }

    /// Extract the output of a finished task.
    pub(crate) fn join<T>(&self, handle: JoinHandle<T>) -> Result<T, JoinError> {
        debug_assert!(handle.is_finished());
        self.tokio.block_on(handle)
    }
}

fn init() -> (Runtime, LocalSet) {
    let mut builder = tokio::runtime::Builder::new_current_thread();

    #[cfg(tokio_unstable)]
    builder.unhandled_panic(tokio::runtime::UnhandledPanic::ShutdownRuntime);

    let tokio = builder
        .enable_time()
        .start_paused(true)
        .build()
        .expect("failed to build the simulation runtime");

    tokio.block_on(async {
        // Sleep to "round" `Instant::now()` to the closest `ms`
        tokio::time::sleep(Duration::from_millis(1)).await;
    });

    (tokio, LocalSet::new())
}

fn with<R>(tokio: &Runtime, local: &LocalSet, f: impl FnOnce() -> R) -> R {
    tokio.block_on(async { local.run_until(async { f() }).await })
}
