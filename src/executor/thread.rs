//! In-process executor: one OS thread per work item, bounded per batch.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::warn;

use crate::model::{ResultRecord, WorkItem};

use super::window::{self, DEFAULT_MAX_IN_FLIGHT, Slot, Spawner};
use super::{Executor, Result};

/// Runs a Rust function over each work item on its own thread.
///
/// A panic inside the function is confined to its item and yields `None`.
/// At most `max_in_flight` threads run at once.
pub struct ThreadExecutor<F> {
    task: Arc<F>,
    max_in_flight: usize,
}

impl<F> ThreadExecutor<F>
where
    F: Fn(&WorkItem) -> Option<ResultRecord> + Send + Sync + 'static,
{
    pub fn new(task: F) -> Self {
        Self {
            task: Arc::new(task),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    /// Caps how many items of a batch run concurrently (at least one).
    #[must_use]
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }
}

impl<F> Spawner for ThreadExecutor<F>
where
    F: Fn(&WorkItem) -> Option<ResultRecord> + Send + Sync + 'static,
{
    type Running = JoinHandle<Option<ResultRecord>>;

    fn spawn(&self, item: &WorkItem) -> Result<Option<Self::Running>> {
        let task = Arc::clone(&self.task);
        let owned = item.clone();
        match thread::Builder::new()
            .name("fanout-task".into())
            .spawn(move || task(&owned))
        {
            Ok(handle) => Ok(Some(handle)),
            Err(e) => {
                warn!(%item, error = %e, "failed to spawn task thread");
                Ok(None)
            }
        }
    }

    fn finish(&self, item: &WorkItem, running: Self::Running) -> Option<ResultRecord> {
        running.join().unwrap_or_else(|_| {
            warn!(%item, "task panicked");
            None
        })
    }

    fn abort(&self, _running: Self::Running) {
        // Threads can't be cancelled; dropping the handle detaches it.
    }
}

impl<F> Executor for ThreadExecutor<F>
where
    F: Fn(&WorkItem) -> Option<ResultRecord> + Send + Sync + 'static,
{
    type Handle = Slot<JoinHandle<Option<ResultRecord>>>;

    fn submit(&self, inputs: &[WorkItem]) -> Result<Vec<Self::Handle>> {
        window::start(self, inputs, self.max_in_flight)
    }

    fn await_all(&self, handles: Vec<Self::Handle>) -> Result<Vec<Option<ResultRecord>>> {
        window::finish(self, handles)
    }
}
