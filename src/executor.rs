//! Executor client: hand a batch of work items to a parallel executor and
//! collect one result per item.
//!
//! The mapped function is bound when an executor is built; callers only ever
//! deal in work items and result records. A failure confined to one item
//! shows up as `None` in that item's slot. Anything that prevents the batch
//! from being dispatched at all is an [`ExecutorError`] and is fatal to the run.
//!
//! Both executors keep at most `max_in_flight` items of a batch running at
//! once; the rest wait for a free slot.

mod process;
mod thread;
mod window;

use std::io;

pub use process::ProcessExecutor;
pub use thread::ThreadExecutor;
pub use window::{DEFAULT_MAX_IN_FLIGHT, Slot};

use crate::model::{ResultRecord, WorkItem};

/// Errors that abort a dispatch.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = core::result::Result<T, ExecutorError>;

/// A parallel map over work items.
pub trait Executor {
    /// One in-flight computation.
    type Handle;

    /// Starts the computation for every input and returns a handle per input,
    /// in input order.
    fn submit(&self, inputs: &[WorkItem]) -> Result<Vec<Self::Handle>>;

    /// Blocks until every handle resolves. The results line up with the
    /// handles; a failed item yields `None`.
    fn await_all(&self, handles: Vec<Self::Handle>) -> Result<Vec<Option<ResultRecord>>>;

    /// Submits a batch and waits for all of it.
    fn map(&self, inputs: &[WorkItem]) -> Result<Vec<Option<ResultRecord>>> {
        let handles = self.submit(inputs)?;
        self.await_all(handles)
    }
}
