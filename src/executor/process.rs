//! Out-of-process executor: one child process per work item.
//!
//! The command is run with the work item appended as its last argument and
//! must print a single JSON object on stdout. This is how external scrapers,
//! scorers and raster tools are plugged in without linking them.

use std::io;
use std::process::{Child, Command, Stdio};

use tracing::{debug, warn};

use crate::model::{ResultRecord, WorkItem};

use super::window::{self, DEFAULT_MAX_IN_FLIGHT, Slot, Spawner};
use super::{Executor, ExecutorError, Result};

/// Runs an external command per work item.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    program: String,
    args: Vec<String>,
    max_in_flight: usize,
}

impl ProcessExecutor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    /// Builds an executor from a command line: program first, then its
    /// fixed arguments. Returns `None` for an empty command line.
    pub fn from_command_line(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    /// Caps how many child processes of a batch run at once (at least one).
    #[must_use]
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }
}

/// Whether a spawn error means the command itself can't run, as opposed to
/// a transient shortage (file descriptors, processes, memory).
fn is_launch_failure(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    )
}

impl Spawner for ProcessExecutor {
    type Running = Child;

    fn spawn(&self, item: &WorkItem) -> Result<Option<Child>> {
        let spawned = Command::new(&self.program)
            .args(&self.args)
            .arg(item.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        match spawned {
            Ok(child) => Ok(Some(child)),
            Err(source) if is_launch_failure(&source) => Err(ExecutorError::Launch {
                program: self.program.clone(),
                source,
            }),
            Err(e) => {
                warn!(%item, error = %e, "failed to start task");
                Ok(None)
            }
        }
    }

    fn finish(&self, item: &WorkItem, child: Child) -> Option<ResultRecord> {
        let output = match child.wait_with_output() {
            Ok(o) => o,
            Err(e) => {
                warn!(%item, error = %e, "failed to wait for task");
                return None;
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(%item, status = %output.status, stderr = %stderr.trim(), "task failed");
            return None;
        }

        let record = parse_output(&output.stdout);
        if record.is_none() {
            debug!(%item, "task produced no record");
        }
        record
    }

    fn abort(&self, mut child: Child) {
        let _ = child.kill();
        let _ = child.wait();
    }
}

impl Executor for ProcessExecutor {
    type Handle = Slot<Child>;

    fn submit(&self, inputs: &[WorkItem]) -> Result<Vec<Self::Handle>> {
        window::start(self, inputs, self.max_in_flight)
    }

    fn await_all(&self, handles: Vec<Self::Handle>) -> Result<Vec<Option<ResultRecord>>> {
        window::finish(self, handles)
    }
}

/// Parses a task's stdout. Anything other than a JSON object is no record.
fn parse_output(stdout: &[u8]) -> Option<ResultRecord> {
    let value = serde_json::from_slice(stdout).ok()?;
    ResultRecord::from_value(value)
}
