//! Bounded dispatch: at most `max_in_flight` items of a batch run at once.
//!
//! `start` launches the head of the batch. `finish` waits for items in input
//! order, launching the next pending item each time one completes, so the
//! number of live workers never exceeds the window.

use std::mem;

use crate::model::{ResultRecord, WorkItem};

use super::Result;

/// Default window size for executors that fork a worker per item.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 32;

/// How an executor starts, completes and abandons one item.
pub(super) trait Spawner {
    type Running;

    /// Starts one item. `Ok(None)` is a failure confined to that item;
    /// `Err` aborts the batch.
    fn spawn(&self, item: &WorkItem) -> Result<Option<Self::Running>>;

    /// Waits for a started item and turns its output into a record.
    fn finish(&self, item: &WorkItem, running: Self::Running) -> Option<ResultRecord>;

    /// Abandons a started item when the batch is aborted.
    fn abort(&self, running: Self::Running);
}

/// One item of a submitted batch.
pub struct Slot<R> {
    item: WorkItem,
    state: State<R>,
}

enum State<R> {
    Pending,
    Running(R),
    Failed,
}

/// Launches the first `max_in_flight` items; the rest stay pending.
pub(super) fn start<S: Spawner>(
    spawner: &S,
    inputs: &[WorkItem],
    max_in_flight: usize,
) -> Result<Vec<Slot<S::Running>>> {
    let mut slots: Vec<Slot<S::Running>> = inputs
        .iter()
        .map(|item| Slot {
            item: item.clone(),
            state: State::Pending,
        })
        .collect();

    let head = slots.len().min(max_in_flight.max(1));
    if let Err(e) = slots[..head]
        .iter_mut()
        .try_for_each(|slot| launch(spawner, slot))
    {
        abort_all(spawner, slots);
        return Err(e);
    }
    Ok(slots)
}

/// Resolves every slot in order, keeping the window full as items complete.
pub(super) fn finish<S: Spawner>(
    spawner: &S,
    mut slots: Vec<Slot<S::Running>>,
) -> Result<Vec<Option<ResultRecord>>> {
    let mut next = slots
        .iter()
        .position(|s| matches!(s.state, State::Pending))
        .unwrap_or(slots.len());
    let mut results = Vec::with_capacity(slots.len());

    for i in 0..slots.len() {
        if matches!(slots[i].state, State::Pending) {
            if let Err(e) = launch(spawner, &mut slots[i]) {
                abort_all(spawner, slots);
                return Err(e);
            }
            next = next.max(i + 1);
        }

        let result = match mem::replace(&mut slots[i].state, State::Failed) {
            State::Running(running) => spawner.finish(&slots[i].item, running),
            State::Pending | State::Failed => None,
        };
        results.push(result);

        if next < slots.len() {
            if let Err(e) = launch(spawner, &mut slots[next]) {
                abort_all(spawner, slots);
                return Err(e);
            }
            next += 1;
        }
    }
    Ok(results)
}

fn launch<S: Spawner>(spawner: &S, slot: &mut Slot<S::Running>) -> Result<()> {
    slot.state = match spawner.spawn(&slot.item)? {
        Some(running) => State::Running(running),
        None => State::Failed,
    };
    Ok(())
}

fn abort_all<S: Spawner>(spawner: &S, slots: Vec<Slot<S::Running>>) {
    for slot in slots {
        if let State::Running(running) = slot.state {
            spawner.abort(running);
        }
    }
}
