/*! Accumulated blocking bounds and per-task analysis results

[Interference] is the unit in which every analysis accounts for
blocking: a total delay length together with the number of blocking
events charged. [BlockingBounds] collects one such bound per task,
plus the protocol-dependent decompositions (remote/local/arrival
blocking, maximum request span) consumed by downstream
schedulability tests.
*/

use std::ops::{Index, IndexMut};

use derive_more::{Add, AddAssign, Sum};

use crate::model::{TaskId, TaskSet};
use crate::time::Duration;

/// An accumulated blocking bound: total delay and number of blocking
/// events. Both components only ever grow under accumulation.
///
/// The ordering is lexicographic by total length, then count, so
/// that `max` prefers the longer delay.
#[derive(
    Debug, Default, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Add, AddAssign, Sum,
)]
pub struct Interference {
    pub total_length: Duration,
    pub count: u64,
}

impl Interference {
    pub fn new(total_length: Duration, count: u64) -> Self {
        Interference {
            total_length,
            count,
        }
    }
}

/// Per-task analysis results: exactly one entry per task of the
/// analyzed [TaskSet], indexed by task position.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BlockingBounds {
    blocking: Vec<Interference>,
    request_span: Vec<Interference>,
    arrival: Vec<Interference>,
    remote: Vec<Interference>,
    local: Vec<Interference>,
}

impl BlockingBounds {
    /// Create an all-zero result object for the given task set.
    pub fn new(ts: &TaskSet) -> Self {
        let zeros = vec![Interference::default(); ts.len()];
        BlockingBounds {
            blocking: zeros.clone(),
            request_span: zeros.clone(),
            arrival: zeros.clone(),
            remote: zeros.clone(),
            local: zeros,
        }
    }

    pub fn len(&self) -> usize {
        self.blocking.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocking.is_empty()
    }

    /// The maximum span of a single request of the given task: its
    /// own critical-section length plus the worst blocking a single
    /// issue can incur.
    pub fn max_request_span(&self, t: TaskId) -> Interference {
        self.request_span[t]
    }

    /// Record `span` as the request span of task `t` if it exceeds
    /// the span recorded so far.
    pub fn raise_request_span(&mut self, t: TaskId, span: Interference) {
        self.request_span[t] = self.request_span[t].max(span);
    }

    pub fn arrival_blocking(&self, t: TaskId) -> Interference {
        self.arrival[t]
    }

    pub fn set_arrival_blocking(&mut self, t: TaskId, b: Interference) {
        self.arrival[t] = b;
    }

    pub fn remote_blocking(&self, t: TaskId) -> Interference {
        self.remote[t]
    }

    pub fn set_remote_blocking(&mut self, t: TaskId, b: Interference) {
        self.remote[t] = b;
    }

    pub fn local_blocking(&self, t: TaskId) -> Interference {
        self.local[t]
    }

    pub fn set_local_blocking(&mut self, t: TaskId, b: Interference) {
        self.local[t] = b;
    }
}

impl Index<TaskId> for BlockingBounds {
    type Output = Interference;

    fn index(&self, t: TaskId) -> &Interference {
        &self.blocking[t]
    }
}

impl IndexMut<TaskId> for BlockingBounds {
    fn index_mut(&mut self, t: TaskId) -> &mut Interference {
        &mut self.blocking[t]
    }
}

/// The longest request span among the same-cluster tasks of
/// lower-or-equal priority, i.e., those whose requests a
/// priority-donation protocol may charge at job release.
fn max_local_request_span(ts: &TaskSet, t: TaskId, bounds: &BlockingBounds) -> Interference {
    let tsk = ts.task(t);
    let mut span = Interference::default();

    for other in ts.tasks() {
        if other.id() != t
            && other.cluster() == tsk.cluster()
            && other.priority() >= tsk.priority()
        {
            span = span.max(bounds.max_request_span(other.id()));
        }
    }

    span
}

/// Charge each task the arrival blocking (delay due to priority
/// donation at job release) implied by the request spans recorded so
/// far, adding it to the per-task totals.
pub fn charge_arrival_blocking(ts: &TaskSet, bounds: &mut BlockingBounds) {
    for t in 0..ts.len() {
        let inf = max_local_request_span(ts, t, bounds);
        bounds[t] += inf;
        bounds.set_arrival_blocking(t, inf);
    }
}
