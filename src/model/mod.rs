/*! The shared-resource task model

This module defines the read-only input of every analysis in this
crate: a [TaskSet] of sporadic tasks, each with a period, a
response-time bound (an *input* here, obtained from a separate
schedulability analysis), a priority, a cluster assignment, and a
list of [Request]s describing its critical sections.

A [TaskSet] is constructed once per analysis invocation and never
mutated afterwards; all derived structures reference it immutably.
*/

use crate::time::{divide_with_ceil, Duration};

/// Stable index of a task within its [TaskSet].
pub type TaskId = usize;

/// Identifier of a shared resource. Resource ids are expected to be
/// small and contiguous, as they index per-resource containers.
pub type ResourceId = usize;

/// Identifier of a cluster (or partition, or processor, depending on
/// the protocol). Cluster ids index a contiguous range.
pub type ClusterId = usize;

/// Scheduling priority. Numerically lower values denote higher
/// priority.
pub type Priority = u32;

/// How a critical section accesses its resource.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AccessMode {
    /// Shared read access.
    Read,
    /// Write access. Contends with readers and writers alike.
    Write,
    /// Mutually exclusive access under a mutex protocol. Treated as
    /// a write by the reader/writer analyses.
    Exclusive,
}

impl AccessMode {
    pub fn is_read(self) -> bool {
        self == AccessMode::Read
    }

    pub fn is_write(self) -> bool {
        !self.is_read()
    }
}

/// A (possibly repeated) critical-section access issued by a task.
#[derive(Debug, Clone)]
pub struct Request {
    resource: ResourceId,
    mode: AccessMode,
    /// How many times the request is issued per job.
    num_requests: u64,
    /// Maximum critical-section length of a single issue.
    length: Duration,
    /// Back-reference to the owning task, assigned by
    /// [TaskSet::new].
    task: TaskId,
}

impl Request {
    pub fn new(resource: ResourceId, mode: AccessMode, num_requests: u64, length: Duration) -> Self {
        Request {
            resource,
            mode,
            num_requests,
            length,
            task: 0,
        }
    }

    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn num_requests(&self) -> u64 {
        self.num_requests
    }

    pub fn length(&self) -> Duration {
        self.length
    }

    /// The task this request belongs to. Meaningful only after the
    /// owning [TaskSet] has been constructed.
    pub fn task(&self) -> TaskId {
        self.task
    }
}

/// One sporadic task and its critical-section profile.
#[derive(Debug, Clone)]
pub struct Task {
    id: TaskId,
    period: Duration,
    response: Duration,
    priority: Priority,
    cluster: ClusterId,
    requests: Vec<Request>,
}

impl Task {
    pub fn new(period: Duration, response: Duration, priority: Priority, cluster: ClusterId) -> Self {
        assert!(period > 0, "a task's period must be positive");
        Task {
            id: 0,
            period,
            response,
            priority,
            cluster,
            requests: Vec::new(),
        }
    }

    /// Attach a critical-section request to this task.
    pub fn add_request(&mut self, req: Request) {
        self.requests.push(req);
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn response(&self) -> Duration {
        self.response
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn cluster(&self) -> ClusterId {
        self.cluster
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    /// Maximum number of jobs of this task that can be pending
    /// simultaneously within its own response window, carry-in
    /// included.
    pub fn num_arrivals(&self) -> u64 {
        divide_with_ceil(self.response, self.period) + 1
    }

    /// The longest critical section issued by this task.
    pub fn max_request_length(&self) -> Duration {
        self.requests.iter().map(Request::length).max().unwrap_or(0)
    }

    /// Maximum number of times this task can issue `req` in an
    /// interval of length `interval` that overlaps its jobs
    /// arbitrarily.
    pub fn max_num_requests(&self, req: &Request, interval: Duration) -> u64 {
        let num_jobs = divide_with_ceil(interval + self.response, self.period);
        num_jobs * req.num_requests
    }
}

/// An immutable set of tasks, the input to every analysis.
///
/// Construction assigns each task a dense, stable index (its
/// [TaskId]) and stamps the owning task into every request, so that
/// derived containers can refer to tasks by index rather than by
/// address.
#[derive(Debug, Clone)]
pub struct TaskSet {
    tasks: Vec<Task>,
}

impl TaskSet {
    pub fn new(mut tasks: Vec<Task>) -> Self {
        for (id, task) in tasks.iter_mut().enumerate() {
            task.id = id;
            for req in task.requests.iter_mut() {
                req.task = id;
            }
        }
        TaskSet { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id]
    }

    /// Convenience lookup: how often can `req` be issued by its
    /// owning task in an interval of length `interval`?
    pub fn max_num_requests(&self, req: &Request, interval: Duration) -> u64 {
        self.tasks[req.task].max_num_requests(req, interval)
    }

    /// Number of clusters spanned by the task set (one more than the
    /// largest cluster id in use).
    pub fn num_clusters(&self) -> usize {
        self.tasks
            .iter()
            .map(|t| t.cluster + 1)
            .max()
            .unwrap_or(0)
    }

    /// Number of resources referenced by any request (one more than
    /// the largest resource id in use).
    pub fn num_resources(&self) -> usize {
        self.tasks
            .iter()
            .flat_map(|t| t.requests.iter())
            .map(|r| r.resource + 1)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests;
