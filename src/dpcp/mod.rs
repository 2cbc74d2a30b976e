/*! Blocking bounds for the Distributed Priority-Ceiling Protocol

Under the DPCP, resources live on designated synchronization
processors and requests execute there as remote agents. Blocking is
therefore organized by the processor that *hosts* each resource, not
by the resource itself: a job is delayed by higher-priority agents
on every processor it sends requests to, by one lower-priority agent
per issued request, and by all agent activity on its own processor
(agents are not part of the local job execution in this model, so
their owner's priority does not matter there).
*/

use std::cmp::min;

use crate::bounds::{BlockingBounds, Interference};
use crate::contention::{sort_all_by_request_length, AllPerCluster, ContentionSet};
use crate::model::{ClusterId, ResourceId, Task, TaskSet};

/// Assignment of resources to their synchronization processors.
///
/// Resources without an assignment live on a dedicated
/// synchronization processor that runs no tasks; their agents delay
/// nobody and are excluded from the analysis.
#[derive(Debug, Default, Clone)]
pub struct ResourceLocality {
    assignment: Vec<Option<ClusterId>>,
}

impl ResourceLocality {
    pub fn new() -> Self {
        Default::default()
    }

    /// Place `res` on processor `cpu`.
    pub fn assign(&mut self, res: ResourceId, cpu: ClusterId) {
        while self.assignment.len() <= res {
            self.assignment.push(None);
        }
        self.assignment[res] = Some(cpu);
    }

    /// The processor hosting `res`, if it is not on a dedicated
    /// synchronization processor.
    pub fn cpu_of(&self, res: ResourceId) -> Option<ClusterId> {
        self.assignment.get(res).copied().flatten()
    }
}

/// Bucket every request by the processor hosting its resource.
/// Indexing always covers each task's own processor, so the local
/// bound below never runs out of range.
fn split_by_locality<'a>(ts: &'a TaskSet, locality: &ResourceLocality) -> AllPerCluster<'a> {
    let mut per_cpu: AllPerCluster = Vec::new();

    for tsk in ts.tasks() {
        while tsk.cluster() >= per_cpu.len() {
            per_cpu.push(ContentionSet::new());
        }

        for req in tsk.requests() {
            if let Some(cpu) = locality.cpu_of(req.resource()) {
                while cpu >= per_cpu.len() {
                    per_cpu.push(ContentionSet::new());
                }
                per_cpu[cpu].push(req);
            }
        }
    }

    per_cpu
}

/// How many requests `tsk` issues toward resources hosted on `cpu`.
fn count_requests_to_cpu(tsk: &Task, locality: &ResourceLocality, cpu: ClusterId) -> u64 {
    tsk.requests()
        .iter()
        .filter(|req| locality.cpu_of(req.resource()) == Some(cpu))
        .map(|req| req.num_requests())
        .sum()
}

/// Agent delays on one remote processor: higher-priority agents
/// block with every request, lower-priority agents at most once per
/// request that `tsk` sends there.
fn bound_blocking_dpcp(
    ts: &TaskSet,
    tsk: &Task,
    cont: &ContentionSet,
    mut max_lower_prio: u64,
) -> Interference {
    let mut inter = Interference::default();
    let interval = tsk.response();

    // assumption: cont is ordered by request length
    for req in cont {
        if req.task() == tsk.id() {
            // can't block itself
            continue;
        }

        let prio = ts.tasks()[req.task()].priority();
        if prio < tsk.priority() {
            // higher priority: all of them
            let num = ts.max_num_requests(req, interval);
            inter.count += num;
            inter.total_length += num * req.length();
        } else if max_lower_prio > 0 {
            // lower priority: only the remaining budget
            let num = min(ts.max_num_requests(req, interval), max_lower_prio);
            inter.count += num;
            inter.total_length += num * req.length();
            max_lower_prio -= num;
        }
    }

    inter
}

fn dpcp_remote_bound(
    ts: &TaskSet,
    tsk: &Task,
    locality: &ResourceLocality,
    per_cpu: &AllPerCluster,
) -> Interference {
    let mut blocking = Interference::default();

    for (cpu, cs) in per_cpu.iter().enumerate() {
        // this is about remote delays
        if cpu != tsk.cluster() {
            let reqs = count_requests_to_cpu(tsk, locality, cpu);
            if reqs > 0 {
                blocking += bound_blocking_dpcp(ts, tsk, cs, reqs);
            }
        }
    }

    blocking
}

/// All agent activity hosted on the task's own processor counts,
/// regardless of the agents' owner priorities.
fn dpcp_local_bound(ts: &TaskSet, tsk: &Task, local: &ContentionSet) -> Interference {
    let mut blocking = Interference::default();
    let interval = tsk.response();

    for req in local {
        if req.task() != tsk.id() {
            let num = ts.max_num_requests(req, interval);
            blocking.count += num;
            blocking.total_length += num * req.length();
        }
    }

    blocking
}

/// Blocking bounds under the DPCP for the given resource placement.
pub fn dpcp_bounds(ts: &TaskSet, locality: &ResourceLocality) -> BlockingBounds {
    let mut per_cpu = split_by_locality(ts, locality);
    sort_all_by_request_length(&mut per_cpu);

    let mut results = BlockingBounds::new(ts);

    for (i, tsk) in ts.tasks().iter().enumerate() {
        let remote = dpcp_remote_bound(ts, tsk, locality, &per_cpu);
        let local = dpcp_local_bound(ts, tsk, &per_cpu[tsk.cluster()]);

        results[i] = remote + local;
        results.set_remote_blocking(i, remote);
        results.set_local_blocking(i, local);
    }

    results
}
