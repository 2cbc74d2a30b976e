/*! Blocking bounds for the Multiprocessor Priority-Ceiling Protocol

The MPCP analysis (after Lakshmanan, Niz, and Rajkumar, 2009) runs
in two phases. First, every resource receives a priority ceiling
and every global critical section (gcs) a response time that only
depends on those ceilings. Second, per-request remote blocking is
obtained by a fixed-point iteration over the gcs response times of
remote higher-priority requests plus one lower-priority ceiling
blocker.

The iteration may fail to converge within the task's own
response-time bound. That is a domain-level "no bound exists"
outcome, reported via the [UNBOUNDED] sentinel in the result --
callers must check for it before using the numeric bound -- and the
analysis simply continues with the remaining tasks.
*/

use std::cmp::max;

use thiserror::Error;

use crate::bounds::{BlockingBounds, Interference};
use crate::contention::{split_by_cluster, split_by_resource, Cluster, Clusters, Resources};
use crate::model::{Priority, ResourceId, Task, TaskId, TaskSet};
use crate::time::{divide_with_ceil, Duration};

/// Sentinel total reported for a task whose remote-blocking fixed
/// point diverges.
pub const UNBOUNDED: Duration = Duration::MAX;

/// Failure of the remote-blocking fixed-point search.
#[derive(Debug, Error, Copy, Clone, Eq, PartialEq)]
pub enum SearchFailure {
    /// The iterated bound exceeded the task's own response-time
    /// bound, so no finite blocking bound exists.
    #[error("remote blocking of task {task} exceeds its response-time bound {limit}")]
    DivergenceLimitExceeded { task: TaskId, limit: Duration },
}

type SearchResult = Result<Duration, SearchFailure>;

/// The priority ceiling of each resource: the highest priority
/// (numerically smallest value) among all requesting tasks.
fn priority_ceilings(ts: &TaskSet, resources: &Resources) -> Vec<Priority> {
    resources
        .iter()
        .map(|cs| {
            cs.iter()
                .map(|req| ts.tasks()[req.task()].priority())
                .min()
                .unwrap_or(Priority::MAX)
        })
        .collect()
}

/// The longest gcs of `tsk` whose ceiling beats `preempted_ceiling`.
fn max_gcs_length(tsk: &Task, ceilings: &[Priority], preempted_ceiling: Priority) -> Duration {
    tsk.requests()
        .iter()
        .filter(|req| ceilings[req.resource()] < preempted_ceiling)
        .map(|req| req.length())
        .max()
        .unwrap_or(0)
}

/// Response time of each gcs of `tsk`: its own length plus one
/// ceiling-preempting gcs of every other local task (Eq. (2) in
/// LNR:09; tasks are sequential, so one per task suffices).
fn gcs_response_times(tsk: &Task, cluster: &Cluster, ceilings: &[Priority]) -> Vec<Duration> {
    tsk.requests()
        .iter()
        .map(|req| {
            let prio = ceilings[req.resource()];
            let mut resp = req.length();

            for t in cluster {
                if t.id() != tsk.id() {
                    resp += max_gcs_length(t, ceilings, prio);
                }
            }

            resp
        })
        .collect()
}

/// How long requests of `tsk` for `res_id` can delay a remote job
/// within `interval`: all overlapping jobs if `tsk` has higher
/// priority (Eq. (3) in LNR:09), a single request otherwise.
fn response_time_for(
    res_id: ResourceId,
    interval: Duration,
    tsk: &Task,
    resp: &[Duration],
    multiple: bool,
) -> Duration {
    for (i, req) in tsk.requests().iter().enumerate() {
        if req.resource() == res_id {
            return if multiple {
                let num_jobs = divide_with_ceil(interval, tsk.period()) + 1;
                // this may represent multiple gcs, so multiply
                num_jobs * resp[i] * req.num_requests()
            } else {
                resp[i]
            };
        }
    }
    // the task does not access res_id at all
    0
}

/// One step of the remote-blocking recurrence: higher-priority
/// remote requests accumulate, the longest lower-priority request
/// is tracked separately.
fn remote_blocking_step(
    res_id: ResourceId,
    interval: Duration,
    tsk: &Task,
    clusters: &Clusters,
    times: &[Vec<Vec<Duration>>],
    max_lower: &mut Duration,
) -> Duration {
    let mut blocking = 0;
    *max_lower = 0;

    for (c, cluster) in clusters.iter().enumerate() {
        for (i, t) in cluster.iter().enumerate() {
            if t.id() != tsk.id() {
                if t.priority() < tsk.priority() {
                    // higher-priority: can block multiple times
                    blocking += response_time_for(res_id, interval, t, &times[c][i], true);
                } else {
                    // lower-priority: blocks only once
                    *max_lower = max(
                        *max_lower,
                        response_time_for(res_id, interval, t, &times[c][i], false),
                    );
                }
            }
        }
    }

    blocking
}

/// Fixed-point search for the remote blocking of one request of
/// `tsk`, aborted once the iterate exceeds the task's response-time
/// bound.
fn remote_blocking_per_request(
    res_id: ResourceId,
    tsk: &Task,
    clusters: &Clusters,
    times: &[Vec<Vec<Duration>>],
) -> SearchResult {
    let mut blocking = 1;
    let mut max_lower = 0;

    loop {
        let interval = blocking;
        // bail out if the recurrence does not converge
        if interval > tsk.response() {
            return Err(SearchFailure::DivergenceLimitExceeded {
                task: tsk.id(),
                limit: tsk.response(),
            });
        }

        blocking = remote_blocking_step(res_id, interval, tsk, clusters, times, &mut max_lower);
        // account for the one lower-priority gcs in the way
        blocking += max_lower;

        if interval == blocking {
            return Ok(blocking);
        }
    }
}

/// Total remote blocking of `tsk` over all of its requests.
fn remote_blocking(tsk: &Task, clusters: &Clusters, times: &[Vec<Vec<Duration>>]) -> SearchResult {
    let mut blocking = 0;

    for req in tsk.requests() {
        let b = remote_blocking_per_request(req.resource(), tsk, clusters, times)?;
        // may represent multiple requests, so multiply accordingly
        blocking += b * req.num_requests();
    }

    Ok(blocking)
}

/// Arrival (spin) blocking: one maximal gcs of every local task of
/// lower-or-equal priority, per arrival unless virtual spinning is
/// used (Eqs. (1) and (4) in LNR:09).
fn arrival_blocking(tsk: &Task, cluster: &Cluster, virtual_spinning: bool) -> Duration {
    let blocking: Duration = cluster
        .iter()
        .filter(|t| t.id() != tsk.id() && t.priority() >= tsk.priority())
        .map(|t| t.max_request_length())
        .sum();

    if virtual_spinning {
        blocking
    } else {
        blocking * tsk.num_arrivals()
    }
}

/// Blocking bounds under the MPCP.
///
/// Tasks whose remote-blocking recurrence diverges are assigned the
/// [UNBOUNDED] sentinel; the remaining tasks are still analyzed.
pub fn mpcp_bounds(ts: &TaskSet, use_virtual_spinning: bool) -> BlockingBounds {
    let resources = split_by_resource(ts);
    let clusters = split_by_cluster(ts);

    let ceilings = priority_ceilings(ts, &resources);

    // gcs response times only depend on the ceilings
    let times: Vec<Vec<Vec<Duration>>> = clusters
        .iter()
        .map(|cluster| {
            cluster
                .iter()
                .map(|tsk| gcs_response_times(tsk, cluster, &ceilings))
                .collect()
        })
        .collect();

    let mut results = BlockingBounds::new(ts);

    for (i, tsk) in ts.tasks().iter().enumerate() {
        match remote_blocking(tsk, &clusters, &times) {
            Ok(remote) => {
                let local = arrival_blocking(tsk, &clusters[tsk.cluster()], use_virtual_spinning);
                results[i] = Interference::new(remote + local, 0);
                results.set_remote_blocking(i, Interference::new(remote, 0));
            }
            Err(_) => {
                // domain-level "no bound": flag and move on
                results[i] = Interference::new(UNBOUNDED, 0);
                results.set_remote_blocking(i, Interference::new(UNBOUNDED, 0));
            }
        }
    }

    results
}
