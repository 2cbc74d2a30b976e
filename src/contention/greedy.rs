/*! The greedy worst-case selection primitive

Every closed-form protocol analysis in this crate reduces to the
same question: given a length-sorted contention set and a family of
caps (total events, events per source, events per cluster), how much
blocking can an adversary inflict? Because the caps are fixed and
the sets are sorted by descending length, taking the longest
eligible requests first is provably maximal (a standard exchange
argument), so a single greedy pass yields the worst case.

Protocols differ only in how they derive the caps.
*/

use std::cmp::min;

use crate::bounds::Interference;
use crate::contention::{ClusterResources, ContentionSet};
use crate::model::{Priority, Request, ResourceId, TaskId, TaskSet};
use crate::time::Duration;

/// Marker for an uncapped dimension.
pub const NO_LIMIT: u64 = u64::MAX;

/// Which sources a greedy pass must skip.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Exclusion {
    /// Exclude only the task under analysis (a task never blocks
    /// itself).
    Task(TaskId),
    /// Exclude the task under analysis and every task in its
    /// cluster.
    Cluster(TaskId),
}

impl Exclusion {
    fn excludes(self, ts: &TaskSet, req: &Request) -> bool {
        match self {
            Exclusion::Task(t) => req.task() == t,
            Exclusion::Cluster(t) => {
                req.task() == t || ts.task(req.task()).cluster() == ts.task(t).cluster()
            }
        }
    }
}

/// Greedily bound the worst-case blocking from a length-sorted
/// contention set.
///
/// Per eligible request, at most `min(issuable in interval,
/// max_per_source, remaining total)` events are charged; the pass
/// stops as soon as the total budget is exhausted. `min_priority`
/// excludes sources of numerically lower (i.e., higher) priority;
/// pass 0 to admit all sources, which is appropriate for remote
/// blocking.
pub fn bound_blocking(
    ts: &TaskSet,
    cont: &ContentionSet,
    interval: Duration,
    max_total: u64,
    max_per_source: u64,
    exclusion: Exclusion,
    min_priority: Priority,
) -> Interference {
    let mut inter = Interference::default();
    let mut remaining = max_total;

    for req in cont {
        if remaining == 0 {
            break;
        }

        if !exclusion.excludes(ts, req) && ts.task(req.task()).priority() >= min_priority {
            // This assumes one request object per source, which
            // holds for contention sets split by resource. For
            // mixed-resource sets it errs on the safe side, and is
            // exact whenever max_total == max_per_source.
            let num = min(
                min(ts.max_num_requests(req, interval), max_per_source),
                remaining,
            );

            inter.total_length += num * req.length();
            inter.count += num;
            remaining -= num;
        }
    }

    inter
}

/// A request together with the maximum number of times it may be
/// charged.
#[derive(Debug, Copy, Clone)]
pub struct LimitedRequest<'a> {
    pub request: &'a Request,
    pub limit: u64,
}

/// A contention set whose entries carry precomputed per-source caps,
/// so that a later pass only needs to enforce a total budget.
pub type LimitedContentionSet<'a> = Vec<LimitedRequest<'a>>;

/// Collect the per-source-capped candidates a greedy pass would
/// consider, without yet enforcing an overall budget. The caller
/// re-sorts the union of several such collections and applies the
/// total cap via [bound_limited].
pub fn add_blocking<'a>(
    lcs: &mut LimitedContentionSet<'a>,
    ts: &TaskSet,
    cont: &ContentionSet<'a>,
    interval: Duration,
    max_total: u64,
    max_per_source: u64,
    exclusion: Exclusion,
) {
    let mut remaining = max_total;

    for req in cont {
        if remaining == 0 {
            break;
        }

        if !exclusion.excludes(ts, req) {
            let num = min(
                min(ts.max_num_requests(req, interval), max_per_source),
                remaining,
            );
            remaining -= num;
            lcs.push(LimitedRequest {
                request: req,
                limit: num,
            });
        }
    }
}

/// Sort a pre-capped contention set by descending request length
/// (stable, as everywhere).
pub fn sort_limited_by_request_length(lcs: &mut LimitedContentionSet<'_>) {
    lcs.sort_by(|a, b| b.request.length().cmp(&a.request.length()));
}

/// Accumulate a length-sorted, pre-capped contention set up to a
/// total budget.
pub fn bound_limited(lcs: &LimitedContentionSet, max_total: u64) -> Interference {
    let mut inter = Interference::default();
    let mut remaining = max_total;

    for lreq in lcs {
        if remaining == 0 {
            break;
        }

        let num = min(lreq.limit, remaining);
        inter.total_length += num * lreq.request.length();
        inter.count += num;
        remaining -= num;
    }

    inter
}

/// The caps a protocol imposes on one cluster's contribution.
#[derive(Debug, Copy, Clone)]
pub struct ClusterLimit {
    pub max_total: u64,
    pub max_per_source: u64,
}

impl ClusterLimit {
    pub fn new(max_total: u64, max_per_source: u64) -> Self {
        ClusterLimit {
            max_total,
            max_per_source,
        }
    }
}

/// Per-cluster caps, indexed by cluster id.
pub type ClusterLimits = Vec<ClusterLimit>;

/// Sum the greedy bound for one resource over all clusters, each
/// under its own caps.
pub fn bound_blocking_all_clusters(
    ts: &TaskSet,
    clusters: &ClusterResources,
    limits: &ClusterLimits,
    res_id: ResourceId,
    interval: Duration,
    exclude: TaskId,
) -> Interference {
    let mut inter = Interference::default();

    for (resources, limit) in clusters.iter().zip(limits.iter()) {
        if resources.len() > res_id {
            inter += bound_blocking(
                ts,
                &resources[res_id],
                interval,
                limit.max_total,
                limit.max_per_source,
                Exclusion::Task(exclude),
                0,
            );
        }
    }

    inter
}

/// Collect, for one resource, the capped candidates from all
/// clusters into one [LimitedContentionSet] (unsorted).
pub fn contention_from_all_clusters<'a>(
    ts: &TaskSet,
    clusters: &ClusterResources<'a>,
    limits: &ClusterLimits,
    res_id: ResourceId,
    interval: Duration,
    exclude: TaskId,
) -> LimitedContentionSet<'a> {
    let mut lcs = LimitedContentionSet::new();

    for (resources, limit) in clusters.iter().zip(limits.iter()) {
        if resources.len() > res_id {
            add_blocking(
                &mut lcs,
                ts,
                &resources[res_id],
                interval,
                limit.max_total,
                limit.max_per_source,
                Exclusion::Task(exclude),
            );
        }
    }

    lcs
}

/// Greedy bound with all four cap dimensions at once: per remote
/// cluster, for the local cluster, per task, and in total. Counters
/// are keyed by stable task and cluster indices.
///
/// Used by the task-fair reader/writer analysis, where reader
/// phases admit several requests per cluster but the queue length
/// per task and overall remains capped.
pub fn bound_blocking_all(
    ts: &TaskSet,
    cont: &ContentionSet,
    tsk: TaskId,
    max_remote_requests: u64,
    max_local_requests: u64,
    max_requests_per_task: u64,
    max_total: u64,
) -> Interference {
    let interval = ts.task(tsk).response();
    let local_cluster = ts.task(tsk).cluster();
    let mut task_budget: Vec<Option<u64>> = vec![None; ts.len()];
    let mut cluster_budget: Vec<Option<u64>> = vec![None; ts.num_clusters()];
    let mut total = max_total;
    let mut inter = Interference::default();

    cluster_budget[local_cluster] = Some(max_local_requests);

    for req in cont {
        if total == 0 {
            break;
        }

        if req.task() == tsk {
            // doesn't block itself
            continue;
        }

        let cluster = ts.task(req.task()).cluster();
        let tb = task_budget[req.task()].get_or_insert(max_requests_per_task);
        if *tb == 0 {
            continue;
        }
        let cb = cluster_budget[cluster].get_or_insert(max_remote_requests);
        if *cb == 0 {
            continue;
        }

        let remaining = min(min(*tb, *cb), total);
        let num = min(ts.max_num_requests(req, interval), remaining);

        inter.total_length += num * req.length();
        inter.count += num;
        *tb -= num;
        *cb -= num;
        total -= num;
    }

    inter
}
