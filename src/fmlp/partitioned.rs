use std::cmp::min;

use crate::bounds::{BlockingBounds, Interference};
use crate::contention::{
    all_per_cluster, bound_blocking, derive_task_contention, sort_all_by_request_length,
    sort_nested_by_request_length, split_by_cluster, split_by_resource_per_cluster,
    AllPerCluster, ClusterContention, ClusterResources, ContentionSet, Exclusion, NO_LIMIT,
};
use crate::model::{Task, TaskSet};

/// How often jobs of each cluster can directly block the task under
/// analysis: per request of the task, each contender ahead of it in
/// the per-resource FIFO queue counts once.
fn count_direct_blocking(
    ts: &TaskSet,
    tsk: &Task,
    resources: &ClusterResources,
) -> Vec<Interference> {
    let interval = tsk.response();
    let mut counts = vec![Interference::default(); resources.len()];

    // for each resource requested by the task
    for req in tsk.requests() {
        let issued = req.num_requests();
        let res_id = req.resource();

        for (i, cluster_resources) in resources.iter().enumerate() {
            // does this cluster access the resource at all?
            if cluster_resources.len() > res_id {
                counts[i] += bound_blocking(
                    ts,
                    &cluster_resources[res_id],
                    interval,
                    NO_LIMIT, // no total limit
                    issued,   // once per issued request
                    Exclusion::Task(tsk.id()),
                    0,
                );
            }
        }
    }

    counts
}

/// Total number of requests issued toward each resource from one
/// cluster.
fn cluster_access_counts(cluster_contention: &ContentionSet) -> Vec<u64> {
    let mut counts: Vec<u64> = Vec::new();

    for req in cluster_contention {
        while counts.len() <= req.resource() {
            counts.push(0);
        }
        counts[req.resource()] += req.num_requests();
    }

    counts
}

/// For each task and each cluster: how many of the task's issued
/// requests target a resource that the cluster accesses as well
/// (and can hence conflict with it).
fn derive_access_counts(per_cluster: &AllPerCluster, ts: &TaskSet) -> Vec<Vec<u64>> {
    let counts: Vec<Vec<u64>> = per_cluster.iter().map(cluster_access_counts).collect();

    ts.tasks()
        .iter()
        .map(|tsk| {
            counts
                .iter()
                .map(|ac| {
                    tsk.requests()
                        .iter()
                        .filter(|req| ac.get(req.resource()).copied().unwrap_or(0) > 0)
                        .map(|req| req.num_requests())
                        .sum()
                })
                .collect()
        })
        .collect()
}

/// Remote boost blocking: each remote task can delay the task under
/// analysis (directly or transitively via boosting) once per direct
/// blocking event, but never more often than the task issues
/// conflicting requests toward that cluster.
fn bound_remote_blocking(
    ts: &TaskSet,
    tsk: &Task,
    icounts: &[u64],
    counts: &[Interference],
    contention: &ClusterContention,
) -> Interference {
    let interval = tsk.response();
    let mut blocking = Interference::default();

    for (i, cluster) in contention.iter().enumerate() {
        let max_per_task = min(counts[i].count, icounts[i]);

        // skip the local cluster and independent clusters
        if i == tsk.cluster() || max_per_task == 0 {
            continue;
        }

        for task_cont in cluster {
            // count the longest critical sections
            blocking += bound_blocking(
                ts,
                task_cont,
                interval,
                max_per_task,
                NO_LIMIT, // no limit per source
                Exclusion::Task(tsk.id()),
                0,
            );
        }
    }

    blocking
}

/// Additional delays due to remote non-preemptive sections (the
/// non-preemptive FMLP+ variant): the same remote task could be
/// non-preemptable each time the task under analysis is directly
/// blocked.
fn bound_np_blocking(
    ts: &TaskSet,
    tsk: &Task,
    counts: &[Interference],
    per_cluster: &AllPerCluster,
) -> Interference {
    let interval = tsk.response();
    let mut blocking = Interference::default();

    for (i, cont) in per_cluster.iter().enumerate() {
        // only remote clusters matter here
        if i == tsk.cluster() {
            continue;
        }

        let max_direct = counts[i].count;
        blocking += bound_blocking(
            ts,
            cont,
            interval,
            max_direct,
            max_direct,
            Exclusion::Task(tsk.id()),
            0,
        );
    }

    blocking
}

/// Local boost blocking from lower-priority tasks.
///
/// Direct blocking by local lower-priority jobs is subsumed by
/// boost blocking: boosted jobs run exactly while they directly
/// block. A lower-priority job can issue at most one blocking
/// request before the job under analysis is released and one before
/// each of its resumptions, so the charge is capped by the number
/// of arrivals and the direct-blocking count plus one.
fn bound_local_blocking(
    ts: &TaskSet,
    tsk: &Task,
    counts: &[Interference],
    contention: &ClusterContention,
) -> Interference {
    let num_db: Interference = counts.iter().copied().sum();
    let num_arrivals = min(tsk.num_arrivals(), num_db.count + 1);
    let interval = tsk.response();
    let mut blocking = Interference::default();

    for task_cont in &contention[tsk.cluster()] {
        // count the longest critical sections
        blocking += bound_blocking(
            ts,
            task_cont,
            interval,
            num_arrivals,
            NO_LIMIT, // no limit per source
            Exclusion::Task(tsk.id()),
            tsk.priority(),
        );
    }

    blocking
}

/// Blocking bounds under the partitioned FMLP+ (with priority
/// boosting); `preemptive` selects whether remote critical sections
/// run preemptively.
pub fn partitioned(ts: &TaskSet, preemptive: bool) -> BlockingBounds {
    let clusters = split_by_cluster(ts);
    let mut resources = split_by_resource_per_cluster(&clusters);
    sort_nested_by_request_length(&mut resources);

    // per-task contention, for picking the longest sections
    let mut contention = derive_task_contention(&clusters);
    sort_nested_by_request_length(&mut contention);

    // total contention per cluster
    let mut per_cluster = all_per_cluster(&clusters);
    sort_all_by_request_length(&mut per_cluster);

    let access_counts = derive_access_counts(&per_cluster, ts);

    // Two sources of blocking must be found: direct blocking (jobs
    // enqueued prior to the job under analysis) and boost blocking,
    // local or transitively propagated from remote partitions. The
    // latter requires knowing how often a job can be directly
    // blocked on each partition, so direct-blocking counts come
    // first.
    let mut results = BlockingBounds::new(ts);

    for (i, tsk) in ts.tasks().iter().enumerate() {
        let counts = count_direct_blocking(ts, tsk, &resources);

        let mut remote = bound_remote_blocking(ts, tsk, &access_counts[i], &counts, &contention);
        let local = bound_local_blocking(ts, tsk, &counts, &contention);

        if !preemptive {
            remote += bound_np_blocking(ts, tsk, &counts, &per_cluster);
        }

        results[i] = remote + local;
        results.set_remote_blocking(i, remote);
        results.set_local_blocking(i, local);
    }

    results
}
