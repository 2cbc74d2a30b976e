use std::cmp::min;

use super::merge_rw_requests;
use crate::bounds::{charge_arrival_blocking, BlockingBounds, Interference};
use crate::contention::{
    bound_blocking, bound_blocking_all_clusters, sort_all_by_request_length,
    sort_nested_by_request_length, split_by_cluster, split_by_resource,
    split_by_resource_per_cluster, split_cluster_resources_by_type, split_resources_by_type,
    ClusterLimit, ClusterLimits, ClusterResources, Exclusion, Resources,
};
use crate::model::{ClusterId, ResourceId, Task, TaskSet};

/// Writer-FIFO blocking: per issued request, each cluster admits one
/// write per processor (beyond the analyzed task's own), and reads
/// queue ahead of writes at most once each.
#[allow(clippy::too_many_arguments)]
fn pf_writer_fifo(
    ts: &TaskSet,
    tsk: &Task,
    writes: &ClusterResources,
    num_writes: u64,
    num_reads: u64,
    res_id: ResourceId,
    procs_per_cluster: u64,
    dedicated_irq: Option<ClusterId>,
) -> Interference {
    let per_src_wlimit = num_reads + num_writes;
    let mut limits = ClusterLimits::with_capacity(writes.len());

    for idx in 0..writes.len() {
        let mut parallelism = procs_per_cluster;

        if Some(idx) == dedicated_irq {
            parallelism -= 1;
        }

        if parallelism > 0 && tsk.cluster() == idx {
            parallelism -= 1;
        }

        // No interference from writers if we are hogging the only
        // available processor.
        let total = if parallelism > 0 {
            num_reads + num_writes * parallelism
        } else {
            0
        };

        limits.push(ClusterLimit::new(total, per_src_wlimit));
    }

    bound_blocking_all_clusters(ts, writes, &limits, res_id, tsk.response(), tsk.id())
}

/// Reader-phase blocking: readers can be delayed by the writer
/// phases blocking them plus the outstanding writers, bounded by a
/// processor-count-scaled limit.
#[allow(clippy::too_many_arguments)]
fn pf_reader_all(
    ts: &TaskSet,
    tsk: &Task,
    all_reads: &Resources,
    num_writes: u64,
    num_wblock: u64,
    num_reads: u64,
    res_id: ResourceId,
    procs_per_cluster: u64,
    num_procs: u64,
) -> Interference {
    let rlimit = min(
        num_wblock + num_writes,
        num_reads + num_writes * (num_procs - 1),
    );
    // With a single processor per cluster, no same-cluster reader
    // can run concurrently at all.
    let exclusion = if procs_per_cluster == 1 {
        Exclusion::Cluster(tsk.id())
    } else {
        Exclusion::Task(tsk.id())
    };

    bound_blocking(
        ts,
        &all_reads[res_id],
        tsk.response(),
        rlimit,
        rlimit,
        exclusion,
        0,
    )
}

/// Blocking bounds under the clustered reader/writer OMLP.
///
/// Writer-FIFO blocking and reader-phase blocking are computed
/// separately per resource and combined per the phase-fair
/// reader/writer fairness rule; single-issue variants of both feed
/// the request-span tracking.
pub fn clustered_rw(
    ts: &TaskSet,
    procs_per_cluster: u64,
    dedicated_irq: Option<ClusterId>,
) -> BlockingBounds {
    let clusters = split_by_cluster(ts);
    let mut resources = split_by_resource_per_cluster(&clusters);

    let all_task_reqs = split_by_resource(ts);
    let (mut all_reads, _all_writes) = split_resources_by_type(&all_task_reqs);

    sort_nested_by_request_length(&mut resources);
    sort_all_by_request_length(&mut all_reads);

    // splitting by type maintains sorted order
    let (_reads, writes) = split_cluster_resources_by_type(&resources);

    let num_procs = procs_per_cluster * clusters.len() as u64;
    let mut results = BlockingBounds::new(ts);

    for (i, tsk) in ts.tasks().iter().enumerate() {
        let mut bterm = Interference::default();

        for rw in merge_rw_requests(tsk) {
            // skip placeholders
            if rw.num_reads == 0 && rw.num_writes == 0 {
                continue;
            }

            let mut wblocking = pf_writer_fifo(
                ts,
                tsk,
                &writes,
                rw.num_writes,
                rw.num_reads,
                rw.res_id,
                procs_per_cluster,
                dedicated_irq,
            );

            let rblocking = pf_reader_all(
                ts,
                tsk,
                &all_reads,
                rw.num_writes,
                wblocking.count,
                rw.num_reads,
                rw.res_id,
                procs_per_cluster,
                num_procs,
            );

            // single write
            let mut rblocking_w1 = Interference::default();
            let mut wblocking_w1 = Interference::default();

            if rw.num_writes > 0 && (rw.num_writes != 1 || rw.num_reads != 0) {
                wblocking_w1 = pf_writer_fifo(
                    ts,
                    tsk,
                    &writes,
                    1,
                    0,
                    rw.res_id,
                    procs_per_cluster,
                    dedicated_irq,
                );
                rblocking_w1 = pf_reader_all(
                    ts,
                    tsk,
                    &all_reads,
                    1,
                    wblocking_w1.count,
                    0,
                    rw.res_id,
                    procs_per_cluster,
                    num_procs,
                );
            } else if rw.num_writes > 0 {
                wblocking_w1 = wblocking;
                rblocking_w1 = rblocking;
            }
            // else: zero, nothing to do

            // single read
            let mut rblocking_r1 = Interference::default();
            let mut wblocking_r1 = Interference::default();

            if rw.num_reads > 0 && (rw.num_reads != 1 || rw.num_writes != 0) {
                wblocking_r1 = pf_writer_fifo(
                    ts,
                    tsk,
                    &writes,
                    0,
                    1,
                    rw.res_id,
                    procs_per_cluster,
                    dedicated_irq,
                );
                rblocking_r1 = pf_reader_all(
                    ts,
                    tsk,
                    &all_reads,
                    0,
                    wblocking_r1.count,
                    1,
                    rw.res_id,
                    procs_per_cluster,
                    num_procs,
                );
            } else if rw.num_reads > 0 {
                wblocking_r1 = wblocking;
                rblocking_r1 = rblocking;
            }
            // else: zero, nothing to do

            // the spans include our own request
            if rw.num_writes > 0 {
                wblocking_w1.total_length += rw.wlength;
                wblocking_w1.count += 1;
            }
            if rw.num_reads > 0 {
                rblocking_r1.total_length += rw.rlength;
                wblocking_r1.count += 1;
            }

            // combine
            let span_w = wblocking_w1 + rblocking_w1;
            let span_r = wblocking_r1 + rblocking_r1;
            wblocking += rblocking;

            results.raise_request_span(i, span_w);
            results.raise_request_span(i, span_r);
            bterm += wblocking;
        }

        results[i] = bterm;
    }

    // the initial delay due to priority donation
    charge_arrival_blocking(ts, &mut results);

    results
}
