use std::cmp::{max, min};

use super::{merge_rw_requests, np_fifo_per_resource};
use crate::bounds::{charge_arrival_blocking, BlockingBounds, Interference};
use crate::contention::{
    bound_blocking_all, sort_all_by_request_length, sort_nested_by_request_length,
    split_by_cluster, split_by_resource, split_by_resource_per_cluster,
    split_cluster_resources_by_type, split_resources_by_type, Resources,
};
use crate::model::{ClusterId, ResourceId, Task, TaskSet};

/// Reader blocking under task-fair queueing: reader phases are
/// bounded by the writer phases blocking us plus our own writes,
/// while per cluster and per task the queue length stays capped.
fn tf_reader_all(
    ts: &TaskSet,
    tsk: &Task,
    all_reads: &Resources,
    num_writes: u64,
    num_wblock: u64,
    num_reads: u64,
    res_id: ResourceId,
    procs_per_cluster: u64,
) -> Interference {
    let num_reqs = num_reads + num_writes;
    let max_reader_phases = num_wblock + num_writes;
    let task_limit = min(max_reader_phases, num_reqs);

    bound_blocking_all(
        ts,
        &all_reads[res_id],
        tsk.id(),
        num_reqs * procs_per_cluster,
        num_reqs * (procs_per_cluster - 1),
        task_limit,
        max_reader_phases,
    )
}

/// Blocking bounds for task-fair reader/writer spin locks.
///
/// `ts_mtx` must describe the same tasks as `ts` with every request
/// degraded to a mutex request; the analysis takes the per-request
/// minimum of the reader/writer bound and the mutex-degradation
/// baseline.
pub fn task_fair_rw(
    ts: &TaskSet,
    ts_mtx: &TaskSet,
    procs_per_cluster: u64,
    dedicated_irq: Option<ClusterId>,
) -> BlockingBounds {
    assert_eq!(ts.len(), ts_mtx.len(), "mutex view must mirror the task set");

    let clusters = split_by_cluster(ts);
    let clusters_mtx = split_by_cluster(ts_mtx);

    let mut resources = split_by_resource_per_cluster(&clusters);
    let mut resources_mtx = split_by_resource_per_cluster(&clusters_mtx);

    let all_task_reqs = split_by_resource(ts);
    let (mut all_reads, _all_writes) = split_resources_by_type(&all_task_reqs);

    sort_nested_by_request_length(&mut resources);
    sort_nested_by_request_length(&mut resources_mtx);
    sort_all_by_request_length(&mut all_reads);

    // splitting by type maintains sorted order
    let (_reads, writes) = split_cluster_resources_by_type(&resources);

    let mut results = BlockingBounds::new(ts);

    for (i, tsk) in ts.tasks().iter().enumerate() {
        let mut bterm = Interference::default();

        for rw in merge_rw_requests(tsk) {
            // skip placeholders
            if rw.num_reads == 0 && rw.num_writes == 0 {
                continue;
            }

            // 1) the mutex-degradation baseline
            let mtx = np_fifo_per_resource(
                ts_mtx,
                tsk,
                &resources_mtx,
                procs_per_cluster,
                rw.res_id,
                rw.num_reads + rw.num_writes,
                dedicated_irq,
            );

            let mut mtx_1 = if rw.num_reads + rw.num_writes == 1 {
                mtx
            } else {
                np_fifo_per_resource(
                    ts_mtx,
                    tsk,
                    &resources_mtx,
                    procs_per_cluster,
                    rw.res_id,
                    1,
                    dedicated_irq,
                )
            };

            // the span includes our own request
            mtx_1.total_length += max(rw.wlength, rw.rlength);
            mtx_1.count += 1;

            // 2) the actual reader/writer analysis
            let mut wblocking = np_fifo_per_resource(
                ts,
                tsk,
                &writes,
                procs_per_cluster,
                rw.res_id,
                rw.num_reads + rw.num_writes,
                dedicated_irq,
            );
            let mut wblocking_1 = np_fifo_per_resource(
                ts,
                tsk,
                &writes,
                procs_per_cluster,
                rw.res_id,
                1,
                dedicated_irq,
            );

            let rblocking = tf_reader_all(
                ts,
                tsk,
                &all_reads,
                rw.num_writes,
                wblocking.count,
                rw.num_reads,
                rw.res_id,
                procs_per_cluster,
            );

            let mut rblocking_w1 = Interference::default();
            let mut rblocking_r1 = Interference::default();

            if rw.num_writes > 0 {
                // single write
                rblocking_w1 = tf_reader_all(
                    ts,
                    tsk,
                    &all_reads,
                    1,
                    wblocking.count,
                    0,
                    rw.res_id,
                    procs_per_cluster,
                );
                // the span includes our own request
                rblocking_w1.total_length += rw.wlength;
                rblocking_w1.count += 1;
            }
            if rw.num_reads > 0 {
                // single read
                rblocking_r1 = tf_reader_all(
                    ts,
                    tsk,
                    &all_reads,
                    0,
                    wblocking.count,
                    1,
                    rw.res_id,
                    procs_per_cluster,
                );
                // the span includes our own request
                rblocking_r1.total_length += rw.rlength;
                rblocking_r1.count += 1;
            }

            // combine
            wblocking += rblocking;
            wblocking_1 += max(rblocking_w1, rblocking_r1);

            bterm += min(wblocking, mtx);
            results.raise_request_span(i, min(wblocking_1, mtx_1));
        }

        results[i] = bterm;
    }

    // the initial delay due to priority donation
    charge_arrival_blocking(ts, &mut results);

    results
}
