use super::{np_fifo_per_resource_contention, ReplicaInfo};
use crate::bounds::{charge_arrival_blocking, BlockingBounds, Interference};
use crate::contention::{
    bound_limited, sort_limited_by_request_length, sort_nested_by_request_length,
    split_by_cluster, split_by_resource_per_cluster,
};
use crate::model::{ClusterId, TaskSet};
use crate::time::divide_with_ceil;

/// Blocking bounds under the clustered k-exclusion OMLP, where
/// resource `q` is replicated `replicas[q]` times.
///
/// The per-cluster FIFO caps are as in the mutex case, but with `k`
/// replicas at most `ceil(num_cpus / k) - 1` requests can precede
/// any single issue, so the union of the per-cluster candidate sets
/// is re-sorted and capped once more.
pub fn clustered_kx(
    ts: &TaskSet,
    replicas: &ReplicaInfo,
    procs_per_cluster: u64,
    dedicated_irq: Option<ClusterId>,
) -> BlockingBounds {
    let clusters = split_by_cluster(ts);
    let num_cpus = clusters.len() as u64 * procs_per_cluster - dedicated_irq.is_some() as u64;

    let mut resources = split_by_resource_per_cluster(&clusters);
    sort_nested_by_request_length(&mut resources);

    let mut results = BlockingBounds::new(ts);

    for (i, tsk) in ts.tasks().iter().enumerate() {
        let mut bterm = Interference::default();

        for req in tsk.requests() {
            let max_total_once = divide_with_ceil(num_cpus, replicas[req.resource()]) - 1;

            let mut lcs = np_fifo_per_resource_contention(
                ts,
                tsk,
                &resources,
                procs_per_cluster,
                req.resource(),
                req.num_requests(),
                dedicated_irq,
            );
            sort_limited_by_request_length(&mut lcs);
            let mut blocking = bound_limited(&lcs, max_total_once * req.num_requests());

            bterm += blocking;

            if req.num_requests() != 1 {
                let mut lcs = np_fifo_per_resource_contention(
                    ts,
                    tsk,
                    &resources,
                    procs_per_cluster,
                    req.resource(),
                    1,
                    dedicated_irq,
                );
                sort_limited_by_request_length(&mut lcs);
                blocking = bound_limited(&lcs, max_total_once);
            }

            // the span includes our own request
            blocking.total_length += req.length();
            blocking.count += 1;
            results.raise_request_span(i, blocking);
        }

        results[i] = bterm;
    }

    // the initial delay due to priority donation
    charge_arrival_blocking(ts, &mut results);

    results
}
