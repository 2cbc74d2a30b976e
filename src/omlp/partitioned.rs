use super::np_fifo_per_resource;
use crate::bounds::{charge_arrival_blocking, BlockingBounds, Interference};
use crate::contention::{
    sort_nested_by_request_length, split_by_cluster, split_by_resource_per_cluster,
};
use crate::model::TaskSet;

/// Blocking bounds under the partitioned OMLP.
///
/// Each partition contributes at most one blocking request per
/// issued request (FIFO among partitions of parallelism one). The
/// maximum request span and the arrival blocking due to priority
/// donation are tracked alongside the direct blocking.
pub fn partitioned(ts: &TaskSet) -> BlockingBounds {
    // split everything by partition, then by resource, then sort
    let clusters = split_by_cluster(ts);
    let mut resources = split_by_resource_per_cluster(&clusters);
    sort_nested_by_request_length(&mut resources);

    // We need the maximum request span for each task as well as the
    // maximum direct blocking from remote partitions for each
    // request; both fall out of one pass.
    let mut results = BlockingBounds::new(ts);

    for (i, tsk) in ts.tasks().iter().enumerate() {
        let mut bterm = Interference::default();

        for req in tsk.requests() {
            let mut blocking = np_fifo_per_resource(
                ts,
                tsk,
                &resources,
                1,
                req.resource(),
                req.num_requests(),
                None,
            );

            bterm += blocking;

            // Track the maximum request span; recompute for a
            // single issue unless this request is single-issue
            // already.
            if req.num_requests() != 1 {
                blocking = np_fifo_per_resource(ts, tsk, &resources, 1, req.resource(), 1, None);
            }

            // the span includes our own request
            blocking.total_length += req.length();
            blocking.count += 1;

            results.raise_request_span(i, blocking);
        }

        results[i] = bterm;
    }

    charge_arrival_blocking(ts, &mut results);

    results
}
