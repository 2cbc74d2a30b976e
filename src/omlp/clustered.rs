use super::np_fifo_per_resource;
use crate::bounds::{charge_arrival_blocking, BlockingBounds, Interference};
use crate::contention::{
    sort_nested_by_request_length, split_by_cluster, split_by_resource_per_cluster,
};
use crate::model::{ClusterId, TaskSet};

/// Blocking bounds under the clustered OMLP with `procs_per_cluster`
/// processors per cluster.
///
/// Per issued request, each cluster can contribute one blocking
/// request per processor, except that the analyzed task's own
/// processor and a dedicated interrupt-handling processor (if any)
/// do not contribute.
pub fn clustered(
    ts: &TaskSet,
    procs_per_cluster: u64,
    dedicated_irq: Option<ClusterId>,
) -> BlockingBounds {
    let clusters = split_by_cluster(ts);
    let mut resources = split_by_resource_per_cluster(&clusters);
    sort_nested_by_request_length(&mut resources);

    let mut results = BlockingBounds::new(ts);

    for (i, tsk) in ts.tasks().iter().enumerate() {
        let mut bterm = Interference::default();

        for req in tsk.requests() {
            let mut blocking = np_fifo_per_resource(
                ts,
                tsk,
                &resources,
                procs_per_cluster,
                req.resource(),
                req.num_requests(),
                dedicated_irq,
            );

            bterm += blocking;

            if req.num_requests() != 1 {
                blocking = np_fifo_per_resource(
                    ts,
                    tsk,
                    &resources,
                    procs_per_cluster,
                    req.resource(),
                    1,
                    dedicated_irq,
                );
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
