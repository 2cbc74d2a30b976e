use crate::bounds::BlockingBounds;
use crate::contention::{bound_blocking, sort_all_by_request_length, split_by_resource, Exclusion};
use crate::bounds::Interference;
use crate::model::TaskSet;

/// Blocking bounds under the global OMLP on `num_procs` processors.
///
/// Each request enters a hybrid FIFO/priority queue: at most `2m-1`
/// blocking requests in total and two per source, per issued
/// request. If the resource has at most `m + 1` requesting sources,
/// the priority queue is never occupied by more than one job and
/// the bound collapses to plain FIFO: one blocking request per
/// source.
pub fn global(ts: &TaskSet, num_procs: u64) -> BlockingBounds {
    // split everything by resource, sort, and then start counting
    let mut resources = split_by_resource(ts);
    sort_all_by_request_length(&mut resources);

    let mut results = BlockingBounds::new(ts);

    for (i, tsk) in ts.tasks().iter().enumerate() {
        let mut bterm = Interference::default();

        for req in tsk.requests() {
            let cs = &resources[req.resource()];

            let num_sources = cs.len() as u64;
            let interval = tsk.response();
            let issued = req.num_requests();

            let (total_limit, per_src_limit) = if num_sources <= num_procs + 1 {
                // FIFO case: no job is ever skipped in the priority
                // queue, so at most one blocking request per source
                // per issued request.
                ((num_sources - 1) * issued, issued)
            } else {
                ((2 * num_procs - 1) * issued, 2 * issued)
            };

            bterm += bound_blocking(
                ts,
                cs,
                interval,
                total_limit,
                per_src_limit,
                Exclusion::Task(i),
                0,
            );
        }

        results[i] = bterm;
    }

    results
}
